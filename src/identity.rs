//! Identity-key derivation rules.
//!
//! The identity-key is what the vote ledger deduplicates on. Students carry a
//! persistent client-supplied token so they stay the same voter across
//! reconnects; teachers get a key derived from the connection id, so every
//! teacher connection votes independently and is never deduplicated across
//! connections.

use rand::Rng;

use crate::ws::ConnectionId;

/// Connection-scoped identity-key for a teacher.
pub fn teacher_key(connection_id: ConnectionId) -> String {
    format!("conn-{connection_id}")
}

/// Resolve a student identity-key: the client-supplied persistent token if
/// one was sent, otherwise a freshly minted token the client is expected to
/// persist for future reconnects.
pub fn resolve_student_key(token: Option<&str>) -> String {
    match token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => token.to_string(),
        None => format!("stu-{}", random_hex(6)),
    }
}

/// Default display name derived from the trailing characters of the
/// identity-key, so the same token always renders as the same pseudonym.
pub fn default_anon_name(identity_key: &str) -> String {
    let start = identity_key
        .char_indices()
        .rev()
        .nth(3)
        .map(|(i, _)| i)
        .unwrap_or(0);
    format!("Anon-{}", &identity_key[start..])
}

/// Server-generated message id: 16 hex digits, collision-free for the
/// lifetime of the process.
pub fn message_id() -> String {
    random_hex(16)
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len.div_ceil(2)];
    rand::rng().fill(&mut bytes[..]);
    let mut out = hex::encode(bytes);
    out.truncate(len);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teacher_keys_are_connection_scoped() {
        assert_eq!(teacher_key(7), "conn-7");
        assert_ne!(teacher_key(1), teacher_key(2));
    }

    #[test]
    fn student_token_is_kept_when_supplied() {
        assert_eq!(resolve_student_key(Some("tok1")), "tok1");
        assert_eq!(resolve_student_key(Some("  tok1  ")), "tok1");
    }

    #[test]
    fn blank_student_token_mints_a_fresh_key() {
        let minted = resolve_student_key(None);
        assert!(minted.starts_with("stu-"));
        assert_eq!(minted.len(), "stu-".len() + 6);
        assert_ne!(resolve_student_key(Some("")), "");
        assert_ne!(resolve_student_key(None), resolve_student_key(None));
    }

    #[test]
    fn anon_name_uses_trailing_characters() {
        assert_eq!(default_anon_name("stu-a1b2c3"), "Anon-b2c3");
        assert_eq!(default_anon_name("ab"), "Anon-ab");
    }

    #[test]
    fn message_ids_are_sixteen_hex_digits() {
        let id = message_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(message_id(), message_id());
    }
}
