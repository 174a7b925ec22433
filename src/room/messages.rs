//! Message ledger: append-only, insertion-ordered, never deleted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ActionError;
use crate::identity;
use crate::room::{Role, Room};
use crate::ws::protocol::ServerEvent;
use crate::ws::ConnectionId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub up: u32,
    pub down: u32,
}

/// Full message record, the admin projection. `student_id` is the author's
/// identity-key for student authors and must never reach non-teacher
/// connections; teacher authors carry `None` since their keys are
/// connection-scoped and meaningless after disconnect.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub anon_name: String,
    pub student_id: Option<String>,
    pub role: Role,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub votes: VoteTally,
    pub answered: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// The subset of a message every participant may see.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicMessage {
    pub id: String,
    pub text: String,
    pub anon_name: String,
    pub role: Role,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub votes: VoteTally,
    pub answered: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn public(&self) -> PublicMessage {
        PublicMessage {
            id: self.id.clone(),
            text: self.text.clone(),
            anon_name: self.anon_name.clone(),
            role: self.role,
            file_url: self.file_url.clone(),
            file_type: self.file_type.clone(),
            votes: self.votes,
            answered: self.answered,
            created_at: self.created_at,
        }
    }
}

impl Room {
    /// Append a message authored by `id`'s session. Requires a role
    /// (`NotJoined`) and either non-whitespace text or a media reference
    /// (`EmptyMessage`). Broadcasts the public projection to everyone and
    /// the full record to teachers. Returns the new message id.
    pub fn post_message(
        &mut self,
        id: ConnectionId,
        text: Option<String>,
        file_url: Option<String>,
        file_type: Option<String>,
    ) -> Result<String, ActionError> {
        let session = self.session(id)?.clone();

        let text = text.unwrap_or_default();
        let file_url = file_url.filter(|url| !url.trim().is_empty());
        if text.trim().is_empty() && file_url.is_none() {
            return Err(ActionError::EmptyMessage);
        }

        let message = Message {
            id: identity::message_id(),
            text,
            anon_name: session.display_name,
            student_id: (session.role == Role::Student).then(|| session.identity_key),
            role: session.role,
            file_url,
            file_type,
            votes: VoteTally::default(),
            answered: false,
            created_at: Utc::now(),
        };
        let message_id = message.id.clone();

        tracing::info!(
            connection_id = id,
            message_id = %message_id,
            role = ?message.role,
            "message posted"
        );

        self.index.insert(message_id.clone(), self.messages.len());
        let public = message.public();
        self.messages.push(message.clone());

        self.broadcast_all(&ServerEvent::Message(public));
        self.broadcast_teachers(&ServerEvent::MessageAdmin(message));
        Ok(message_id)
    }

    /// Teacher-only: flip a message's answered flag to true. Monotonic and
    /// idempotent; a repeated call rebroadcasts the same state.
    pub fn mark_answered(&mut self, id: ConnectionId, message_id: &str) -> Result<(), ActionError> {
        match self.session(id) {
            Ok(session) if session.role == Role::Teacher => {}
            _ => return Err(ActionError::Unauthorized),
        }
        let &slot = self.index.get(message_id).ok_or(ActionError::NotFound)?;
        self.messages[slot].answered = true;

        tracing::info!(connection_id = id, message_id, "marked answered");
        self.broadcast_all(&ServerEvent::MessageUpdate {
            id: message_id.to_string(),
            answered: true,
        });
        Ok(())
    }

    /// All messages, public shape, insertion order.
    pub fn public_snapshot(&self) -> Vec<PublicMessage> {
        self.messages.iter().map(Message::public).collect()
    }

    /// All messages, full admin shape, insertion order.
    pub fn admin_snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::testing::{drain, join_student, join_teacher, open};

    const PASSWORD: &str = "sesame";

    #[test]
    fn post_requires_join() {
        let mut room = Room::new();
        let _rx = open(&mut room, 1);
        let err = room.post_message(1, Some("hi".to_string()), None, None);
        assert_eq!(err, Err(ActionError::NotJoined));
        assert!(room.public_snapshot().is_empty());
    }

    #[test]
    fn empty_post_is_rejected() {
        let mut room = Room::new();
        let _rx = open(&mut room, 1);
        join_student(&mut room, 1, "tok1");

        assert_eq!(
            room.post_message(1, None, None, None),
            Err(ActionError::EmptyMessage)
        );
        assert_eq!(
            room.post_message(1, Some("   ".to_string()), None, None),
            Err(ActionError::EmptyMessage)
        );
        // whitespace text with an attachment is fine
        let posted = room.post_message(
            1,
            None,
            Some("/uploads/1-clip.webm".to_string()),
            Some("audio/webm".to_string()),
        );
        assert!(posted.is_ok());
        assert_eq!(room.public_snapshot().len(), 1);
    }

    #[test]
    fn snapshots_are_insertion_ordered() {
        let mut room = Room::new();
        let _rx = open(&mut room, 1);
        join_student(&mut room, 1, "tok1");
        let first = room.post_message(1, Some("one".to_string()), None, None).unwrap();
        let second = room.post_message(1, Some("two".to_string()), None, None).unwrap();

        let snapshot = room.public_snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, first);
        assert_eq!(snapshot[1].id, second);
        assert_eq!(snapshot[0].anon_name, "Anon-tok1");
        assert_eq!(snapshot[0].role, Role::Student);
    }

    #[test]
    fn public_projection_never_leaks_identity() {
        let mut room = Room::new();
        let _rx = open(&mut room, 1);
        join_student(&mut room, 1, "tok1");
        room.post_message(1, Some("hi".to_string()), None, None)
            .unwrap();

        let public = serde_json::to_value(&room.public_snapshot()[0]).unwrap();
        assert!(public.get("studentId").is_none());

        let admin = serde_json::to_value(&room.admin_snapshot()[0]).unwrap();
        assert_eq!(admin["studentId"], "tok1");
        // admin shape contains every public field
        for key in public.as_object().unwrap().keys() {
            assert!(admin.get(key).is_some(), "admin shape missing {key}");
        }
    }

    #[test]
    fn teacher_messages_carry_no_student_identity() {
        let mut room = Room::new();
        let _rx = open(&mut room, 1);
        join_teacher(&mut room, 1, PASSWORD);
        room.post_message(1, Some("settle down".to_string()), None, None)
            .unwrap();
        let admin = &room.admin_snapshot()[0];
        assert_eq!(admin.student_id, None);
        assert_eq!(admin.role, Role::Teacher);
        assert_eq!(admin.anon_name, "Teacher");
    }

    #[test]
    fn mark_answered_is_teacher_only_and_idempotent() {
        let mut room = Room::new();
        let _student_rx = open(&mut room, 1);
        let _teacher_rx = open(&mut room, 2);
        join_student(&mut room, 1, "tok1");
        join_teacher(&mut room, 2, PASSWORD);
        let message_id = room
            .post_message(1, Some("hi".to_string()), None, None)
            .unwrap();

        assert_eq!(
            room.mark_answered(1, &message_id),
            Err(ActionError::Unauthorized)
        );
        assert!(!room.admin_snapshot()[0].answered);

        assert!(room.mark_answered(2, &message_id).is_ok());
        assert!(room.admin_snapshot()[0].answered);
        assert!(room.mark_answered(2, &message_id).is_ok());
        assert!(room.admin_snapshot()[0].answered);

        assert_eq!(
            room.mark_answered(2, "0000000000000000"),
            Err(ActionError::NotFound)
        );
    }

    #[test]
    fn message_broadcast_reaches_everyone_admin_only_teachers() {
        let mut room = Room::new();
        let mut student_rx = open(&mut room, 1);
        let mut teacher_rx = open(&mut room, 2);
        join_student(&mut room, 1, "tok1");
        join_teacher(&mut room, 2, PASSWORD);
        drain(&mut student_rx);
        drain(&mut teacher_rx);

        room.post_message(1, Some("hi".to_string()), None, None)
            .unwrap();

        let student_events = drain(&mut student_rx);
        assert_eq!(student_events.len(), 1);
        assert_eq!(student_events[0]["event"], "message");
        assert!(student_events[0]["data"].get("studentId").is_none());

        let teacher_events = drain(&mut teacher_rx);
        assert_eq!(teacher_events.len(), 2);
        assert_eq!(teacher_events[0]["event"], "message");
        assert_eq!(teacher_events[1]["event"], "messageAdmin");
        assert_eq!(teacher_events[1]["data"]["studentId"], "tok1");
    }
}
