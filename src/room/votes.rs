//! Vote ledger: at most one vote per identity-key per message, forever.
//!
//! Deduplication is keyed on identity, not connection: a student who
//! reconnects with the same persisted token is the same voter, while two
//! teacher connections always count separately because their keys are
//! connection-scoped.

use crate::error::ActionError;
use crate::room::{Room, VoteTally};
use crate::ws::protocol::{ServerEvent, VoteKind};
use crate::ws::ConnectionId;

impl Room {
    /// Record a vote by `id`'s identity on `message_id`. Success broadcasts
    /// the new tally to everyone and the tally plus voter-identity list to
    /// teachers; `DuplicateVote` is terminal and leaves the tally unchanged.
    pub fn cast_vote(
        &mut self,
        id: ConnectionId,
        message_id: &str,
        kind: VoteKind,
    ) -> Result<VoteTally, ActionError> {
        let voter = self.session(id)?.identity_key.clone();
        let &slot = self.index.get(message_id).ok_or(ActionError::NotFound)?;

        let voters = self.voters.entry(message_id.to_string()).or_default();
        if !voters.insert(voter.clone()) {
            return Err(ActionError::DuplicateVote);
        }
        let mut voter_list: Vec<String> = voters.iter().cloned().collect();
        voter_list.sort_unstable();

        let message = &mut self.messages[slot];
        match kind {
            VoteKind::Up => message.votes.up += 1,
            VoteKind::Down => message.votes.down += 1,
        }
        let votes = message.votes;

        tracing::debug!(connection_id = id, message_id, voter = %voter, ?kind, "vote recorded");

        self.broadcast_all(&ServerEvent::VoteUpdate {
            message_id: message_id.to_string(),
            votes,
        });
        self.broadcast_teachers(&ServerEvent::VoteUpdateAdmin {
            message_id: message_id.to_string(),
            votes,
            voters: voter_list,
        });
        Ok(votes)
    }

    /// Tally for a message, if it exists. Test/diagnostic accessor.
    pub fn tally(&self, message_id: &str) -> Option<VoteTally> {
        self.index
            .get(message_id)
            .map(|&slot| self.messages[slot].votes)
    }
}
