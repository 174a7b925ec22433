//! Wire protocol: closed tagged event sets, validated at the boundary.
//!
//! Frames are JSON text shaped `{"event": ..., "data": ...}`. A frame that
//! fails to parse (including a vote direction other than `up`/`down`) is
//! logged and dropped before it can reach the room, so the room only ever
//! operates on well-typed structures.

use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::room::{Message, PublicMessage, Role, VoteTally};
use crate::state::AppState;
use crate::ws::ConnectionId;

/// Join payload. `role` defaults to student; anything else must name a known
/// role or the frame is rejected at parse time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinRequest {
    pub role: Role,
    pub name: Option<String>,
    /// Persistent identity token from a previous session, if the client has
    /// one. Absent on first connect; the server mints one and returns it.
    pub student_id: Option<String>,
    pub password: Option<String>,
}

/// Vote direction. Unknown strings fail deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Up,
    Down,
}

/// Events the server accepts from clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    Join(JoinRequest),
    #[serde(rename_all = "camelCase")]
    PostMessage {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        file_url: Option<String>,
        #[serde(default)]
        file_type: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Vote {
        message_id: String,
        #[serde(rename = "type")]
        kind: VoteKind,
    },
    #[serde(rename_all = "camelCase")]
    MarkAnswered { message_id: String },
}

/// Events the server emits. Public events go to every connection, admin
/// events only to teacher-role connections, the rest are unicast.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    JoinResult {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<Role>,
        #[serde(skip_serializing_if = "Option::is_none")]
        student_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        anon_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    InitialMessages(Vec<PublicMessage>),
    InitialMessagesAdmin(Vec<Message>),
    Message(PublicMessage),
    MessageAdmin(Message),
    #[serde(rename_all = "camelCase")]
    VoteUpdate {
        message_id: String,
        votes: VoteTally,
    },
    #[serde(rename_all = "camelCase")]
    VoteUpdateAdmin {
        message_id: String,
        votes: VoteTally,
        voters: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    VoteRejected {
        message_id: String,
        reason: String,
    },
    MessageUpdate { id: String, answered: bool },
    UpdateCounts { teachers: usize, students: usize },
    ActionFailed { reason: String },
}

impl ServerEvent {
    pub fn join_failure(error: &ActionError) -> Self {
        ServerEvent::JoinResult {
            success: false,
            role: None,
            student_id: None,
            anon_name: None,
            error: Some(error.to_string()),
        }
    }
}

/// Parse one inbound text frame and dispatch it to the room. All mutation
/// and fan-out happens under the room lock, so broadcasts form a single
/// global total order across connections.
pub fn handle_frame(state: &AppState, connection_id: ConnectionId, text: &str) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(err) => {
            tracing::debug!(connection_id, %err, "dropping unparseable frame");
            return;
        }
    };

    let mut room = state.room();
    match event {
        ClientEvent::Join(request) => {
            match room.join(connection_id, request, &state.teacher_password) {
                Ok(()) => {}
                Err(err @ ActionError::AuthFailed) => {
                    tracing::info!(connection_id, "teacher join rejected");
                    room.send_to(connection_id, &ServerEvent::join_failure(&err));
                }
                Err(err) => {
                    tracing::warn!(connection_id, %err, "join dropped");
                }
            }
        }
        ClientEvent::PostMessage {
            text,
            file_url,
            file_type,
        } => match room.post_message(connection_id, text, file_url, file_type) {
            Ok(_) => {}
            Err(err @ ActionError::EmptyMessage) => {
                room.send_to(
                    connection_id,
                    &ServerEvent::ActionFailed {
                        reason: err.to_string(),
                    },
                );
            }
            Err(err) => {
                tracing::debug!(connection_id, %err, "post dropped");
            }
        },
        ClientEvent::Vote { message_id, kind } => {
            match room.cast_vote(connection_id, &message_id, kind) {
                Ok(_) => {}
                Err(err @ (ActionError::NotFound | ActionError::DuplicateVote)) => {
                    room.send_to(
                        connection_id,
                        &ServerEvent::VoteRejected {
                            message_id,
                            reason: err.to_string(),
                        },
                    );
                }
                Err(err) => {
                    tracing::debug!(connection_id, %err, "vote dropped");
                }
            }
        }
        ClientEvent::MarkAnswered { message_id } => {
            match room.mark_answered(connection_id, &message_id) {
                Ok(_) => {}
                Err(err @ ActionError::Unauthorized) => {
                    room.send_to(
                        connection_id,
                        &ServerEvent::ActionFailed {
                            reason: err.to_string(),
                        },
                    );
                }
                Err(err) => {
                    tracing::debug!(connection_id, %err, "markAnswered dropped");
                }
            }
        }
    }
}
