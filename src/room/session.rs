//! Session registry: connection lifecycle, roles, and presence counters.
//!
//! A connection's role is set exactly once, on its first successful join,
//! and never changes until disconnect. A failed teacher join leaves the
//! connection unauthenticated and free to retry.

use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::identity;
use crate::room::{Connection, Room};
use crate::ws::protocol::{JoinRequest, ServerEvent};
use crate::ws::{ConnectionId, ConnectionSender};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
}

/// What a successful join pins to a connection, immutable thereafter.
#[derive(Debug, Clone)]
pub struct Session {
    pub role: Role,
    pub identity_key: String,
    pub display_name: String,
}

impl Room {
    /// Track a freshly upgraded connection. It starts unauthenticated; no
    /// events fire until it joins.
    pub fn add_connection(&mut self, id: ConnectionId, sender: ConnectionSender) {
        let previous = self.connections.insert(
            id,
            Connection {
                sender,
                session: None,
            },
        );
        if previous.is_some() {
            tracing::warn!(connection_id = id, "connection id reused");
        }
    }

    /// Establish a role for a connection. On success this unicasts the join
    /// result and initial message snapshot(s) and broadcasts updated
    /// presence counts.
    pub fn join(
        &mut self,
        id: ConnectionId,
        request: JoinRequest,
        teacher_password: &str,
    ) -> Result<(), ActionError> {
        let Some(connection) = self.connections.get_mut(&id) else {
            return Err(ActionError::NotJoined);
        };
        if connection.session.is_some() {
            return Err(ActionError::AlreadyJoined);
        }

        let session = match request.role {
            Role::Teacher => {
                if request.password.as_deref() != Some(teacher_password) {
                    return Err(ActionError::AuthFailed);
                }
                Session {
                    role: Role::Teacher,
                    identity_key: identity::teacher_key(id),
                    display_name: "Teacher".to_string(),
                }
            }
            Role::Student => {
                let identity_key = identity::resolve_student_key(request.student_id.as_deref());
                let display_name = request
                    .name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| identity::default_anon_name(&identity_key));
                Session {
                    role: Role::Student,
                    identity_key,
                    display_name,
                }
            }
        };

        match session.role {
            Role::Teacher => self.teacher_count += 1,
            Role::Student => self.student_count += 1,
        }

        let result = match session.role {
            Role::Teacher => ServerEvent::JoinResult {
                success: true,
                role: Some(Role::Teacher),
                student_id: None,
                anon_name: None,
                error: None,
            },
            Role::Student => ServerEvent::JoinResult {
                success: true,
                role: Some(Role::Student),
                student_id: Some(session.identity_key.clone()),
                anon_name: Some(session.display_name.clone()),
                error: None,
            },
        };

        tracing::info!(
            connection_id = id,
            role = ?session.role,
            display_name = %session.display_name,
            "joined"
        );
        let role = session.role;
        connection.session = Some(session);

        self.send_to(id, &result);
        self.broadcast_counts();
        self.send_to(id, &ServerEvent::InitialMessages(self.public_snapshot()));
        if role == Role::Teacher {
            self.send_to(id, &ServerEvent::InitialMessagesAdmin(self.admin_snapshot()));
        }
        Ok(())
    }

    /// Drop a connection on disconnect. Decrements the matching presence
    /// counter, clamped at zero, and broadcasts the new counts.
    pub fn remove_connection(&mut self, id: ConnectionId) {
        let Some(connection) = self.connections.remove(&id) else {
            return;
        };
        if let Some(session) = connection.session {
            match session.role {
                Role::Teacher => self.teacher_count = self.teacher_count.saturating_sub(1),
                Role::Student => self.student_count = self.student_count.saturating_sub(1),
            }
            self.broadcast_counts();
        }
        tracing::info!(connection_id = id, "connection closed");
    }

    /// Presence snapshot: (teachers, students).
    pub fn counts(&self) -> (usize, usize) {
        (self.teacher_count, self.student_count)
    }

    pub(crate) fn session(&self, id: ConnectionId) -> Result<&Session, ActionError> {
        self.connections
            .get(&id)
            .and_then(|connection| connection.session.as_ref())
            .ok_or(ActionError::NotJoined)
    }
}
