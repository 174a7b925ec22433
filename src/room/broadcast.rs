//! Fan-out: public events to every live connection, admin events only to
//! connections currently in teacher role.
//!
//! The teacher audience is read from the session table at publish time, never
//! cached, so a connection that became teacher after an earlier event still
//! receives everything published afterwards. Events are serialized once and
//! the frame cloned per recipient.

use axum::extract::ws::Message as WsMessage;

use crate::room::{Role, Room};
use crate::ws::protocol::ServerEvent;
use crate::ws::ConnectionId;

impl Room {
    /// Unicast to one connection. A send to a connection whose actor already
    /// died is silently dropped; the actor removes the record on exit.
    pub(crate) fn send_to(&self, id: ConnectionId, event: &ServerEvent) {
        let Some(frame) = encode(event) else { return };
        if let Some(connection) = self.connections.get(&id) {
            let _ = connection.sender.send(frame);
        }
    }

    pub(crate) fn broadcast_all(&self, event: &ServerEvent) {
        let Some(frame) = encode(event) else { return };
        for connection in self.connections.values() {
            let _ = connection.sender.send(frame.clone());
        }
    }

    pub(crate) fn broadcast_teachers(&self, event: &ServerEvent) {
        let Some(frame) = encode(event) else { return };
        let teachers = self.connections.values().filter(|connection| {
            matches!(
                &connection.session,
                Some(session) if session.role == Role::Teacher
            )
        });
        for connection in teachers {
            let _ = connection.sender.send(frame.clone());
        }
    }

    pub(crate) fn broadcast_counts(&self) {
        self.broadcast_all(&ServerEvent::UpdateCounts {
            teachers: self.teacher_count,
            students: self.student_count,
        });
    }
}

fn encode(event: &ServerEvent) -> Option<WsMessage> {
    match serde_json::to_string(event) {
        Ok(json) => Some(WsMessage::Text(json.into())),
        Err(err) => {
            tracing::error!(%err, "failed to encode server event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::room::testing::{drain, join_student, join_teacher, open};
    use crate::room::Room;
    use crate::ws::protocol::ServerEvent;

    #[test]
    fn admin_events_reach_late_joining_teachers() {
        let mut room = Room::new();
        let mut early_rx = open(&mut room, 1);
        join_student(&mut room, 1, "tok1");

        room.broadcast_teachers(&ServerEvent::ActionFailed {
            reason: "before any teacher".to_string(),
        });
        assert!(drain(&mut early_rx)
            .iter()
            .all(|event| event["event"] != "actionFailed"));

        // a connection that becomes teacher later still gets future events
        let mut late_rx = open(&mut room, 2);
        join_teacher(&mut room, 2, "sesame");
        drain(&mut late_rx);

        room.broadcast_teachers(&ServerEvent::ActionFailed {
            reason: "after".to_string(),
        });
        let late_events = drain(&mut late_rx);
        assert_eq!(late_events.len(), 1);
        assert_eq!(late_events[0]["event"], "actionFailed");

        // the student audience never sees it
        assert!(drain(&mut early_rx)
            .iter()
            .all(|event| event["event"] != "actionFailed"));
    }

    #[test]
    fn unicast_ignores_dead_and_unknown_connections() {
        let mut room = Room::new();
        let rx = open(&mut room, 1);
        drop(rx);
        room.send_to(1, &ServerEvent::ActionFailed {
            reason: "into the void".to_string(),
        });
        room.send_to(99, &ServerEvent::ActionFailed {
            reason: "never connected".to_string(),
        });
    }
}
