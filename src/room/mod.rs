//! The classroom room: the single process-wide state object.
//!
//! Session registry, message ledger, vote ledger, and presence counters all
//! live in one `Room` behind one mutex. Every inbound action locks the room,
//! mutates, and fans out while still holding the lock; sends are
//! non-blocking, so the lock is never held across an await point. This is
//! what serializes mutation and gives every connection the same broadcast
//! order.

pub mod broadcast;
pub mod messages;
pub mod session;
pub mod votes;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use messages::{Message, PublicMessage, VoteTally};
pub use session::{Role, Session};

use crate::ws::{ConnectionId, ConnectionSender};

pub type SharedRoom = Arc<Mutex<Room>>;

/// One live connection as the room sees it: an outbound channel plus the
/// session established by a successful join, if any.
pub(crate) struct Connection {
    pub(crate) sender: ConnectionSender,
    pub(crate) session: Option<Session>,
}

#[derive(Default)]
pub struct Room {
    pub(crate) connections: HashMap<ConnectionId, Connection>,
    /// Append-only, insertion order is the broadcast/snapshot order.
    pub(crate) messages: Vec<Message>,
    /// Message id -> position in `messages`.
    pub(crate) index: HashMap<String, usize>,
    /// Message id -> identity-keys that have already voted on it.
    pub(crate) voters: HashMap<String, HashSet<String>>,
    pub(crate) teacher_count: usize,
    pub(crate) student_count: usize,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRoom {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Lock a shared room, recovering the inner state if a previous holder
    /// panicked. Room mutation never leaves state half-applied, so the data
    /// behind a poisoned lock is still consistent.
    pub fn lock(shared: &SharedRoom) -> MutexGuard<'_, Room> {
        shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
