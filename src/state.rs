use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, MutexGuard};

use crate::config::Config;
use crate::room::{Room, SharedRoom};
use crate::ws::ConnectionId;

/// Shared application state passed to all handlers via the axum State
/// extractor. The room is the only mutable piece; everything else is
/// configuration fixed at startup.
#[derive(Clone)]
pub struct AppState {
    /// All session/message/vote/counter state behind one lock.
    pub room: SharedRoom,
    /// The single configured teacher credential.
    pub teacher_password: String,
    /// Directory holding uploaded media (under `uploads/`).
    pub data_dir: String,
    /// Directory of static client assets.
    pub public_dir: String,
    /// Maximum accepted upload size in megabytes.
    pub max_upload_size_mb: u32,
    /// Monotonic source of transport-assigned connection ids.
    next_connection_id: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            room: Room::shared(),
            teacher_password: config.teacher_password.clone(),
            data_dir: config.data_dir.clone(),
            public_dir: config.public_dir.clone(),
            max_upload_size_mb: config.max_upload_size_mb,
            next_connection_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn room(&self) -> MutexGuard<'_, Room> {
        Room::lock(&self.room)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("uploads")
    }
}
