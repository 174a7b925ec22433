//! Rejection taxonomy for classroom actions.
//!
//! Every variant is a per-action rejection: it is either surfaced to the
//! originating connection as a unicast event or silently dropped with a log
//! line. None of these are fatal and none leave shared state half-mutated.

/// Why a join/post/vote/markAnswered action was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// Wrong teacher credential. The connection stays unauthenticated and
    /// may retry.
    #[error("wrong password")]
    AuthFailed,

    /// Action attempted before a successful join.
    #[error("not joined")]
    NotJoined,

    /// A connection whose role is already set attempted a second join.
    #[error("already joined")]
    AlreadyJoined,

    /// Post with neither text nor an attached media reference.
    #[error("message needs text or an attachment")]
    EmptyMessage,

    /// Vote or markAnswered referencing an unknown message id.
    #[error("unknown message")]
    NotFound,

    /// This identity already voted on this message. Terminal: the same vote
    /// must not be retried.
    #[error("already voted")]
    DuplicateVote,

    /// Non-teacher connection attempting a teacher-only action.
    #[error("not authorized")]
    Unauthorized,
}
