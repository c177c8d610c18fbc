//! Transient user-facing notices.
//!
//! Every failure the core recovers from ends up here instead of being
//! returned to a caller.

use std::fmt;

/// A message the frontend shows briefly and then forgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Another player asked the local player to hurry up
    HurryUp { from: String },
    /// Refreshing the room state failed
    FetchFailed(String),
    /// A move, restart or ping was refused or never arrived
    ActionFailed(String),
    /// A command could not be carried out locally
    Unavailable(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::HurryUp { from } => write!(f, "{from} asks that you hurry up"),
            Notice::FetchFailed(reason) => write!(f, "could not refresh the board: {reason}"),
            Notice::ActionFailed(reason) => write!(f, "{reason}"),
            Notice::Unavailable(reason) => write!(f, "{reason}"),
        }
    }
}
