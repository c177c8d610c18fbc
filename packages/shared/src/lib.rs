//! Shared utilities for the Hollows game client.

pub mod logger;
pub mod time;
