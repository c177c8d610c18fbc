//! Hollows game client.
//!
//! Keeps a local snapshot of a room on a remote game server current and turns
//! successive snapshots into smooth stone animation:
//!
//! - [`sync`]: push channel plus staleness-driven polling and reconnection
//! - [`projector`]: per-stone animation records, diffed per snapshot and
//!   stepped per frame
//! - [`session`]: the single-task event loop tying both to a renderer

pub mod api;
pub mod command;
pub mod error;
pub mod formatter;
pub mod layout;
pub mod notice;
pub mod projector;
pub mod push;
pub mod runner;
pub mod session;
pub mod snapshot;
pub mod sync;
pub mod ui;

pub use runner::run_client;
