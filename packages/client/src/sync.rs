//! Sync channel manager.
//!
//! Keeps the local room snapshot fresh through two channels:
//!
//! - the push channel, whose messages trigger a refetch, and
//! - a fallback timer that refetches and replaces the push channel when
//!   nothing has been heard for longer than the staleness threshold.
//!
//! ## 設計ノート
//!
//! Network work (opening the channel, fetching state) runs on spawned tasks
//! that report back as [`SyncEvent`]s over an mpsc channel. The owner feeds
//! those events into [`SyncManager::handle_event`] from a single task, so the
//! manager itself is plain mutable state with no locks.
//!
//! Every push connection gets a generation number and every fetch a request
//! number. Events from a replaced connection and responses older than the
//! newest applied one are dropped.

use std::{sync::Arc, time::Duration};

use futures_util::StreamExt;
use tokio::{sync::mpsc, task::JoinHandle};

use hollows_shared::time::Clock;

use crate::{
    api::GameApi,
    error::ApiError,
    notice::Notice,
    push::{PushConnector, PushMessage},
    snapshot::Snapshot,
};

/// Sync policy values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// How often [`SyncManager::tick`] is driven
    pub poll_interval: Duration,
    /// Silence after which the channel is considered dead
    pub staleness_threshold: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            staleness_threshold: Duration::from_secs(10),
        }
    }
}

/// Room and player a sync manager follows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomTarget {
    pub code: String,
    pub player: String,
}

/// Completion reports from the manager's background tasks
#[derive(Debug)]
pub enum SyncEvent {
    /// A message arrived on push connection `generation`
    Push {
        generation: u64,
        message: PushMessage,
    },
    /// Push connection `generation` ended or never opened
    PushClosed {
        generation: u64,
        reason: Option<String>,
    },
    /// Fetch number `request` finished
    Fetched {
        request: u64,
        result: Result<Snapshot, ApiError>,
    },
}

/// What the owner has to act on after an event
#[derive(Debug, Clone, PartialEq)]
pub enum SyncUpdate {
    /// State changed; this is the current snapshot
    Snapshot(Arc<Snapshot>),
    /// Something to show the user
    Notice(Notice),
}

struct PushConnection {
    generation: u64,
    reader: JoinHandle<()>,
}

/// Owner of the push connection and the staleness bookkeeping.
pub struct SyncManager {
    target: RoomTarget,
    api: Arc<dyn GameApi>,
    connector: Arc<dyn PushConnector>,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
    events: mpsc::UnboundedSender<SyncEvent>,
    connection: Option<PushConnection>,
    generation: u64,
    last_update_at: i64,
    requests_issued: u64,
    newest_applied: u64,
    closed: bool,
}

impl SyncManager {
    /// Create a manager for `target`.
    ///
    /// Nothing is opened yet; call [`SyncManager::connect`] and
    /// [`SyncManager::fetch_snapshot`]. The returned receiver yields the
    /// events that must be fed back into [`SyncManager::handle_event`].
    pub fn new(
        target: RoomTarget,
        api: Arc<dyn GameApi>,
        connector: Arc<dyn PushConnector>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let last_update_at = clock.now_millis();
        let manager = Self {
            target,
            api,
            connector,
            clock,
            config,
            events,
            connection: None,
            generation: 0,
            last_update_at,
            requests_issued: 0,
            newest_applied: 0,
            closed: false,
        };
        (manager, events_rx)
    }

    pub fn target(&self) -> &RoomTarget {
        &self.target
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Generation of the live push connection (0 before the first connect)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of fetches issued so far
    pub fn requests_issued(&self) -> u64 {
        self.requests_issued
    }

    /// Timestamp (ms) of the last observed update
    pub fn last_update_at(&self) -> i64 {
        self.last_update_at
    }

    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Open a fresh push channel, closing the current one first.
    ///
    /// Room code and player name come from the [`RoomTarget`] given to
    /// [`SyncManager::new`]; another room needs another manager.
    pub fn connect(&mut self) {
        if self.closed {
            tracing::debug!("Sync manager is closed, not connecting");
            return;
        }
        self.drop_connection();

        self.generation += 1;
        let generation = self.generation;
        let connector = Arc::clone(&self.connector);
        let events = self.events.clone();
        let RoomTarget { code, player } = self.target.clone();

        let reader = tokio::spawn(async move {
            let mut stream = match connector.open(&code, &player).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!("Push channel {} failed to open: {}", generation, e);
                    let _ = events.send(SyncEvent::PushClosed {
                        generation,
                        reason: Some(e.to_string()),
                    });
                    return;
                }
            };
            tracing::debug!("Push channel {} open", generation);

            while let Some(item) = stream.next().await {
                match item {
                    Ok(message) => {
                        if events.send(SyncEvent::Push { generation, message }).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        let _ = events.send(SyncEvent::PushClosed {
                            generation,
                            reason: Some(e.to_string()),
                        });
                        return;
                    }
                }
            }

            let _ = events.send(SyncEvent::PushClosed {
                generation,
                reason: None,
            });
        });

        self.connection = Some(PushConnection { generation, reader });
        tracing::info!(
            "Connecting push channel {} for '{}' in room '{}'",
            generation,
            self.target.player,
            self.target.code
        );
    }

    /// Request the authoritative state.
    ///
    /// The result arrives later as [`SyncEvent::Fetched`]. Returns the
    /// request number, or `None` once the manager is closed.
    pub fn fetch_snapshot(&mut self) -> Option<u64> {
        if self.closed {
            return None;
        }

        self.requests_issued += 1;
        let request = self.requests_issued;
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        let code = self.target.code.clone();

        tokio::spawn(async move {
            let result = api.fetch_state(&code).await;
            let _ = events.send(SyncEvent::Fetched { request, result });
        });

        tracing::debug!("Fetch {} issued for room '{}'", request, self.target.code);
        Some(request)
    }

    /// Process one background event.
    pub fn handle_event(&mut self, event: SyncEvent) -> Option<SyncUpdate> {
        if self.closed {
            return None;
        }

        match event {
            SyncEvent::Push {
                generation,
                message,
            } => {
                if generation != self.generation {
                    tracing::debug!("Dropping message from replaced push channel {}", generation);
                    return None;
                }
                self.touch();

                match message {
                    PushMessage::Heartbeat => None,
                    PushMessage::HurryUp { from } => {
                        Some(SyncUpdate::Notice(Notice::HurryUp { from }))
                    }
                    PushMessage::Changed => {
                        self.fetch_snapshot();
                        None
                    }
                }
            }
            SyncEvent::PushClosed { generation, reason } => {
                if generation == self.generation {
                    // Recovery is left to the staleness check in tick()
                    match reason {
                        Some(reason) => tracing::warn!("Push channel {} lost: {}", generation, reason),
                        None => tracing::warn!("Push channel {} closed by server", generation),
                    }
                }
                None
            }
            SyncEvent::Fetched { request, result } => match result {
                Ok(snapshot) => {
                    if request <= self.newest_applied {
                        tracing::debug!(
                            "Discarding fetch {} (fetch {} already applied)",
                            request,
                            self.newest_applied
                        );
                        return None;
                    }
                    self.newest_applied = request;
                    self.touch();
                    Some(SyncUpdate::Snapshot(Arc::new(snapshot)))
                }
                Err(e) => {
                    tracing::warn!("Fetch {} failed: {}", request, e);
                    Some(SyncUpdate::Notice(Notice::FetchFailed(e.to_string())))
                }
            },
        }
    }

    /// Staleness check, driven every [`SyncConfig::poll_interval`].
    ///
    /// When nothing has been observed for longer than the threshold, refetch
    /// and replace the push channel. Returns whether that happened.
    pub fn tick(&mut self) -> bool {
        if self.closed {
            return false;
        }

        let elapsed = self.clock.now_millis() - self.last_update_at;
        let threshold = i64::try_from(self.config.staleness_threshold.as_millis()).unwrap_or(i64::MAX);
        if elapsed <= threshold {
            return false;
        }

        tracing::info!(
            "No update for {} ms, refetching and reconnecting push channel",
            elapsed
        );
        self.fetch_snapshot();
        self.connect();
        true
    }

    /// Close the push channel and stop reacting to events. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.drop_connection();
        tracing::info!("Sync for room '{}' closed", self.target.code);
    }

    fn touch(&mut self) {
        self.last_update_at = self.clock.now_millis();
    }

    fn drop_connection(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.reader.abort();
            tracing::debug!("Push channel {} closed", connection.generation);
        }
    }
}

impl Drop for SyncManager {
    fn drop(&mut self) {
        self.drop_connection();
    }
}
