//! Game session event loop.
//!
//! One task owns the sync manager, the projector and the current snapshot,
//! and multiplexes everything that can happen to them:
//!
//! - push channel messages and fetch results from the [`SyncManager`],
//! - completions of moves, restarts and pings,
//! - the staleness timer,
//! - the frame clock that steps the animation,
//! - commands from the frontend.
//!
//! Each event is handled to completion before the next one is picked up, so
//! nothing here needs a lock.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use tokio::{
    sync::mpsc,
    time::{self, Instant, MissedTickBehavior},
};

use hollows_shared::time::Clock;

use crate::{
    api::{GameApi, MoveRequest, PingRequest},
    error::ApiError,
    layout::{BoardLayout, Point},
    notice::Notice,
    projector::{AnimationConfig, Projector, StoneAnimation},
    push::PushConnector,
    snapshot::{Snapshot, StoneId},
    sync::{RoomTarget, SyncConfig, SyncEvent, SyncManager, SyncUpdate},
};

/// Session tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Time between animation frames
    pub frame_interval: Duration,
    pub sync: SyncConfig,
    pub animation: AnimationConfig,
    pub layout: BoardLayout,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(16),
            sync: SyncConfig::default(),
            animation: AnimationConfig::default(),
            layout: BoardLayout::default(),
        }
    }
}

/// Requests from the frontend
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Play the stones of a hole
    Move(usize),
    /// Pointer released at a screen position; plays the hole under it
    Click(Point),
    /// Ask the current player to hurry up
    Ping,
    /// Start a new game once the current one is over
    Restart,
    /// Refetch the room state now
    Refresh,
    /// Show the animation records
    ShowStones,
    /// End the session
    Quit,
}

/// Read-only view handed to the renderer
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub snapshot: Option<&'a Snapshot>,
    pub stones: &'a BTreeMap<StoneId, StoneAnimation>,
    pub layout: &'a BoardLayout,
    /// When the sync manager last heard from the server (Unix millis)
    pub last_update_at: i64,
}

/// Rendering side of the session.
pub trait Renderer: Send {
    /// A new snapshot has been applied.
    fn snapshot_changed(&mut self, snapshot: &Snapshot);

    /// Show a transient notice.
    fn notice(&mut self, notice: &Notice);

    /// Called once per frame after the animation has been stepped, as long
    /// as some stone is still moving.
    fn frame(&mut self, _view: FrameView<'_>) {}

    /// The user asked to see the animation records.
    fn show_stones(&mut self, view: FrameView<'_>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionKind {
    Move(usize),
    Restart,
    Ping,
}

#[derive(Debug)]
struct ActionOutcome {
    kind: ActionKind,
    result: Result<(), ApiError>,
}

/// One player's view of one room.
pub struct Session<R> {
    sync: SyncManager,
    sync_events: mpsc::UnboundedReceiver<SyncEvent>,
    projector: Projector,
    snapshot: Option<Arc<Snapshot>>,
    api: Arc<dyn GameApi>,
    config: SessionConfig,
    actions: mpsc::UnboundedSender<ActionOutcome>,
    action_results: mpsc::UnboundedReceiver<ActionOutcome>,
    renderer: R,
}

impl<R: Renderer> Session<R> {
    pub fn new(
        target: RoomTarget,
        api: Arc<dyn GameApi>,
        connector: Arc<dyn PushConnector>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
        renderer: R,
    ) -> Self {
        let (sync, sync_events) =
            SyncManager::new(target, Arc::clone(&api), connector, clock, config.sync);
        let (actions, action_results) = mpsc::unbounded_channel();
        Self {
            sync,
            sync_events,
            projector: Projector::new(config.layout, config.animation),
            snapshot: None,
            api,
            config,
            actions,
            action_results,
            renderer,
        }
    }

    /// Replace the projector, e.g. with a seeded one.
    pub fn with_projector(mut self, projector: Projector) -> Self {
        self.projector = projector;
        self
    }

    /// Latest applied snapshot
    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        self.snapshot.as_ref()
    }

    /// Current animation records
    pub fn stones(&self) -> &BTreeMap<StoneId, StoneAnimation> {
        self.projector.records()
    }

    pub fn sync(&self) -> &SyncManager {
        &self.sync
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Open the push channel and fetch the initial state.
    pub fn start(&mut self) {
        self.sync.connect();
        self.sync.fetch_snapshot();
    }

    /// Manual refresh entry point.
    pub fn refresh(&mut self) {
        self.sync.fetch_snapshot();
    }

    /// Make `snapshot` current and diff it into the animation records.
    pub fn apply_snapshot(&mut self, snapshot: Arc<Snapshot>) {
        self.projector.apply_snapshot(&snapshot);
        self.renderer.snapshot_changed(&snapshot);
        self.snapshot = Some(snapshot);
    }

    fn surface(&mut self, notice: Notice) {
        tracing::debug!("Notice: {}", notice);
        self.renderer.notice(&notice);
    }

    /// Feed one sync event through the manager and act on the outcome.
    pub fn handle_sync_event(&mut self, event: SyncEvent) {
        match self.sync.handle_event(event) {
            Some(SyncUpdate::Snapshot(snapshot)) => self.apply_snapshot(snapshot),
            Some(SyncUpdate::Notice(notice)) => self.surface(notice),
            None => {}
        }
    }

    /// Step the animation by `delta` and let the renderer draw.
    ///
    /// Nothing happens while every stone is resting.
    pub fn advance_frame(&mut self, delta: Duration) {
        if self.projector.is_idle() {
            return;
        }
        self.projector.step(delta.as_secs_f64());
        let view = FrameView {
            snapshot: self.snapshot.as_deref(),
            stones: self.projector.records(),
            layout: self.projector.layout(),
            last_update_at: self.sync.last_update_at(),
        };
        self.renderer.frame(view);
    }

    /// Handle a frontend command. Returns `false` once the session should end.
    pub fn handle_command(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Move(index) => self.submit_move(index),
            SessionCommand::Click(point) => {
                // Stones are drawn over holes and take the hit first
                let hit = self.snapshot.as_deref().map(|snapshot| {
                    self.projector
                        .stone_at(point)
                        .or_else(|| self.projector.layout().hole_at(snapshot, point))
                });
                match hit {
                    Some(Some(index)) => self.submit_move(index),
                    Some(None) => self.surface(Notice::Unavailable(format!(
                        "there is no hole at ({:.0}, {:.0})",
                        point.x, point.y
                    ))),
                    None => self.surface(Notice::Unavailable(
                        "waiting for the room state".to_string(),
                    )),
                }
            }
            SessionCommand::Ping => self.ping_current_player(),
            SessionCommand::Restart => self.restart(),
            SessionCommand::Refresh => self.refresh(),
            SessionCommand::ShowStones => {
                let view = FrameView {
                    snapshot: self.snapshot.as_deref(),
                    stones: self.projector.records(),
                    layout: self.projector.layout(),
                    last_update_at: self.sync.last_update_at(),
                };
                self.renderer.show_stones(view);
            }
            SessionCommand::Quit => return false,
        }
        true
    }

    fn submit_move(&mut self, index: usize) {
        let request = MoveRequest {
            player: self.sync.target().player.clone(),
            code: self.sync.target().code.clone(),
            index,
            reset: false,
        };
        self.spawn_move(ActionKind::Move(index), request);
    }

    fn restart(&mut self) {
        let finished = self
            .snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.board.finished);
        if !finished {
            self.surface(Notice::Unavailable(
                "the game is still running".to_string(),
            ));
            return;
        }

        let request = MoveRequest {
            player: self.sync.target().player.clone(),
            code: self.sync.target().code.clone(),
            index: 0,
            reset: true,
        };
        self.spawn_move(ActionKind::Restart, request);
    }

    fn spawn_move(&mut self, kind: ActionKind, request: MoveRequest) {
        let api = Arc::clone(&self.api);
        let actions = self.actions.clone();
        tracing::debug!("Submitting {:?} for room '{}'", kind, request.code);
        tokio::spawn(async move {
            let result = api.submit_move(&request).await;
            let _ = actions.send(ActionOutcome { kind, result });
        });
    }

    fn ping_current_player(&mut self) {
        let me = self.sync.target().player.clone();
        let target = match self.snapshot.as_ref() {
            None => None,
            Some(snapshot) => snapshot.ping_target(&me),
        };
        let Some(target) = target else {
            self.surface(Notice::Unavailable("no one to ping".to_string()));
            return;
        };

        let request = PingRequest {
            code: self.sync.target().code.clone(),
            name: me,
        };
        let api = Arc::clone(&self.api);
        let actions = self.actions.clone();
        tracing::info!("Asking {} to hurry up", target);
        tokio::spawn(async move {
            let result = api.ping(&request).await;
            let _ = actions.send(ActionOutcome {
                kind: ActionKind::Ping,
                result,
            });
        });
    }

    fn handle_action(&mut self, outcome: ActionOutcome) {
        match (outcome.kind, outcome.result) {
            (ActionKind::Move(_) | ActionKind::Restart, Ok(())) => {
                // Reconcile with whatever the server made of the move
                self.refresh();
            }
            (ActionKind::Ping, Ok(())) => {}
            (kind, Err(e)) => {
                tracing::warn!("{:?} failed: {}", kind, e);
                self.surface(Notice::ActionFailed(e.to_string()));
            }
        }
    }

    /// Close the push channel. Idempotent.
    pub fn shutdown(&mut self) {
        self.sync.close();
    }

    /// Drive the session until `commands` asks to quit or is closed.
    ///
    /// Returns the renderer so the caller can inspect what it was shown.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<SessionCommand>) -> R {
        self.start();

        let poll_interval = self.sync.config().poll_interval;
        let mut poll = time::interval_at(Instant::now() + poll_interval, poll_interval);
        let mut frames = time::interval(self.config.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_frame = Instant::now();

        loop {
            tokio::select! {
                Some(event) = self.sync_events.recv() => self.handle_sync_event(event),
                Some(outcome) = self.action_results.recv() => self.handle_action(outcome),
                _ = poll.tick() => {
                    self.sync.tick();
                }
                now = frames.tick() => {
                    self.advance_frame(now.saturating_duration_since(last_frame));
                    last_frame = now;
                }
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command) {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }

        self.shutdown();
        tracing::info!("Session for room '{}' ended", self.sync.target().code);
        self.renderer
    }
}
