//! Animated state projector.
//!
//! Turns the discrete stone-to-hole assignments of successive snapshots into
//! continuous motion. Each stone keeps one [`StoneAnimation`] for as long as it
//! stays on the board; a snapshot only moves its target, and [`Projector::step`]
//! moves its current position toward that target once per frame.

use std::collections::{BTreeMap, HashSet};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    layout::{BoardLayout, Point, jitter_offset},
    snapshot::{Hole, Snapshot, StoneId},
};

/// Animation policy values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationConfig {
    /// Travel speed in screen units per second
    pub speed: f64,
    /// Squared distance under which a stone counts as resting
    pub rest_epsilon_sq: f64,
    /// Radius of the disc around a hole centre where stones are placed
    pub jitter_radius: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            speed: 100.0,
            rest_epsilon_sq: 0.05,
            jitter_radius: 20.0,
        }
    }
}

/// Render state of one stone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoneAnimation {
    /// Where the stone is drawn now
    pub current: Point,
    /// Where the stone is heading
    pub target: Point,
    /// Hole the stone is assigned to in the latest snapshot
    pub hole: usize,
}

impl StoneAnimation {
    fn resting(position: Point, hole: usize) -> Self {
        Self {
            current: position,
            target: position,
            hole,
        }
    }

    /// Whether the stone is close enough to its target to stay put.
    pub fn is_at_rest(&self, rest_epsilon_sq: f64) -> bool {
        self.current.distance_squared(self.target) < rest_epsilon_sq
    }
}

/// What one [`Projector::apply_snapshot`] call changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub created: usize,
    pub retargeted: usize,
    pub pruned: usize,
}

/// Owner of the per-stone animation records for one game session.
#[derive(Debug)]
pub struct Projector {
    layout: BoardLayout,
    config: AnimationConfig,
    records: BTreeMap<StoneId, StoneAnimation>,
    rng: StdRng,
}

impl Projector {
    /// Create a projector with OS-seeded jitter.
    pub fn new(layout: BoardLayout, config: AnimationConfig) -> Self {
        Self::with_rng(layout, config, StdRng::from_os_rng())
    }

    /// Create a projector with reproducible jitter.
    pub fn with_seed(layout: BoardLayout, config: AnimationConfig, seed: u64) -> Self {
        Self::with_rng(layout, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(layout: BoardLayout, config: AnimationConfig, rng: StdRng) -> Self {
        Self {
            layout,
            config,
            records: BTreeMap::new(),
            rng,
        }
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// All animation records, keyed by stone.
    pub fn records(&self) -> &BTreeMap<StoneId, StoneAnimation> {
        &self.records
    }

    /// Animation record of one stone.
    pub fn get(&self, stone: StoneId) -> Option<&StoneAnimation> {
        self.records.get(&stone)
    }

    /// Hole of the stone drawn under `point`, if any.
    ///
    /// Uses the stone's current position, so a stone still in flight is
    /// found where it is drawn and answers for the hole it is heading to.
    pub fn stone_at(&self, point: Point) -> Option<usize> {
        let radius_sq = self.layout.stone_radius * self.layout.stone_radius;
        self.records
            .values()
            .find(|record| record.current.distance_squared(point) <= radius_sq)
            .map(|record| record.hole)
    }

    /// Whether every stone is resting.
    pub fn is_idle(&self) -> bool {
        self.records
            .values()
            .all(|record| record.is_at_rest(self.config.rest_epsilon_sq))
    }

    /// Diff `snapshot` against the records and create, retarget or prune them.
    ///
    /// - A stone seen for the first time is placed at rest near its hole.
    /// - A stone whose hole changed gets a new target near the new hole; its
    ///   current position is kept so that [`Projector::step`] animates the move.
    /// - A stone still in the same hole is left alone, even mid-flight.
    /// - A stone that is in no hole any more loses its record.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> ApplySummary {
        let mut summary = ApplySummary::default();
        let mut present = HashSet::with_capacity(snapshot.stone_count());

        for (index, stone) in snapshot.stone_assignments() {
            present.insert(stone);
            let hole = &snapshot.board.holes[index];

            match self.records.get(&stone).map(|record| record.hole) {
                None => {
                    let position = self.place_in(hole);
                    self.records
                        .insert(stone, StoneAnimation::resting(position, index));
                    summary.created += 1;
                }
                Some(previous) if previous != index => {
                    let target = self.place_in(hole);
                    if let Some(record) = self.records.get_mut(&stone) {
                        record.target = target;
                        record.hole = index;
                    }
                    tracing::trace!("Stone {} moves from hole {} to {}", stone, previous, index);
                    summary.retargeted += 1;
                }
                Some(_) => {}
            }
        }

        let before = self.records.len();
        self.records.retain(|stone, _| present.contains(stone));
        summary.pruned = before - self.records.len();

        tracing::debug!(
            "Applied snapshot: {} created, {} retargeted, {} pruned",
            summary.created,
            summary.retargeted,
            summary.pruned
        );
        summary
    }

    /// Advance every moving stone by one frame of `delta_secs` seconds.
    ///
    /// Stones travel in a straight line at the configured speed and stop
    /// exactly on their target. Returns how many stones moved.
    pub fn step(&mut self, delta_secs: f64) -> usize {
        if !delta_secs.is_finite() || delta_secs <= 0.0 {
            return 0;
        }

        let travel = self.config.speed * delta_secs;
        let mut moved = 0;

        for record in self.records.values_mut() {
            let remaining = record.target - record.current;
            let distance_sq = remaining.length_squared();
            if distance_sq < self.config.rest_epsilon_sq {
                continue;
            }

            let distance = distance_sq.sqrt();
            if travel >= distance {
                record.current = record.target;
            } else {
                record.current = record.current + remaining * (travel / distance);
            }
            moved += 1;
        }

        moved
    }

    /// Jittered screen position inside `hole`.
    fn place_in(&mut self, hole: &Hole) -> Point {
        let u: f64 = self.rng.random();
        let v: f64 = self.rng.random();
        self.layout.hole_center(hole) + jitter_offset(self.config.jitter_radius, u, v)
    }
}
