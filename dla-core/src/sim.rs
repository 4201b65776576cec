//! Simulation driver for the aggregation process.
//!
//! The per-frame update is:
//! 1. Rebuild the cluster's spatial hash if the wanted cell size moved
//!    (parameter changes only, never steady-state stepping).
//! 2. Reconcile the walker pool with the configured count.
//! 3. Step walkers round-robin, one at a time, starting at the cursor
//!    saved by the previous frame, until every walker has been visited
//!    once, the node count reaches the configured maximum, or the
//!    wall-clock budget runs out.
//!
//! Each walker step draws a uniform direction, moves by the step length,
//! and resolves to one of three [`StepOutcome`]s: escaped past the kill
//! radius (respawned), stuck to the cluster (node appended, radii updated,
//! walker respawned), or still wandering.

use crate::cluster::Cluster;
use crate::config::SimConfig;
use crate::types::NodeId;
use crate::walker::{self, Walker, WalkerPool};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use std::time::{Duration, Instant};

/// Outcome of stepping a single walker. Escape and wander are expected,
/// frequent results, not failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The walker attached to the cluster; a node was appended.
    Stuck,
    /// The walker crossed the kill radius and was respawned.
    Escaped,
    /// The walker moved and remains in flight.
    Wandering,
}

/// Aggregate result of one frame-level [`Simulation::step`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Walker steps executed this frame.
    pub processed: usize,
    /// Walkers that stuck this frame.
    pub stuck: usize,
    /// Walkers that escaped and were respawned this frame.
    pub escaped: usize,
    /// The cluster holds the configured maximum number of nodes.
    pub max_reached: bool,
}

/// Owns the cluster, the walker pool and the RNG, and schedules
/// time-budgeted walker stepping across frames.
///
/// All random draws come from one sequential [`StdRng`] and all iteration
/// is index-based, so two drivers reset with the same seed and stepped the
/// same way produce identical node sequences — provided the frame budget
/// is disabled (or never hit), since budget stops depend on wall time.
#[derive(Debug)]
pub struct Simulation {
    cluster: Cluster,
    pool: WalkerPool,
    rng: StdRng,
    spawn_radius: f32,
    kill_radius: f32,
    last_cell_size: f32,
    paused: bool,
    /// Scratch buffer reused across neighbor queries.
    candidates: Vec<NodeId>,
}

/// Cell size that keeps two points closer than the stick radius in the
/// same or adjacent cells, and keeps one step from skipping a cell
/// boundary undetected.
fn wanted_cell_size(cfg: &SimConfig) -> f32 {
    (cfg.stick_radius * 2.0).max(cfg.step_len * 2.0)
}

impl Simulation {
    /// Creates a driver and performs a full [`Simulation::reset`].
    pub fn new(cfg: &SimConfig) -> Self {
        let cell = wanted_cell_size(cfg);
        let mut sim = Self {
            cluster: Cluster::new(cell),
            pool: WalkerPool::default(),
            rng: StdRng::seed_from_u64(cfg.seed),
            spawn_radius: 80.0,
            kill_radius: 160.0,
            last_cell_size: cell,
            paused: false,
            candidates: Vec::new(),
        };
        sim.reset(cfg);
        sim
    }

    /// Reinitializes everything: the RNG (from the configured seed or OS
    /// entropy), the cluster with a single seed at the origin, the derived
    /// radii, the walker pool, and the spatial hash.
    pub fn reset(&mut self, cfg: &SimConfig) {
        self.rng = if cfg.deterministic {
            StdRng::seed_from_u64(cfg.seed)
        } else {
            StdRng::from_os_rng()
        };

        self.cluster.reset();
        self.cluster.add_seed(Vec2::ZERO);
        self.update_radii(cfg);

        self.pool.clear();
        self.pool.ensure_count(
            cfg.num_walkers,
            &mut self.rng,
            self.spawn_radius,
            self.kill_radius,
        );

        self.last_cell_size = wanted_cell_size(cfg);
        self.cluster.rebuild_hash(self.last_cell_size);

        self.paused = false;

        log::info!(
            "reset: seed={} deterministic={} walkers={}",
            cfg.seed,
            cfg.deterministic,
            cfg.num_walkers
        );
    }

    /// Recomputes spawn and kill radii from the current extent.
    ///
    /// Both grow strictly with the extent, and `kill_radius > spawn_radius`
    /// holds whenever `kill_margin > 0`.
    fn update_radii(&mut self, cfg: &SimConfig) {
        let ext = self.cluster.extent().max(1.0);
        self.spawn_radius = ext + cfg.spawn_margin * 1.5;
        self.kill_radius = ext + cfg.spawn_margin * 2.0 + cfg.kill_margin;
    }

    /// Finds the nearest cluster node around `pos` and applies the stick
    /// test. Distance ties keep the first candidate in query order. The
    /// probability draw is only taken when the distance test passes.
    fn try_stick(&mut self, pos: Vec2, cfg: &SimConfig) -> Option<NodeId> {
        self.cluster.query_neighbors(pos, &mut self.candidates);

        let mut nearest: Option<NodeId> = None;
        let mut nearest_d2 = f32::MAX;
        let nodes = self.cluster.nodes();
        for &idx in &self.candidates {
            let d2 = nodes[idx].pos.distance_squared(pos);
            if d2 < nearest_d2 {
                nearest_d2 = d2;
                nearest = Some(idx);
            }
        }

        let r2 = cfg.stick_radius * cfg.stick_radius;
        if nearest.is_some() && nearest_d2 <= r2 && self.rng.random::<f32>() <= cfg.stick_prob {
            nearest
        } else {
            None
        }
    }

    /// Advances one walker by a single random step and resolves the result.
    ///
    /// The walker moves by `step_len` in a uniformly random direction. If
    /// it ends up past the kill radius it escapes and is respawned; if the
    /// stick test succeeds a node is appended with the nearest node as its
    /// parent, the radii are recomputed from the new extent, and the walker
    /// is respawned; otherwise it keeps wandering from its new position.
    pub fn step_walker(&mut self, i: usize, cfg: &SimConfig) -> StepOutcome {
        let a = self.rng.random::<f32>() * TAU;
        let step = Vec2::new(a.cos(), a.sin()) * cfg.step_len;

        let w = self.pool.walker_mut(i);
        w.prev_pos = w.pos;
        w.pos += step;
        let pos = w.pos;

        if pos.length() > self.kill_radius {
            let (sr, kr) = (self.spawn_radius, self.kill_radius);
            walker::respawn(self.pool.walker_mut(i), &mut self.rng, sr, kr);
            return StepOutcome::Escaped;
        }

        if let Some(parent) = self.try_stick(pos, cfg) {
            self.cluster.add_node(pos, parent);
            self.update_radii(cfg);
            let (sr, kr) = (self.spawn_radius, self.kill_radius);
            walker::respawn(self.pool.walker_mut(i), &mut self.rng, sr, kr);
            return StepOutcome::Stuck;
        }

        StepOutcome::Wandering
    }

    /// Runs up to one frame's worth of walker steps.
    ///
    /// Stops when every walker has been visited once, when the node count
    /// reaches `max_stuck`, or when the elapsed time exceeds the frame
    /// budget — whichever comes first. Only a budget stop saves the
    /// rotating cursor, so interrupted frames resume at the next unvisited
    /// walker; completed frames have already wrapped around. Once
    /// `max_stuck` is reached with auto-pause enabled, subsequent calls do
    /// nothing until [`Simulation::reset`].
    pub fn step(&mut self, cfg: &SimConfig) -> FrameReport {
        let mut report = FrameReport {
            max_reached: self.cluster.len() >= cfg.max_stuck,
            ..FrameReport::default()
        };

        if self.paused {
            return report;
        }

        // Rebuild only when the wanted cell size actually moves.
        let wanted = wanted_cell_size(cfg);
        if (wanted - self.last_cell_size).abs() > 0.01 {
            log::debug!(
                "spatial hash rebuild: cell size {:.2} -> {:.2}",
                self.last_cell_size,
                wanted
            );
            self.last_cell_size = wanted;
            self.cluster.rebuild_hash(wanted);
        }

        self.pool.ensure_count(
            cfg.num_walkers,
            &mut self.rng,
            self.spawn_radius,
            self.kill_radius,
        );

        let total = self.pool.len();
        if total == 0 {
            return report;
        }

        let start = Instant::now();
        let budget = (cfg.frame_budget_ms > 0).then(|| Duration::from_millis(cfg.frame_budget_ms));

        let mut i = self.pool.cursor();
        let mut processed = 0;

        while processed < total {
            if self.cluster.len() >= cfg.max_stuck {
                report.max_reached = true;
                break;
            }

            match self.step_walker(i, cfg) {
                StepOutcome::Stuck => report.stuck += 1,
                StepOutcome::Escaped => report.escaped += 1,
                StepOutcome::Wandering => {}
            }

            processed += 1;
            i = (i + 1) % total;

            if let Some(b) = budget
                && start.elapsed() > b
            {
                // Resume from the next unvisited walker next frame.
                self.pool.set_cursor(i);
                break;
            }
        }

        report.processed = processed;

        if self.cluster.len() >= cfg.max_stuck {
            report.max_reached = true;
            if cfg.auto_pause_on_max && !self.paused {
                log::info!("max stuck nodes reached ({}), pausing", self.cluster.len());
                self.paused = true;
            }
        }

        report
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// Current walker states, for read-only presentation.
    pub fn walkers(&self) -> &[Walker] {
        self.pool.walkers()
    }

    pub fn spawn_radius(&self) -> f32 {
        self.spawn_radius
    }

    pub fn kill_radius(&self) -> f32 {
        self.kill_radius
    }

    /// True once auto-pause has latched; cleared by [`Simulation::reset`].
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
