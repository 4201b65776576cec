use serde::{Deserialize, Serialize};

/// Simulation parameters, owned by the embedding application.
///
/// The driver reads these afresh on every call, so they can be edited
/// between frames and take effect immediately. The driver never mutates
/// them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of concurrently walking particles.
    pub num_walkers: usize,
    /// Maximum distance to a cluster node for sticking to be possible.
    pub stick_radius: f32,
    /// Length of a single random-walk step.
    pub step_len: f32,
    /// Probability that a walker within the stick radius actually sticks.
    pub stick_prob: f32,
    /// Margin added to the cluster extent when deriving the spawn radius.
    pub spawn_margin: f32,
    /// Extra margin past the spawn band before a walker counts as escaped.
    pub kill_margin: f32,
    /// Growth stops once the cluster holds this many nodes.
    pub max_stuck: usize,
    /// Per-frame stepping budget in milliseconds; 0 disables the budget.
    pub frame_budget_ms: u64,
    /// RNG seed, used when `deterministic` is set.
    pub seed: u64,
    /// Seed the RNG from `seed` instead of OS entropy.
    pub deterministic: bool,
    /// Stop stepping entirely once `max_stuck` is reached, until a reset.
    pub auto_pause_on_max: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_walkers: 1024,
            stick_radius: 3.0,
            step_len: 2.0,
            stick_prob: 1.0,
            spawn_margin: 40.0,
            kill_margin: 120.0,
            max_stuck: 20_000,
            frame_budget_ms: 6,
            seed: 1337,
            deterministic: true,
            auto_pause_on_max: true,
        }
    }
}
