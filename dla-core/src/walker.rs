use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

/// Fraction of the spawn radius where the respawn window starts.
pub const SPAWN_WINDOW_MIN: f32 = 0.5;
/// Fraction of the spawn radius where the respawn window ends.
pub const SPAWN_WINDOW_MAX: f32 = 1.5;

/// A particle performing an independent random walk.
///
/// Walkers carry no identity across respawns; only the pool size matters.
#[derive(Clone, Copy, Debug, Default)]
pub struct Walker {
    pub pos: Vec2,
    pub prev_pos: Vec2,
    pub active: bool,
}

/// Fixed-size collection of walkers plus the round-robin cursor the driver
/// resumes from between frames.
#[derive(Debug, Default)]
pub struct WalkerPool {
    walkers: Vec<Walker>,
    cursor: usize,
}

/// Places `w` on the spawn ring around the origin.
///
/// The angle is uniform; the radius is drawn over
/// `[SPAWN_WINDOW_MIN, SPAWN_WINDOW_MAX] * spawn_radius` with a squared
/// bias toward the outer edge, then clamped to `kill_radius` so a fresh
/// walker never starts past the escape boundary. The previous position is
/// set equal to the new position, marking a walk with no step history.
pub fn respawn(w: &mut Walker, rng: &mut impl Rng, spawn_radius: f32, kill_radius: f32) {
    w.active = true;

    let angle = rng.random::<f32>() * TAU;

    // Squaring pushes the draw toward the outer edge of the window.
    let t = rng.random::<f32>();
    let bias = t * t;

    let min_r = spawn_radius * SPAWN_WINDOW_MIN;
    let max_r = spawn_radius * SPAWN_WINDOW_MAX;
    let r = (min_r + bias * (max_r - min_r)).min(kill_radius);

    w.pos = Vec2::new(r * angle.cos(), r * angle.sin());
    w.prev_pos = w.pos;
}

impl WalkerPool {
    pub fn len(&self) -> usize {
        self.walkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walkers.is_empty()
    }

    pub fn walkers(&self) -> &[Walker] {
        &self.walkers
    }

    pub fn walker_mut(&mut self, i: usize) -> &mut Walker {
        &mut self.walkers[i]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, i: usize) {
        self.cursor = i;
    }

    pub fn clear(&mut self) {
        self.walkers.clear();
        self.cursor = 0;
    }

    /// Grows the pool by respawning fresh walkers, or shrinks it by
    /// truncating from the end. After a shrink the cursor is re-anchored
    /// modulo the new size so it always stays within `[0, n)`.
    pub fn ensure_count(
        &mut self,
        n: usize,
        rng: &mut impl Rng,
        spawn_radius: f32,
        kill_radius: f32,
    ) {
        if self.walkers.len() < n {
            self.walkers.reserve(n - self.walkers.len());
            while self.walkers.len() < n {
                let mut w = Walker::default();
                respawn(&mut w, rng, spawn_radius, kill_radius);
                self.walkers.push(w);
            }
        } else if self.walkers.len() > n {
            self.walkers.truncate(n);
            if self.walkers.is_empty() {
                self.cursor = 0;
            } else {
                self.cursor %= self.walkers.len();
            }
        }
    }
}
