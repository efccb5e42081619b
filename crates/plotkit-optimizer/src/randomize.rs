//! Random start points for closed loops
//!
//! Rotating where a loop starts spreads the pen-down blot of closed shapes
//! around the drawing.

use crate::stage::PathStage;
use parking_lot::Mutex;
use plotkit_core::{Path, PathList, Point};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Rotate a closed loop to begin at vertex `start` of its open form
///
/// The loop is opened by dropping its closing point, rotated, then closed at
/// the new start.
pub fn rotate_loop(path: &[Point], start: usize) -> Path {
    let open = &path[..path.len().saturating_sub(1)];
    if open.is_empty() {
        return path.to_vec();
    }
    let start = start % open.len();
    let mut rotated: Path = open[start..].iter().chain(&open[..start]).copied().collect();
    rotated.push(open[start]);
    rotated
}

/// Randomize-start stage
///
/// Only paths whose ends lie within `tolerance` of each other are touched.
pub struct RandomizeStartStage {
    tolerance: f64,
    rng: Mutex<StdRng>,
}

impl RandomizeStartStage {
    /// Stage seeded from the operating system
    pub fn new(tolerance: f64) -> Self {
        Self::with_rng(tolerance, StdRng::from_entropy())
    }

    /// Stage with a fixed seed, for reproducible output
    pub fn seeded(tolerance: f64, seed: u64) -> Self {
        Self::with_rng(tolerance, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(tolerance: f64, rng: StdRng) -> Self {
        Self {
            tolerance,
            rng: Mutex::new(rng),
        }
    }

    fn is_closed(&self, path: &Path) -> bool {
        match (path.first(), path.last()) {
            (Some(first), Some(last)) => path.len() > 2 && first.distance(last) < self.tolerance,
            _ => false,
        }
    }
}

impl PathStage for RandomizeStartStage {
    fn name(&self) -> &str {
        "randomize_start"
    }

    fn apply(&self, paths: PathList) -> PathList {
        let mut rng = self.rng.lock();
        paths
            .into_iter()
            .map(|path| {
                if self.is_closed(&path) {
                    let start = rng.gen_range(0..path.len() - 1);
                    rotate_loop(&path, start)
                } else {
                    path
                }
            })
            .collect()
    }
}
