//! Short path removal

use crate::stage::PathStage;
use plotkit_core::{path_length, PathList};

/// Drops paths whose total length does not exceed `min_length` millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElideStage {
    pub min_length: f64,
}

impl ElideStage {
    pub fn new(min_length: f64) -> Self {
        Self { min_length }
    }
}

impl PathStage for ElideStage {
    fn name(&self) -> &str {
        "elide"
    }

    fn apply(&self, paths: PathList) -> PathList {
        let before = paths.len();
        let kept: PathList = paths
            .into_iter()
            .filter(|p| p.len() >= 2 && path_length(p) > self.min_length)
            .collect();
        if kept.len() < before {
            tracing::debug!(
                "Elided {} paths shorter than {} mm",
                before - kept.len(),
                self.min_length
            );
        }
        kept
    }
}
