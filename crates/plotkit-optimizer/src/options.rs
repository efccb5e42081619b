//! Optimization options and pipeline construction

use crate::elide::ElideStage;
use crate::layout::Placement;
use crate::merge::MergeStage;
use crate::randomize::RandomizeStartStage;
use crate::reorder::ReorderStage;
use crate::stage::PathPipeline;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which optimizer stages run, and their parameters
///
/// Distances are in millimeters on the paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationOptions {
    /// Curve flattening tolerance
    pub flatten_epsilon: f64,
    /// Maximum curve subdivision depth
    pub flatten_max_depth: u32,
    pub merge: bool,
    /// Minimum spacing between consecutive points
    pub merge_distance: f64,
    pub elide: bool,
    /// Paths not longer than this are dropped
    pub min_path_length: f64,
    pub reorder: bool,
    pub randomize_start: bool,
    /// Endpoint distance under which a path counts as a closed loop
    pub loop_tolerance: f64,
    /// Fixed seed for start randomization
    pub seed: Option<u64>,
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self {
            flatten_epsilon: 0.1,
            flatten_max_depth: 10,
            merge: true,
            merge_distance: 0.5,
            elide: true,
            min_path_length: 0.2,
            reorder: true,
            randomize_start: false,
            loop_tolerance: 0.01,
            seed: None,
        }
    }
}

impl OptimizationOptions {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<(), String> {
        if !(self.flatten_epsilon > 0.0) {
            return Err(format!(
                "Flatten tolerance must be positive, got {}",
                self.flatten_epsilon
            ));
        }
        for (name, value) in [
            ("Merge distance", self.merge_distance),
            ("Minimum path length", self.min_path_length),
            ("Loop tolerance", self.loop_tolerance),
        ] {
            if !(value >= 0.0) {
                return Err(format!("{} must not be negative, got {}", name, value));
            }
        }
        Ok(())
    }

    /// Build the stage list: placement, merge, elide, randomize-start, reorder
    pub fn pipeline(&self, placement: Option<&Placement>) -> PathPipeline {
        let mut pipeline = PathPipeline::new();
        if let Some(placement) = placement {
            for stage in placement.stages() {
                pipeline.register(stage);
            }
        }
        if self.merge {
            pipeline.register(Arc::new(MergeStage::new(self.merge_distance)));
        }
        if self.elide {
            pipeline.register(Arc::new(ElideStage::new(self.min_path_length)));
        }
        if self.randomize_start {
            let stage = match self.seed {
                Some(seed) => RandomizeStartStage::seeded(self.loop_tolerance, seed),
                None => RandomizeStartStage::new(self.loop_tolerance),
            };
            pipeline.register(Arc::new(stage));
        }
        if self.reorder {
            pipeline.register(Arc::new(ReorderStage));
        }
        pipeline
    }
}
