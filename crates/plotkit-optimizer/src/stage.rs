//! Optimizer stage trait and pipeline

use plotkit_core::{path_length, PathList, Point};
use std::sync::Arc;

/// A single `PathList -> PathList` transformation
///
/// Stages never fail on valid input. Paths that end up with fewer than two
/// points are dropped by the stage that produced them.
pub trait PathStage: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Transform the path list
    fn apply(&self, paths: PathList) -> PathList;
}

/// Arc-wrapped stage for sharing between pipelines
pub type StageHandle = Arc<dyn PathStage>;

/// Ordered list of optimizer stages
///
/// ```ignore
/// let mut pipeline = PathPipeline::new();
/// pipeline.register(Arc::new(MergeStage::new(0.1)));
/// pipeline.register(Arc::new(ReorderStage));
/// let optimized = pipeline.run(paths);
/// ```
#[derive(Default, Clone)]
pub struct PathPipeline {
    stages: Vec<StageHandle>,
}

impl PathPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage; stages run in registration order
    pub fn register(&mut self, stage: StageHandle) -> &mut Self {
        self.stages.push(stage);
        self
    }

    /// Names of the registered stages, in order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Number of registered stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check whether no stages are registered
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order
    pub fn run(&self, paths: PathList) -> PathList {
        self.stages.iter().fold(paths, |paths, stage| {
            let before = paths.len();
            let out = stage.apply(paths);
            tracing::debug!(
                "Stage '{}': {} -> {} paths, {:.1} mm drawn, {:.1} mm travel",
                stage.name(),
                before,
                out.len(),
                drawn_length(&out),
                travel_length(&out)
            );
            out
        })
    }
}

/// Total pen-down length of a path list
pub fn drawn_length(paths: &PathList) -> f64 {
    paths.iter().map(|p| path_length(p)).sum()
}

/// Total pen-up length starting and ending at the origin
pub fn travel_length(paths: &PathList) -> f64 {
    let mut pen = Point::default();
    let mut total = 0.0;
    for path in paths {
        if let (Some(first), Some(last)) = (path.first(), path.last()) {
            total += pen.distance(first);
            pen = *last;
        }
    }
    total + pen.distance(&Point::default())
}

/// Drop paths that cannot be drawn
pub(crate) fn retain_drawable(paths: &mut PathList) {
    paths.retain(|p| p.len() >= 2);
}
