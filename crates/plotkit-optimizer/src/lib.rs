//! # PlotKit Optimizer
//!
//! Reshapes a path list before motion planning. Stages run in a configured
//! order, each taking and returning the whole list:
//!
//! 1. **rotate/scale** - place the drawing on the paper
//! 2. **merge** - drop points closer than the merge distance
//! 3. **elide** - drop paths too short to draw
//! 4. **randomize_start** - move closed-loop seams to random vertices
//! 5. **reorder** - greedy nearest-neighbour ordering to cut pen-up travel

pub mod elide;
pub mod kdtree;
pub mod layout;
pub mod merge;
pub mod options;
pub mod randomize;
pub mod reorder;
pub mod stage;

pub use elide::ElideStage;
pub use kdtree::KdTree;
pub use layout::{Alignment, Layout, Margins, Placement, RotateStage, Rotation, ScaleStage};
pub use merge::{merge_path, MergeStage};
pub use options::OptimizationOptions;
pub use randomize::{rotate_loop, RandomizeStartStage};
pub use reorder::{reorder_paths, ReorderStage};
pub use stage::{drawn_length, travel_length, PathPipeline, PathStage, StageHandle};
