//! # PlotKit Planner
//!
//! Motion planning for pen plotters driven by an EiBotBoard.
//!
//! Paths become [`MotionSegment`]s with junction speeds limited by corner
//! geometry, smoothed so every speed change is reachable under the configured
//! acceleration, then split into trapezoidal or triangular profiles and
//! encoded as `LM`/`SM` commands.

pub mod command;
pub mod encoder;
pub mod planner;
pub mod profile;
pub mod segment;

pub use command::{Command, CommandKind, DISPATCH_OVERHEAD_MS, DISPATCH_THRESHOLD_MS};
pub use encoder::CommandEncoder;
pub use planner::{MotionPlanner, Plan, PlannerState};
pub use profile::{velocity_profile, Breakpoint, Profile, ProfileShape};
pub use segment::{build_segments, corner_speed, plan_speeds, smooth_speeds, MotionSegment};
