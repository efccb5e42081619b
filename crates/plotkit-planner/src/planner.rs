//! Motion planner
//!
//! Turns an ordered path list into board commands. Each path is drawn by
//! travelling to its start with the pen up, lowering the pen, running its
//! segments with smoothed speeds and raising the pen again.

use crate::command::Command;
use crate::encoder::CommandEncoder;
use crate::profile::velocity_profile;
use crate::segment::{build_segments, plan_speeds, MotionSegment};
use plotkit_core::{MachineConfig, PathList, PlanningError, Point};
use std::fmt;
use std::time::Duration;

/// Where the planner is within one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    Idle,
    TravelToStart,
    PenDown,
    Segment(usize),
    PenUp,
}

impl PlannerState {
    /// Check whether a transition to `target` is valid
    pub fn can_transition_to(&self, target: PlannerState) -> bool {
        use PlannerState::*;
        match (self, target) {
            (Idle, TravelToStart) => true,
            (TravelToStart, PenDown) => true,
            (PenDown, Segment(0)) => true,
            (Segment(i), Segment(j)) => j == i + 1,
            (Segment(_), PenUp) | (PenDown, PenUp) => true,
            (PenUp, Idle) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PlannerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::TravelToStart => write!(f, "TravelToStart"),
            Self::PenDown => write!(f, "PenDown"),
            Self::Segment(i) => write!(f, "Segment({})", i),
            Self::PenUp => write!(f, "PenUp"),
        }
    }
}

/// Commands for a whole drawing plus summary figures
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub commands: Vec<Command>,
    /// Millimeters drawn with the pen down
    pub pen_down_distance: f64,
    /// Millimeters travelled with the pen up
    pub travel_distance: f64,
}

impl Plan {
    /// Sum of command durations
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.commands.iter().map(|c| c.duration_ms).sum())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Kinematic limits for one kind of motion
#[derive(Debug, Clone, Copy)]
struct Limits {
    acceleration: f64,
    max_speed: f64,
}

/// Plans paths against one machine configuration
#[derive(Debug, Clone)]
pub struct MotionPlanner {
    config: MachineConfig,
    encoder: CommandEncoder,
}

impl MotionPlanner {
    /// Create a planner; fails if the configuration is unusable
    pub fn new(config: &MachineConfig) -> Result<Self, PlanningError> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            encoder: CommandEncoder::new(&config.stepper),
        })
    }

    pub fn encoder(&self) -> &CommandEncoder {
        &self.encoder
    }

    fn down_limits(&self) -> Limits {
        Limits {
            acceleration: self.config.planning.down_acceleration,
            max_speed: self.config.planning.down_max_speed,
        }
    }

    fn up_limits(&self) -> Limits {
        Limits {
            acceleration: self.config.planning.up_acceleration,
            max_speed: self.config.planning.up_max_speed,
        }
    }

    /// Plan every path in order, starting and optionally ending at the origin
    pub fn plan(&self, paths: &PathList) -> Result<Plan, PlanningError> {
        let mut builder = PlanBuilder {
            planner: self,
            plan: Plan::default(),
            pen: Point::default(),
            state: PlannerState::Idle,
        };
        for path in paths {
            builder.path(path)?;
        }
        if self.config.planning.return_home {
            builder.travel(Point::default())?;
        }

        let plan = builder.plan;
        tracing::debug!(
            "Planned {} commands: {:.1} mm drawn, {:.1} mm travel, {:.1} s",
            plan.len(),
            plan.pen_down_distance,
            plan.travel_distance,
            plan.duration().as_secs_f64()
        );
        Ok(plan)
    }

    /// Commands for one segment whose entry/exit speeds are already smoothed
    pub fn segment_commands(
        &self,
        segment: &MotionSegment,
        max_speed: f64,
        acceleration: f64,
    ) -> Result<Vec<Command>, PlanningError> {
        segment.check_speed_delta()?;

        if self.encoder.axis_steps(&segment.from, &segment.to) == (0, 0) {
            tracing::debug!(
                "Skipping {:.4} mm move below step resolution at {}",
                segment.length,
                segment.from
            );
            return Ok(Vec::new());
        }

        let min_move = self.config.planning.min_move_mm;
        if segment.length < 2.0 * min_move {
            let (entry, exit) = (segment.entry_speed, segment.exit_speed);
            let command = if entry <= 0.0 && exit <= 0.0 {
                self.encoder.constant_move(
                    &segment.from,
                    &segment.to,
                    self.config.planning.fallback_speed,
                )?
            } else {
                self.encoder
                    .accelerated_move(&segment.from, &segment.to, entry, exit)?
            };
            return Ok(vec![command]);
        }

        let profile = velocity_profile(
            segment.length,
            segment.entry_speed,
            segment.exit_speed,
            max_speed,
            acceleration,
            min_move,
        );
        let at = |distance: f64| segment.from.lerp(&segment.to, distance / segment.length);

        let mut commands = Vec::with_capacity(profile.breakpoints.len() - 1);
        for pair in profile.breakpoints.windows(2) {
            let (start, end) = (at(pair[0].distance), at(pair[1].distance));
            if self.encoder.axis_steps(&start, &end) == (0, 0) {
                continue;
            }
            commands.push(
                self.encoder
                    .accelerated_move(&start, &end, pair[0].speed, pair[1].speed)?,
            );
        }
        Ok(commands)
    }
}

struct PlanBuilder<'a> {
    planner: &'a MotionPlanner,
    plan: Plan,
    pen: Point,
    state: PlannerState,
}

impl PlanBuilder<'_> {
    fn enter(&mut self, next: PlannerState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid planner transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!("Planner {} -> {}", self.state, next);
        self.state = next;
    }

    /// Pen-up move to `target`, starting and ending at rest
    fn travel(&mut self, target: Point) -> Result<(), PlanningError> {
        if self.pen == target {
            return Ok(());
        }
        let limits = self.planner.up_limits();
        let segment = MotionSegment::new(self.pen, target, limits.acceleration);
        let commands =
            self.planner
                .segment_commands(&segment, limits.max_speed, limits.acceleration)?;
        self.plan.commands.extend(commands);
        self.plan.travel_distance += segment.length;
        self.pen = target;
        Ok(())
    }

    fn path(&mut self, path: &[Point]) -> Result<(), PlanningError> {
        let limits = self.planner.down_limits();
        let mut segments = build_segments(path, limits.acceleration);
        let Some(start) = segments.first().map(|s| s.from) else {
            tracing::warn!("Skipping path with no drawable segments");
            return Ok(());
        };
        plan_speeds(
            &mut segments,
            limits.acceleration,
            self.planner.config.planning.corner_factor,
            limits.max_speed,
        );

        let servo_ms = self.planner.config.servo.duration_ms;

        self.enter(PlannerState::TravelToStart);
        self.travel(start)?;

        self.enter(PlannerState::PenDown);
        self.plan.commands.push(Command::pen_down(servo_ms));

        for (i, segment) in segments.iter().enumerate() {
            self.enter(PlannerState::Segment(i));
            let commands =
                self.planner
                    .segment_commands(segment, limits.max_speed, limits.acceleration)?;
            self.plan.commands.extend(commands);
            self.plan.pen_down_distance += segment.length;
            self.pen = segment.to;
        }

        self.enter(PlannerState::PenUp);
        self.plan.commands.push(Command::pen_up(servo_ms));
        self.enter(PlannerState::Idle);
        Ok(())
    }
}
