//! EiBotBoard move encoding
//!
//! Converts a straight move between two points into `SM` or `LM` commands.
//! Step counts are taken as the difference of rounded absolute motor
//! positions, so rounding never accumulates over a long run of moves.

use crate::command::{Command, CommandKind};
use plotkit_core::{PlanningError, Point, StepperConfig};

/// `LM` rate units per step per second (rates are fractions of 2^31 per tick)
const LM_RATE_SCALE: f64 = 2_147_483_648.0;
/// `LM` interrupt rate in Hz
const LM_TICK_HZ: f64 = 25_000.0;

/// Encodes moves for one stepper configuration
#[derive(Debug, Clone)]
pub struct CommandEncoder {
    stepper: StepperConfig,
    steps_per_mm: f64,
}

impl CommandEncoder {
    pub fn new(stepper: &StepperConfig) -> Self {
        Self {
            stepper: stepper.clone(),
            steps_per_mm: stepper.effective_steps_per_mm(),
        }
    }

    /// Steps per millimeter at the configured step mode
    pub fn steps_per_mm(&self) -> f64 {
        self.steps_per_mm
    }

    /// Motor-space coordinates of a point, in millimeters
    fn motor_position(&self, p: &Point) -> (f64, f64) {
        let x = if self.stepper.invert_x { -p.x } else { p.x };
        let y = if self.stepper.invert_y { -p.y } else { p.y };
        if self.stepper.corexy {
            (x + y, x - y)
        } else {
            (x, y)
        }
    }

    /// Signed motor steps for a move from `from` to `to`
    pub fn axis_steps(&self, from: &Point, to: &Point) -> (i64, i64) {
        let (a0, b0) = self.motor_position(from);
        let (a1, b1) = self.motor_position(to);
        let spm = self.steps_per_mm;
        (
            (a1 * spm).round() as i64 - (a0 * spm).round() as i64,
            (b1 * spm).round() as i64 - (b0 * spm).round() as i64,
        )
    }

    /// Cartesian displacement produced by a pair of motor step counts
    pub fn decode_steps(&self, steps: (i64, i64)) -> Point {
        let a = steps.0 as f64 / self.steps_per_mm;
        let b = steps.1 as f64 / self.steps_per_mm;
        let (x, y) = if self.stepper.corexy {
            ((a + b) / 2.0, (a - b) / 2.0)
        } else {
            (a, b)
        };
        Point::new(
            if self.stepper.invert_x { -x } else { x },
            if self.stepper.invert_y { -y } else { y },
        )
    }

    /// Constant-velocity `SM` move at `speed` mm/s
    pub fn constant_move(
        &self,
        from: &Point,
        to: &Point,
        speed: f64,
    ) -> Result<Command, PlanningError> {
        if !(speed > 0.0) {
            return Err(PlanningError::ZeroSpeed { speed });
        }
        let distance = from.distance(to);
        let (s1, s2) = self.axis_steps(from, to);
        if s1 == 0 && s2 == 0 {
            return Err(PlanningError::ZeroStepMove { distance });
        }
        let duration_ms = ((distance / speed) * 1000.0).round().max(1.0) as u64;
        Ok(Command::new(
            format!("SM,{},{},{}", duration_ms, s1, s2),
            duration_ms,
            CommandKind::ConstantMove,
        ))
    }

    /// Accelerated `LM` move changing speed linearly from `entry` to `exit` mm/s
    pub fn accelerated_move(
        &self,
        from: &Point,
        to: &Point,
        entry: f64,
        exit: f64,
    ) -> Result<Command, PlanningError> {
        if entry <= 0.0 && exit <= 0.0 {
            return Err(PlanningError::StaticHold);
        }
        let distance = from.distance(to);
        let (s1, s2) = self.axis_steps(from, to);
        if s1 == 0 && s2 == 0 {
            return Err(PlanningError::ZeroStepMove { distance });
        }

        let entry = entry.max(0.0);
        let exit = exit.max(0.0);
        let seconds = 2.0 * distance / (entry + exit);
        let cycles = seconds * LM_TICK_HZ;

        // Each motor runs at a speed proportional to its share of the move.
        let axis = |steps: i64| -> (i64, i64) {
            if steps == 0 {
                return (0, 0);
            }
            let steps_per_unit = steps.unsigned_abs() as f64 / distance;
            let rate = |v: f64| v * steps_per_unit * LM_RATE_SCALE / LM_TICK_HZ;
            let initial = rate(entry);
            let accel = (rate(exit) - initial) / cycles;
            (initial.round() as i64, accel.round() as i64)
        };
        let (r1, a1) = axis(s1);
        let (r2, a2) = axis(s2);

        let duration_ms = (seconds * 1000.0).round() as u64;
        Ok(Command::new(
            format!("LM,{},{},{},{},{},{},3", r1, s1, a1, r2, s2, a2),
            duration_ms,
            CommandKind::AcceleratedMove,
        ))
    }
}
