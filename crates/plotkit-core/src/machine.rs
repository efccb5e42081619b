//! Machine configuration
//!
//! A single immutable [`MachineConfig`] is built once per plot job and passed by
//! reference to the planner, the encoder and the board control plane.

use crate::error::PlanningError;
use serde::{Deserialize, Serialize};

/// Stepper driver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepperConfig {
    /// Motor steps per millimeter at step mode 1 (16x microstepping)
    pub steps_per_mm: f64,
    /// Board microstep mode, 1 (16x) through 5 (full step)
    pub step_mode: u8,
    /// Invert the first motor axis
    pub invert_x: bool,
    /// Invert the second motor axis
    pub invert_y: bool,
    /// Mix axes for CoreXY / H-bot kinematics
    pub corexy: bool,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            steps_per_mm: 80.0,
            step_mode: 1,
            invert_x: false,
            invert_y: false,
            corexy: true,
        }
    }
}

impl StepperConfig {
    /// Steps per millimeter at the configured step mode
    pub fn effective_steps_per_mm(&self) -> f64 {
        let divisor = 1u32 << self.step_mode.saturating_sub(1).min(4);
        self.steps_per_mm / f64::from(divisor)
    }
}

/// Pen servo settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    /// Servo position at 0%, in board position units
    pub min: u32,
    /// Servo position at 100%, in board position units
    pub max: u32,
    /// Pen-up height in percent
    pub up_percent: f64,
    /// Pen-down height in percent
    pub down_percent: f64,
    /// Servo slew rate in board rate units
    pub rate: u32,
    /// Time allowed for the pen to settle, in milliseconds
    pub duration_ms: u64,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            min: 7500,
            max: 28000,
            up_percent: 50.0,
            down_percent: 0.0,
            rate: 0,
            duration_ms: 200,
        }
    }
}

impl ServoConfig {
    /// Board position units for a height percentage
    pub fn position(&self, percent: f64) -> u32 {
        let span = f64::from(self.max) - f64::from(self.min);
        let pos = f64::from(self.min) + span * percent.clamp(0.0, 100.0) / 100.0;
        pos.round() as u32
    }

    /// Position used for pen up
    pub fn up_position(&self) -> u32 {
        self.position(self.up_percent)
    }

    /// Position used for pen down
    pub fn down_position(&self) -> u32 {
        self.position(self.down_percent)
    }
}

/// Kinematic limits used by the motion planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// Pen-down acceleration in mm/s²
    pub down_acceleration: f64,
    /// Pen-down cruise speed in mm/s
    pub down_max_speed: f64,
    /// Pen-up acceleration in mm/s²
    pub up_acceleration: f64,
    /// Pen-up cruise speed in mm/s
    pub up_max_speed: f64,
    /// Junction deviation factor for corner speed limiting
    pub corner_factor: f64,
    /// Smallest move the board can act on, in mm
    pub min_move_mm: f64,
    /// Speed used for direct moves that would otherwise start and end at rest
    pub fallback_speed: f64,
    /// Travel back to the origin after the last path
    pub return_home: bool,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            down_acceleration: 200.0,
            down_max_speed: 50.0,
            up_acceleration: 400.0,
            up_max_speed: 200.0,
            corner_factor: 0.127,
            min_move_mm: 0.1,
            fallback_speed: 5.0,
            return_home: true,
        }
    }
}

/// Supply monitoring limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Motors are never enabled below this supply voltage
    pub min_voltage: f64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self { min_voltage: 8.5 }
    }
}

/// Complete machine description for one plot job
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Stepper settings
    pub stepper: StepperConfig,
    /// Servo settings
    pub servo: ServoConfig,
    /// Planner limits
    pub planning: PlanningConfig,
    /// Power limits
    pub power: PowerConfig,
}

impl MachineConfig {
    /// Reject configurations the planner cannot work with
    pub fn validate(&self) -> Result<(), PlanningError> {
        let invalid = |reason: &str| {
            Err(PlanningError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if self.stepper.steps_per_mm <= 0.0 {
            return invalid("steps per mm must be > 0");
        }
        if !(1..=5).contains(&self.stepper.step_mode) {
            return invalid("step mode must be between 1 and 5");
        }
        if self.servo.max < self.servo.min {
            return invalid("servo max must not be below servo min");
        }
        let p = &self.planning;
        if p.down_acceleration <= 0.0 || p.up_acceleration <= 0.0 {
            return invalid("acceleration must be > 0");
        }
        if p.down_max_speed <= 0.0 || p.up_max_speed <= 0.0 {
            return invalid("max speed must be > 0");
        }
        if p.corner_factor < 0.0 {
            return invalid("corner factor must not be negative");
        }
        if p.min_move_mm < 0.0 {
            return invalid("minimum move must not be negative");
        }
        if p.fallback_speed <= 0.0 {
            return invalid("fallback speed must be > 0");
        }
        Ok(())
    }
}
