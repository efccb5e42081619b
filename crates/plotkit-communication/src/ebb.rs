//! EiBotBoard control plane
//!
//! Discrete machine actions on top of [`EbbController`]: power query, motor
//! enable/disable, servo setup, pen moves, jogging, reboot and emergency stop.
//! Motors are never enabled without a supply reading above the configured
//! minimum.

use crate::controller::EbbController;
use plotkit_core::{MachineConfig, Point, ProtocolError, Result};
use plotkit_planner::{Command, CommandEncoder};
use std::fmt;

/// ADC reference voltage on the board
const ADC_REFERENCE_VOLTS: f64 = 3.3;
/// Full-scale ADC reading
const ADC_FULL_SCALE: f64 = 1023.0;
/// Divider between the motor supply and the ADC pin
const SUPPLY_DIVIDER: f64 = 11.0;

/// Servo configuration parameters for `SC`
const SC_PEN_UP_POSITION: u8 = 4;
const SC_PEN_DOWN_POSITION: u8 = 5;
const SC_SERVO_RATE: u8 = 10;

/// Parsed `QC` reply
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerReading {
    /// Raw motor current ADC value
    pub current_raw: u16,
    /// Raw supply voltage ADC value
    pub voltage_raw: u16,
}

impl PowerReading {
    /// Parse a `<current>,<voltage>` line
    pub fn parse(line: &str) -> Option<Self> {
        let (current, voltage) = line.trim().split_once(',')?;
        Some(Self {
            current_raw: current.trim().parse().ok()?,
            voltage_raw: voltage.trim().parse().ok()?,
        })
    }

    /// Motor supply voltage in volts
    pub fn voltage(&self) -> f64 {
        f64::from(self.voltage_raw) / ADC_FULL_SCALE * ADC_REFERENCE_VOLTS * SUPPLY_DIVIDER
    }
}

impl fmt::Display for PowerReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}V (raw {}, current {})",
            self.voltage(),
            self.voltage_raw,
            self.current_raw
        )
    }
}

/// Board actions for one machine configuration
#[derive(Clone)]
pub struct Ebb {
    controller: EbbController,
    config: MachineConfig,
    encoder: CommandEncoder,
}

impl Ebb {
    pub fn new(controller: EbbController, config: &MachineConfig) -> Self {
        Self {
            controller,
            config: config.clone(),
            encoder: CommandEncoder::new(&config.stepper),
        }
    }

    /// Same board actions issued through `controller`
    pub fn with_controller(&self, controller: EbbController) -> Self {
        Self {
            controller,
            config: self.config.clone(),
            encoder: self.encoder.clone(),
        }
    }

    pub fn controller(&self) -> &EbbController {
        &self.controller
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Read motor current and supply voltage with `QC`
    pub async fn query_voltage(&self) -> std::result::Result<PowerReading, ProtocolError> {
        let lines = self.controller.command("QC").await?;
        lines
            .iter()
            .find_map(|l| PowerReading::parse(l))
            .ok_or_else(|| ProtocolError::InvalidResponse {
                command: "QC".to_string(),
                reply: lines.join(" | "),
            })
    }

    /// Enable both motors at `step_mode` after checking the supply
    pub async fn enable_motors(&self, step_mode: u8) -> std::result::Result<(), ProtocolError> {
        let command = format!("EM,{},{}", step_mode, step_mode);
        if !(1..=5).contains(&step_mode) {
            return Err(ProtocolError::Rejected {
                command,
                reply: "step mode must be between 1 and 5".to_string(),
            });
        }

        let reading = self.query_voltage().await?;
        let minimum = self.config.power.min_voltage;
        if reading.voltage() < minimum {
            tracing::error!("Refusing to enable motors: supply at {}", reading);
            return Err(ProtocolError::LowPower {
                voltage: reading.voltage(),
                minimum,
            });
        }
        tracing::debug!("Supply at {}", reading);

        self.controller.command(&command).await?;
        Ok(())
    }

    /// Release both motors
    pub async fn disable_motors(&self) -> std::result::Result<(), ProtocolError> {
        self.controller.command("EM,0,0").await.map(|_| ())
    }

    /// Send pen positions and slew rate from the servo configuration
    pub async fn configure_servo(&self) -> std::result::Result<(), ProtocolError> {
        let servo = &self.config.servo;
        self.set_servo(SC_PEN_UP_POSITION, servo.up_position()).await?;
        self.set_servo(SC_PEN_DOWN_POSITION, servo.down_position()).await?;
        self.set_servo(SC_SERVO_RATE, servo.rate).await
    }

    async fn set_servo(&self, param: u8, value: u32) -> std::result::Result<(), ProtocolError> {
        self.controller
            .command(&format!("SC,{},{}", param, value))
            .await
            .map(|_| ())
    }

    /// Send one planned command and wait out its pacing
    pub async fn send(&self, command: &Command) -> std::result::Result<(), ProtocolError> {
        self.controller.command(&command.wire).await?;
        tokio::time::sleep(command.pacing()).await;
        Ok(())
    }

    pub async fn pen_up(&self) -> std::result::Result<(), ProtocolError> {
        self.send(&Command::pen_up(self.config.servo.duration_ms)).await
    }

    pub async fn pen_down(&self) -> std::result::Result<(), ProtocolError> {
        self.send(&Command::pen_down(self.config.servo.duration_ms))
            .await
    }

    /// Raise the pen to `percent` of the servo range
    pub async fn pen_up_at(&self, percent: f64) -> std::result::Result<(), ProtocolError> {
        let position = self.config.servo.position(percent);
        self.set_servo(SC_PEN_UP_POSITION, position).await?;
        self.pen_up().await
    }

    /// Lower the pen to `percent` of the servo range
    pub async fn pen_down_at(&self, percent: f64) -> std::result::Result<(), ProtocolError> {
        let position = self.config.servo.position(percent);
        self.set_servo(SC_PEN_DOWN_POSITION, position).await?;
        self.pen_down().await
    }

    /// Move by (`dx`, `dy`) mm at a constant `speed` mm/s
    pub async fn jog(&self, dx: f64, dy: f64, speed: f64) -> Result<()> {
        let command = self
            .encoder
            .constant_move(&Point::default(), &Point::new(dx, dy), speed)?;
        self.send(&command).await?;
        Ok(())
    }

    /// Reboot the board; the port goes away so the connection is closed
    pub async fn reboot(&self) -> std::result::Result<(), ProtocolError> {
        tracing::info!("Rebooting board");
        self.controller.write_line("RB").await?;
        self.controller.disconnect().await
    }

    /// Abort queued motion and release the motors
    pub async fn emergency_stop(&self) -> std::result::Result<(), ProtocolError> {
        tracing::warn!("Emergency stop");
        self.controller.command("ES").await.map(|_| ())
    }

    /// Firmware version string
    pub async fn query_version(&self) -> std::result::Result<String, ProtocolError> {
        self.controller.query_line("V").await
    }
}
