//! Plot job execution
//!
//! Dispatches a [`Plan`] to the board one command at a time, awaiting each
//! acknowledgment before sending the next. Any failure ends the job: the pen
//! is raised and the motors released on a best-effort basis and the original
//! error is returned. Nothing is retried mid-job.

use crate::ebb::Ebb;
use plotkit_core::{ControllerEvent, ProtocolError};
use plotkit_planner::{Command, Plan};
use std::time::{Duration, Instant};

/// Summary of a finished job
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    /// Plan commands acknowledged by the board
    pub commands_sent: usize,
    pub elapsed: Duration,
}

/// Runs plans against one board
pub struct PlotJob<'a> {
    ebb: &'a Ebb,
    pacing: bool,
}

impl<'a> PlotJob<'a> {
    pub fn new(ebb: &'a Ebb) -> Self {
        Self { ebb, pacing: true }
    }

    /// Send commands back to back without waiting out their durations
    pub fn without_pacing(mut self) -> Self {
        self.pacing = false;
        self
    }

    pub async fn run(&self, plan: &Plan) -> Result<JobReport, ProtocolError> {
        let guard = self.ebb.controller().begin_job()?;
        let ebb = self.ebb.with_controller(guard.controller().clone());
        let started = Instant::now();
        tracing::info!(
            "Starting job: {} commands, estimated {:.1} s",
            plan.len(),
            plan.duration().as_secs_f64()
        );

        match self.dispatch(&ebb, plan).await {
            Ok(sent) => {
                let report = JobReport {
                    commands_sent: sent,
                    elapsed: started.elapsed(),
                };
                tracing::info!(
                    "Job finished: {} commands in {:.1} s",
                    report.commands_sent,
                    report.elapsed.as_secs_f64()
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Job failed: {}", e);
                ebb.controller()
                    .events()
                    .publish(ControllerEvent::Error(format!("Job failed: {}", e)));
                shutdown(&ebb).await;
                Err(e)
            }
        }
    }

    async fn dispatch(&self, ebb: &Ebb, plan: &Plan) -> Result<usize, ProtocolError> {
        let config = ebb.config();
        ebb.enable_motors(config.stepper.step_mode).await?;
        ebb.configure_servo().await?;
        self.send(ebb, &Command::pen_up(config.servo.duration_ms))
            .await?;

        let total = plan.len();
        for (i, command) in plan.commands.iter().enumerate() {
            self.send(ebb, command).await?;
            ebb.controller()
                .events()
                .publish(ControllerEvent::JobProgress { done: i + 1, total });
        }

        ebb.disable_motors().await?;
        Ok(total)
    }

    async fn send(&self, ebb: &Ebb, command: &Command) -> Result<(), ProtocolError> {
        if self.pacing {
            ebb.send(command).await
        } else {
            ebb.controller().command(&command.wire).await.map(|_| ())
        }
    }
}

/// Leave the machine safe after a failure
async fn shutdown(ebb: &Ebb) {
    if !ebb.controller().is_connected() {
        tracing::warn!("Board gone; cannot raise pen or release motors");
        return;
    }
    let pen_up = Command::pen_up(ebb.config().servo.duration_ms);
    if let Err(e) = ebb.controller().command(&pen_up.wire).await {
        tracing::warn!("Failed to raise pen after job failure: {}", e);
    }
    if let Err(e) = ebb.disable_motors().await {
        tracing::warn!("Failed to release motors after job failure: {}", e);
    }
}
