//! Wire commands with duration estimates

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Commands running longer than this get the dispatch overhead subtracted
pub const DISPATCH_THRESHOLD_MS: u64 = 20;
/// Time spent on the serial round trip for one command
pub const DISPATCH_OVERHEAD_MS: u64 = 10;

/// Kind of board command, used for logging and pacing decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    /// `LM` accelerated move
    AcceleratedMove,
    /// `SM` constant-velocity move
    ConstantMove,
    /// `SP` pen up or down
    Pen,
    /// Anything else (`EM`, `SC`, `QC`, ...)
    Control,
}

/// A CR-less command string and its estimated execution time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub wire: String,
    pub duration_ms: u64,
    pub kind: CommandKind,
}

impl Command {
    pub fn new(wire: impl Into<String>, duration_ms: u64, kind: CommandKind) -> Self {
        Self {
            wire: wire.into(),
            duration_ms,
            kind,
        }
    }

    /// Control command with no motion time
    pub fn control(wire: impl Into<String>) -> Self {
        Self::new(wire, 0, CommandKind::Control)
    }

    /// Raise the pen and wait `duration_ms` for it to settle
    pub fn pen_up(duration_ms: u64) -> Self {
        Self::new(format!("SP,1,{}", duration_ms), duration_ms, CommandKind::Pen)
    }

    /// Lower the pen and wait `duration_ms` for it to settle
    pub fn pen_down(duration_ms: u64) -> Self {
        Self::new(format!("SP,0,{}", duration_ms), duration_ms, CommandKind::Pen)
    }

    /// How long to wait after the acknowledgment before sending the next command
    pub fn pacing(&self) -> Duration {
        let ms = if self.duration_ms > DISPATCH_THRESHOLD_MS {
            self.duration_ms - DISPATCH_OVERHEAD_MS
        } else {
            self.duration_ms
        };
        Duration::from_millis(ms)
    }

    pub fn is_motion(&self) -> bool {
        matches!(
            self.kind,
            CommandKind::AcceleratedMove | CommandKind::ConstantMove
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire)
    }
}
