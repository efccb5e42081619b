//! Motion segments, corner speeds and speed smoothing

use plotkit_core::{PlanningError, Point};

/// Threshold for treating a junction as straight or fully reversed
const JUNCTION_EPSILON: f64 = 1e-9;
/// Slack allowed when checking speed changes against the physical limit
pub const SPEED_DELTA_EPSILON: f64 = 1e-6;

/// One straight pen move between consecutive path points
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSegment {
    pub from: Point,
    pub to: Point,
    /// Speed at `from`, mm/s
    pub entry_speed: f64,
    /// Speed at `to`, mm/s
    pub exit_speed: f64,
    pub length: f64,
    /// Unit vector from `from` to `to`
    pub direction: Point,
    /// Largest speed change reachable over `length`
    pub max_speed_delta: f64,
}

impl MotionSegment {
    pub fn new(from: Point, to: Point, acceleration: f64) -> Self {
        let length = from.distance(&to);
        Self {
            from,
            to,
            entry_speed: 0.0,
            exit_speed: 0.0,
            length,
            direction: (to - from).normalize(),
            max_speed_delta: (2.0 * acceleration * length).sqrt(),
        }
    }

    /// Fail if the entry/exit speed change is not physically reachable
    pub fn check_speed_delta(&self) -> Result<(), PlanningError> {
        let delta = (self.entry_speed - self.exit_speed).abs();
        if delta > self.max_speed_delta + SPEED_DELTA_EPSILON {
            return Err(PlanningError::SpeedDeltaExceeded {
                entry: self.entry_speed,
                exit: self.exit_speed,
                max_delta: self.max_speed_delta,
                length: self.length,
            });
        }
        Ok(())
    }
}

/// Build segments for consecutive point pairs, dropping zero-length ones
pub fn build_segments(path: &[Point], acceleration: f64) -> Vec<MotionSegment> {
    path.windows(2)
        .filter_map(|pair| {
            if pair[0] == pair[1] {
                tracing::warn!("Dropping zero-length segment at {}", pair[0]);
                None
            } else {
                Some(MotionSegment::new(pair[0], pair[1], acceleration))
            }
        })
        .collect()
}

/// Junction speed between two unit directions
///
/// A straight continuation allows `max_speed`, a full reversal forces a stop,
/// anything between uses the junction deviation model.
pub fn corner_speed(
    incoming: &Point,
    outgoing: &Point,
    acceleration: f64,
    corner_factor: f64,
    max_speed: f64,
) -> f64 {
    let cosine = -incoming.dot(outgoing);
    let sine = ((1.0 - cosine) / 2.0).max(0.0).sqrt();
    if sine >= 1.0 - JUNCTION_EPSILON {
        return max_speed;
    }
    if sine <= JUNCTION_EPSILON {
        return 0.0;
    }
    let speed = (acceleration * corner_factor * sine / (1.0 - sine)).sqrt();
    speed.clamp(0.0, max_speed)
}

/// Assign tentative entry speeds from corner limits, then smooth
///
/// The path starts and ends at rest.
pub fn plan_speeds(
    segments: &mut [MotionSegment],
    acceleration: f64,
    corner_factor: f64,
    max_speed: f64,
) {
    if segments.is_empty() {
        return;
    }
    let mut speeds = vec![0.0; segments.len() + 1];
    for i in 1..segments.len() {
        speeds[i] = corner_speed(
            &segments[i - 1].direction,
            &segments[i].direction,
            acceleration,
            corner_factor,
            max_speed,
        );
    }
    let deltas: Vec<f64> = segments.iter().map(|s| s.max_speed_delta).collect();
    smooth_speeds(&mut speeds, &deltas);

    for (i, segment) in segments.iter_mut().enumerate() {
        segment.entry_speed = speeds[i];
        segment.exit_speed = speeds[i + 1];
    }
}

/// Lower junction speeds until every segment's speed change is reachable
///
/// `speeds[i]` and `speeds[i + 1]` bound segment `i`, whose limit is
/// `deltas[i]`. A forward pass lowers whichever end violates the limit; when
/// the earlier end is lowered the correction is walked backward until a
/// segment already satisfies its limit. Speeds only ever decrease, and the
/// first and last speeds are never raised.
pub fn smooth_speeds(speeds: &mut [f64], deltas: &[f64]) {
    debug_assert_eq!(speeds.len(), deltas.len() + 1);
    for i in 0..deltas.len() {
        if speeds[i + 1] > speeds[i] + deltas[i] {
            speeds[i + 1] = speeds[i] + deltas[i];
        } else if speeds[i] > speeds[i + 1] + deltas[i] {
            speeds[i] = speeds[i + 1] + deltas[i];
            let mut j = i;
            while j > 0 && speeds[j - 1] > speeds[j] + deltas[j - 1] {
                speeds[j - 1] = speeds[j] + deltas[j - 1];
                j -= 1;
            }
        }
    }
}
