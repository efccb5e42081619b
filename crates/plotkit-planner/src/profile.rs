//! Velocity profiles for a single segment
//!
//! Speed squared changes linearly with distance under constant acceleration,
//! so the acceleration and deceleration ramps are straight lines in
//! distance/speed² space. Where they meet before reaching cruise speed the
//! profile is triangular; otherwise it is a trapezoid with a cruise plateau.

/// A point on a profile: distance from the segment start and the speed there
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub distance: f64,
    pub speed: f64,
}

impl Breakpoint {
    pub fn new(distance: f64, speed: f64) -> Self {
        Self { distance, speed }
    }
}

/// Profile shape, mostly for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileShape {
    Trapezoid,
    Triangle,
}

/// Breakpoints from start to end of a segment, inclusive
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub shape: ProfileShape,
    pub breakpoints: Vec<Breakpoint>,
}

/// Build the profile for a segment of `length` mm
///
/// `entry` and `exit` must not exceed `max_speed`. Interior breakpoints within
/// `min_move` of either end or of the previous kept breakpoint are dropped.
pub fn velocity_profile(
    length: f64,
    entry: f64,
    exit: f64,
    max_speed: f64,
    acceleration: f64,
    min_move: f64,
) -> Profile {
    let accel_distance = (max_speed * max_speed - entry * entry) / (2.0 * acceleration);
    let decel_distance = (max_speed * max_speed - exit * exit) / (2.0 * acceleration);

    let (shape, interior) = if accel_distance + decel_distance <= length {
        (
            ProfileShape::Trapezoid,
            vec![
                Breakpoint::new(accel_distance, max_speed),
                Breakpoint::new(length - decel_distance, max_speed),
            ],
        )
    } else {
        let peak_distance = ((2.0 * acceleration * length + exit * exit - entry * entry)
            / (4.0 * acceleration))
            .clamp(0.0, length);
        let peak_speed = (entry * entry + 2.0 * acceleration * peak_distance).sqrt();
        (
            ProfileShape::Triangle,
            vec![Breakpoint::new(peak_distance, peak_speed.min(max_speed))],
        )
    };

    let mut breakpoints = vec![Breakpoint::new(0.0, entry)];
    for bp in interior {
        let previous = breakpoints.last().map_or(0.0, |b| b.distance);
        let clear_of_ends = bp.distance >= min_move && length - bp.distance >= min_move;
        if clear_of_ends && bp.distance - previous >= min_move {
            breakpoints.push(bp);
        }
    }
    breakpoints.push(Breakpoint::new(length, exit));

    Profile { shape, breakpoints }
}
