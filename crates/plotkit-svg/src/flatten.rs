//! Adaptive curve flattening
//!
//! Cubic Béziers are split in half recursively until both control points lie
//! within `epsilon` of the chord or the recursion depth is exhausted. Control
//! points are transformed before subdivision so the tolerance applies in
//! output space.

use crate::path_data::Segment;
use lyon::geom::euclid::default::Transform2D;
use lyon::geom::CubicBezierSegment;
use plotkit_core::{Path, Point};

/// Flattening tolerance settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlattenOptions {
    /// Largest allowed distance between a curve and its chord
    pub epsilon: f64,
    /// Maximum subdivision depth per curve
    pub max_depth: u32,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            max_depth: 10,
        }
    }
}

fn apply(transform: &Transform2D<f64>, p: Point) -> Point {
    let q = transform.transform_point(lyon::geom::Point::new(p.x, p.y));
    Point::new(q.x, q.y)
}

/// Distance from `p` to the line through `a` and `b`
fn distance_to_line(p: Point, a: Point, b: Point) -> f64 {
    let chord = b - a;
    let len = chord.length();
    if len == 0.0 {
        return p.distance(&a);
    }
    ((p.x - a.x) * chord.y - (p.y - a.y) * chord.x).abs() / len
}

fn to_lyon(p: Point) -> lyon::geom::Point<f64> {
    lyon::geom::Point::new(p.x, p.y)
}

fn from_lyon(p: lyon::geom::Point<f64>) -> Point {
    Point::new(p.x, p.y)
}

fn subdivide(curve: &CubicBezierSegment<f64>, depth: u32, opts: &FlattenOptions, out: &mut Path) {
    let from = from_lyon(curve.from);
    let to = from_lyon(curve.to);
    let deviation = distance_to_line(from_lyon(curve.ctrl1), from, to)
        .max(distance_to_line(from_lyon(curve.ctrl2), from, to));

    if deviation <= opts.epsilon || depth >= opts.max_depth {
        out.push(to);
        return;
    }

    let (left, right) = curve.split(0.5);
    subdivide(&left, depth + 1, opts, out);
    subdivide(&right, depth + 1, opts, out);
}

/// Flatten canonical segments into polylines, one per subpath
///
/// Subpaths with fewer than two points are discarded. `ClosePath` appends the
/// subpath start so closed shapes end where they began.
pub fn flatten_segments(
    segments: &[Segment],
    transform: &Transform2D<f64>,
    opts: &FlattenOptions,
) -> Vec<Path> {
    let mut paths = Vec::new();
    let mut current: Path = Vec::new();
    let mut start = Point::default();
    let mut pen = Point::default();

    let finish = |current: &mut Path, paths: &mut Vec<Path>| {
        if current.len() >= 2 {
            paths.push(std::mem::take(current));
        } else {
            current.clear();
        }
    };

    for segment in segments {
        match *segment {
            Segment::MoveTo(p) => {
                finish(&mut current, &mut paths);
                pen = p;
                start = p;
                current.push(apply(transform, p));
            }
            Segment::LineTo(p) => {
                if current.is_empty() {
                    current.push(apply(transform, pen));
                }
                current.push(apply(transform, p));
                pen = p;
            }
            Segment::CubicTo { ctrl1, ctrl2, to } => {
                if current.is_empty() {
                    current.push(apply(transform, pen));
                }
                let curve = CubicBezierSegment {
                    from: to_lyon(apply(transform, pen)),
                    ctrl1: to_lyon(apply(transform, ctrl1)),
                    ctrl2: to_lyon(apply(transform, ctrl2)),
                    to: to_lyon(apply(transform, to)),
                };
                subdivide(&curve, 0, opts, &mut current);
                pen = to;
            }
            Segment::ClosePath => {
                if !current.is_empty() {
                    current.push(apply(transform, start));
                }
                finish(&mut current, &mut paths);
                pen = start;
            }
        }
    }
    finish(&mut current, &mut paths);
    paths
}
