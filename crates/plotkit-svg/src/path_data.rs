//! SVG path data normalization
//!
//! Reduces the full path command set to the canonical `{M, L, C, Z}` set:
//! - relative commands are made absolute
//! - `H`/`V` become `L`
//! - `S` and `T` shorthand is expanded using the reflected control point
//! - quadratic curves become cubics (2/3 control-point interpolation)
//! - elliptical arcs become cubic Béziers

use lyon::geom::{Angle, ArcFlags, CubicBezierSegment, SvgArc, Vector};
use plotkit_core::Point;
use svgtypes::{PathParser, PathSegment};

/// A canonical path command in absolute coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    /// Start a new subpath
    MoveTo(Point),
    /// Straight line from the current point
    LineTo(Point),
    /// Cubic Bézier from the current point
    CubicTo {
        /// First control point
        ctrl1: Point,
        /// Second control point
        ctrl2: Point,
        /// End point
        to: Point,
    },
    /// Close the current subpath
    ClosePath,
}

/// Previous command, needed for smooth-curve reflection
#[derive(Clone, Copy)]
enum Previous {
    Other,
    Cubic(Point),
    Quadratic(Point),
}

/// Incremental normalizer over raw path segments
struct Normalizer {
    out: Vec<Segment>,
    current: Point,
    start: Point,
    previous: Previous,
}

impl Normalizer {
    fn new() -> Self {
        Self {
            out: Vec::new(),
            current: Point::default(),
            start: Point::default(),
            previous: Previous::Other,
        }
    }

    fn resolve(&self, abs: bool, x: f64, y: f64) -> Point {
        if abs {
            Point::new(x, y)
        } else {
            Point::new(self.current.x + x, self.current.y + y)
        }
    }

    fn reflect(&self, ctrl: Point) -> Point {
        self.current * 2.0 - ctrl
    }

    fn line_to(&mut self, to: Point) {
        self.out.push(Segment::LineTo(to));
        self.current = to;
        self.previous = Previous::Other;
    }

    fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        self.out.push(Segment::CubicTo { ctrl1, ctrl2, to });
        self.current = to;
        self.previous = Previous::Cubic(ctrl2);
    }

    fn quadratic_to(&mut self, ctrl: Point, to: Point) {
        let from = self.current;
        let ctrl1 = from + (ctrl - from) * (2.0 / 3.0);
        let ctrl2 = to + (ctrl - to) * (2.0 / 3.0);
        self.out.push(Segment::CubicTo { ctrl1, ctrl2, to });
        self.current = to;
        self.previous = Previous::Quadratic(ctrl);
    }

    fn arc_to(&mut self, rx: f64, ry: f64, rotation: f64, large_arc: bool, sweep: bool, to: Point) {
        let from = self.current;
        if from == to {
            self.previous = Previous::Other;
            return;
        }
        if rx == 0.0 || ry == 0.0 {
            self.line_to(to);
            return;
        }

        let arc = SvgArc {
            from: lyon::geom::Point::new(from.x, from.y),
            to: lyon::geom::Point::new(to.x, to.y),
            radii: Vector::new(rx.abs(), ry.abs()),
            x_rotation: Angle::degrees(rotation),
            flags: ArcFlags { large_arc, sweep },
        };

        let mut curves = Vec::new();
        arc.for_each_cubic_bezier(&mut |c: &CubicBezierSegment<f64>| curves.push(*c));
        if curves.is_empty() {
            self.line_to(to);
            return;
        }
        for c in curves {
            self.out.push(Segment::CubicTo {
                ctrl1: Point::new(c.ctrl1.x, c.ctrl1.y),
                ctrl2: Point::new(c.ctrl2.x, c.ctrl2.y),
                to: Point::new(c.to.x, c.to.y),
            });
        }
        // Land exactly on the requested end point.
        if let Some(Segment::CubicTo { to: last, .. }) = self.out.last_mut() {
            *last = to;
        }
        self.current = to;
        self.previous = Previous::Other;
    }

    fn push(&mut self, segment: PathSegment) {
        match segment {
            PathSegment::MoveTo { abs, x, y } => {
                let p = self.resolve(abs, x, y);
                self.out.push(Segment::MoveTo(p));
                self.current = p;
                self.start = p;
                self.previous = Previous::Other;
            }
            PathSegment::LineTo { abs, x, y } => {
                let p = self.resolve(abs, x, y);
                self.line_to(p);
            }
            PathSegment::HorizontalLineTo { abs, x } => {
                let x = if abs { x } else { self.current.x + x };
                self.line_to(Point::new(x, self.current.y));
            }
            PathSegment::VerticalLineTo { abs, y } => {
                let y = if abs { y } else { self.current.y + y };
                self.line_to(Point::new(self.current.x, y));
            }
            PathSegment::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let c1 = self.resolve(abs, x1, y1);
                let c2 = self.resolve(abs, x2, y2);
                let to = self.resolve(abs, x, y);
                self.cubic_to(c1, c2, to);
            }
            PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                let c1 = match self.previous {
                    Previous::Cubic(ctrl) => self.reflect(ctrl),
                    _ => self.current,
                };
                let c2 = self.resolve(abs, x2, y2);
                let to = self.resolve(abs, x, y);
                self.cubic_to(c1, c2, to);
            }
            PathSegment::Quadratic { abs, x1, y1, x, y } => {
                let ctrl = self.resolve(abs, x1, y1);
                let to = self.resolve(abs, x, y);
                self.quadratic_to(ctrl, to);
            }
            PathSegment::SmoothQuadratic { abs, x, y } => {
                let ctrl = match self.previous {
                    Previous::Quadratic(ctrl) => self.reflect(ctrl),
                    _ => self.current,
                };
                let to = self.resolve(abs, x, y);
                self.quadratic_to(ctrl, to);
            }
            PathSegment::EllipticalArc {
                abs,
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => {
                let to = self.resolve(abs, x, y);
                self.arc_to(rx, ry, x_axis_rotation, large_arc, sweep, to);
            }
            PathSegment::ClosePath { .. } => {
                self.out.push(Segment::ClosePath);
                self.current = self.start;
                self.previous = Previous::Other;
            }
        }
    }
}

/// Parse and normalize an SVG `d` attribute
///
/// Malformed data is handled the way renderers do: everything up to the first
/// error is kept and the rest is discarded with a warning.
pub fn parse_path_data(d: &str) -> Vec<Segment> {
    let mut normalizer = Normalizer::new();
    for segment in PathParser::from(d) {
        match segment {
            Ok(segment) => normalizer.push(segment),
            Err(e) => {
                tracing::warn!("Truncating malformed path data: {}", e);
                break;
            }
        }
    }
    normalizer.out
}
