//! Basic shape conversion
//!
//! Converts `rect`, `circle`, `ellipse`, `line`, `polygon` and `polyline`
//! elements into the canonical segment set used for `path` data.

use crate::path_data::{parse_path_data, Segment};
use plotkit_core::Point;
use roxmltree::Node;
use std::str::FromStr;
use svgtypes::{Length, PointsParser};

/// Cubic control distance for a quarter ellipse
const KAPPA: f64 = 0.552_284_749_830_793_6;

/// Shape elements understood by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Path,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polygon,
    Polyline,
}

impl ShapeKind {
    /// Map a tag name to a shape, `None` for anything else
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "path" => Some(Self::Path),
            "rect" => Some(Self::Rect),
            "circle" => Some(Self::Circle),
            "ellipse" => Some(Self::Ellipse),
            "line" => Some(Self::Line),
            "polygon" => Some(Self::Polygon),
            "polyline" => Some(Self::Polyline),
            _ => None,
        }
    }
}

/// Numeric attribute in user units; unit suffixes are ignored
fn number_attr(node: &Node, name: &str) -> Option<f64> {
    node.attribute(name)
        .and_then(|v| Length::from_str(v.trim()).ok())
        .map(|l| l.number)
}

fn attr_or_zero(node: &Node, name: &str) -> f64 {
    number_attr(node, name).unwrap_or(0.0)
}

/// Convert a shape element into canonical segments
pub fn shape_segments(kind: ShapeKind, node: &Node) -> Vec<Segment> {
    match kind {
        ShapeKind::Path => node.attribute("d").map(parse_path_data).unwrap_or_default(),
        ShapeKind::Rect => rect_segments(node),
        ShapeKind::Circle => {
            let r = attr_or_zero(node, "r");
            ellipse_segments(attr_or_zero(node, "cx"), attr_or_zero(node, "cy"), r, r)
        }
        ShapeKind::Ellipse => ellipse_segments(
            attr_or_zero(node, "cx"),
            attr_or_zero(node, "cy"),
            attr_or_zero(node, "rx"),
            attr_or_zero(node, "ry"),
        ),
        ShapeKind::Line => vec![
            Segment::MoveTo(Point::new(attr_or_zero(node, "x1"), attr_or_zero(node, "y1"))),
            Segment::LineTo(Point::new(attr_or_zero(node, "x2"), attr_or_zero(node, "y2"))),
        ],
        ShapeKind::Polygon | ShapeKind::Polyline => {
            let points: Vec<Point> = node
                .attribute("points")
                .map(|pts| PointsParser::from(pts).map(Point::from).collect())
                .unwrap_or_default();
            let mut segments = poly_segments(&points);
            if kind == ShapeKind::Polygon && !segments.is_empty() {
                segments.push(Segment::ClosePath);
            }
            segments
        }
    }
}

fn poly_segments(points: &[Point]) -> Vec<Segment> {
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    std::iter::once(Segment::MoveTo(*first))
        .chain(iter.map(|p| Segment::LineTo(*p)))
        .collect()
}

/// Quarter-ellipse cubic from `from` to `to` around the corner `corner`
fn corner_arc(from: Point, corner: Point, to: Point) -> Segment {
    Segment::CubicTo {
        ctrl1: from + (corner - from) * KAPPA,
        ctrl2: to + (corner - to) * KAPPA,
        to,
    }
}

fn rect_segments(node: &Node) -> Vec<Segment> {
    let x = attr_or_zero(node, "x");
    let y = attr_or_zero(node, "y");
    let w = attr_or_zero(node, "width");
    let h = attr_or_zero(node, "height");
    if w <= 0.0 || h <= 0.0 {
        return Vec::new();
    }

    // A single radius applies to both axes.
    let (rx, ry) = match (number_attr(node, "rx"), number_attr(node, "ry")) {
        (Some(rx), Some(ry)) => (rx, ry),
        (Some(r), None) | (None, Some(r)) => (r, r),
        (None, None) => (0.0, 0.0),
    };
    let rx = rx.clamp(0.0, w / 2.0);
    let ry = ry.clamp(0.0, h / 2.0);

    if rx == 0.0 || ry == 0.0 {
        return vec![
            Segment::MoveTo(Point::new(x, y)),
            Segment::LineTo(Point::new(x + w, y)),
            Segment::LineTo(Point::new(x + w, y + h)),
            Segment::LineTo(Point::new(x, y + h)),
            Segment::ClosePath,
        ];
    }

    let (r, b) = (x + w, y + h);
    vec![
        Segment::MoveTo(Point::new(x + rx, y)),
        Segment::LineTo(Point::new(r - rx, y)),
        corner_arc(Point::new(r - rx, y), Point::new(r, y), Point::new(r, y + ry)),
        Segment::LineTo(Point::new(r, b - ry)),
        corner_arc(Point::new(r, b - ry), Point::new(r, b), Point::new(r - rx, b)),
        Segment::LineTo(Point::new(x + rx, b)),
        corner_arc(Point::new(x + rx, b), Point::new(x, b), Point::new(x, b - ry)),
        Segment::LineTo(Point::new(x, y + ry)),
        corner_arc(Point::new(x, y + ry), Point::new(x, y), Point::new(x + rx, y)),
        Segment::ClosePath,
    ]
}

fn ellipse_segments(cx: f64, cy: f64, rx: f64, ry: f64) -> Vec<Segment> {
    if rx <= 0.0 || ry <= 0.0 {
        return Vec::new();
    }
    let right = Point::new(cx + rx, cy);
    let bottom = Point::new(cx, cy + ry);
    let left = Point::new(cx - rx, cy);
    let top = Point::new(cx, cy - ry);
    vec![
        Segment::MoveTo(right),
        corner_arc(right, Point::new(cx + rx, cy + ry), bottom),
        corner_arc(bottom, Point::new(cx - rx, cy + ry), left),
        corner_arc(left, Point::new(cx - rx, cy - ry), top),
        corner_arc(top, Point::new(cx + rx, cy - ry), right),
        Segment::ClosePath,
    ]
}
