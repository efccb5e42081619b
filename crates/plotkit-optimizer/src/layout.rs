//! Page layout
//!
//! Maps the drawing's source rectangle (the view box, or the bounding box of
//! the extracted geometry) onto the printable area of the paper. The drawing
//! keeps its aspect ratio and is aligned inside the area, optionally rotated
//! in quarter turns first.

use crate::stage::{PathStage, StageHandle};
use plotkit_core::{Bounds, PathList, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Placement along one axis of the printable area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Start,
    #[default]
    Middle,
    End,
}

impl Alignment {
    fn offset(&self, free: f64) -> f64 {
        match self {
            Self::Start => 0.0,
            Self::Middle => free / 2.0,
            Self::End => free,
        }
    }
}

/// Clockwise quarter-turn rotation applied before scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    /// Rotation in degrees
    pub fn degrees(&self) -> u16 {
        match self {
            Self::None => 0,
            Self::Quarter => 90,
            Self::Half => 180,
            Self::ThreeQuarter => 270,
        }
    }

    fn swaps_axes(&self) -> bool {
        matches!(self, Self::Quarter | Self::ThreeQuarter)
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            90 => Ok(Self::Quarter),
            180 => Ok(Self::Half),
            270 => Ok(Self::ThreeQuarter),
            other => Err(format!(
                "Rotation must be 0, 90, 180 or 270 degrees, got {}",
                other
            )),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Paper margins in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    /// Same margin on every side
    pub fn uniform(margin: f64) -> Self {
        Self {
            top: margin,
            right: margin,
            bottom: margin,
            left: margin,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(10.0)
    }
}

/// Paper and placement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Paper width in millimeters
    pub paper_width: f64,
    /// Paper height in millimeters
    pub paper_height: f64,
    pub margins: Margins,
    pub horizontal_align: Alignment,
    pub vertical_align: Alignment,
    pub rotation: Rotation,
    /// Fit the geometry's bounding box instead of the view box
    pub use_bounding_box: bool,
}

impl Default for Layout {
    fn default() -> Self {
        // A4 landscape
        Self {
            paper_width: 297.0,
            paper_height: 210.0,
            margins: Margins::default(),
            horizontal_align: Alignment::Middle,
            vertical_align: Alignment::Middle,
            rotation: Rotation::None,
            use_bounding_box: false,
        }
    }
}

impl Layout {
    /// Paper area inside the margins
    pub fn printable_area(&self) -> Bounds {
        Bounds::new(
            self.margins.left,
            self.margins.top,
            self.paper_width - self.margins.right,
            self.paper_height - self.margins.bottom,
        )
    }

    /// Check that the printable area is non-empty
    pub fn validate(&self) -> Result<(), String> {
        if !(self.paper_width > 0.0 && self.paper_height > 0.0) {
            return Err(format!(
                "Paper size must be positive, got {}x{} mm",
                self.paper_width, self.paper_height
            ));
        }
        let m = &self.margins;
        if [m.top, m.right, m.bottom, m.left].iter().any(|v| *v < 0.0) {
            return Err("Margins must not be negative".to_string());
        }
        let area = self.printable_area();
        if area.width() <= 0.0 || area.height() <= 0.0 {
            return Err(format!(
                "Margins leave no printable area on {}x{} mm paper",
                self.paper_width, self.paper_height
            ));
        }
        Ok(())
    }

    /// Compute where the drawing lands on the paper
    ///
    /// `drawing` is the bounding box of the extracted geometry; it is used
    /// instead of `view_box` when `use_bounding_box` is set and is available.
    pub fn placement(&self, view_box: Bounds, drawing: Option<Bounds>) -> Placement {
        let source = match (self.use_bounding_box, drawing) {
            (true, Some(bounds)) => bounds,
            _ => view_box,
        };

        let rotate = (self.rotation != Rotation::None).then(|| RotateStage {
            rotation: self.rotation,
            source,
        });
        let rotated = rotate.as_ref().map(RotateStage::output).unwrap_or(source);

        let area = self.printable_area();
        let (w, h) = (rotated.width(), rotated.height());
        let factor = match (w > 0.0, h > 0.0) {
            (true, true) => (area.width() / w).min(area.height() / h),
            (true, false) => area.width() / w,
            (false, true) => area.height() / h,
            (false, false) => 1.0,
        };
        let (tw, th) = (w * factor, h * factor);
        let target = Bounds::from_rect(
            area.min_x + self.horizontal_align.offset(area.width() - tw),
            area.min_y + self.vertical_align.offset(area.height() - th),
            tw,
            th,
        );

        Placement {
            rotate,
            scale: ScaleStage::new(rotated, target),
            factor,
        }
    }
}

/// The stages that position a drawing on the paper
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub rotate: Option<RotateStage>,
    pub scale: ScaleStage,
    factor: f64,
}

impl Placement {
    /// Millimeters per source unit
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Where the drawing ends up, in millimeters
    pub fn target(&self) -> Bounds {
        self.scale.target
    }

    /// Stages to prepend to an optimizer pipeline
    pub fn stages(&self) -> Vec<StageHandle> {
        let mut stages: Vec<StageHandle> = Vec::new();
        if let Some(rotate) = &self.rotate {
            stages.push(Arc::new(rotate.clone()));
        }
        stages.push(Arc::new(self.scale.clone()));
        stages
    }
}

/// Quarter-turn rotation of a source rectangle onto one anchored at the origin
#[derive(Debug, Clone, PartialEq)]
pub struct RotateStage {
    pub rotation: Rotation,
    pub source: Bounds,
}

impl RotateStage {
    /// Rectangle covered by the rotated source
    pub fn output(&self) -> Bounds {
        let (w, h) = (self.source.width(), self.source.height());
        if self.rotation.swaps_axes() {
            Bounds::from_rect(0.0, 0.0, h, w)
        } else {
            Bounds::from_rect(0.0, 0.0, w, h)
        }
    }

    fn rotate(&self, p: &Point) -> Point {
        let (w, h) = (self.source.width(), self.source.height());
        let u = p.x - self.source.min_x;
        let v = p.y - self.source.min_y;
        match self.rotation {
            Rotation::None => Point::new(u, v),
            Rotation::Quarter => Point::new(h - v, u),
            Rotation::Half => Point::new(w - u, h - v),
            Rotation::ThreeQuarter => Point::new(v, w - u),
        }
    }
}

impl PathStage for RotateStage {
    fn name(&self) -> &str {
        "rotate"
    }

    fn apply(&self, paths: PathList) -> PathList {
        paths
            .into_iter()
            .map(|path| path.iter().map(|p| self.rotate(p)).collect())
            .collect()
    }
}

/// Maps a source rectangle onto a target rectangle with independent x/y ratios
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleStage {
    pub source: Bounds,
    pub target: Bounds,
}

impl ScaleStage {
    pub fn new(source: Bounds, target: Bounds) -> Self {
        Self { source, target }
    }

    /// Horizontal and vertical ratios; a degenerate source axis maps 1:1
    pub fn ratios(&self) -> (f64, f64) {
        let ratio = |target: f64, source: f64| if source > 0.0 { target / source } else { 1.0 };
        (
            ratio(self.target.width(), self.source.width()),
            ratio(self.target.height(), self.source.height()),
        )
    }

    /// Map one point
    pub fn map(&self, p: &Point) -> Point {
        let (sx, sy) = self.ratios();
        Point::new(
            self.target.min_x + (p.x - self.source.min_x) * sx,
            self.target.min_y + (p.y - self.source.min_y) * sy,
        )
    }
}

impl PathStage for ScaleStage {
    fn name(&self) -> &str {
        "scale"
    }

    fn apply(&self, paths: PathList) -> PathList {
        paths
            .into_iter()
            .map(|path| path.iter().map(|p| self.map(p)).collect())
            .collect()
    }
}
