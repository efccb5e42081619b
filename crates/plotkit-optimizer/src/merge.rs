//! Point merging
//!
//! Collapses runs of points closer than the merge distance and removes
//! interior points lying exactly on the segment between their neighbours. The
//! first and last points of a path are anchors and always survive, so a path
//! never shrinks below two points.

use crate::stage::{retain_drawable, PathStage};
use plotkit_core::{Path, PathList, Point};

/// Deviation below which an interior point counts as collinear
const COLLINEAR_EPSILON: f64 = 1e-6;

/// Merge stage with a minimum point spacing in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeStage {
    pub distance: f64,
}

impl MergeStage {
    pub fn new(distance: f64) -> Self {
        Self { distance }
    }
}

fn is_redundant(prev: Point, p: Point, next: Point) -> bool {
    let chord = next - prev;
    let len = chord.length();
    if len == 0.0 {
        return false;
    }
    let deviation = ((p.x - prev.x) * chord.y - (p.y - prev.y) * chord.x).abs() / len;
    deviation < COLLINEAR_EPSILON && (p - prev).dot(&(next - p)) > 0.0
}

/// Merge a single path; paths with fewer than two points pass through
pub fn merge_path(path: &[Point], distance: f64) -> Path {
    let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
        return Vec::new();
    };
    if path.len() < 2 {
        return path.to_vec();
    }

    let mut out: Path = vec![first];
    for &p in &path[1..path.len() - 1] {
        if let Some(prev) = out.last() {
            if p.distance(prev) >= distance {
                out.push(p);
            }
        }
    }
    // The end point replaces a kept neighbour that is too close to it.
    if out.len() > 1 && out.last().is_some_and(|prev| prev.distance(&last) < distance) {
        out.pop();
    }
    out.push(last);

    let mut collapsed: Path = Vec::with_capacity(out.len());
    for (i, &p) in out.iter().enumerate() {
        let redundant = match (collapsed.last(), out.get(i + 1)) {
            (Some(&prev), Some(&next)) => is_redundant(prev, p, next),
            _ => false,
        };
        if !redundant {
            collapsed.push(p);
        }
    }

    let n = collapsed.len();
    if n > 2 && collapsed[0].distance(&collapsed[n - 1]) < distance {
        collapsed[n - 1] = collapsed[0];
    }
    collapsed
}

impl PathStage for MergeStage {
    fn name(&self) -> &str {
        "merge"
    }

    fn apply(&self, paths: PathList) -> PathList {
        let mut merged: PathList = paths
            .iter()
            .map(|p| merge_path(p, self.distance))
            .collect();
        retain_drawable(&mut merged);
        merged
    }
}
