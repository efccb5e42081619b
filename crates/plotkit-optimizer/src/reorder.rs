//! Greedy nearest-neighbour path ordering
//!
//! Starting from the origin, repeatedly draws whichever remaining path has an
//! endpoint closest to the pen. Paths may be drawn reversed unless they start
//! where they end.

use crate::kdtree::KdTree;
use crate::stage::{travel_length, PathStage};
use plotkit_core::{PathList, Point};

/// Reorder stage
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReorderStage;

/// Order paths by greedy nearest endpoint starting at `start`
pub fn reorder_paths(mut paths: PathList, start: Point) -> PathList {
    // Endpoint ids: 2i is path i drawn forward, 2i + 1 drawn reversed.
    let mut items = Vec::with_capacity(paths.len() * 2);
    for (i, path) in paths.iter().enumerate() {
        let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
            continue;
        };
        items.push((2 * i, first));
        if first != last {
            items.push((2 * i + 1, last));
        }
    }
    let mut tree = KdTree::build(items);

    let mut ordered = Vec::with_capacity(paths.len());
    let mut pen = start;
    while let Some((id, _)) = tree.nearest(&pen) {
        let index = id / 2;
        tree.deactivate(2 * index);
        tree.deactivate(2 * index + 1);

        let mut path = std::mem::take(&mut paths[index]);
        if id % 2 == 1 {
            path.reverse();
        }
        if let Some(&end) = path.last() {
            pen = end;
        }
        ordered.push(path);
    }
    ordered
}

impl PathStage for ReorderStage {
    fn name(&self) -> &str {
        "reorder"
    }

    fn apply(&self, paths: PathList) -> PathList {
        let before = travel_length(&paths);
        let ordered = reorder_paths(paths, Point::default());
        tracing::debug!(
            "Reordered {} paths, travel {:.1} -> {:.1} mm",
            ordered.len(),
            before,
            travel_length(&ordered)
        );
        ordered
    }
}
