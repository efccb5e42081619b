//! Two-dimensional k-d tree over path endpoints
//!
//! Nodes live in a flat arena and refer to each other by index. Each node
//! tracks how many active points remain in its subtree so nearest-neighbour
//! queries can skip exhausted branches, and deactivation walks parent links
//! from the node to the root.

use plotkit_core::Point;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Node {
    id: usize,
    point: Point,
    /// 0 splits on x, 1 on y
    axis: u8,
    left: Option<usize>,
    right: Option<usize>,
    parent: Option<usize>,
    active: bool,
    /// Active points in this subtree, including this node
    active_count: usize,
}

impl Node {
    fn coord(&self, p: &Point) -> f64 {
        if self.axis == 0 {
            p.x
        } else {
            p.y
        }
    }
}

/// Arena-backed k-d tree supporting nearest-active queries
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    nodes: Vec<Node>,
    root: Option<usize>,
    by_id: HashMap<usize, usize>,
}

impl KdTree {
    /// Build a balanced tree from `(id, point)` pairs
    ///
    /// Splits on the median, alternating axes per level. Ids must be unique.
    pub fn build(mut items: Vec<(usize, Point)>) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(items.len()),
            root: None,
            by_id: HashMap::with_capacity(items.len()),
        };
        tree.root = tree.build_subtree(&mut items, 0, None);
        tree
    }

    fn build_subtree(
        &mut self,
        items: &mut [(usize, Point)],
        depth: usize,
        parent: Option<usize>,
    ) -> Option<usize> {
        if items.is_empty() {
            return None;
        }
        let axis = (depth % 2) as u8;
        items.sort_by(|a, b| {
            if axis == 0 {
                a.1.x.total_cmp(&b.1.x)
            } else {
                a.1.y.total_cmp(&b.1.y)
            }
        });
        let mid = items.len() / 2;
        let (id, point) = items[mid];

        let index = self.nodes.len();
        self.nodes.push(Node {
            id,
            point,
            axis,
            left: None,
            right: None,
            parent,
            active: true,
            active_count: items.len(),
        });
        self.by_id.insert(id, index);

        let (lower, rest) = items.split_at_mut(mid);
        let upper = &mut rest[1..];
        let left = self.build_subtree(lower, depth + 1, Some(index));
        let right = self.build_subtree(upper, depth + 1, Some(index));
        self.nodes[index].left = left;
        self.nodes[index].right = right;
        Some(index)
    }

    /// Number of points still active
    pub fn active_len(&self) -> usize {
        self.root.map(|r| self.nodes[r].active_count).unwrap_or(0)
    }

    /// Check whether every point has been deactivated
    pub fn is_exhausted(&self) -> bool {
        self.active_len() == 0
    }

    /// Deactivate the point with `id`; returns false if unknown or already inactive
    pub fn deactivate(&mut self, id: usize) -> bool {
        let Some(&index) = self.by_id.get(&id) else {
            return false;
        };
        if !self.nodes[index].active {
            return false;
        }
        self.nodes[index].active = false;
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            self.nodes[i].active_count -= 1;
            cursor = self.nodes[i].parent;
        }
        true
    }

    /// Closest active point to `target`, as `(id, point)`
    pub fn nearest(&self, target: &Point) -> Option<(usize, Point)> {
        let mut best: Option<(usize, f64)> = None;
        if let Some(root) = self.root {
            self.search(root, target, &mut best);
        }
        best.map(|(index, _)| (self.nodes[index].id, self.nodes[index].point))
    }

    fn search(&self, index: usize, target: &Point, best: &mut Option<(usize, f64)>) {
        let node = &self.nodes[index];
        if node.active_count == 0 {
            return;
        }
        if node.active {
            let d2 = {
                let d = node.point - *target;
                d.dot(&d)
            };
            if best.map_or(true, |(_, b)| d2 < b) {
                *best = Some((index, d2));
            }
        }

        let diff = node.coord(target) - node.coord(&node.point);
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(near) = near {
            self.search(near, target, best);
        }
        if let Some(far) = far {
            if best.map_or(true, |(_, b)| diff * diff < b) {
                self.search(far, target, best);
            }
        }
    }
}
