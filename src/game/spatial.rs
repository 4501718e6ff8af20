//! Region quadtree for broad-phase collision queries.
//!
//! Rebuilt from scratch every tick: the arena is bounded and the entity
//! count modest, so a full rebuild is cheaper than incremental maintenance
//! and immune to update bugs. Objects overlapping a quadrant boundary are
//! inserted into every quadrant they touch; the duplicates are folded back
//! out at query time, never prevented at insert time.

use rustc_hash::FxHashSet;

use crate::game::constants::spatial::{MAX_SPLIT_DEPTH, SPLIT_OBJECTS};
use crate::game::entity::EntityId;

/// One bounding box in the tree: the entity handle captured at rebuild time
/// plus its center and half-extents.
#[derive(Debug, Clone, Copy)]
pub struct QuadTreeEntry {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub radi_w: f32,
    pub radi_h: f32,
}

impl QuadTreeEntry {
    /// Which sides of a node's center point this box reaches. Strict
    /// comparisons: a box exactly on the line belongs to neither side.
    #[inline]
    fn sides_of(&self, center_x: f32, center_y: f32) -> (bool, bool, bool, bool) {
        (
            self.y - self.radi_h < center_y, // top
            self.y + self.radi_h > center_y, // bottom
            self.x - self.radi_w < center_x, // left
            self.x + self.radi_w > center_x, // right
        )
    }
}

#[derive(Debug)]
struct QuadTreeNode {
    x: f32,
    y: f32,
    radi_w: f32,
    radi_h: f32,
    level: u32,
    objects: Vec<QuadTreeEntry>,
    /// Quadrant order: top-left, top-right, bottom-left, bottom-right.
    children: Option<Box<[QuadTreeNode; 4]>>,
}

impl QuadTreeNode {
    fn new(x: f32, y: f32, radi_w: f32, radi_h: f32, level: u32) -> Self {
        Self {
            x,
            y,
            radi_w,
            radi_h,
            level,
            objects: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, entry: QuadTreeEntry) {
        if let Some(children) = self.children.as_mut() {
            let (top, bottom, left, right) = entry.sides_of(self.x, self.y);
            if top && left {
                children[0].insert(entry);
            }
            if top && right {
                children[1].insert(entry);
            }
            if bottom && left {
                children[2].insert(entry);
            }
            if bottom && right {
                children[3].insert(entry);
            }
            return;
        }

        self.objects.push(entry);
        if self.objects.len() == SPLIT_OBJECTS && self.level <= MAX_SPLIT_DEPTH {
            self.split();
        }
    }

    /// Subdivides and redistributes the held objects into the new quadrants.
    /// The node stops holding objects directly from here on.
    fn split(&mut self) {
        let half_w = self.radi_w / 2.0;
        let half_h = self.radi_h / 2.0;
        let level = self.level + 1;
        self.children = Some(Box::new([
            QuadTreeNode::new(self.x - half_w, self.y - half_h, half_w, half_h, level),
            QuadTreeNode::new(self.x + half_w, self.y - half_h, half_w, half_h, level),
            QuadTreeNode::new(self.x - half_w, self.y + half_h, half_w, half_h, level),
            QuadTreeNode::new(self.x + half_w, self.y + half_h, half_w, half_h, level),
        ]));
        for entry in std::mem::take(&mut self.objects) {
            self.insert(entry);
        }
    }

    fn retrieve_into(
        &self,
        x: f32,
        y: f32,
        radi_w: f32,
        radi_h: f32,
        out: &mut Vec<QuadTreeEntry>,
    ) {
        if let Some(children) = self.children.as_ref() {
            let top = y - radi_h < self.y;
            let bottom = y + radi_h > self.y;
            let left = x - radi_w < self.x;
            let right = x + radi_w > self.x;
            if top && left {
                children[0].retrieve_into(x, y, radi_w, radi_h, out);
            }
            if top && right {
                children[1].retrieve_into(x, y, radi_w, radi_h, out);
            }
            if bottom && left {
                children[2].retrieve_into(x, y, radi_w, radi_h, out);
            }
            if bottom && right {
                children[3].retrieve_into(x, y, radi_w, radi_h, out);
            }
        } else {
            out.extend_from_slice(&self.objects);
        }
    }

    fn collect_stats(&self, stats: &mut QuadTreeStats) {
        stats.nodes += 1;
        stats.max_depth = stats.max_depth.max(self.level);
        stats.entries += self.objects.len();
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.collect_stats(stats);
            }
        }
    }
}

/// Occupancy snapshot for logs and benchmarks.
#[derive(Debug, Clone, Default)]
pub struct QuadTreeStats {
    pub nodes: usize,
    /// Boundary-crossing objects count once per quadrant they touch.
    pub entries: usize,
    pub max_depth: u32,
}

/// The per-world spatial index, centered on the arena origin.
#[derive(Debug)]
pub struct QuadTree {
    root: QuadTreeNode,
}

impl QuadTree {
    /// `radi_w`/`radi_h` are the half-extents of the indexed region.
    pub fn new(radi_w: f32, radi_h: f32) -> Self {
        Self {
            root: QuadTreeNode::new(0.0, 0.0, radi_w, radi_h, 0),
        }
    }

    /// Drops all nodes and entries, keeping the region bounds.
    pub fn reset(&mut self) {
        self.root.children = None;
        self.root.objects.clear();
    }

    pub fn insert(&mut self, entry: QuadTreeEntry) {
        self.root.insert(entry);
    }

    /// All entries whose boxes overlap the query box, de-duplicated by
    /// entity identity in first-occurrence order. Liveness is the caller's
    /// concern: handles were captured at rebuild time and may be stale.
    pub fn retrieve(&self, x: f32, y: f32, radi_w: f32, radi_h: f32) -> Vec<EntityId> {
        let mut raw = Vec::new();
        self.root.retrieve_into(x, y, radi_w, radi_h, &mut raw);

        let mut seen = FxHashSet::default();
        let mut out = Vec::with_capacity(raw.len());
        for entry in raw {
            if seen.insert(entry.id.id()) {
                out.push(entry.id);
            }
        }
        out
    }

    pub fn stats(&self) -> QuadTreeStats {
        let mut stats = QuadTreeStats::default();
        self.root.collect_stats(&mut stats);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, x: f32, y: f32, radius: f32) -> QuadTreeEntry {
        QuadTreeEntry {
            id: EntityId::new(id, 1),
            x,
            y,
            radi_w: radius,
            radi_h: radius,
        }
    }

    fn tree() -> QuadTree {
        QuadTree::new(1000.0, 1000.0)
    }

    #[test]
    fn test_retrieve_single() {
        let mut tree = tree();
        tree.insert(entry(1, 100.0, 100.0, 10.0));

        let hits = tree.retrieve(100.0, 100.0, 20.0, 20.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), 1);
    }

    #[test]
    fn test_no_split_below_threshold() {
        let mut tree = tree();
        for i in 0..4 {
            tree.insert(entry(i, i as f32 * 10.0, 0.0, 5.0));
        }
        let stats = tree.stats();
        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.entries, 4);
    }

    #[test]
    fn test_split_at_exactly_five() {
        let mut tree = tree();
        for i in 0..5 {
            tree.insert(entry(i, 100.0 + i as f32, 100.0, 5.0));
        }
        let stats = tree.stats();
        // Root subdivided and handed its objects down.
        assert!(stats.nodes > 1);
        assert!(stats.max_depth >= 1);
    }

    #[test]
    fn test_boundary_object_duplicated_across_quadrants() {
        let mut tree = tree();
        // Force a split with four far-apart objects plus one on the center.
        tree.insert(entry(1, -500.0, -500.0, 10.0));
        tree.insert(entry(2, 500.0, -500.0, 10.0));
        tree.insert(entry(3, -500.0, 500.0, 10.0));
        tree.insert(entry(4, 500.0, 500.0, 10.0));
        tree.insert(entry(5, 0.0, 0.0, 10.0));

        // The straddler lands in all four quadrants.
        assert_eq!(tree.stats().entries, 8);

        // But queries report it once.
        let hits = tree.retrieve(0.0, 0.0, 1000.0, 1000.0);
        assert_eq!(hits.len(), 5);
    }

    #[test]
    fn test_whole_arena_query_returns_each_once() {
        let mut tree = tree();
        let count = 200;
        for i in 0..count {
            let x = ((i * 37) % 1900) as f32 - 950.0;
            let y = ((i * 53) % 1900) as f32 - 950.0;
            tree.insert(entry(i, x, y, 25.0));
        }

        let hits = tree.retrieve(0.0, 0.0, 1000.0, 1000.0);
        assert_eq!(hits.len(), count as usize);
        let distinct: FxHashSet<u32> = hits.iter().map(|h| h.id()).collect();
        assert_eq!(distinct.len(), count as usize);
    }

    #[test]
    fn test_query_misses_distant_objects() {
        let mut tree = tree();
        // Enough clustered objects to subdivide a few levels.
        for i in 0..20 {
            tree.insert(entry(i, -800.0 + i as f32, -800.0, 5.0));
        }
        tree.insert(entry(99, 800.0, 800.0, 5.0));

        let hits = tree.retrieve(800.0, 800.0, 50.0, 50.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), 99);
    }

    #[test]
    fn test_depth_bounded() {
        let mut tree = tree();
        // Pile everything on one point: splits stop at the depth cap even
        // though every leaf stays over the object threshold.
        for i in 0..100 {
            tree.insert(entry(i, 300.0, 300.0, 1.0));
        }
        let stats = tree.stats();
        assert!(stats.max_depth <= MAX_SPLIT_DEPTH + 1);

        let hits = tree.retrieve(300.0, 300.0, 2.0, 2.0);
        assert_eq!(hits.len(), 100);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut tree = tree();
        for i in 0..50 {
            tree.insert(entry(i, i as f32, i as f32, 5.0));
        }
        tree.reset();

        assert!(tree.retrieve(0.0, 0.0, 1000.0, 1000.0).is_empty());
        let stats = tree.stats();
        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.entries, 0);
    }
}
