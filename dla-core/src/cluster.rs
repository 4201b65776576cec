use crate::spatial_hash::SpatialHash;
use crate::types::NodeId;
use glam::Vec2;

/// A single stuck point in the aggregate.
#[derive(Clone, Copy, Debug)]
pub struct ClusterNode {
    pub pos: Vec2,
    /// Index of the node this one stuck to; `None` for the seed.
    pub parent: Option<NodeId>,
    /// Steps from the seed along the parent chain.
    pub depth: u32,
}

/// Append-only graph of stuck points, indexed spatially.
///
/// Nodes are addressed by dense index and never removed or mutated after
/// insertion, so the indices held by the [`SpatialHash`] stay valid without
/// any invalidation bookkeeping. A parent index is always smaller than the
/// child's own index, which rules out cycles by construction.
#[derive(Debug)]
pub struct Cluster {
    nodes: Vec<ClusterNode>,
    hash: SpatialHash,
    extent: f32,
}

impl Cluster {
    pub fn new(cell_size: f32) -> Self {
        Self {
            nodes: Vec::new(),
            hash: SpatialHash::new(cell_size),
            extent: 0.0,
        }
    }

    /// Removes all nodes, empties the spatial index and resets the extent.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.hash.clear();
        self.extent = 0.0;
    }

    /// Inserts the root node. Must be the first insertion after a reset.
    pub fn add_seed(&mut self, p: Vec2) {
        debug_assert!(self.nodes.is_empty(), "seed must be the first node");
        self.nodes.push(ClusterNode {
            pos: p,
            parent: None,
            depth: 0,
        });
        self.hash.insert(p, 0);
        self.extent = self.extent.max(p.length());
    }

    /// Appends a node stuck to `parent`, keeping hash and extent in sync.
    ///
    /// `parent` must reference an existing node. The driver guarantees this
    /// by construction, since the index always comes from a successful
    /// neighbor query; violating it is a logic bug, not a runtime condition.
    pub fn add_node(&mut self, p: Vec2, parent: NodeId) -> NodeId {
        debug_assert!(parent < self.nodes.len(), "parent index out of range");
        let id = self.nodes.len();
        let depth = self.nodes[parent].depth + 1;
        self.nodes.push(ClusterNode {
            pos: p,
            parent: Some(parent),
            depth,
        });
        self.hash.insert(p, id);
        self.extent = self.extent.max(p.length());
        id
    }

    /// Changes the spatial index cell size and re-inserts every node. O(n).
    ///
    /// Only needed when the cell size changes; incremental inserts keep the
    /// hash current otherwise.
    pub fn rebuild_hash(&mut self, cell_size: f32) {
        self.hash.set_cell_size(cell_size);
        let pts: Vec<Vec2> = self.nodes.iter().map(|n| n.pos).collect();
        self.hash.rebuild(&pts);
    }

    /// Candidate node indices near `p`. A superset; callers re-check
    /// exact distances.
    pub fn query_neighbors(&self, p: Vec2, out: &mut Vec<NodeId>) {
        self.hash.query_neighbors(p, out);
    }

    pub fn nodes(&self) -> &[ClusterNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Maximum distance from the origin over all nodes. Non-decreasing
    /// between resets.
    pub fn extent(&self) -> f32 {
        self.extent
    }

    pub fn cell_size(&self) -> f32 {
        self.hash.cell_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn seed_then_child_records_parent_depth_and_extent() {
        let mut cluster = Cluster::new(8.0);
        cluster.add_seed(Vec2::ZERO);
        let id = cluster.add_node(Vec2::new(3.0, 0.0), 0);

        assert_eq!(id, 1);
        assert_eq!(cluster.len(), 2);

        let node = cluster.nodes()[1];
        assert_eq!(node.parent, Some(0));
        assert_eq!(node.depth, 1);
        assert_eq!(cluster.extent(), 3.0);
    }

    #[test]
    fn parents_precede_children_and_depth_increments() {
        let mut cluster = Cluster::new(8.0);
        cluster.add_seed(Vec2::ZERO);
        // Grow a small two-branch structure.
        cluster.add_node(Vec2::new(2.0, 0.0), 0);
        cluster.add_node(Vec2::new(0.0, 2.0), 0);
        cluster.add_node(Vec2::new(4.0, 0.0), 1);
        cluster.add_node(Vec2::new(0.0, 4.0), 2);
        cluster.add_node(Vec2::new(6.0, 0.0), 3);

        for (i, node) in cluster.nodes().iter().enumerate() {
            match node.parent {
                None => assert_eq!(i, 0, "only the seed has no parent"),
                Some(p) => {
                    assert!(p < i, "parent {} must precede child {}", p, i);
                    assert_eq!(node.depth, cluster.nodes()[p].depth + 1);
                }
            }
        }
    }

    #[test]
    fn extent_is_non_decreasing_and_matches_max_distance() {
        let mut cluster = Cluster::new(8.0);
        cluster.add_seed(Vec2::ZERO);

        let positions = [
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 5.0),
            Vec2::new(-2.0, 0.0), // closer than the current extent
            Vec2::new(3.0, 4.0),  // length 5, ties the max
            Vec2::new(-6.0, 8.0), // length 10
        ];

        let mut prev = cluster.extent();
        for &p in &positions {
            cluster.add_node(p, 0);
            assert!(cluster.extent() >= prev, "extent must never shrink");
            prev = cluster.extent();

            let max = cluster
                .nodes()
                .iter()
                .map(|n| n.pos.length())
                .fold(0.0_f32, f32::max);
            assert_eq!(cluster.extent(), max);
        }
        assert_eq!(cluster.extent(), 10.0);
    }

    #[test]
    fn reset_clears_nodes_index_and_extent() {
        let mut cluster = Cluster::new(8.0);
        cluster.add_seed(Vec2::ZERO);
        cluster.add_node(Vec2::new(3.0, 0.0), 0);

        cluster.reset();

        assert!(cluster.is_empty());
        assert_eq!(cluster.extent(), 0.0);

        let mut out = Vec::new();
        cluster.query_neighbors(Vec2::new(3.0, 0.0), &mut out);
        assert!(out.is_empty(), "spatial index should be empty after reset");
    }

    #[test]
    fn rebuild_hash_keeps_every_node_queryable() {
        let mut cluster = Cluster::new(8.0);
        cluster.add_seed(Vec2::ZERO);
        for i in 0..20 {
            let a = (i as f32) * 0.7;
            cluster.add_node(Vec2::new(a.cos() * (i as f32), a.sin() * (i as f32)), i);
        }

        cluster.rebuild_hash(16.0);
        assert_eq!(cluster.cell_size(), 16.0);

        let mut out = Vec::new();
        for (i, node) in cluster.nodes().iter().enumerate() {
            cluster.query_neighbors(node.pos, &mut out);
            assert!(
                out.contains(&i),
                "node {} should be findable after rebuild",
                i
            );
        }
    }
}
