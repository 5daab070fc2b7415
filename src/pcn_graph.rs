// Directed channel graph container and bidirectional normalization

use hashbrown::HashMap;
use indexmap::IndexSet;
use log::info;

use crate::pcn_interface::{ChannelAttributes, EdgeKey, NodeId};

// ============================================================================
// Channel Graph
// ============================================================================

/// Directed graph of payment channels, optionally a multigraph.
///
/// Edge insertion order is the graph's native enumeration order: attribute
/// assignment and persistence both walk edges in the order they were added.
/// Nodes keep insertion order as well.
#[derive(Debug, Clone)]
pub struct ChannelGraph {
    multigraph: bool,
    nodes: IndexSet<NodeId>,
    edges: Vec<EdgeKey>,
    /// Number of parallel edges per (source, target) pair; the next
    /// insertion for a pair takes this count as its instance index.
    edge_counts: HashMap<(NodeId, NodeId), u32>,
    attributes: HashMap<EdgeKey, ChannelAttributes>,
}

impl ChannelGraph {
    pub fn new(multigraph: bool) -> Self {
        Self {
            multigraph,
            nodes: IndexSet::new(),
            edges: Vec::new(),
            edge_counts: HashMap::new(),
            attributes: HashMap::new(),
        }
    }

    pub fn is_multigraph(&self) -> bool {
        self.multigraph
    }

    pub fn add_node(&mut self, node: NodeId) {
        self.nodes.insert(node);
    }

    /// Adds a directed edge, inserting both endpoints as nodes.
    ///
    /// In a simple graph a duplicate `(source, target)` pair is a no-op and
    /// the existing key is returned; in a multigraph every call appends a
    /// new parallel edge with the next instance index.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> EdgeKey {
        self.nodes.insert(source);
        self.nodes.insert(target);

        let count = self.edge_counts.entry((source, target)).or_insert(0);
        if !self.multigraph && *count > 0 {
            return EdgeKey::new(source, target, 0);
        }

        let key = EdgeKey::new(source, target, *count);
        *count += 1;
        self.edges.push(key);
        key
    }

    pub fn has_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.edge_counts
            .get(&(source, target))
            .map_or(false, |c| *c > 0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[EdgeKey] {
        &self.edges
    }

    /// Number of edges leaving `node`, counting parallel edges.
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.edges.iter().filter(|e| e.source == node).count()
    }

    /// Number of edges entering `node`, counting parallel edges.
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.edges.iter().filter(|e| e.target == node).count()
    }

    /// Edge density: `m / (n * (n - 1))` for a directed graph.
    pub fn density(&self) -> f64 {
        let n = self.nodes.len();
        if n < 2 {
            return 0.0;
        }
        self.edges.len() as f64 / (n as f64 * (n as f64 - 1.0))
    }

    /// Removes every `(u, u)` edge. Returns the number removed.
    pub fn remove_self_loops(&mut self) -> usize {
        let before = self.edges.len();
        self.edges.retain(|e| e.source != e.target);
        self.edge_counts.retain(|(u, v), _| u != v);
        self.attributes.retain(|e, _| e.source != e.target);
        before - self.edges.len()
    }

    /// Applies a batch of attribute records, replacing any previous ones.
    pub fn set_edge_attributes(&mut self, attributes: HashMap<EdgeKey, ChannelAttributes>) {
        self.attributes = attributes;
    }

    pub fn attributes(&self, edge: &EdgeKey) -> Option<&ChannelAttributes> {
        self.attributes.get(edge)
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    // ========================================================================
    // Normalization
    // ========================================================================

    /// Makes the graph a valid channel topology: no self-loops, and every
    /// channel bidirectional.
    ///
    /// Channels are inherently bidirectional (either party can route), so
    /// each discovered directed connection is mirrored before the
    /// direction-specific financial attributes are assigned.
    ///
    /// Two phases: the reversals are collected first, then inserted, so the
    /// edge list is never mutated while it is being walked. In a multigraph
    /// every reversal appends a parallel edge; in a simple graph insertion
    /// dedupes against an existing opposite edge.
    pub fn normalize(&mut self) {
        let removed = self.remove_self_loops();
        let before = self.edges.len();

        let reversals: Vec<(NodeId, NodeId)> = self
            .edges
            .iter()
            .map(|e| e.reversed_endpoints())
            .collect();
        for (source, target) in reversals {
            self.add_edge(source, target);
        }

        info!(
            "normalized topology: {} self-loops removed, {} -> {} edges, density {:.4}",
            removed,
            before,
            self.edges.len(),
            self.density()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_graph_dedupes_parallel_edges() {
        let mut graph = ChannelGraph::new(false);
        let first = graph.add_edge(0, 1);
        let second = graph.add_edge(0, 1);

        assert_eq!(first, second);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_multigraph_keeps_parallel_edges() {
        let mut graph = ChannelGraph::new(true);
        let first = graph.add_edge(0, 1);
        let second = graph.add_edge(0, 1);

        assert_eq!(first.instance, 0);
        assert_eq!(second.instance, 1);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_add_edge_inserts_endpoints() {
        let mut graph = ChannelGraph::new(false);
        graph.add_edge(5, 9);

        assert_eq!(graph.node_count(), 2);
        assert!(graph.nodes().any(|n| n == 5));
        assert!(graph.nodes().any(|n| n == 9));
    }

    #[test]
    fn test_remove_self_loops() {
        let mut graph = ChannelGraph::new(true);
        graph.add_edge(0, 1);
        graph.add_edge(1, 1);
        graph.add_edge(2, 2);
        graph.add_edge(1, 2);

        assert_eq!(graph.remove_self_loops(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert!(!graph.has_edge(1, 1));
    }

    #[test]
    fn test_normalize_mirrors_every_edge() {
        // 4-node directed ring: 0->1->2->3->0
        let mut graph = ChannelGraph::new(false);
        for i in 0..4u64 {
            graph.add_edge(i, (i + 1) % 4);
        }

        graph.normalize();

        // 4 forward + 4 reverse
        assert_eq!(graph.edge_count(), 8);
        for edge in graph.edges() {
            assert!(graph.has_edge(edge.target, edge.source));
            assert_ne!(edge.source, edge.target);
        }
    }

    #[test]
    fn test_normalize_removes_self_loops_first() {
        let mut graph = ChannelGraph::new(true);
        graph.add_edge(0, 0);
        graph.add_edge(0, 1);

        graph.normalize();

        assert_eq!(graph.edge_count(), 2);
        assert!(graph.has_edge(0, 1));
        assert!(graph.has_edge(1, 0));
        assert!(!graph.has_edge(0, 0));
    }

    #[test]
    fn test_normalize_multigraph_mirrors_parallel_edges() {
        let mut graph = ChannelGraph::new(true);
        graph.add_edge(0, 1);
        graph.add_edge(0, 1);

        graph.normalize();

        // both parallel edges get their own reverse edge
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.out_degree(1), 2);
    }

    #[test]
    fn test_normalize_simple_graph_with_both_directions_present() {
        let mut graph = ChannelGraph::new(false);
        graph.add_edge(0, 1);
        graph.add_edge(1, 0);

        graph.normalize();

        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_degrees_after_normalization() {
        // star: hub 0 with leaves 1..=4
        let mut graph = ChannelGraph::new(false);
        for leaf in 1..=4u64 {
            graph.add_edge(0, leaf);
        }
        graph.normalize();

        assert_eq!(graph.out_degree(0), 4);
        assert_eq!(graph.in_degree(0), 4);
        for leaf in 1..=4u64 {
            assert_eq!(graph.out_degree(leaf), 1);
        }
    }

    #[test]
    fn test_density_directed() {
        let mut graph = ChannelGraph::new(false);
        graph.add_edge(0, 1);
        graph.add_edge(1, 0);
        graph.add_edge(0, 2);

        // 3 edges out of 3 * 2 possible
        assert!((graph.density() - 0.5).abs() < 1e-12);
    }
}
