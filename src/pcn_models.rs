// Random graph synthesis strategies
//
// The three models mirror the reference generators the pipeline consumes:
// directed scale-free growth (Bollobas et al.), Watts-Strogatz small-world,
// and Barabasi-Albert preferential attachment. The pipeline treats them as
// opaque: parameters go in, a raw graph comes out, and anything invalid
// surfaces as a generation failure.

use std::collections::{BTreeSet, HashSet};

use log::info;
use rand::rngs::StdRng;
use rand::Rng;

use crate::pcn_graph::ChannelGraph;
use crate::pcn_interface::{GenError, NodeId};

/// In-degree bias of the scale-free growth process.
const SCALE_FREE_DELTA_IN: f64 = 0.2;
/// Out-degree bias of the scale-free growth process.
const SCALE_FREE_DELTA_OUT: f64 = 0.0;

/// Topology construction strategy with its model-specific parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyModel {
    /// Directed scale-free growth. `alpha` adds a new source node, `beta`
    /// wires two existing nodes, `gamma` adds a new target node; the three
    /// must sum to 1. Produces a multigraph (parallel edges and self-loops
    /// are possible and left for normalization to handle).
    ScaleFree { alpha: f64, beta: f64, gamma: f64 },

    /// Watts-Strogatz small world: ring lattice with `k` neighbors per
    /// node, each lattice edge rewired with probability `p`.
    WattsStrogatz { k: usize, p: f64 },

    /// Barabasi-Albert preferential attachment: each new node attaches to
    /// `m` existing nodes.
    BarabasiAlbert { m: usize },
}

impl TopologyModel {
    pub fn name(&self) -> &'static str {
        match self {
            TopologyModel::ScaleFree { .. } => "scale-free",
            TopologyModel::WattsStrogatz { .. } => "watts-strogatz",
            TopologyModel::BarabasiAlbert { .. } => "barabasi-albert",
        }
    }
}

/// Builds a raw graph with `nodes` nodes using the requested model.
///
/// The result is not yet a valid channel topology: it may contain
/// self-loops and one-directional connections. Callers run
/// [`ChannelGraph::normalize`] before assigning attributes.
pub fn synthesize(
    model: &TopologyModel,
    nodes: usize,
    rng: &mut StdRng,
) -> Result<ChannelGraph, GenError> {
    info!("generating {} topology with {} nodes", model.name(), nodes);

    match *model {
        TopologyModel::ScaleFree { alpha, beta, gamma } => {
            scale_free(nodes, alpha, beta, gamma, rng)
        }
        TopologyModel::WattsStrogatz { k, p } => watts_strogatz(nodes, k, p, rng),
        TopologyModel::BarabasiAlbert { m } => barabasi_albert(nodes, m, rng),
    }
}

// ============================================================================
// Scale-Free (directed growth)
// ============================================================================

fn scale_free(
    nodes: usize,
    alpha: f64,
    beta: f64,
    gamma: f64,
    rng: &mut StdRng,
) -> Result<ChannelGraph, GenError> {
    if alpha <= 0.0 {
        return Err(GenError::Config("scale-free alpha must be > 0".to_string()));
    }
    if gamma <= 0.0 {
        return Err(GenError::Config("scale-free gamma must be > 0".to_string()));
    }
    if beta < 0.0 {
        return Err(GenError::Config("scale-free beta must be >= 0".to_string()));
    }
    if ((alpha + beta + gamma) - 1.0).abs() > 1e-9 {
        return Err(GenError::Config(format!(
            "scale-free alpha + beta + gamma must sum to 1, got {}",
            alpha + beta + gamma
        )));
    }

    // Seed cycle; growth cannot go below it.
    let mut graph = ChannelGraph::new(true);
    graph.add_edge(0, 1);
    graph.add_edge(1, 2);
    graph.add_edge(2, 0);

    while graph.node_count() < nodes {
        let r: f64 = rng.gen();

        if r < alpha {
            // new source node, target chosen by in-degree
            let target = choose_by_degree(&graph, Degree::In, SCALE_FREE_DELTA_IN, rng);
            let source = graph.node_count() as NodeId;
            graph.add_edge(source, target);
        } else if r < alpha + beta {
            // wire two existing nodes; may produce self-loops and
            // parallel edges
            let source = choose_by_degree(&graph, Degree::Out, SCALE_FREE_DELTA_OUT, rng);
            let target = choose_by_degree(&graph, Degree::In, SCALE_FREE_DELTA_IN, rng);
            graph.add_edge(source, target);
        } else {
            // new target node, source chosen by out-degree
            let source = choose_by_degree(&graph, Degree::Out, SCALE_FREE_DELTA_OUT, rng);
            let target = graph.node_count() as NodeId;
            graph.add_edge(source, target);
        }
    }

    Ok(graph)
}

enum Degree {
    In,
    Out,
}

/// Picks an existing node with probability proportional to degree + delta.
fn choose_by_degree(graph: &ChannelGraph, degree: Degree, delta: f64, rng: &mut StdRng) -> NodeId {
    let total = graph.edge_count() as f64 + delta * graph.node_count() as f64;
    let mut threshold: f64 = rng.gen::<f64>() * total;

    let mut chosen = 0;
    for node in graph.nodes() {
        chosen = node;
        let weight = match degree {
            Degree::In => graph.in_degree(node) as f64,
            Degree::Out => graph.out_degree(node) as f64,
        } + delta;
        if threshold < weight {
            return node;
        }
        threshold -= weight;
    }

    // float round-off can walk past the last node
    chosen
}

// ============================================================================
// Watts-Strogatz (small world)
// ============================================================================

fn watts_strogatz(
    nodes: usize,
    k: usize,
    p: f64,
    rng: &mut StdRng,
) -> Result<ChannelGraph, GenError> {
    if k >= nodes {
        return Err(GenError::Config(format!(
            "watts-strogatz requires k < n, got k={} n={}",
            k, nodes
        )));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(GenError::Config(format!(
            "watts-strogatz rewiring probability must be in [0, 1], got {}",
            p
        )));
    }

    // ring lattice: each node connected to its k/2 nearest neighbors on
    // each side
    let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); nodes];
    for j in 1..=k / 2 {
        for i in 0..nodes {
            let other = (i + j) % nodes;
            adjacency[i].insert(other);
            adjacency[other].insert(i);
        }
    }

    // rewire each lattice edge with probability p
    for j in 1..=k / 2 {
        for u in 0..nodes {
            if !rng.gen_bool(p) {
                continue;
            }
            // a fully connected node has nowhere to rewire to
            if adjacency[u].len() >= nodes - 1 {
                continue;
            }
            let v = (u + j) % nodes;
            let mut w = rng.gen_range(0..nodes);
            while w == u || adjacency[u].contains(&w) {
                w = rng.gen_range(0..nodes);
            }
            adjacency[u].remove(&v);
            adjacency[v].remove(&u);
            adjacency[u].insert(w);
            adjacency[w].insert(u);
        }
    }

    let mut graph = ChannelGraph::new(false);
    for node in 0..nodes {
        graph.add_node(node as NodeId);
    }
    for (u, neighbors) in adjacency.iter().enumerate() {
        for &v in neighbors.iter().filter(|&&v| v > u) {
            graph.add_edge(u as NodeId, v as NodeId);
        }
    }

    Ok(graph)
}

// ============================================================================
// Barabasi-Albert (preferential attachment)
// ============================================================================

fn barabasi_albert(nodes: usize, m: usize, rng: &mut StdRng) -> Result<ChannelGraph, GenError> {
    if m < 1 || m >= nodes {
        return Err(GenError::Config(format!(
            "barabasi-albert requires 1 <= m < n, got m={} n={}",
            m, nodes
        )));
    }

    let mut graph = ChannelGraph::new(false);
    for node in 0..nodes {
        graph.add_node(node as NodeId);
    }

    // Attachment by degree via the repeated-nodes scheme: every edge
    // endpoint is pushed onto the list, so a uniform pick from it is a
    // degree-proportional pick.
    let mut targets: Vec<NodeId> = (0..m as NodeId).collect();
    let mut repeated: Vec<NodeId> = Vec::new();

    for source in m..nodes {
        let source = source as NodeId;
        for &target in &targets {
            graph.add_edge(source, target);
        }
        repeated.extend_from_slice(&targets);
        repeated.extend(std::iter::repeat(source).take(m));
        targets = random_subset(&repeated, m, rng);
    }

    Ok(graph)
}

/// `m` distinct values uniformly from `pool` (with multiplicity).
fn random_subset(pool: &[NodeId], m: usize, rng: &mut StdRng) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    let mut subset = Vec::with_capacity(m);
    while subset.len() < m {
        let candidate = pool[rng.gen_range(0..pool.len())];
        if seen.insert(candidate) {
            subset.push(candidate);
        }
    }
    subset
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::from_seed([0u8; 32])
    }

    #[test]
    fn test_watts_strogatz_ring_lattice() {
        // k=2, p=0: a plain ring, one lattice edge per node
        let graph = synthesize(
            &TopologyModel::WattsStrogatz { k: 2, p: 0.0 },
            4,
            &mut rng(),
        )
        .unwrap();

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_watts_strogatz_preserves_edge_count_under_rewiring() {
        let graph = synthesize(
            &TopologyModel::WattsStrogatz { k: 4, p: 0.5 },
            20,
            &mut rng(),
        )
        .unwrap();

        // rewiring moves edges, never adds or removes them
        assert_eq!(graph.node_count(), 20);
        assert_eq!(graph.edge_count(), 20 * 2);
        for edge in graph.edges() {
            assert_ne!(edge.source, edge.target);
        }
    }

    #[test]
    fn test_watts_strogatz_rejects_k_not_less_than_n() {
        let result = synthesize(
            &TopologyModel::WattsStrogatz { k: 10, p: 0.1 },
            10,
            &mut rng(),
        );
        assert!(matches!(result, Err(GenError::Config(_))));
    }

    #[test]
    fn test_watts_strogatz_rejects_bad_probability() {
        let result = synthesize(
            &TopologyModel::WattsStrogatz { k: 2, p: 1.5 },
            10,
            &mut rng(),
        );
        assert!(matches!(result, Err(GenError::Config(_))));
    }

    #[test]
    fn test_barabasi_albert_counts() {
        let graph = synthesize(&TopologyModel::BarabasiAlbert { m: 2 }, 30, &mut rng()).unwrap();

        assert_eq!(graph.node_count(), 30);
        // each of the n - m arriving nodes brings m edges
        assert_eq!(graph.edge_count(), (30 - 2) * 2);
    }

    #[test]
    fn test_barabasi_albert_targets_are_distinct() {
        let graph = synthesize(&TopologyModel::BarabasiAlbert { m: 3 }, 40, &mut rng()).unwrap();

        // no parallel edges in a simple graph: each (source, target)
        // pair appears once
        let mut seen = HashSet::new();
        for edge in graph.edges() {
            assert!(seen.insert((edge.source, edge.target)));
        }
    }

    #[test]
    fn test_barabasi_albert_rejects_bad_m() {
        assert!(matches!(
            synthesize(&TopologyModel::BarabasiAlbert { m: 0 }, 10, &mut rng()),
            Err(GenError::Config(_))
        ));
        assert!(matches!(
            synthesize(&TopologyModel::BarabasiAlbert { m: 10 }, 10, &mut rng()),
            Err(GenError::Config(_))
        ));
    }

    #[test]
    fn test_scale_free_reaches_requested_node_count() {
        let graph = synthesize(
            &TopologyModel::ScaleFree {
                alpha: 0.5,
                beta: 0.00001,
                gamma: 0.49999,
            },
            50,
            &mut rng(),
        )
        .unwrap();

        assert_eq!(graph.node_count(), 50);
        assert!(graph.is_multigraph());
        // growth adds one edge per step on top of the seed cycle
        assert!(graph.edge_count() >= 50 - 3 + 3);
    }

    #[test]
    fn test_scale_free_normalizes_cleanly() {
        // beta-heavy growth produces self-loops and parallel edges;
        // normalization must clear the former and mirror the latter
        let mut graph = synthesize(
            &TopologyModel::ScaleFree {
                alpha: 0.41,
                beta: 0.54,
                gamma: 0.05,
            },
            40,
            &mut rng(),
        )
        .unwrap();
        graph.normalize();

        for edge in graph.edges() {
            assert_ne!(edge.source, edge.target);
            assert!(graph.has_edge(edge.target, edge.source));
        }
    }

    #[test]
    fn test_scale_free_rejects_probabilities_not_summing_to_one() {
        let result = synthesize(
            &TopologyModel::ScaleFree {
                alpha: 0.5,
                beta: 0.5,
                gamma: 0.5,
            },
            10,
            &mut rng(),
        );
        assert!(matches!(result, Err(GenError::Config(_))));
    }

    #[test]
    fn test_scale_free_small_n_returns_seed_cycle() {
        let graph = synthesize(
            &TopologyModel::ScaleFree {
                alpha: 0.5,
                beta: 0.00001,
                gamma: 0.49999,
            },
            2,
            &mut rng(),
        )
        .unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_synthesis_is_deterministic_for_a_seed() {
        let model = TopologyModel::BarabasiAlbert { m: 2 };
        let a = synthesize(&model, 25, &mut rng()).unwrap();
        let b = synthesize(&model, 25, &mut rng()).unwrap();

        assert_eq!(a.edges(), b.edges());
    }
}
