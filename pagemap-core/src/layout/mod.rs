//! Page graph layout engine.
//!
//! Three policies share one entry point:
//! 1. `hierarchical` - layered placement (cycle breaking, longest-path ranks, barycenter ordering)
//! 2. `force-directed` - spring simulation seeded from a jittered grid
//! 3. `radial` - BFS rings around a root page
//!
//! The engine is pure: every call builds its own graph from the inputs and keeps nothing.

pub mod config;
pub mod force;
pub mod hierarchical;
pub mod radial;

use crate::model::{Edge, LayoutPolicy, LayoutResult, PageNode, Position};
use petgraph::graph::{DiGraph, NodeIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tracing::debug;

pub use config::LayoutConfig;

/// Directed graph over the input nodes. Node `i` of `graph` is `nodes[i]`.
pub struct PageGraph<'a> {
    pub graph: DiGraph<(), ()>,
    lookup: HashMap<&'a str, usize>,
    pub dangling: usize,
}

impl<'a> PageGraph<'a> {
    pub fn build(nodes: &'a [PageNode], edges: &[Edge]) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut lookup = HashMap::with_capacity(nodes.len());

        for (idx, node) in nodes.iter().enumerate() {
            graph.add_node(());
            lookup.insert(node.id.as_str(), idx);
        }

        let mut dangling = 0;
        for edge in edges {
            match (
                lookup.get(edge.source.as_str()),
                lookup.get(edge.target.as_str()),
            ) {
                (Some(&u), Some(&v)) => {
                    graph.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
                }
                _ => dangling += 1,
            }
        }

        if dangling > 0 {
            debug!("Ignoring {} edges with unknown endpoints", dangling);
        }

        Self {
            graph,
            lookup,
            dangling,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.lookup.get(id).copied()
    }

    /// Index of the requested root, or the first node when it is missing or unknown.
    pub fn root_index(&self, root_id: Option<&str>) -> usize {
        match root_id {
            Some(id) => self.index_of(id).unwrap_or_else(|| {
                debug!("Root '{}' not found, falling back to first node", id);
                0
            }),
            None => 0,
        }
    }
}

/// Shift all points so the smallest x and y land on `margin`.
pub fn translate_to_margin(points: &mut [Position], margin: f64) {
    if points.is_empty() {
        return;
    }

    let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let dx = margin - min_x;
    let dy = margin - min_y;

    for p in points.iter_mut() {
        p.x += dx;
        p.y += dy;
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out `nodes` with the configured seed, or an OS-seeded generator when none is set.
    pub fn layout(
        &self,
        nodes: &[PageNode],
        edges: &[Edge],
        policy: LayoutPolicy,
        root_id: Option<&str>,
    ) -> LayoutResult {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.layout_with_rng(nodes, edges, policy, root_id, &mut rng)
    }

    /// Lay out `nodes` drawing any randomness from `rng`.
    ///
    /// Only the force-directed policy consumes random numbers; the other two ignore `rng`.
    pub fn layout_with_rng<R: Rng>(
        &self,
        nodes: &[PageNode],
        edges: &[Edge],
        policy: LayoutPolicy,
        root_id: Option<&str>,
        rng: &mut R,
    ) -> LayoutResult {
        if nodes.is_empty() {
            return LayoutResult::empty(policy, edges);
        }

        let graph = PageGraph::build(nodes, edges);
        debug!(
            "Laying out {} nodes and {} edges ({})",
            graph.node_count(),
            graph.graph.edge_count(),
            policy
        );

        let (positions, layers) = match policy {
            LayoutPolicy::Hierarchical => {
                let (positions, ranks) = hierarchical::layout(&graph, &self.config);
                (positions, Some(ranks))
            }
            LayoutPolicy::ForceDirected => (force::layout(&graph, &self.config, rng), None),
            LayoutPolicy::Radial => {
                let root = graph.root_index(root_id);
                let (positions, rings) = radial::layout(&graph, root, &self.config);
                (positions, Some(rings))
            }
        };

        let mut result = LayoutResult::empty(policy, edges);
        result.node_size = (self.config.node_width, self.config.node_height);
        for (idx, node) in nodes.iter().enumerate() {
            result.positions.insert(node.id.clone(), positions[idx]);
            if let Some(ref layers) = layers {
                result.layers.insert(node.id.clone(), layers[idx]);
            }
        }
        result
    }
}

/// Lay out a page graph with the default configuration.
pub fn layout(
    nodes: &[PageNode],
    edges: &[Edge],
    policy: LayoutPolicy,
    root_id: Option<&str>,
) -> LayoutResult {
    LayoutEngine::default().layout(nodes, edges, policy, root_id)
}
