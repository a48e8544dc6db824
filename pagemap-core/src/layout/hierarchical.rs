//! Layered placement for page graphs.
//!
//! 1. Cycle breaking: DFS from nodes in input order, back edges are dropped
//! 2. Rank assignment: longest path over the remaining DAG
//! 3. Node ordering: alternating barycenter sweeps
//! 4. Coordinate assignment: fixed box size and spacing, ranks centred on the widest one

use super::{LayoutConfig, PageGraph, translate_to_margin};
use crate::model::Position;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{DfsEvent, EdgeRef, depth_first_search};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Rank of every node, indexed like the input nodes.
///
/// For an acyclic edge set `rank(target) > rank(source)` holds for every edge.
pub fn assign_ranks(graph: &PageGraph) -> Vec<usize> {
    let n = graph.node_count();
    let mut back_edges: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();

    depth_first_search(&graph.graph, graph.graph.node_indices(), |event| {
        if let DfsEvent::BackEdge(u, v) = event {
            back_edges.insert((u, v));
        }
    });

    if !back_edges.is_empty() {
        debug!("Breaking {} cycle edges before ranking", back_edges.len());
    }

    let mut dag: DiGraph<(), ()> = DiGraph::with_capacity(n, graph.graph.edge_count());
    for _ in 0..n {
        dag.add_node(());
    }
    for edge in graph.graph.edge_references() {
        let (u, v) = (edge.source(), edge.target());
        if u != v && !back_edges.contains(&(u, v)) {
            dag.add_edge(u, v, ());
        }
    }

    let mut ranks = vec![0usize; n];
    match toposort(&dag, None) {
        Ok(order) => {
            for u in order {
                let next = ranks[u.index()] + 1;
                for v in dag.neighbors(u) {
                    if ranks[v.index()] < next {
                        ranks[v.index()] = next;
                    }
                }
            }
        }
        Err(cycle) => {
            warn!(
                "Graph still cyclic at node {} after cycle breaking, using a single rank",
                cycle.node_id().index()
            );
        }
    }
    ranks
}

/// Order of nodes within each rank after crossing reduction.
pub fn order_ranks(graph: &PageGraph, ranks: &[usize], passes: usize) -> Vec<Vec<usize>> {
    let rank_count = ranks.iter().copied().max().map_or(0, |r| r + 1);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
    for (idx, &rank) in ranks.iter().enumerate() {
        layers[rank].push(idx);
    }

    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); ranks.len()];
    for edge in graph.graph.edge_references() {
        let (u, v) = (edge.source().index(), edge.target().index());
        if u != v {
            neighbours[u].push(v);
            neighbours[v].push(u);
        }
    }

    // slot[node] = index of node within its rank
    let mut slot = vec![0usize; ranks.len()];
    for layer in &layers {
        for (i, &node) in layer.iter().enumerate() {
            slot[node] = i;
        }
    }

    for pass in 0..passes {
        let downward = pass % 2 == 0;
        let sweep: Vec<usize> = if downward {
            (1..rank_count).collect()
        } else {
            (0..rank_count.saturating_sub(1)).rev().collect()
        };

        for r in sweep {
            let mut keyed: Vec<(f64, usize)> = layers[r]
                .iter()
                .map(|&node| {
                    let fixed: Vec<usize> = neighbours[node]
                        .iter()
                        .copied()
                        .filter(|&other| {
                            if downward {
                                ranks[other] < r
                            } else {
                                ranks[other] > r
                            }
                        })
                        .collect();
                    let barycenter = if fixed.is_empty() {
                        slot[node] as f64
                    } else {
                        fixed.iter().map(|&o| slot[o] as f64).sum::<f64>() / fixed.len() as f64
                    };
                    (barycenter, node)
                })
                .collect();

            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            layers[r] = keyed.into_iter().map(|(_, node)| node).collect();
            for (i, &node) in layers[r].iter().enumerate() {
                slot[node] = i;
            }
        }
    }

    layers
}

pub(crate) fn layout(graph: &PageGraph, config: &LayoutConfig) -> (Vec<Position>, Vec<usize>) {
    let ranks = assign_ranks(graph);
    let layers = order_ranks(graph, &ranks, config.ordering_passes);

    let step_x = config.node_width + config.node_spacing;
    let step_y = config.node_height + config.rank_spacing;
    let rank_width = |count: usize| {
        if count == 0 {
            0.0
        } else {
            count as f64 * config.node_width + (count - 1) as f64 * config.node_spacing
        }
    };
    let widest = layers
        .iter()
        .map(|layer| rank_width(layer.len()))
        .fold(0.0, f64::max);

    let mut positions = vec![Position::default(); graph.node_count()];
    for (rank, layer) in layers.iter().enumerate() {
        let offset = (widest - rank_width(layer.len())) / 2.0;
        for (i, &node) in layer.iter().enumerate() {
            positions[node] = Position::new(offset + i as f64 * step_x, rank as f64 * step_y);
        }
    }

    translate_to_margin(&mut positions, 0.0);
    (positions, ranks)
}
