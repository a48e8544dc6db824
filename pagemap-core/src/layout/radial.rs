// Radial layout: BFS rings around a root page.
//
// Ring k sits on a circle of radius k * ring_spacing with its members evenly spaced, starting at
// 12 o'clock and going clockwise (screen coordinates, y grows downwards). Pages the root cannot
// reach share one ring just outside the farthest reachable ring.

use super::{LayoutConfig, PageGraph, translate_to_margin};
use crate::model::Position;
use petgraph::graph::NodeIndex;
use std::collections::VecDeque;
use std::f64::consts::{FRAC_PI_2, TAU};

/// Ring of every node, indexed like the input nodes.
pub fn assign_rings(graph: &PageGraph, root: usize) -> Vec<usize> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let root = if root < n { root } else { 0 };
    let mut distances: Vec<Option<usize>> = vec![None; n];
    let mut queue = VecDeque::new();
    distances[root] = Some(0);
    queue.push_back(root);

    while let Some(current) = queue.pop_front() {
        let next = distances[current].unwrap_or(0) + 1;
        for neighbour in graph.graph.neighbors(NodeIndex::new(current)) {
            let slot = &mut distances[neighbour.index()];
            if slot.is_none() {
                *slot = Some(next);
                queue.push_back(neighbour.index());
            }
        }
    }

    let outer = distances.iter().flatten().copied().max().unwrap_or(0) + 1;
    distances
        .into_iter()
        .map(|d| d.unwrap_or(outer))
        .collect()
}

/// Centre point of each node, root at the origin.
pub fn ring_points(rings: &[usize], ring_spacing: f64) -> Vec<Position> {
    let ring_count = rings.iter().copied().max().map_or(0, |r| r + 1);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); ring_count];
    for (idx, &ring) in rings.iter().enumerate() {
        members[ring].push(idx);
    }

    let mut points = vec![Position::default(); rings.len()];
    for (ring, nodes) in members.iter().enumerate() {
        if ring == 0 {
            continue;
        }
        let radius = ring as f64 * ring_spacing;
        let count = nodes.len() as f64;
        for (i, &node) in nodes.iter().enumerate() {
            let angle = -FRAC_PI_2 + TAU * i as f64 / count;
            points[node] = Position::new(radius * angle.cos(), radius * angle.sin());
        }
    }
    points
}

pub(crate) fn layout(
    graph: &PageGraph,
    root: usize,
    config: &LayoutConfig,
) -> (Vec<Position>, Vec<usize>) {
    let rings = assign_rings(graph, root);
    let mut positions = ring_points(&rings, config.ring_spacing);

    let half_w = config.node_width / 2.0;
    let half_h = config.node_height / 2.0;
    for p in positions.iter_mut() {
        p.x -= half_w;
        p.y -= half_h;
    }

    translate_to_margin(&mut positions, 0.0);
    (positions, rings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, PageNode};

    fn nodes(ids: &[&str]) -> Vec<PageNode> {
        ids.iter().map(|id| PageNode::new(*id, "/")).collect()
    }

    #[test]
    fn test_rings_follow_outgoing_edges_only() {
        let nodes = nodes(&["a", "b", "c"]);
        // c -> a points at the root, so c is unreachable from a
        let edges = vec![Edge::new("a", "b"), Edge::new("c", "a")];
        let graph = PageGraph::build(&nodes, &edges);
        assert_eq!(assign_rings(&graph, 0), vec![0, 1, 2]);
    }

    #[test]
    fn test_shortest_hop_count() {
        let nodes = nodes(&["a", "b", "c", "d"]);
        let edges = vec![
            Edge::new("a", "b"),
            Edge::new("b", "c"),
            Edge::new("c", "d"),
            Edge::new("a", "d"),
        ];
        let graph = PageGraph::build(&nodes, &edges);
        assert_eq!(assign_rings(&graph, 0), vec![0, 1, 2, 1]);
    }

    #[test]
    fn test_first_member_at_twelve_o_clock() {
        let points = ring_points(&[0, 1, 1, 1, 1], 100.0);
        assert_eq!(points[0], Position::new(0.0, 0.0));
        assert!(points[1].x.abs() < 1e-9);
        assert!((points[1].y + 100.0).abs() < 1e-9);
        // clockwise on screen: second member at 3 o'clock
        assert!((points[2].x - 100.0).abs() < 1e-9);
        assert!(points[2].y.abs() < 1e-9);
    }

    #[test]
    fn test_isolated_root_only() {
        let nodes = nodes(&["solo"]);
        let graph = PageGraph::build(&nodes, &[]);
        let (positions, rings) = layout(&graph, 0, &LayoutConfig::default());
        assert_eq!(rings, vec![0]);
        assert_eq!(positions[0], Position::new(0.0, 0.0));
    }
}
