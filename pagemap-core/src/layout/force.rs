//! Spring simulation layout.
//!
//! Nodes start on a jittered grid, then every round all pairs repel with `k_repel / d^2` and every
//! edge pulls its endpoints together with `k_attract * d`. Displacements are accumulated per round
//! and applied together, each capped by a step size that cools linearly to zero. O(n^2) per round,
//! fine for the tens to low hundreds of pages a single application produces.
//!
//! Grid cells are handed out component by component, so pages that link to each other start out
//! as neighbours whatever order the crawler reported them in.

use super::{LayoutConfig, PageGraph, translate_to_margin};
use crate::model::Position;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use rand::Rng;
use std::collections::VecDeque;

/// Node indices grouped by weakly connected component, breadth first from the lowest index.
pub fn component_order(graph: &PageGraph) -> Vec<usize> {
    let n = graph.node_count();
    let mut seen = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut queue = VecDeque::new();

    for start in 0..n {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            order.push(current);
            for neighbour in graph.graph.neighbors_undirected(NodeIndex::new(current)) {
                let index = neighbour.index();
                if !seen[index] {
                    seen[index] = true;
                    queue.push_back(index);
                }
            }
        }
    }
    order
}

/// Jittered grid with `ceil(sqrt(n))` columns. `order[k]` is the node placed in cell `k`.
pub fn initial_grid<R: Rng>(order: &[usize], config: &LayoutConfig, rng: &mut R) -> Vec<Position> {
    let count = order.len();
    let cols = (count as f64).sqrt().ceil().max(1.0) as usize;
    let mut positions = vec![Position::default(); count];
    for (cell, &node) in order.iter().enumerate() {
        let mut x = (cell % cols) as f64 * config.grid_spacing;
        let mut y = (cell / cols) as f64 * config.grid_spacing;
        if config.jitter > 0.0 {
            x += rng.random_range(-config.jitter..=config.jitter);
            y += rng.random_range(-config.jitter..=config.jitter);
        }
        positions[node] = Position::new(x, y);
    }
    positions
}

/// Largest move allowed in `round`.
pub fn step_limit(round: usize, config: &LayoutConfig) -> f64 {
    let iterations = config.iterations.max(1) as f64;
    config.max_displacement * (1.0 - round as f64 / iterations)
}

/// Run one simulation round in place. No node moves further than `limit`.
pub fn step(
    positions: &mut [Position],
    links: &[(usize, usize)],
    config: &LayoutConfig,
    limit: f64,
) {
    let n = positions.len();
    let mut disp = vec![(0.0f64, 0.0f64); n];

    for i in 0..n {
        for j in (i + 1)..n {
            let dx = positions[i].x - positions[j].x;
            let dy = positions[i].y - positions[j].y;
            // coincident nodes count as distance 1
            let dist = (dx * dx + dy * dy).sqrt().max(1.0);
            let force = config.repulsion / (dist * dist);
            let fx = dx / dist * force;
            let fy = dy / dist * force;
            disp[i].0 += fx;
            disp[i].1 += fy;
            disp[j].0 -= fx;
            disp[j].1 -= fy;
        }
    }

    for &(s, t) in links {
        let dx = positions[t].x - positions[s].x;
        let dy = positions[t].y - positions[s].y;
        let dist = (dx * dx + dy * dy).sqrt().max(1.0);
        let force = config.attraction * dist;
        let fx = dx / dist * force;
        let fy = dy / dist * force;
        disp[s].0 += fx;
        disp[s].1 += fy;
        disp[t].0 -= fx;
        disp[t].1 -= fy;
    }

    for (p, (mut dx, mut dy)) in positions.iter_mut().zip(disp) {
        let length = (dx * dx + dy * dy).sqrt();
        if length > limit {
            dx = dx / length * limit;
            dy = dy / length * limit;
        }
        p.x += dx;
        p.y += dy;
    }
}

pub(crate) fn layout<R: Rng>(graph: &PageGraph, config: &LayoutConfig, rng: &mut R) -> Vec<Position> {
    let links: Vec<(usize, usize)> = graph
        .graph
        .edge_references()
        .map(|e| (e.source().index(), e.target().index()))
        .filter(|(s, t)| s != t)
        .collect();

    let order = component_order(graph);
    let mut positions = initial_grid(&order, config, rng);
    for round in 0..config.iterations {
        step(&mut positions, &links, config, step_limit(round, config));
    }

    translate_to_margin(&mut positions, config.margin);
    positions
}
