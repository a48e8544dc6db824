// Tests for the page graph layout engine

use pagemap_core::layout::{LayoutConfig, LayoutEngine};
use pagemap_core::{Edge, LayoutPolicy, LayoutResult, PageNode, layout};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ALL_POLICIES: [LayoutPolicy; 3] = [
    LayoutPolicy::Hierarchical,
    LayoutPolicy::ForceDirected,
    LayoutPolicy::Radial,
];

fn nodes(ids: &[&str]) -> Vec<PageNode> {
    ids.iter()
        .map(|id| PageNode::new(*id, format!("https://app.example.com/{}", id)))
        .collect()
}

fn edges(pairs: &[(&str, &str)]) -> Vec<Edge> {
    pairs.iter().map(|(s, t)| Edge::new(*s, *t)).collect()
}

fn seeded_engine(seed: u64) -> LayoutEngine {
    LayoutEngine::new(LayoutConfig::default().with_seed(seed))
}

fn assert_non_negative(result: &LayoutResult) {
    for (id, pos) in &result.positions {
        assert!(pos.x >= 0.0, "{} has negative x {}", id, pos.x);
        assert!(pos.y >= 0.0, "{} has negative y {}", id, pos.y);
    }
}

fn mean_distance(result: &LayoutResult, pairs: &[(&str, &str)]) -> f64 {
    let total: f64 = pairs
        .iter()
        .map(|(a, b)| {
            let pa = result.position(a).unwrap();
            let pb = result.position(b).unwrap();
            pa.distance(&pb)
        })
        .sum();
    total / pairs.len() as f64
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_empty_graph_hierarchical() {
    let result = layout(&[], &[], LayoutPolicy::Hierarchical, None);
    assert!(result.is_empty());
    assert!(result.edges.is_empty());
}

#[test]
fn test_chain_ranks_and_rows() {
    let nodes = nodes(&["a", "b", "c"]);
    let edges = edges(&[("a", "b"), ("b", "c")]);
    let result = layout(&nodes, &edges, LayoutPolicy::Hierarchical, None);

    assert_eq!(result.layer("a"), Some(0));
    assert_eq!(result.layer("b"), Some(1));
    assert_eq!(result.layer("c"), Some(2));

    let ya = result.position("a").unwrap().y;
    let yb = result.position("b").unwrap().y;
    let yc = result.position("c").unwrap().y;
    assert!(ya < yb && yb < yc);
}

#[test]
fn test_radial_rings_with_unreachable_page() {
    let nodes = nodes(&["a", "b", "c", "d"]);
    let edges = edges(&[("a", "b"), ("a", "c")]);
    let result = layout(&nodes, &edges, LayoutPolicy::Radial, Some("a"));

    assert_eq!(result.layer("a"), Some(0));
    assert_eq!(result.layer("b"), Some(1));
    assert_eq!(result.layer("c"), Some(1));
    // unreachable pages share the ring just outside the farthest reachable one
    assert_eq!(result.layer("d"), Some(2));
    let a = result.position("a").unwrap();
    let ring_spacing = LayoutConfig::default().ring_spacing;
    let dist = a.distance(&result.position("d").unwrap());
    assert!((dist - 2.0 * ring_spacing).abs() < 1e-6);
}

#[test]
fn test_duplicate_edges_pass_through() {
    let nodes = nodes(&["a", "b"]);
    let edges = edges(&[("a", "b"), ("a", "b")]);
    for policy in ALL_POLICIES {
        let result = seeded_engine(3).layout(&nodes, &edges, policy, None);
        assert_eq!(result.len(), 2);
        assert_eq!(result.edges, edges, "{} changed the edge list", policy);
    }
}

// ============================================================================
// Totality
// ============================================================================

#[test]
fn test_every_node_positioned_despite_bad_edges() {
    let nodes = nodes(&["home", "login", "cart", "orphan"]);
    let edges = edges(&[
        ("home", "login"),
        ("login", "login"),
        ("cart", "nowhere"),
        ("ghost", "home"),
        ("login", "home"),
    ]);

    for policy in ALL_POLICIES {
        let result = seeded_engine(11).layout(&nodes, &edges, policy, Some("home"));
        assert_eq!(result.len(), nodes.len());
        for node in &nodes {
            let pos = result.position(&node.id).unwrap();
            assert!(pos.x.is_finite() && pos.y.is_finite());
        }
        assert_eq!(result.edges.len(), 5);
    }
}

#[test]
fn test_single_node_every_policy() {
    let nodes = nodes(&["only"]);
    for policy in ALL_POLICIES {
        let result = layout(&nodes, &[], policy, None);
        assert_eq!(result.len(), 1);
        assert_non_negative(&result);
    }
}

#[test]
fn test_unknown_root_falls_back_to_first_node() {
    let nodes = nodes(&["first", "second"]);
    let edges = edges(&[("first", "second")]);
    let result = layout(&nodes, &edges, LayoutPolicy::Radial, Some("missing"));
    assert_eq!(result.layer("first"), Some(0));
    assert_eq!(result.layer("second"), Some(1));
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_hierarchical_and_radial_are_deterministic() {
    let nodes = nodes(&["a", "b", "c", "d", "e", "f"]);
    let edges = edges(&[
        ("a", "b"),
        ("a", "c"),
        ("c", "d"),
        ("d", "a"),
        ("b", "e"),
        ("e", "c"),
        ("f", "f"),
    ]);

    for policy in [LayoutPolicy::Hierarchical, LayoutPolicy::Radial] {
        let first = layout(&nodes, &edges, policy, Some("a"));
        for _ in 0..5 {
            let again = layout(&nodes, &edges, policy, Some("a"));
            assert_eq!(first.positions, again.positions);
            assert_eq!(first.layers, again.layers);
        }
    }
}

#[test]
fn test_force_directed_reproducible_with_seed() {
    let nodes = nodes(&["a", "b", "c", "d"]);
    let edges = edges(&[("a", "b"), ("b", "c"), ("c", "d")]);

    let first = seeded_engine(42).layout(&nodes, &edges, LayoutPolicy::ForceDirected, None);
    let second = seeded_engine(42).layout(&nodes, &edges, LayoutPolicy::ForceDirected, None);
    assert_eq!(first.positions, second.positions);

    let mut rng = StdRng::seed_from_u64(42);
    let injected = LayoutEngine::default().layout_with_rng(
        &nodes,
        &edges,
        LayoutPolicy::ForceDirected,
        None,
        &mut rng,
    );
    assert_eq!(first.positions, injected.positions);
    assert!(first.layers.is_empty());
}

// ============================================================================
// Rank monotonicity
// ============================================================================

#[test]
fn test_acyclic_edges_strictly_increase_rank() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..20 {
        let count = rng.random_range(2..30usize);
        let ids: Vec<String> = (0..count).map(|i| format!("p{}", i)).collect();
        let nodes: Vec<PageNode> = ids.iter().map(|id| PageNode::new(id.clone(), "/")).collect();

        // edges only point from lower to higher index, so the graph is acyclic
        let mut edges = Vec::new();
        for _ in 0..count * 2 {
            let a = rng.random_range(0..count);
            let b = rng.random_range(0..count);
            if a < b {
                edges.push(Edge::new(ids[a].clone(), ids[b].clone()));
            }
        }

        let result = layout(&nodes, &edges, LayoutPolicy::Hierarchical, None);
        for edge in &edges {
            let rs = result.layer(&edge.source).unwrap();
            let rt = result.layer(&edge.target).unwrap();
            assert!(rt > rs, "{} -> {} has ranks {} -> {}", edge.source, edge.target, rs, rt);
        }
        assert_non_negative(&result);
    }
}

#[test]
fn test_same_rank_shares_row() {
    let nodes = nodes(&["root", "x", "y", "z"]);
    let edges = edges(&[("root", "x"), ("root", "y"), ("root", "z")]);
    let result = layout(&nodes, &edges, LayoutPolicy::Hierarchical, None);
    let y = result.position("x").unwrap().y;
    assert_eq!(result.position("y").unwrap().y, y);
    assert_eq!(result.position("z").unwrap().y, y);
    assert!(result.position("x").unwrap().x < result.position("z").unwrap().x);
}

// ============================================================================
// Ring correctness
// ============================================================================

#[test]
fn test_rings_are_shortest_hop_counts() {
    let nodes = nodes(&["r", "a", "b", "c", "d", "u1", "u2"]);
    let edges = edges(&[
        ("r", "a"),
        ("a", "b"),
        ("b", "c"),
        ("r", "c"),
        ("c", "d"),
        ("d", "r"),
        ("u1", "u2"),
        ("u2", "r"),
    ]);
    let result = layout(&nodes, &edges, LayoutPolicy::Radial, Some("r"));

    assert_eq!(result.layer("r"), Some(0));
    assert_eq!(result.layer("a"), Some(1));
    assert_eq!(result.layer("c"), Some(1));
    assert_eq!(result.layer("b"), Some(2));
    assert_eq!(result.layer("d"), Some(2));

    let farthest_reachable = 2;
    assert!(result.layer("u1").unwrap() > farthest_reachable);
    assert!(result.layer("u2").unwrap() > farthest_reachable);
}

#[test]
fn test_ring_members_equidistant_from_root() {
    let nodes = nodes(&["hub", "a", "b", "c"]);
    let edges = edges(&[("hub", "a"), ("hub", "b"), ("hub", "c")]);
    let result = layout(&nodes, &edges, LayoutPolicy::Radial, Some("hub"));
    let hub = result.position("hub").unwrap();
    let da = hub.distance(&result.position("a").unwrap());
    let db = hub.distance(&result.position("b").unwrap());
    let dc = hub.distance(&result.position("c").unwrap());
    assert!((da - db).abs() < 1e-6);
    assert!((da - dc).abs() < 1e-6);
    assert!((da - LayoutConfig::default().ring_spacing).abs() < 1e-6);
}

// ============================================================================
// Connectivity bias
// ============================================================================

fn assert_clusters_hold_together(
    order: &[&str],
    edge_pairs: &[(&str, &str)],
    a: &[&str],
    b: &[&str],
    seeds: std::ops::Range<u64>,
) {
    let nodes = nodes(order);
    let edges = edges(edge_pairs);
    let pairs_within = |ids: &[&str]| -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (i, x) in ids.iter().enumerate() {
            for y in &ids[i + 1..] {
                out.push((x.to_string(), y.to_string()));
            }
        }
        out
    };
    let mut intra = pairs_within(a);
    intra.extend(pairs_within(b));
    let inter: Vec<(String, String)> = a
        .iter()
        .flat_map(|x| b.iter().map(move |y| (x.to_string(), y.to_string())))
        .collect();
    let intra: Vec<(&str, &str)> = intra.iter().map(|(x, y)| (x.as_str(), y.as_str())).collect();
    let inter: Vec<(&str, &str)> = inter.iter().map(|(x, y)| (x.as_str(), y.as_str())).collect();

    for seed in seeds {
        let result = seeded_engine(seed).layout(&nodes, &edges, LayoutPolicy::ForceDirected, None);
        let intra_mean = mean_distance(&result, &intra);
        let inter_mean = mean_distance(&result, &inter);
        assert!(
            intra_mean < inter_mean,
            "order {:?} seed {}: intra {} >= inter {}",
            order,
            seed,
            intra_mean,
            inter_mean
        );
    }
}

const TRIANGLES: [(&str, &str); 6] = [
    ("a1", "a2"),
    ("a2", "a3"),
    ("a3", "a1"),
    ("b1", "b2"),
    ("b2", "b3"),
    ("b3", "b1"),
];

const CHAINS: [(&str, &str); 4] = [("a1", "a2"), ("a2", "a3"), ("b1", "b2"), ("b2", "b3")];

#[test]
fn test_force_directed_keeps_clusters_together() {
    assert_clusters_hold_together(
        &["a1", "a2", "a3", "b1", "b2", "b3"],
        &TRIANGLES,
        &["a1", "a2", "a3"],
        &["b1", "b2", "b3"],
        0..8,
    );
}

#[test]
fn test_force_directed_clusters_with_interleaved_input() {
    let interleaved = ["a1", "b1", "a2", "b2", "a3", "b3"];
    let a = ["a1", "a2", "a3"];
    let b = ["b1", "b2", "b3"];
    assert_clusters_hold_together(&interleaved, &TRIANGLES, &a, &b, 0..20);
    assert_clusters_hold_together(&interleaved, &CHAINS, &a, &b, 0..20);
}

#[test]
fn test_force_directed_larger_interleaved_chains() {
    let a: Vec<String> = (0..8).map(|i| format!("a{}", i)).collect();
    let b: Vec<String> = (0..8).map(|i| format!("b{}", i)).collect();
    let order: Vec<&str> = a
        .iter()
        .zip(&b)
        .flat_map(|(x, y)| [x.as_str(), y.as_str()])
        .collect();
    let mut links: Vec<(&str, &str)> = Vec::new();
    for cluster in [&a, &b] {
        for pair in cluster.windows(2) {
            links.push((pair[0].as_str(), pair[1].as_str()));
        }
    }
    let a: Vec<&str> = a.iter().map(String::as_str).collect();
    let b: Vec<&str> = b.iter().map(String::as_str).collect();
    assert_clusters_hold_together(&order, &links, &a, &b, 0..5);
}

// ============================================================================
// Non-negativity
// ============================================================================

#[test]
fn test_all_policies_non_negative() {
    let nodes = nodes(&["a", "b", "c", "d", "e", "f", "g"]);
    let edges = edges(&[
        ("a", "b"),
        ("a", "c"),
        ("b", "d"),
        ("c", "d"),
        ("d", "e"),
        ("f", "g"),
    ]);
    for policy in ALL_POLICIES {
        for seed in 0..4 {
            let result = seeded_engine(seed).layout(&nodes, &edges, policy, Some("a"));
            assert_non_negative(&result);
        }
    }
}

#[test]
fn test_force_directed_respects_margin() {
    let config = LayoutConfig::default().with_seed(9);
    let margin = config.margin;
    let nodes = nodes(&["a", "b", "c"]);
    let edges = edges(&[("a", "b")]);
    let result = LayoutEngine::new(config).layout(&nodes, &edges, LayoutPolicy::ForceDirected, None);
    let min_x = result.positions.values().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = result.positions.values().map(|p| p.y).fold(f64::INFINITY, f64::min);
    assert!((min_x - margin).abs() < 1e-9);
    assert!((min_y - margin).abs() < 1e-9);
}
