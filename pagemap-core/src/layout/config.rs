use serde::{Deserialize, Serialize};

/// Tunable layout constants.
///
/// None of these values is load-bearing: the force-directed constants in particular only need to
/// keep connected pages closer together than unconnected ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width of a node box
    pub node_width: f64,
    /// Height of a node box
    pub node_height: f64,
    /// Horizontal gap between boxes in the same rank
    pub node_spacing: f64,
    /// Vertical gap between ranks
    pub rank_spacing: f64,
    /// Number of barycenter sweeps used to reduce crossings
    pub ordering_passes: usize,
    /// Radius increment between radial rings
    pub ring_spacing: f64,
    /// Force-directed simulation rounds
    pub iterations: usize,
    pub repulsion: f64,
    pub attraction: f64,
    /// Step cap of the first force-directed round; cools linearly to zero
    pub max_displacement: f64,
    /// Cell size of the initial force-directed grid
    pub grid_spacing: f64,
    /// Maximum absolute jitter added to each initial grid coordinate
    pub jitter: f64,
    /// Offset of the top-left-most node after a force-directed run
    pub margin: f64,
    /// Fixed seed for the force-directed jitter. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 180.0,
            node_height: 60.0,
            node_spacing: 50.0,
            rank_spacing: 100.0,
            ordering_passes: 4,
            ring_spacing: 220.0,
            iterations: 300,
            repulsion: 8_000_000.0,
            attraction: 0.05,
            max_displacement: 400.0,
            grid_spacing: 200.0,
            jitter: 20.0,
            margin: 50.0,
            seed: None,
        }
    }
}

impl LayoutConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_node_size(mut self, width: f64, height: f64) -> Self {
        self.node_width = width;
        self.node_height = height;
        self
    }
}
