use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A page found during a discovery crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNode {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub element_count: u32,
    #[serde(default)]
    pub form_count: u32,
    #[serde(default)]
    pub link_count: u32,
    /// Distance from the crawl root, as reported by the crawler.
    #[serde(default)]
    pub depth: u32,
}

impl PageNode {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: String::new(),
            category: String::new(),
            element_count: 0,
            form_count: 0,
            link_count: 0,
            depth: 0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_counts(mut self, elements: u32, forms: u32, links: u32) -> Self {
        self.element_count = elements;
        self.form_count = forms;
        self.link_count = links;
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }
}

/// Directed navigational relationship between two pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutPolicy {
    Hierarchical,
    ForceDirected,
    Radial,
}

impl LayoutPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutPolicy::Hierarchical => "hierarchical",
            LayoutPolicy::ForceDirected => "force-directed",
            LayoutPolicy::Radial => "radial",
        }
    }
}

impl fmt::Display for LayoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hierarchical" | "tree" => Ok(LayoutPolicy::Hierarchical),
            "force-directed" | "force" | "forcedirected" => Ok(LayoutPolicy::ForceDirected),
            "radial" => Ok(LayoutPolicy::Radial),
            other => Err(format!("Unknown layout policy: {}", other)),
        }
    }
}

/// Axis-aligned extent of a layout, node boxes included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl LayoutBounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Output of a layout call: one position per input node plus the untouched edge list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub policy: LayoutPolicy,
    pub positions: BTreeMap<String, Position>,
    /// Rank (hierarchical) or ring (radial) per node. Empty for force-directed.
    pub layers: BTreeMap<String, usize>,
    pub edges: Vec<Edge>,
    /// Box size used for `bounds()`
    #[serde(default)]
    pub node_size: (f64, f64),
}

impl LayoutResult {
    pub fn empty(policy: LayoutPolicy, edges: &[Edge]) -> Self {
        Self {
            policy,
            positions: BTreeMap::new(),
            layers: BTreeMap::new(),
            edges: edges.to_vec(),
            node_size: (0.0, 0.0),
        }
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.positions.get(id).copied()
    }

    pub fn layer(&self, id: &str) -> Option<usize> {
        self.layers.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn bounds(&self) -> Option<LayoutBounds> {
        let (w, h) = self.node_size;
        let mut iter = self.positions.values();
        let first = iter.next()?;
        let mut bounds = LayoutBounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x + w,
            max_y: first.y + h,
        };
        for p in iter {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x + w);
            bounds.max_y = bounds.max_y.max(p.y + h);
        }
        Some(bounds)
    }
}

/// A page graph as delivered by the discovery backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphInput {
    #[serde(default)]
    pub nodes: Vec<PageNode>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphInput {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
