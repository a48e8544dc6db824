use pagemap::handlers::*;
use pagemap::{Config, RetrySettings};
use pagemap_core::export::ExportFormat;
use pagemap_core::{LayoutConfig, LayoutPolicy, LayoutResult};
use pagemap_stream::{ActivityKind, SessionStatus};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const GRAPH: &str = r#"{
  "nodes": [
    {"id": "home", "url": "/", "title": "Home", "elementCount": 40},
    {"id": "products", "url": "/products"},
    {"id": "cart", "url": "/cart"}
  ],
  "edges": [
    {"source": "home", "target": "products"},
    {"source": "products", "target": "cart"},
    {"source": "cart", "target": "checkout"}
  ]
}"#;

fn graph_file() -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{}", GRAPH).unwrap();
    temp_file
}

// ============================================================================
// Graph loading and layout rendering
// ============================================================================

#[test]
fn test_load_graph_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp_file = graph_file();
    let graph = load_graph_from_file(temp_file.path())?;

    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.edges.len(), 3);
    assert_eq!(graph.nodes[0].element_count, 40);
    assert_eq!(graph.nodes[1].title, "");

    Ok(())
}

#[test]
fn test_load_graph_from_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.json");
    let err = load_graph_from_file(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("nope.json"));
}

#[test]
fn test_load_graph_with_invalid_json() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "{{\"nodes\": [").unwrap();
    let err = load_graph_from_file(temp_file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Invalid page graph"));
}

#[test]
fn test_render_layout_json_covers_every_node() {
    let temp_file = graph_file();
    let graph = load_graph_from_file(temp_file.path()).unwrap();

    let rendered = render_layout(
        &graph,
        LayoutConfig::default(),
        LayoutPolicy::Hierarchical,
        None,
        ExportFormat::Json,
    )
    .unwrap();
    let result: LayoutResult = serde_json::from_str(&rendered).unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result.edges.len(), 3);
    assert_eq!(result.layer("home"), Some(0));
    assert_eq!(result.layer("cart"), Some(2));
}

#[test]
fn test_render_layout_csv_with_root() {
    let temp_file = graph_file();
    let graph = load_graph_from_file(temp_file.path()).unwrap();

    let rendered = render_layout(
        &graph,
        LayoutConfig::default(),
        LayoutPolicy::Radial,
        Some("products"),
        ExportFormat::Csv,
    )
    .unwrap();
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[0], "id,url,x,y,layer");
    assert_eq!(lines.len(), 4);
    // home cannot be reached from products and lands on the outer ring
    assert!(lines[1].starts_with("home,/,") && lines[1].ends_with(",2"));
    assert!(lines[2].ends_with(",0"));
}

#[test]
fn test_seeded_force_layout_is_reproducible() {
    let temp_file = graph_file();
    let graph = load_graph_from_file(temp_file.path()).unwrap();
    let config = LayoutConfig::default().with_seed(11);

    let first = render_layout(
        &graph,
        config.clone(),
        LayoutPolicy::ForceDirected,
        None,
        ExportFormat::Csv,
    )
    .unwrap();
    let second = render_layout(
        &graph,
        config,
        LayoutPolicy::ForceDirected,
        None,
        ExportFormat::Csv,
    )
    .unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_write_default_config_creates_parents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let written = write_default_config(&path).unwrap();
    assert!(path.exists());

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, written);
    assert_eq!(loaded.retry, RetrySettings::default());
}

#[test]
fn test_missing_config_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_invalid_config_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "not json").unwrap();
    assert!(Config::load(temp_file.path()).is_err());
}

// ============================================================================
// Watch output
// ============================================================================

#[test]
fn test_unseen_activity() {
    let mut status = SessionStatus::new("s1");
    status.log(ActivityKind::Info, "one");
    status.log(ActivityKind::Success, "two");

    assert_eq!(unseen_activity(&status.activity, None).len(), 2);

    let last = status.activity[1].clone();
    status.log(ActivityKind::Warning, "three");
    let unseen = unseen_activity(&status.activity, Some(&last));
    assert_eq!(unseen.len(), 1);
    assert_eq!(unseen[0].message, "three");

    let newest = status.activity.last().cloned();
    assert!(unseen_activity(&status.activity, newest.as_ref()).is_empty());
}

#[test]
fn test_status_summary() {
    let mut status = SessionStatus::new("s1");
    status.pages_found = 4;
    status.current_page = Some("/checkout".to_string());

    let summary = status_summary(&status);
    assert!(summary.starts_with("pending"));
    assert!(summary.contains("pages 4"));
    assert!(summary.ends_with("/checkout"));
}
