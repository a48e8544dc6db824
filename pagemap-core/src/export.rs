// Layout export in the formats the CLI can print or save

use crate::model::{Edge, LayoutResult, PageNode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ExportFormat::Text),
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            "markdown" | "md" => Some(ExportFormat::Markdown),
            _ => None,
        }
    }
}

/// Number of edges with at least one endpoint missing from `nodes`.
pub fn dangling_edges(nodes: &[PageNode], edges: &[Edge]) -> usize {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    edges
        .iter()
        .filter(|e| !ids.contains(e.source.as_str()) || !ids.contains(e.target.as_str()))
        .count()
}

pub fn export_layout(
    result: &LayoutResult,
    nodes: &[PageNode],
    format: ExportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ExportFormat::Text => Ok(generate_text_export(result, nodes)),
        ExportFormat::Json => generate_json_export(result),
        ExportFormat::Csv => Ok(generate_csv_export(result, nodes)),
        ExportFormat::Markdown => Ok(generate_markdown_export(result, nodes)),
    }
}

pub fn generate_text_export(result: &LayoutResult, nodes: &[PageNode]) -> String {
    let mut out = String::new();

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str(&format!("  PAGE GRAPH LAYOUT ({})\n", result.policy));
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    out.push_str(&format!("Pages:          {}\n", result.len()));
    out.push_str(&format!("Edges:          {}\n", result.edges.len()));
    out.push_str(&format!(
        "Dangling edges: {}\n",
        dangling_edges(nodes, &result.edges)
    ));
    if let Some(bounds) = result.bounds() {
        out.push_str(&format!(
            "Extent:         {:.0} x {:.0}\n",
            bounds.width(),
            bounds.height()
        ));
    }
    out.push('\n');

    for (label, group) in group_by_layer(result, nodes) {
        out.push_str(&format!("## {}\n", label));
        for (i, node) in group.iter().enumerate() {
            let prefix = if i == group.len() - 1 { "└── " } else { "├── " };
            let pos = result.position(&node.id).unwrap_or_default();
            out.push_str(&format!(
                "{}{} ({:.1}, {:.1})  {}\n",
                prefix, node.id, pos.x, pos.y, node.url
            ));
        }
        out.push('\n');
    }

    out
}

pub fn generate_json_export(result: &LayoutResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

pub fn generate_csv_export(result: &LayoutResult, nodes: &[PageNode]) -> String {
    let mut out = String::from("id,url,x,y,layer\n");
    for node in nodes {
        let Some(pos) = result.position(&node.id) else {
            continue;
        };
        let layer = result
            .layer(&node.id)
            .map(|l| l.to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "{},{},{:.2},{:.2},{}\n",
            escape_csv(&node.id),
            escape_csv(&node.url),
            pos.x,
            pos.y,
            layer
        ));
    }
    out
}

pub fn generate_markdown_export(result: &LayoutResult, nodes: &[PageNode]) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Page graph layout ({})\n\n", result.policy));
    out.push_str(&format!(
        "**{}** pages, **{}** edges\n\n",
        result.len(),
        result.edges.len()
    ));

    for (label, group) in group_by_layer(result, nodes) {
        out.push_str(&format!("## {}\n\n", label));
        out.push_str("| Page | URL | Category | Elements | Forms | Depth | x | y |\n");
        out.push_str("|------|-----|----------|----------|-------|-------|---|---|\n");
        for node in group {
            let pos = result.position(&node.id).unwrap_or_default();
            let title = if node.title.is_empty() {
                node.id.as_str()
            } else {
                node.title.as_str()
            };
            out.push_str(&format!(
                "| {} | `{}` | {} | {} | {} | {} | {:.1} | {:.1} |\n",
                escape_markdown_cell(title),
                escape_markdown_cell(&node.url),
                escape_markdown_cell(&node.category),
                node.element_count,
                node.form_count,
                node.depth,
                pos.x,
                pos.y
            ));
        }
        out.push('\n');
    }

    out
}

pub fn save_export(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

// Helper functions

fn group_by_layer<'a>(result: &LayoutResult, nodes: &'a [PageNode]) -> Vec<(String, Vec<&'a PageNode>)> {
    if result.layers.is_empty() {
        let all: Vec<&PageNode> = nodes
            .iter()
            .filter(|n| result.positions.contains_key(&n.id))
            .collect();
        return if all.is_empty() {
            Vec::new()
        } else {
            vec![("All pages".to_string(), all)]
        };
    }

    let mut grouped: BTreeMap<usize, Vec<&PageNode>> = BTreeMap::new();
    for node in nodes {
        if let Some(layer) = result.layer(&node.id) {
            grouped.entry(layer).or_default().push(node);
        }
    }

    let noun = match result.policy {
        crate::model::LayoutPolicy::Radial => "Ring",
        _ => "Rank",
    };
    grouped
        .into_iter()
        .map(|(layer, group)| (format!("{} {}", noun, layer), group))
        .collect()
}

/// Pipes end a table cell and newlines end the row.
fn escape_markdown_cell(field: &str) -> String {
    field.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
