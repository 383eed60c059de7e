//! # CLI Command Implementations

use composite::{Assembly, AssemblyError, Built};
use composite_core::{CompositeConfig, Value};
use std::path::Path;
use tracing::debug;

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// Explicit `--config` file, else `$COMPOSITE_CONFIG`, else defaults.
pub fn load_config(path: Option<&Path>) -> Result<CompositeConfig, AssemblyError> {
    let config = match path {
        Some(path) => CompositeConfig::load(path)?,
        None => CompositeConfig::from_env()?,
    };
    debug!(?config, "configuration loaded");
    Ok(config)
}

fn build(file: &Path, config: CompositeConfig) -> Result<Built, AssemblyError> {
    let (built, changes) = Assembly::load(file)?.build(config)?;
    debug!(notifications = changes.len(), "initial build settled");
    Ok(built)
}

fn print_json(output: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(output).unwrap_or_default()
    );
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Build the assembly and report its size.
pub fn cmd_check(file: &Path, config: CompositeConfig, json_mode: bool) -> Result<(), AssemblyError> {
    let built = build(file, config)?;
    let nodes = built.graph.len();
    let edges = built.graph.edge_count();

    if json_mode {
        print_json(&serde_json::json!({
            "file": file.to_string_lossy(),
            "nodes": nodes,
            "edges": edges,
            "cycle_policy": built.graph.config().cycle_policy,
        }));
        return Ok(());
    }

    println!("Assembly OK");
    println!("===========");
    println!("File:  {}", file.display());
    println!("Nodes: {}", nodes);
    println!("Edges: {}", edges);
    Ok(())
}

// =============================================================================
// QUERY COMMANDS
// =============================================================================

/// Read one property.
pub fn cmd_get(
    file: &Path,
    config: CompositeConfig,
    json_mode: bool,
    node: &str,
    key: &str,
) -> Result<(), AssemblyError> {
    let built = build(file, config)?;
    let value = built.get(node, key)?;

    if json_mode {
        print_json(&serde_json::json!({ "node": node, "key": key, "value": value }));
    } else {
        println!("{}.{} = {}", node, key, value);
    }
    Ok(())
}

/// Sum the integer contributions to one property.
pub fn cmd_sum(
    file: &Path,
    config: CompositeConfig,
    json_mode: bool,
    node: &str,
    key: &str,
) -> Result<(), AssemblyError> {
    let built = build(file, config)?;
    let total = built.sum(node, key)?;

    if json_mode {
        print_json(&serde_json::json!({ "node": node, "key": key, "sum": total }));
    } else {
        println!("sum({}.{}) = {}", node, key, total);
    }
    Ok(())
}

/// List the composite roots above a node.
pub fn cmd_roots(
    file: &Path,
    config: CompositeConfig,
    json_mode: bool,
    node: &str,
) -> Result<(), AssemblyError> {
    let built = build(file, config)?;
    let roots = built.roots(node)?;

    if json_mode {
        print_json(&serde_json::json!({ "node": node, "roots": roots }));
    } else {
        println!("Roots of {}: {}", node, roots.join(", "));
    }
    Ok(())
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// Print the composite state of one node, or of every node.
pub fn cmd_show(
    file: &Path,
    config: CompositeConfig,
    json_mode: bool,
    node: Option<&str>,
) -> Result<(), AssemblyError> {
    let built = build(file, config)?;
    let names: Vec<String> = match node {
        Some(name) => vec![name.to_string()],
        None => built.names().into_iter().map(str::to_string).collect(),
    };

    let mut reports = Vec::with_capacity(names.len());
    for name in &names {
        reports.push(built.report(name)?);
    }

    if json_mode {
        print_json(&serde_json::to_value(&reports).unwrap_or_default());
        return Ok(());
    }

    for report in reports {
        let kind = if report.is_leaf { "leaf" } else { "composite" };
        println!("{} (#{}, {})", report.name, report.id, kind);
        if !report.parents.is_empty() {
            println!("  parents:  {}", report.parents.join(", "));
        }
        if !report.children.is_empty() {
            println!("  children: {}", report.children.join(", "));
        }
        for (key, value) in &report.values {
            let marker = if report.dynamic.contains(key) { "*" } else { " " };
            println!("  {}{} = {}", marker, key, display(value));
        }
    }
    Ok(())
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
