//! # Assembly Files
//!
//! A named description of a composite graph, read from TOML or JSON and
//! built through the public `composite-core` API.
//!
//! ```toml
//! [[node]]
//! name = "camaro"
//! composite = ["weight", "horsePower"]
//! fields = { weight = 2000, horsePower = 250 }
//!
//! [[node]]
//! name = "v8Engine"
//! parents = ["camaro"]
//! fields = { weight = 300, horsePower = 100 }
//! ```
//!
//! Nodes are created in declaration order, then every edge is added inside a
//! single batch, so a parent may be declared after its children.

use composite_core::{
    Appending, ChangeSet, CompositeConfig, CompositeError, CompositeGraph, Constant, NodeId,
    NodeTemplate, Roster, Value,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Maximum assembly file size (16 MB).
pub const MAX_ASSEMBLY_FILE_SIZE: u64 = 16 * 1024 * 1024;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised while loading or building an assembly.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Duplicate node name: {0}")]
    DuplicateName(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error(transparent)]
    Graph(#[from] CompositeError),
}

// =============================================================================
// FILE FORMAT
// =============================================================================

/// Serialized form of an assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Assembly {
    #[serde(default, rename = "node")]
    pub nodes: Vec<NodeSpec>,
}

/// One node of an assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeSpec {
    pub name: String,
    /// Properties aggregated from descendants.
    pub composite: Vec<String>,
    pub fields: BTreeMap<String, Value>,
    /// Properties whose writes append instead of replacing.
    pub appending: Vec<String>,
    /// Computed properties with a fixed contribution.
    pub constants: BTreeMap<String, Value>,
    /// Names of the parents, in insertion order.
    pub parents: Vec<String>,
}

impl Assembly {
    /// Parse TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, AssemblyError> {
        toml::from_str(text).map_err(|e| AssemblyError::Parse(e.to_string()))
    }

    /// Parse JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, AssemblyError> {
        serde_json::from_str(text).map_err(|e| AssemblyError::Parse(e.to_string()))
    }

    /// Load a file; `.json` files are read as JSON, everything else as TOML.
    pub fn load(path: &Path) -> Result<Self, AssemblyError> {
        let path = validate_file_path(path)?;
        validate_file_size(&path, MAX_ASSEMBLY_FILE_SIZE)?;
        let text = std::fs::read_to_string(&path)
            .map_err(|e| AssemblyError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        debug!(path = %path.display(), json = is_json, "loading assembly");
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }

    /// Build the graph. Edges are added in one batch whose settled changes
    /// are returned alongside the graph.
    pub fn build(&self, config: CompositeConfig) -> Result<(Built, ChangeSet), AssemblyError> {
        let mut graph = CompositeGraph::with_config(config);
        let mut names = BTreeMap::new();

        for spec in &self.nodes {
            if names.contains_key(&spec.name) {
                return Err(AssemblyError::DuplicateName(spec.name.clone()));
            }
            let id = graph.create(spec.template())?;
            names.insert(spec.name.clone(), id);
        }

        let mut edges = Vec::new();
        for spec in &self.nodes {
            let child = lookup(&names, &spec.name)?;
            for parent in &spec.parents {
                edges.push((lookup(&names, parent)?, child));
            }
        }

        let ((), changes) = graph.batch(|g| {
            for &(parent, child) in &edges {
                g.add_child(parent, child)?;
            }
            Ok(())
        })?;

        info!(nodes = names.len(), edges = edges.len(), "assembly built");
        Ok((Built { graph, names }, changes))
    }
}

impl NodeSpec {
    fn template(&self) -> NodeTemplate {
        let mut template = NodeTemplate::new().composite(self.composite.iter().cloned());
        for key in &self.appending {
            template = template.accessor(key.clone(), Appending);
        }
        for (key, value) in &self.constants {
            template = template.accessor(key.clone(), Constant(value.clone()));
        }
        for (key, value) in &self.fields {
            template = template.field(key.clone(), value.clone());
        }
        template
    }
}

fn lookup(names: &BTreeMap<String, NodeId>, name: &str) -> Result<NodeId, AssemblyError> {
    names
        .get(name)
        .copied()
        .ok_or_else(|| AssemblyError::UnknownNode(name.to_string()))
}

// =============================================================================
// BUILT ASSEMBLY
// =============================================================================

/// A built graph together with its name table.
#[derive(Debug)]
pub struct Built {
    pub graph: CompositeGraph,
    names: BTreeMap<String, NodeId>,
}

/// Composite state of one node, as reported by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeReport {
    pub name: String,
    pub id: u64,
    pub is_leaf: bool,
    pub parents: Vec<String>,
    pub children: Vec<String>,
    pub composite: Vec<String>,
    pub dynamic: Vec<String>,
    pub values: BTreeMap<String, Value>,
}

impl Built {
    /// Resolve a node name.
    pub fn id(&self, name: &str) -> Result<NodeId, AssemblyError> {
        lookup(&self.names, name)
    }

    /// The name a node was declared with.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, v)| **v == id)
            .map(|(k, _)| k.as_str())
    }

    /// Node names in id (declaration) order.
    pub fn names(&self) -> Vec<&str> {
        let mut pairs: Vec<(&NodeId, &String)> = self.names.iter().map(|(k, v)| (v, k)).collect();
        pairs.sort();
        pairs.into_iter().map(|(_, name)| name.as_str()).collect()
    }

    fn named(&self, ids: Vec<NodeId>) -> Vec<String> {
        ids.into_iter()
            .map(|id| self.name(id).map_or_else(|| id.to_string(), str::to_string))
            .collect()
    }

    /// Read `key` on the named node.
    pub fn get(&self, name: &str, key: &str) -> Result<Value, AssemblyError> {
        Ok(self.graph.get(self.id(name)?, key)?)
    }

    /// Integer sum over the named node and its descendants.
    pub fn sum(&self, name: &str, key: &str) -> Result<i64, AssemblyError> {
        Ok(self.graph.sum(self.id(name)?, key)?)
    }

    /// Names of the composite roots above the named node.
    pub fn roots(&self, name: &str) -> Result<Vec<String>, AssemblyError> {
        Ok(self.named(self.graph.composite_root(self.id(name)?)?))
    }

    /// Full composite state of the named node.
    pub fn report(&self, name: &str) -> Result<NodeReport, AssemblyError> {
        let id = self.id(name)?;
        let node = self.graph.node(id)?;

        let mut values = BTreeMap::new();
        let keys: Vec<String> = node
            .field_names()
            .chain(node.composite_properties())
            .map(str::to_string)
            .collect();
        for key in keys {
            let value = self.graph.get(id, &key)?;
            values.insert(key, value);
        }

        Ok(NodeReport {
            name: name.to_string(),
            id: id.0,
            is_leaf: node.children().is_empty(),
            parents: self.named(self.graph.roster(id, Roster::Parents)?),
            children: self.named(self.graph.roster(id, Roster::Children)?),
            composite: node.composite_properties().map(str::to_string).collect(),
            dynamic: node.dynamic_properties().map(str::to_string).collect(),
            values,
        })
    }
}

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Resolve symlinks and `..`, and require an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, AssemblyError> {
    let canonical = path.canonicalize().map_err(|e| {
        AssemblyError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(AssemblyError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

fn validate_file_size(path: &Path, max_size: u64) -> Result<(), AssemblyError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AssemblyError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(AssemblyError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
