//! # Core Type Definitions
//!
//! This module contains the value-level types shared by every component of
//! the composite graph:
//! - Node identifiers (`NodeId`)
//! - Stored field values (`Value`)
//! - Observable roster selectors (`Roster`)
//! - Error types (`CompositeError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they key a `BTreeMap`/`BTreeSet`
//! - Use saturating arithmetic for reductions to prevent overflow

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// NODE IDENTIFIER
// =============================================================================

/// Stable handle of a node in the composite arena.
///
/// Identifiers are issued sequentially and never reused, so a handle to a
/// destroyed node keeps pointing at its tombstone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// VALUE
// =============================================================================

/// A stored field value: a scalar or a sequence.
///
/// `Null` stands for "absent". It is what an unset field reads as, and it is
/// dropped whenever values are flattened into an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    /// Check if the value is `Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the integer payload, if this is an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the text payload, if this is a `Text`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the items, if this is a `List`.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// View the value as a sequence: `Null` is empty, a scalar is a
    /// one-element sequence, a list is itself.
    #[must_use]
    pub fn to_items(&self) -> Vec<Value> {
        match self {
            Self::Null => Vec::new(),
            Self::List(items) => items.clone(),
            other => vec![other.clone()],
        }
    }

    /// Check whether `needle` is this value or one of its items.
    #[must_use]
    pub fn contains(&self, needle: &Value) -> bool {
        match self {
            Self::List(items) => items.contains(needle),
            other => other == needle,
        }
    }

    /// Number of items when viewed as a sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Null => 0,
            Self::List(items) => items.len(),
            _ => 1,
        }
    }

    /// Check if the value holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short type name used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// =============================================================================
// ROSTER
// =============================================================================

/// Selects one of the membership lists a node exposes.
///
/// `Parents` and `Children` are backed by edges and can be edited through a
/// `RosterHandle`. `List` is derived (parents followed by children) and is
/// read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Roster {
    Parents,
    Children,
    List,
}

impl fmt::Display for Roster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parents => "parents",
            Self::Children => "children",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while editing or reading a composite graph.
///
/// - No silent failures: misuse is reported at the call site that caused it
/// - Propagation itself never fails; it is a pure graph walk
/// - The library never panics; every error is recoverable
#[derive(Debug, Error)]
pub enum CompositeError {
    /// A node cannot be its own parent or child.
    #[error("Invalid relationship: {parent} -> {child}")]
    InvalidRelationship { parent: NodeId, child: NodeId },

    /// The edge would close a cycle and the graph rejects cycles.
    #[error("Cycle detected: {child} is already an ancestor of {parent}")]
    CycleDetected { parent: NodeId, child: NodeId },

    /// The node was destroyed and can no longer take part in the graph.
    #[error("Node {0} has been destroyed")]
    UseAfterDestroy(NodeId),

    /// The identifier was never issued by this graph.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Attempted to mutate a derived, read-only roster.
    #[error("Roster '{0}' is read-only")]
    ImmutableViolation(Roster),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

// =============================================================================
// TESTS
// =============================================================================
