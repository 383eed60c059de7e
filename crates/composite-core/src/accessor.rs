//! # Property Accessors
//!
//! User-supplied getter/setter pairs for computed composite properties.
//!
//! A property backed by an accessor is always composite. The aggregation
//! engine wraps the accessor instead of replacing it: the getter produces the
//! node's own contribution, the setter decides what a write stores, and the
//! children's contributions are appended after the getter's result.
//!
//! Merge policy (replace, append, ...) is a property of each accessor and is
//! documented on the implementation, never assumed by the graph.

use crate::node::Node;
use crate::Value;
use std::fmt;

/// Custom read/write behaviour for a single property on a node.
pub trait PropertyAccessor: fmt::Debug + Send + Sync {
    /// Compute the node's own contribution from its stored value.
    ///
    /// The node is passed read-only so the getter may consult sibling fields.
    fn get(&self, node: &Node, stored: &Value) -> Value {
        let _ = node;
        stored.clone()
    }

    /// Compute the value to store when `incoming` is written.
    fn set(&self, node: &Node, stored: &Value, incoming: Value) -> Value {
        let _ = (node, stored);
        incoming
    }
}

/// Append-on-write: every write concatenates onto what is already stored.
///
/// Reads return the accumulated sequence unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Appending;

impl PropertyAccessor for Appending {
    fn set(&self, _node: &Node, stored: &Value, incoming: Value) -> Value {
        let mut items = stored.to_items();
        items.extend(incoming.to_items());
        Value::List(items)
    }
}

/// Read-only constant contribution, whatever is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant(pub Value);

impl PropertyAccessor for Constant {
    fn get(&self, _node: &Node, _stored: &Value) -> Value {
        self.0.clone()
    }

    fn set(&self, _node: &Node, stored: &Value, _incoming: Value) -> Value {
        stored.clone()
    }
}
