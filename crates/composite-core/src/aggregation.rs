//! # Aggregation Engine
//!
//! Reads and writes of node properties.
//!
//! A composite property on a leaf reads as its stored value. On a node with
//! children it reads as a flat sequence: the node's own contribution (when
//! not null) followed by each child's value in child-insertion order, with one
//! level of flattening so that sequences contributed by any piece are spliced
//! in rather than nested. Null contributions are dropped.
//!
//! Reads are computed on demand; nothing is cached, so a settled notification
//! is all an observer needs to re-read.

use crate::graph::CompositeGraph;
use crate::node::Node;
use crate::{CompositeError, NodeId, Value};
use std::collections::BTreeSet;

// =============================================================================
// COMPOSITE OPERATIONS
// =============================================================================

/// A per-piece evaluation that `do_composite_operation` folds over a node and
/// all of its descendants.
///
/// `apply` computes one piece's own contribution; the engine handles the
/// walk, ordering and flattening, so every operation obeys the same
/// flatten contract as `Get`.
pub trait CompositeOperation {
    fn apply(&self, node: &Node, key: &str) -> Value;
}

/// The built-in operation: each piece's own value of the property, through
/// its accessor when one is registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct Get;

impl CompositeOperation for Get {
    fn apply(&self, node: &Node, key: &str) -> Value {
        node.own_value(key)
    }
}

impl<F> CompositeOperation for F
where
    F: Fn(&Node, &str) -> Value,
{
    fn apply(&self, node: &Node, key: &str) -> Value {
        self(node, key)
    }
}

// =============================================================================
// FLATTENING & REDUCTIONS
// =============================================================================

/// Splice `value` into `out`: nulls vanish, sequences contribute their items,
/// scalars contribute themselves.
pub fn flatten_into(out: &mut Vec<Value>, value: Value) {
    match value {
        Value::Null => {}
        Value::List(items) => out.extend(items),
        scalar => out.push(scalar),
    }
}

/// Saturating sum of the integer items; other items are ignored.
#[must_use]
pub fn sum_ints(values: &[Value]) -> i64 {
    values
        .iter()
        .filter_map(Value::as_int)
        .fold(0i64, i64::saturating_add)
}

/// Number of non-null items.
#[must_use]
pub fn count(values: &[Value]) -> usize {
    values.iter().filter(|v| !v.is_null()).count()
}

// =============================================================================
// GRAPH API
// =============================================================================

impl CompositeGraph {
    /// Read `key` on `node`.
    ///
    /// - non-composite key: the stored value
    /// - composite key on a leaf: the node's own value
    /// - composite key with children: the flattened aggregate as a `List`
    ///
    /// A destroyed node still answers with its (reverted) stored value.
    pub fn get(&self, node: NodeId, key: &str) -> Result<Value, CompositeError> {
        let piece = self.node(node)?;
        if !piece.is_composite(key) {
            return Ok(piece.raw(key));
        }
        if piece.is_destroyed() || piece.children().is_empty() {
            return Ok(piece.own_value(key));
        }
        Ok(Value::List(self.do_composite_operation(node, &Get, key)?))
    }

    /// Fold `op` over `node` and all of its descendants for `key`.
    ///
    /// Children are always descended into, whether or not they declare `key`
    /// composite themselves. Works on leaves too: the result is then just the
    /// node's own contribution.
    pub fn do_composite_operation(
        &self,
        node: NodeId,
        op: &dyn CompositeOperation,
        key: &str,
    ) -> Result<Vec<Value>, CompositeError> {
        self.live(node)?;
        let mut out = Vec::new();
        self.collect(node, op, key, &mut out)?;
        Ok(out)
    }

    /// Sum of the integer items of the aggregate.
    pub fn sum(&self, node: NodeId, key: &str) -> Result<i64, CompositeError> {
        Ok(sum_ints(&self.do_composite_operation(node, &Get, key)?))
    }

    /// Write `key` on `node`.
    ///
    /// While the property is dynamic this replaces the node's own
    /// contribution; children's contributions are untouched. The node and
    /// every ancestor aggregating `key` are notified once.
    pub fn set(
        &mut self,
        node: NodeId,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), CompositeError> {
        self.live_mut(node)?.write(key, value.into());

        self.begin_batch();
        self.queue_property(node, key);
        let keys = BTreeSet::from([key.to_string()]);
        self.notify_ancestors(node, &keys);
        self.end_batch();
        Ok(())
    }

    /// Pre-order walk with an explicit stack, so chain length is bounded only
    /// by memory. A node already on the current path is skipped; that only
    /// happens when cycles are tolerated.
    fn collect(
        &self,
        root: NodeId,
        op: &dyn CompositeOperation,
        key: &str,
        out: &mut Vec<Value>,
    ) -> Result<(), CompositeError> {
        let mut on_path = BTreeSet::new();
        let mut stack = vec![Step::Enter(root)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(id) => {
                    if on_path.contains(&id) {
                        continue;
                    }
                    let node = self.node(id)?;
                    flatten_into(out, op.apply(node, key));

                    on_path.insert(id);
                    stack.push(Step::Leave(id));
                    stack.extend(node.children().iter().rev().map(|&child| Step::Enter(child)));
                }
                Step::Leave(id) => {
                    on_path.remove(&id);
                }
            }
        }
        Ok(())
    }
}

enum Step {
    Enter(NodeId),
    Leave(NodeId),
}

// =============================================================================
// TESTS
// =============================================================================
