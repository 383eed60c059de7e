//! # Node
//!
//! The unit of composition. A node is a plain value holder: named fields,
//! the set of properties it aggregates, and its parent/child rosters. It has
//! no behaviour of its own; the graph drives every change.

use crate::accessor::PropertyAccessor;
use crate::{NodeId, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

// =============================================================================
// MEMBERS (ordered set)
// =============================================================================

/// Insertion-ordered set of node handles. Membership checks are O(log n);
/// removal is linear because the order vector is kept compact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Members {
    order: Vec<NodeId>,
    index: BTreeSet<NodeId>,
}

impl Members {
    /// Append `id`. Returns `false` if it was already present.
    pub fn insert(&mut self, id: NodeId) -> bool {
        if !self.index.insert(id) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Remove `id`. Returns `false` if it was absent.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if !self.index.remove(&id) {
            return false;
        }
        self.order.retain(|m| *m != id);
        true
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains(&id)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[NodeId] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// =============================================================================
// SLOT
// =============================================================================

/// Storage for one property.
///
/// `Static` is a plain field. `Aggregating` marks a composite property that
/// currently reads as the flattened aggregate; the payload is the node's own
/// contribution, which is what the field reverts to when the last child
/// leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Static(Value),
    Aggregating(Value),
}

impl Slot {
    /// The stored value, whatever the variant.
    #[must_use]
    pub fn value(&self) -> &Value {
        match self {
            Self::Static(v) | Self::Aggregating(v) => v,
        }
    }

    #[must_use]
    pub fn is_aggregating(&self) -> bool {
        matches!(self, Self::Aggregating(_))
    }

    fn replace(&mut self, value: Value) {
        match self {
            Self::Static(v) | Self::Aggregating(v) => *v = value,
        }
    }
}

// =============================================================================
// NODE
// =============================================================================

/// A piece of a composite graph.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    pub(crate) parents: Members,
    pub(crate) children: Members,
    composite: BTreeSet<String>,
    slots: BTreeMap<String, Slot>,
    accessors: BTreeMap<String, Arc<dyn PropertyAccessor>>,
    linked: bool,
    destroyed: bool,
}

impl Node {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            parents: Members::default(),
            children: Members::default(),
            composite: BTreeSet::new(),
            slots: BTreeMap::new(),
            accessors: BTreeMap::new(),
            linked: false,
            destroyed: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Parents in insertion order.
    #[must_use]
    pub fn parents(&self) -> &[NodeId] {
        self.parents.as_slice()
    }

    /// Children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        self.children.as_slice()
    }

    /// Read the stored value of `key` without aggregation or accessors.
    #[must_use]
    pub fn raw(&self, key: &str) -> Value {
        self.slots
            .get(key)
            .map(|slot| slot.value().clone())
            .unwrap_or_default()
    }

    /// Names of all stored fields.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Check whether `key` aggregates from descendants on this node.
    #[must_use]
    pub fn is_composite(&self, key: &str) -> bool {
        self.composite.contains(key)
    }

    /// Declared and adopted composite property names, sorted.
    pub fn composite_properties(&self) -> impl Iterator<Item = &str> {
        self.composite.iter().map(String::as_str)
    }

    /// Check whether `key` is currently rewritten as an aggregator.
    #[must_use]
    pub fn is_dynamic(&self, key: &str) -> bool {
        self.slots.get(key).is_some_and(Slot::is_aggregating)
    }

    /// Properties currently rewritten as aggregators, sorted.
    pub fn dynamic_properties(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.is_aggregating())
            .map(|(k, _)| k.as_str())
    }

    /// The custom accessor registered for `key`, if any.
    #[must_use]
    pub fn accessor(&self, key: &str) -> Option<&Arc<dyn PropertyAccessor>> {
        self.accessors.get(key)
    }

    /// True once the node has taken part in any relationship.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The node's own contribution to `key`: the stored value, passed through
    /// the accessor when one is registered.
    #[must_use]
    pub fn own_value(&self, key: &str) -> Value {
        let stored = self.raw(key);
        match self.accessors.get(key) {
            Some(accessor) => accessor.get(self, &stored),
            None => stored,
        }
    }

    // -------------------------------------------------------------------------
    // Mutation (graph-internal)
    // -------------------------------------------------------------------------

    /// Store a write to `key`, routed through the accessor when present.
    pub(crate) fn write(&mut self, key: &str, incoming: Value) {
        let stored = self.raw(key);
        let next = match self.accessors.get(key) {
            Some(accessor) => accessor.set(self, &stored, incoming),
            None => incoming,
        };
        match self.slots.get_mut(key) {
            Some(slot) => slot.replace(next),
            None => {
                let slot = if self.is_composite(key) && !self.children.is_empty() {
                    Slot::Aggregating(next)
                } else {
                    Slot::Static(next)
                };
                self.slots.insert(key.to_string(), slot);
            }
        }
    }

    pub(crate) fn set_accessor(&mut self, key: &str, accessor: Arc<dyn PropertyAccessor>) {
        self.accessors.insert(key.to_string(), accessor);
        self.composite.insert(key.to_string());
    }

    /// Add `key` to the composite set. Returns `true` if it was new.
    pub(crate) fn declare_composite(&mut self, key: &str) -> bool {
        self.composite.insert(key.to_string())
    }

    pub(crate) fn mark_linked(&mut self) {
        self.linked = true;
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    /// Bring every slot in line with the rule "dynamic iff composite and the
    /// node has children". Returns the keys whose variant changed.
    pub(crate) fn reclassify(&mut self) -> Vec<String> {
        let aggregating = !self.children.is_empty();
        let mut changed = Vec::new();

        for key in &self.composite {
            let slot = self
                .slots
                .entry(key.clone())
                .or_insert(Slot::Static(Value::Null));
            if slot.is_aggregating() == aggregating {
                continue;
            }
            let own = slot.value().clone();
            *slot = if aggregating {
                Slot::Aggregating(own)
            } else {
                Slot::Static(own)
            };
            changed.push(key.clone());
        }

        changed
    }
}

// =============================================================================
// TESTS
// =============================================================================
