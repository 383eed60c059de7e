//! # Node Templates
//!
//! A template describes a kind of piece (its composite properties, default
//! fields and accessors) and is extended per instance with fields and initial
//! relationships. Templates are cheap to clone, so one template can stamp out
//! any number of nodes.

use crate::accessor::PropertyAccessor;
use crate::{NodeId, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Construction options for a node.
#[derive(Debug, Clone, Default)]
pub struct NodeTemplate {
    pub(crate) composite: Vec<String>,
    pub(crate) fields: BTreeMap<String, Value>,
    pub(crate) accessors: BTreeMap<String, Arc<dyn PropertyAccessor>>,
    pub(crate) parents: Vec<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl NodeTemplate {
    /// Create an empty template.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare properties that aggregate from descendants.
    #[must_use]
    pub fn composite<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            let key = key.into();
            if !self.composite.contains(&key) {
                self.composite.push(key);
            }
        }
        self
    }

    /// Set an initial field value.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Register a computed composite property.
    #[must_use]
    pub fn accessor(mut self, key: impl Into<String>, accessor: impl PropertyAccessor + 'static) -> Self {
        self.accessors.insert(key.into(), Arc::new(accessor));
        self
    }

    /// Attach the new node under `parent` on creation.
    #[must_use]
    pub fn parent(mut self, parent: NodeId) -> Self {
        self.parents.push(parent);
        self
    }

    /// Attach the new node under each of `parents` on creation.
    #[must_use]
    pub fn parents(mut self, parents: impl IntoIterator<Item = NodeId>) -> Self {
        self.parents.extend(parents);
        self
    }

    /// Adopt `child` on creation.
    #[must_use]
    pub fn child(mut self, child: NodeId) -> Self {
        self.children.push(child);
        self
    }

    /// Adopt each of `children` on creation.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = NodeId>) -> Self {
        self.children.extend(children);
        self
    }
}
