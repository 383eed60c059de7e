//! # Composite Graph
//!
//! The arena that owns every node, plus the derived composite-state queries.
//!
//! Nodes are stored in a `BTreeMap` keyed by `NodeId`; edges are id pairs
//! held in each node's rosters. Destroying a node leaves a tombstone behind so
//! stale handles are answered with `UseAfterDestroy` instead of aliasing a
//! new node.
//!
//! The operations are spread over the component modules:
//! - `relationship`: link/unlink, membership, rosters
//! - `aggregation`: reads, writes, composite operations
//! - `propagation`: batches, notifications, observers
//! - `lifecycle`: creation, supplant, destroy, roots

use crate::config::CompositeConfig;
use crate::node::Node;
use crate::propagation::{NotificationHub, PendingChanges};
use crate::{CompositeError, NodeId};
use std::collections::BTreeMap;

/// A reactive composite-aggregation graph.
#[derive(Debug, Default)]
pub struct CompositeGraph {
    /// Node storage: NodeId -> Node (tombstones included)
    nodes: BTreeMap<NodeId, Node>,

    /// Next available NodeId
    next_node_id: u64,

    config: CompositeConfig,

    /// Notifications queued by the current batch
    pub(crate) pending: PendingChanges,

    /// Registered observers
    pub(crate) hub: NotificationHub,
}

impl CompositeGraph {
    /// Create an empty graph with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with the given configuration.
    #[must_use]
    pub fn with_config(config: CompositeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &CompositeConfig {
        &self.config
    }

    /// Look up a node, destroyed or not.
    pub fn node(&self, id: NodeId) -> Result<&Node, CompositeError> {
        self.nodes.get(&id).ok_or(CompositeError::NodeNotFound(id))
    }

    /// Check whether `id` names a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| !n.is_destroyed())
    }

    /// Live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| !n.is_destroyed())
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of parent/child edges between live nodes.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes().map(|n| n.children().len()).sum()
    }

    // -------------------------------------------------------------------------
    // Derived composite state
    // -------------------------------------------------------------------------

    /// `Some(true)` when the node has no children; `None` once destroyed.
    #[must_use]
    pub fn is_leaf(&self, id: NodeId) -> Option<bool> {
        self.live(id).ok().map(|n| n.children().is_empty())
    }

    /// `Some(true)` when the node has children; `None` once destroyed.
    #[must_use]
    pub fn has_children(&self, id: NodeId) -> Option<bool> {
        self.live(id).ok().map(|n| !n.children().is_empty())
    }

    /// `Some(true)` once the node has taken part in a relationship; `None`
    /// once destroyed.
    #[must_use]
    pub fn is_composite_piece(&self, id: NodeId) -> Option<bool> {
        self.live(id).ok().map(Node::is_linked)
    }

    // -------------------------------------------------------------------------
    // Arena internals
    // -------------------------------------------------------------------------

    pub(crate) fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id = self.next_node_id.saturating_add(1);
        self.nodes.insert(id, Node::new(id));
        id
    }

    /// Look up a node that must still be live.
    pub(crate) fn live(&self, id: NodeId) -> Result<&Node, CompositeError> {
        let node = self.node(id)?;
        if node.is_destroyed() {
            return Err(CompositeError::UseAfterDestroy(id));
        }
        Ok(node)
    }

    pub(crate) fn live_mut(&mut self, id: NodeId) -> Result<&mut Node, CompositeError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(CompositeError::NodeNotFound(id))?;
        if node.is_destroyed() {
            return Err(CompositeError::UseAfterDestroy(id));
        }
        Ok(node)
    }

    /// Mutable access for ids that were already validated in this call.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, CompositeError> {
        self.nodes
            .get_mut(&id)
            .ok_or(CompositeError::NodeNotFound(id))
    }
}

// =============================================================================
// TESTS
// =============================================================================
