//! # Propagation Controller
//!
//! Turns graph edits into change notifications.
//!
//! Every mutation queues notifications into the current batch. A batch is
//! opened implicitly by each mutating call, or explicitly by the caller with
//! `begin_batch`/`end_batch` (or `batch`). Batches nest; only the outermost
//! `end_batch` settles: the queued notifications, already deduplicated by
//! `(node, key)` and `(node, roster)`, are delivered to observers once and
//! returned as a `ChangeSet`.
//!
//! Upward walks visit each ancestor once per walk, whatever the number of
//! paths leading to it, so a diamond never notifies its apex twice.

use crate::graph::CompositeGraph;
use crate::{CompositeError, NodeId, Roster};
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use tracing::{debug, trace, warn};

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// A settled change event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// The visible value of `key` on `node` changed.
    PropertyChanged { node: NodeId, key: String },
    /// The membership list `roster` of `node` changed.
    RosterChanged { node: NodeId, roster: Roster },
}

impl Notification {
    /// The node the notification is about.
    #[must_use]
    pub fn node(&self) -> NodeId {
        match self {
            Self::PropertyChanged { node, .. } | Self::RosterChanged { node, .. } => *node,
        }
    }
}

/// Notifications settled by one batch, in deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    notifications: Vec<Notification>,
}

impl ChangeSet {
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    /// How many times `key` on `node` was reported (0 or 1 after dedup).
    #[must_use]
    pub fn property_changes(&self, node: NodeId, key: &str) -> usize {
        self.notifications
            .iter()
            .filter(|n| {
                matches!(n, Notification::PropertyChanged { node: id, key: k } if *id == node && k == key)
            })
            .count()
    }

    #[must_use]
    pub fn property_changed(&self, node: NodeId, key: &str) -> bool {
        self.property_changes(node, key) > 0
    }

    #[must_use]
    pub fn roster_changed(&self, node: NodeId, roster: Roster) -> bool {
        self.notifications.contains(&Notification::RosterChanged { node, roster })
    }

    /// Nodes that received at least one notification.
    #[must_use]
    pub fn touched_nodes(&self) -> BTreeSet<NodeId> {
        self.notifications.iter().map(Notification::node).collect()
    }
}

// =============================================================================
// PENDING BATCH STATE
// =============================================================================

/// Batch nesting depth and the notifications queued so far.
#[derive(Debug, Default)]
pub(crate) struct PendingChanges {
    depth: usize,
    queued: BTreeSet<Notification>,
}

// =============================================================================
// OBSERVERS
// =============================================================================

/// Selects which settled notifications an observer receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    /// Every notification.
    All,
    /// Every notification about one node.
    Node(NodeId),
    /// Changes of one property on one node.
    Property { node: NodeId, key: String },
    /// Changes of one roster on one node.
    Roster { node: NodeId, roster: Roster },
}

impl Subscription {
    fn matches(&self, notification: &Notification) -> bool {
        match (self, notification) {
            (Self::All, _) => true,
            (Self::Node(id), n) => n.node() == *id,
            (
                Self::Property { node, key },
                Notification::PropertyChanged { node: n, key: k },
            ) => node == n && key == k,
            (
                Self::Roster { node, roster },
                Notification::RosterChanged { node: n, roster: r },
            ) => node == n && roster == r,
            _ => false,
        }
    }
}

/// Handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&Notification)>;

/// Registry of observers.
#[derive(Default)]
pub(crate) struct NotificationHub {
    next_id: u64,
    observers: Vec<(SubscriptionId, Subscription, Callback)>,
}

impl fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationHub")
            .field("next_id", &self.next_id)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl NotificationHub {
    fn dispatch(&mut self, notifications: &[Notification]) {
        for notification in notifications {
            for (_, subscription, callback) in &mut self.observers {
                if subscription.matches(notification) {
                    callback(notification);
                }
            }
        }
    }
}

// =============================================================================
// GRAPH API
// =============================================================================

impl CompositeGraph {
    /// Register an observer. The callback runs when a batch settles, once
    /// per matching notification.
    pub fn subscribe(
        &mut self,
        subscription: Subscription,
        callback: impl FnMut(&Notification) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.hub.next_id);
        self.hub.next_id = self.hub.next_id.saturating_add(1);
        self.hub
            .observers
            .push((id, subscription, Box::new(callback)));
        id
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.hub.observers.len();
        self.hub.observers.retain(|(sid, _, _)| *sid != id);
        self.hub.observers.len() != before
    }

    /// Open a (possibly nested) batch.
    pub fn begin_batch(&mut self) {
        self.pending.depth = self.pending.depth.saturating_add(1);
    }

    /// Close a batch. The outermost close delivers and returns everything
    /// queued since the batch opened; inner closes return an empty set.
    pub fn end_batch(&mut self) -> ChangeSet {
        match self.pending.depth {
            0 => {
                warn!("end_batch called without a matching begin_batch");
                ChangeSet::default()
            }
            1 => {
                self.pending.depth = 0;
                self.settle()
            }
            _ => {
                self.pending.depth -= 1;
                ChangeSet::default()
            }
        }
    }

    /// Check whether a batch is currently open.
    #[must_use]
    pub fn in_batch(&self) -> bool {
        self.pending.depth > 0
    }

    /// Run `f` inside a batch and return its result together with the
    /// settled changes.
    ///
    /// The batch settles even when `f` fails, so observers always see the
    /// state that was actually reached.
    pub fn batch<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CompositeError>,
    ) -> Result<(T, ChangeSet), CompositeError> {
        self.begin_batch();
        let result = f(self);
        let changes = self.end_batch();
        result.map(|value| (value, changes))
    }

    fn settle(&mut self) -> ChangeSet {
        let notifications: Vec<Notification> =
            std::mem::take(&mut self.pending.queued).into_iter().collect();
        debug!(count = notifications.len(), "batch settled");
        self.hub.dispatch(&notifications);
        ChangeSet { notifications }
    }

    // -------------------------------------------------------------------------
    // Internal propagation
    // -------------------------------------------------------------------------

    pub(crate) fn queue(&mut self, notification: Notification) {
        trace!(?notification, "queued");
        self.pending.queued.insert(notification);
    }

    pub(crate) fn queue_property(&mut self, node: NodeId, key: &str) {
        self.queue(Notification::PropertyChanged {
            node,
            key: key.to_string(),
        });
    }

    /// Queue roster changes for both ends of an edge.
    pub(crate) fn queue_edge(&mut self, parent: NodeId, child: NodeId) {
        for (node, roster) in [
            (parent, Roster::Children),
            (parent, Roster::List),
            (child, Roster::Parents),
            (child, Roster::List),
        ] {
            self.queue(Notification::RosterChanged { node, roster });
        }
    }

    /// Every node reachable upward from `origin`, each exactly once, in
    /// breadth-first order. `origin` itself is excluded.
    pub(crate) fn ancestors(&self, origin: NodeId) -> Vec<NodeId> {
        let mut visited = BTreeSet::from([origin]);
        let mut queue = VecDeque::from([origin]);
        let mut order = Vec::new();

        while let Some(current) = queue.pop_front() {
            let Ok(node) = self.node(current) else {
                continue;
            };
            for &parent in node.parents() {
                if visited.insert(parent) {
                    order.push(parent);
                    queue.push_back(parent);
                }
            }
        }

        order
    }

    /// Queue a property change on every ancestor of `origin` for which a
    /// key in `keys` is dynamic.
    pub(crate) fn notify_ancestors<'k>(
        &mut self,
        origin: NodeId,
        keys: impl IntoIterator<Item = &'k String> + Clone,
    ) {
        for ancestor in self.ancestors(origin) {
            let dynamic: Vec<String> = match self.node(ancestor) {
                Ok(node) => keys
                    .clone()
                    .into_iter()
                    .filter(|key| node.is_dynamic(key))
                    .cloned()
                    .collect(),
                Err(_) => continue,
            };
            for key in dynamic {
                self.queue_property(ancestor, &key);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
