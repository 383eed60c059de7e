//! # Relationship Manager
//!
//! Parent/child edges of the composite DAG.
//!
//! Each edge is stored on both ends (`parent.children` and `child.parents`)
//! and is only ever inserted or removed by `link`/`unlink`, which keep both
//! sides consistent, reclassify the affected properties and queue the
//! resulting notifications. Every public entry point runs inside a batch.

use crate::config::CyclePolicy;
use crate::graph::CompositeGraph;
use crate::{CompositeError, NodeId, Roster};
use std::collections::BTreeSet;
use tracing::{debug, warn};

impl CompositeGraph {
    /// Attach `child` under `parent`.
    ///
    /// Returns `Ok(false)` when the edge already exists.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, CompositeError> {
        self.begin_batch();
        let result = self.link(parent, child);
        self.end_batch();
        result
    }

    /// Attach `child` under `parent`, seen from the child's side.
    pub fn add_parent(&mut self, child: NodeId, parent: NodeId) -> Result<bool, CompositeError> {
        self.add_child(parent, child)
    }

    /// Detach `child` from `parent`.
    ///
    /// Returns `Ok(false)` when there was no such edge. If `parent` loses its
    /// last child, its dynamic properties revert to their own stored values.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, CompositeError> {
        self.begin_batch();
        let result = self.unlink(parent, child);
        self.end_batch();
        result
    }

    /// Detach `child` from `parent`, seen from the child's side.
    pub fn remove_parent(&mut self, child: NodeId, parent: NodeId) -> Result<bool, CompositeError> {
        self.remove_child(parent, child)
    }

    /// Check whether `child` is a child of `parent`.
    ///
    /// Fails if `parent` is destroyed; a destroyed `child` is simply absent.
    pub fn has_child(&self, parent: NodeId, child: NodeId) -> Result<bool, CompositeError> {
        Ok(self.live(parent)?.children.contains(child))
    }

    /// Check whether `parent` is a parent of `child`.
    pub fn has_parent(&self, child: NodeId, parent: NodeId) -> Result<bool, CompositeError> {
        Ok(self.live(child)?.parents.contains(parent))
    }

    /// Replace the whole parent set of `child` in one batch.
    ///
    /// Equivalent to removing every current parent edge and then adding
    /// `parents` in order, so the child ends up last among each parent's
    /// children. Nothing is changed if any new edge would be refused.
    pub fn set_parents(
        &mut self,
        child: NodeId,
        parents: impl IntoIterator<Item = NodeId>,
    ) -> Result<(), CompositeError> {
        let wanted = dedup(parents);
        let current = self.live(child)?.parents().to_vec();
        // Dropping edges into `child` never removes a path out of it, so the
        // current graph is good enough for the cycle check.
        for &parent in &wanted {
            self.check_link(parent, child)?;
        }

        self.batch(|graph| {
            for &parent in &current {
                graph.unlink(parent, child)?;
            }
            for &parent in &wanted {
                graph.link(parent, child)?;
            }
            Ok(())
        })
        .map(|((), _)| ())
    }

    /// Replace the whole child set of `parent` in one batch, as
    /// "remove all, then add in order".
    pub fn set_children(
        &mut self,
        parent: NodeId,
        children: impl IntoIterator<Item = NodeId>,
    ) -> Result<(), CompositeError> {
        let wanted = dedup(children);
        let current = self.live(parent)?.children().to_vec();
        for &child in &wanted {
            self.check_link(parent, child)?;
        }

        self.batch(|graph| {
            for &child in &current {
                graph.unlink(parent, child)?;
            }
            for &child in &wanted {
                graph.link(parent, child)?;
            }
            Ok(())
        })
        .map(|((), _)| ())
    }

    /// Snapshot of one roster.
    pub fn roster(&self, node: NodeId, roster: Roster) -> Result<Vec<NodeId>, CompositeError> {
        let node = self.live(node)?;
        Ok(match roster {
            Roster::Parents => node.parents().to_vec(),
            Roster::Children => node.children().to_vec(),
            Roster::List => node
                .parents()
                .iter()
                .chain(node.children())
                .copied()
                .collect(),
        })
    }

    /// Editable view of one roster. Edits route through the relationship
    /// operations; the derived `List` roster refuses them.
    pub fn roster_mut(&mut self, node: NodeId, roster: Roster) -> RosterHandle<'_> {
        RosterHandle {
            graph: self,
            node,
            roster,
        }
    }

    // -------------------------------------------------------------------------
    // Edge primitives
    // -------------------------------------------------------------------------

    /// Validate a prospective edge without touching the graph.
    ///
    /// Returns `Ok(false)` when the edge already exists.
    pub(crate) fn check_link(&self, parent: NodeId, child: NodeId) -> Result<bool, CompositeError> {
        let parent_node = self.live(parent)?;
        self.live(child)?;

        if parent == child {
            warn!(%parent, "refused self edge");
            return Err(CompositeError::InvalidRelationship { parent, child });
        }
        if parent_node.children.contains(child) {
            return Ok(false);
        }
        if self.config().cycle_policy == CyclePolicy::Reject && self.ancestors(parent).contains(&child) {
            warn!(%parent, %child, "refused cyclic edge");
            return Err(CompositeError::CycleDetected { parent, child });
        }
        Ok(true)
    }

    pub(crate) fn link(&mut self, parent: NodeId, child: NodeId) -> Result<bool, CompositeError> {
        if !self.check_link(parent, child)? {
            warn!(%parent, %child, "refused duplicate edge");
            return Ok(false);
        }

        let child_keys: BTreeSet<String> = {
            let node = self.live_mut(child)?;
            node.parents.insert(parent);
            node.mark_linked();
            node.composite_properties().map(str::to_string).collect()
        };
        let mut keys: BTreeSet<String> = {
            let node = self.live_mut(parent)?;
            node.children.insert(child);
            node.mark_linked();
            node.composite_properties().map(str::to_string).collect()
        };
        keys.extend(child_keys.iter().cloned());

        // The parent and everything above it aggregate what the child aggregates.
        let mut adopters = vec![parent];
        adopters.extend(self.ancestors(parent));
        for id in adopters {
            let node = self.node_mut(id)?;
            for key in &child_keys {
                node.declare_composite(key);
            }
            node.reclassify();
        }

        debug!(%parent, %child, keys = keys.len(), "linked");
        self.queue_edge(parent, child);
        for key in &keys {
            self.queue_property(parent, key);
        }
        self.notify_ancestors(parent, &keys);
        Ok(true)
    }

    pub(crate) fn unlink(&mut self, parent: NodeId, child: NodeId) -> Result<bool, CompositeError> {
        if !self.live(parent)?.children.contains(child) {
            return Ok(false);
        }

        let child_keys: Vec<String> = {
            let node = self.node_mut(child)?;
            node.parents.remove(parent);
            node.composite_properties().map(str::to_string).collect()
        };
        let (mut keys, reverted) = {
            let node = self.live_mut(parent)?;
            node.children.remove(child);
            let reverted = node.reclassify();
            let keys: BTreeSet<String> = node.composite_properties().map(str::to_string).collect();
            (keys, reverted)
        };
        keys.extend(child_keys);

        if !reverted.is_empty() {
            debug!(%parent, ?reverted, "reverted dynamic properties");
        }
        debug!(%parent, %child, "unlinked");
        self.queue_edge(parent, child);
        for key in &keys {
            self.queue_property(parent, key);
        }
        self.notify_ancestors(parent, &keys);
        Ok(true)
    }
}

fn dedup(ids: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
    let mut seen = BTreeSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

// =============================================================================
// ROSTER HANDLE
// =============================================================================

/// Editable view of a node's parents or children.
#[derive(Debug)]
pub struct RosterHandle<'g> {
    graph: &'g mut CompositeGraph,
    node: NodeId,
    roster: Roster,
}

impl RosterHandle<'_> {
    /// Current members in order.
    pub fn members(&self) -> Result<Vec<NodeId>, CompositeError> {
        self.graph.roster(self.node, self.roster)
    }

    /// Number of members.
    pub fn len(&self) -> Result<usize, CompositeError> {
        Ok(self.members()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CompositeError> {
        Ok(self.len()? == 0)
    }

    /// Append `other` to the roster.
    pub fn push(&mut self, other: NodeId) -> Result<bool, CompositeError> {
        match self.roster {
            Roster::Parents => self.graph.add_child(other, self.node),
            Roster::Children => self.graph.add_child(self.node, other),
            Roster::List => Err(CompositeError::ImmutableViolation(Roster::List)),
        }
    }

    /// Remove `other` from the roster.
    pub fn remove(&mut self, other: NodeId) -> Result<bool, CompositeError> {
        match self.roster {
            Roster::Parents => self.graph.remove_child(other, self.node),
            Roster::Children => self.graph.remove_child(self.node, other),
            Roster::List => Err(CompositeError::ImmutableViolation(Roster::List)),
        }
    }

    /// Replace every member in one batch.
    pub fn replace(&mut self, members: impl IntoIterator<Item = NodeId>) -> Result<(), CompositeError> {
        match self.roster {
            Roster::Parents => self.graph.set_parents(self.node, members),
            Roster::Children => self.graph.set_children(self.node, members),
            Roster::List => Err(CompositeError::ImmutableViolation(Roster::List)),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
