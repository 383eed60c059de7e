//! # Lifecycle Manager
//!
//! Creation, supplanting and destruction of nodes, plus root discovery.
//!
//! Each operation validates everything it can before touching the graph and
//! runs its edge edits inside a single batch, so observers never see a half
//! built node or a half transplanted roster.

use crate::config::CyclePolicy;
use crate::graph::CompositeGraph;
use crate::propagation::Notification;
use crate::template::NodeTemplate;
use crate::{CompositeError, NodeId, Roster};
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

impl CompositeGraph {
    /// Create a node from a template, wiring its initial parents and children
    /// in one batch.
    pub fn create(&mut self, template: NodeTemplate) -> Result<NodeId, CompositeError> {
        for &id in template.parents.iter().chain(&template.children) {
            self.live(id)?;
        }
        if self.config().cycle_policy == CyclePolicy::Reject {
            for &child in &template.children {
                for &parent in &template.parents {
                    if child == parent || self.ancestors(parent).contains(&child) {
                        return Err(CompositeError::CycleDetected { parent, child });
                    }
                }
            }
        }

        let NodeTemplate {
            composite,
            fields,
            accessors,
            parents,
            children,
        } = template;

        let id = self.allocate();
        let node = self.node_mut(id)?;
        for key in &composite {
            node.declare_composite(key);
        }
        for (key, accessor) in accessors {
            node.set_accessor(&key, accessor);
        }
        for (key, value) in fields {
            node.write(&key, value);
        }
        node.reclassify();

        self.batch(|graph| {
            for &parent in &parents {
                graph.link(parent, id)?;
            }
            for &child in &children {
                graph.link(id, child)?;
            }
            Ok(())
        })?;

        debug!(%id, parents = parents.len(), children = children.len(), "created");
        Ok(id)
    }

    /// Move every child of `other` under `target`.
    ///
    /// Afterwards `other` has no children and `target`'s children are its
    /// previous children followed by `other`'s former children (minus any it
    /// already had, and minus `target` itself).
    pub fn supplant(&mut self, target: NodeId, other: NodeId) -> Result<(), CompositeError> {
        self.live(target)?;
        let transplanted = self.live(other)?.children().to_vec();
        if target == other {
            return Ok(());
        }

        if self.config().cycle_policy == CyclePolicy::Reject {
            let above = self.ancestors(target);
            if let Some(&child) = transplanted.iter().find(|c| above.contains(c)) {
                return Err(CompositeError::CycleDetected {
                    parent: target,
                    child,
                });
            }
        }

        self.batch(|graph| {
            for &child in &transplanted {
                graph.unlink(other, child)?;
                if child != target {
                    graph.link(target, child)?;
                }
            }
            Ok(())
        })?;

        debug!(%target, %other, moved = transplanted.len(), "supplanted");
        Ok(())
    }

    /// Destroy a node: detach it from every parent and child, revert its
    /// dynamic properties and retire its id.
    ///
    /// Returns the number of edges removed.
    pub fn destroy(&mut self, id: NodeId) -> Result<usize, CompositeError> {
        let (parents, children) = {
            let node = self.live(id)?;
            (node.parents().to_vec(), node.children().to_vec())
        };

        let (removed, _) = self.batch(|graph| {
            let mut removed = 0usize;
            for &parent in &parents {
                if graph.unlink(parent, id)? {
                    removed += 1;
                }
            }
            for &child in &children {
                if graph.unlink(id, child)? {
                    removed += 1;
                }
            }
            let node = graph.node_mut(id)?;
            node.reclassify();
            node.mark_destroyed();
            graph.queue(Notification::RosterChanged {
                node: id,
                roster: Roster::List,
            });
            Ok(removed)
        })?;

        debug!(%id, removed, "destroyed");
        Ok(removed)
    }

    /// The composite roots above `id`: every ancestor without parents, in
    /// breadth-first discovery order. A node without parents is its own root.
    pub fn composite_root(&self, id: NodeId) -> Result<Vec<NodeId>, CompositeError> {
        let node = self.live(id)?;
        if node.parents().is_empty() {
            return Ok(vec![id]);
        }

        let mut visited = BTreeSet::from([id]);
        let mut queue = VecDeque::from([id]);
        let mut roots = Vec::new();

        while let Some(current) = queue.pop_front() {
            let node = self.node(current)?;
            if current != id && node.parents().is_empty() {
                roots.push(current);
                continue;
            }
            for &parent in node.parents() {
                if visited.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }

        Ok(roots)
    }
}

// =============================================================================
// TESTS
// =============================================================================
