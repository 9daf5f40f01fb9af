//! Replacing and pruning nodes.

use log::debug;

use storyweave_core::content::{Link, NodeId};

use super::{ContentTree, Subject, TreeError};

/// Outcome of [`ContentTree::delete_and_replace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replacement {
    node: NodeId,
    inserted: bool,
}

impl Replacement {
    /// Final position of the node that took the target's place.
    pub fn node(self) -> NodeId {
        self.node
    }

    /// Returns `true` if the replacing node was new.
    pub fn inserted(self) -> bool {
        self.inserted
    }
}

impl ContentTree {
    /// Deletes `target` and puts `source` in its place.
    ///
    /// The source takes over the target's successor. Its own former successor
    /// is handed to its previous parents, and its former position is removed,
    /// which shifts every later position down by one. A branching question can
    /// only be replaced while all its alternatives are empty.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] when either node is missing, when both are the
    /// same node, when `target` is a branching question with outgoing links,
    /// or when a branching source has no empty alternative to keep the
    /// target's successor. A new source may only link to positions that
    /// exist once it is appended. The tree is unchanged in that case.
    pub fn delete_and_replace(
        &mut self,
        target: NodeId,
        source: Subject,
    ) -> Result<Replacement, TreeError> {
        let target_node = self.node(target)?;
        if target_node.is_branching() && !target_node.is_leaf() {
            return Err(TreeError::BranchingTarget(target));
        }
        let adopted = target_node.detachable_next();

        let (source_id, pending) = match source {
            Subject::Existing(id) => {
                self.check_node(id)?;
                if id == target {
                    return Err(TreeError::SelfPlacement(id));
                }
                (id, None)
            }
            Subject::New(node) => {
                let id = NodeId::new(self.nodes.len());
                self.check_new_node(id, &node)?;
                (id, Some(*node))
            }
        };

        let source_node = match &pending {
            Some(node) => node,
            None => &self.nodes[source_id.index()],
        };
        if !adopted.is_none() && !source_node.can_attach() {
            return Err(TreeError::NoFreeAlternative(source_id));
        }
        // A source that leads to itself leaves nothing to hand over.
        let current_next = match source_node.detachable_next() {
            Link::Node(next) if next == source_id => Link::None,
            next => next,
        };

        let inserted = pending.is_some();
        if let Some(node) = pending {
            self.nodes.push(node);
        }

        let removed = source_id.index();
        self.nodes[removed].attach(adopted);
        self.nodes.swap(target.index(), removed);
        self.nodes.remove(removed);

        self.renumber(|old| {
            let link = if old.index() == removed {
                current_next
            } else {
                Link::Node(old)
            };
            link.map_node(|id| Link::Node(shift_down(id, removed)))
        });
        self.release_root_links();

        let node = shift_down(target, removed);
        debug!(
            target = target.index(),
            node = node.index(),
            inserted;
            "Replaced node"
        );
        Ok(Replacement { node, inserted })
    }

    /// Deletes `id` if it is a leaf.
    ///
    /// Links to the removed node are cleared and every later position shifts
    /// down by one. Returns `Ok(false)` and leaves the tree untouched if the
    /// node still has outgoing links.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeOutOfRange`] if `id` does not exist.
    pub fn remove_leaf(&mut self, id: NodeId) -> Result<bool, TreeError> {
        if !self.node(id)?.is_leaf() {
            debug!(node = id.index(); "Kept node with outgoing links");
            return Ok(false);
        }

        let removed = id.index();
        self.nodes.remove(removed);
        self.renumber(|old| {
            if old.index() == removed {
                Link::None
            } else {
                Link::Node(shift_down(old, removed))
            }
        });
        self.release_root_links();

        debug!(node = removed, nodes_len = self.nodes.len(); "Removed leaf");
        Ok(true)
    }
}

fn shift_down(id: NodeId, removed: usize) -> NodeId {
    if id.index() > removed {
        NodeId::new(id.index() - 1)
    } else {
        id
    }
}
