//! Moving and inserting nodes.
//!
//! Placing node `X` in front of target `T` means: the parents of `T` now
//! lead to `X`, `X` leads to `T`, and whatever `X` led to before is handed to
//! `X`'s previous parents. Placing a node in front of the root promotes it
//! into position `0`, which shifts every earlier position up by one.

use log::{debug, warn};

use storyweave_core::content::{Link, Node, NodeId};

use super::{ContentTree, LinkSlot, TreeError};

/// The node being placed.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    /// A node already in the tree.
    Existing(NodeId),
    /// A node that is appended to the tree as part of the placement.
    New(Box<Node>),
}

impl Subject {
    pub fn new_node(node: Node) -> Self {
        Self::New(Box::new(node))
    }
}

/// Outcome of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    node: NodeId,
    inserted: bool,
}

impl Placement {
    /// Final position of the placed node.
    pub fn node(self) -> NodeId {
        self.node
    }

    /// Returns `true` if the placed node was new.
    pub fn inserted(self) -> bool {
        self.inserted
    }
}

/// Rotation of `nodes[..=promoted]` that moves `promoted` to the front.
///
/// Positions below the bump threshold (`promoted + 1`) move up by one,
/// except `promoted` itself which becomes the root.
#[derive(Debug, Clone, Copy)]
struct Promotion {
    promoted: usize,
}

impl Promotion {
    fn bump_threshold(self) -> usize {
        self.promoted + 1
    }

    fn map(self, index: usize) -> usize {
        if index == self.promoted {
            0
        } else if index < self.bump_threshold() {
            index + 1
        } else {
            index
        }
    }

    fn map_id(self, id: NodeId) -> NodeId {
        NodeId::new(self.map(id.index()))
    }
}

/// How the moved node is reconnected.
#[derive(Debug, Clone, Copy)]
enum Shape {
    /// The node takes an ordinary position.
    Regular,
    /// The node becomes the new root, in front of the old one.
    NewRoot(Promotion),
    /// The root moves away and its successor takes its place.
    RootMoved(Promotion),
    /// The root is dropped in front of its own successor.
    Unchanged,
}

impl Shape {
    fn promotion(self) -> Option<Promotion> {
        match self {
            Self::Regular | Self::Unchanged => None,
            Self::NewRoot(promotion) | Self::RootMoved(promotion) => Some(promotion),
        }
    }

    fn map_id(self, id: NodeId) -> NodeId {
        self.promotion().map_or(id, |promotion| promotion.map_id(id))
    }
}

impl ContentTree {
    /// Places `subject` in front of `target`.
    ///
    /// `target` is the link a dropzone represents: the node the subject will
    /// lead to, [`Link::EndScreen`], or [`Link::None`] when dropping below a
    /// leaf. `parent` names the link slot that should lead to the subject
    /// afterwards; it is required when dropping below a leaf or onto an
    /// alternative of a branching question.
    ///
    /// The first node of an empty tree is always inserted at the root;
    /// `target` and `parent` are ignored in that case.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] when an argument refers to a missing node or
    /// alternative, when the subject would be placed relative to itself, or
    /// when a branching question has no empty alternative to keep `target`.
    /// A new subject must only link to positions that exist once it is
    /// appended, and a moved branching question cannot land inside its own
    /// branches. The tree is unchanged in that case.
    ///
    /// Moving the root in front of its own successor changes nothing.
    pub fn place_node(
        &mut self,
        subject: Subject,
        target: Link,
        parent: Option<LinkSlot>,
    ) -> Result<Placement, TreeError> {
        let (id, pending) = match subject {
            Subject::Existing(id) => {
                self.check_node(id)?;
                (id, None)
            }
            Subject::New(node) if self.nodes.is_empty() => {
                self.check_new_node(NodeId::ROOT, &node)?;
                self.nodes.push(*node);
                debug!("Placed first node at the root");
                return Ok(Placement {
                    node: NodeId::ROOT,
                    inserted: true,
                });
            }
            Subject::New(node) => (NodeId::new(self.nodes.len()), Some(*node)),
        };

        let moved = match &pending {
            Some(node) => node,
            None => &self.nodes[id.index()],
        };
        let shape = self.plan_placement(id, moved, target, parent)?;
        if matches!(shape, Shape::Unchanged) {
            debug!(node = id.index(); "Root already leads to the target");
            return Ok(Placement {
                node: id,
                inserted: false,
            });
        }
        let current_next = moved.detachable_next();

        let inserted = pending.is_some();
        if let Some(node) = pending {
            self.nodes.push(node);
        }

        self.bridge_and_redirect(id, current_next, target);

        if let Some(promotion) = shape.promotion() {
            self.nodes[..promotion.bump_threshold()].rotate_right(1);
            let promoted = NodeId::new(promotion.promoted);
            self.renumber(|old| {
                if old == promoted {
                    Link::None
                } else {
                    Link::Node(promotion.map_id(old))
                }
            });
        }

        let placed = shape.map_id(id);
        if let Some(slot) = parent {
            let parent_id = shape.map_id(slot.node);
            if let Some(link) = self.nodes[parent_id.index()].link_mut(slot.alternative) {
                *link = Link::Node(placed);
            }
        }

        let own_link = match shape {
            Shape::Regular | Shape::Unchanged => target,
            Shape::NewRoot(_) => Link::Node(NodeId::new(1)),
            Shape::RootMoved(promotion) => target.map_node(|t| Link::Node(promotion.map_id(t))),
        };
        if !self.nodes[placed.index()].attach(own_link) {
            // `plan_placement` has checked for an empty alternative.
            warn!(node = placed.index(); "Placed node could not keep its target");
        }

        debug!(
            node = placed.index(),
            inserted,
            nodes_len = self.nodes.len();
            "Placed node"
        );
        Ok(Placement {
            node: placed,
            inserted,
        })
    }

    /// Validates a placement and decides its shape without touching the tree.
    fn plan_placement(
        &self,
        id: NodeId,
        moved: &Node,
        target: Link,
        parent: Option<LinkSlot>,
    ) -> Result<Shape, TreeError> {
        let existing = id.index() < self.nodes.len();
        if !existing {
            self.check_new_node(id, moved)?;
        }
        if let Link::Node(target_id) = target {
            self.check_node(target_id)?;
            if target_id == id {
                return Err(TreeError::SelfPlacement(id));
            }
        }
        if let Some(slot) = parent {
            self.check_slot(slot)?;
            if slot.node == id {
                return Err(TreeError::SelfPlacement(id));
            }
        }

        let needs_slot = !target.is_none();
        if target == Link::Node(NodeId::ROOT) {
            if parent.is_some() {
                return Err(TreeError::RootWithParent);
            }
            if !moved.can_attach() {
                return Err(TreeError::NoFreeAlternative(id));
            }
            return Ok(Shape::NewRoot(Promotion {
                promoted: id.index(),
            }));
        }

        if needs_slot && !moved.can_attach() {
            return Err(TreeError::NoFreeAlternative(id));
        }

        if id.is_root() {
            let Link::Node(successor) = moved.detachable_next() else {
                return Err(TreeError::RootNotMovable(id));
            };
            if target == Link::Node(successor) {
                if parent.is_some() {
                    return Err(TreeError::RootWithParent);
                }
                return Ok(Shape::Unchanged);
            }
            return Ok(Shape::RootMoved(Promotion {
                promoted: successor.index(),
            }));
        }

        // A moved branching question hands nothing to its parents, so its
        // branches would be cut off from the root.
        if existing && moved.is_branching() {
            let inside = target
                .node()
                .into_iter()
                .chain(parent.map(|slot| slot.node))
                .any(|node| self.reaches(id, node));
            if inside {
                return Err(TreeError::InsideOwnBranches(id));
            }
        }

        Ok(Shape::Regular)
    }

    /// Hands `id`'s former successor to its parents and points the parents of
    /// `target` at `id`, all in pre-move positions.
    ///
    /// The rules apply one after the other, so a parent whose bridged link
    /// is `target` ends up leading to `id` again.
    fn bridge_and_redirect(&mut self, id: NodeId, current_next: Link, target: Link) {
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if index == id.index() {
                continue;
            }
            for link in node.links_mut() {
                if *link == Link::Node(id) {
                    *link = current_next;
                }
                if matches!(target, Link::Node(_)) && *link == target {
                    *link = Link::Node(id);
                }
            }
        }
    }
}
