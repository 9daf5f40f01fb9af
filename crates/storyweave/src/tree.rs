//! The scenario tree.
//!
//! [`ContentTree`] owns the flat sequence of [`Node`]s of a branching scenario.
//! A node's position is its identity, so every structural edit that moves,
//! inserts or deletes a node renumbers the links of all other nodes in the
//! same step. The editing operations live in submodules:
//!
//! - [`placement`] - moving or inserting a node at a dropzone.
//! - [`replace`] - replacing a node by another and pruning leaves.
//!
//! Every operation validates its arguments first and leaves the tree untouched
//! when it returns an error.

mod placement;
mod replace;

pub use placement::{Placement, Subject};
pub use replace::Replacement;

use log::{debug, trace};
use thiserror::Error;
use uuid::Uuid;

use storyweave_core::content::{ContentError, EditedContent, Link, Node, NodeId};

/// Errors raised by structural edits.
#[derive(Debug, Error, PartialEq)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    NodeOutOfRange(NodeId),

    #[error("node {node} has no alternative {alternative}")]
    AlternativeOutOfRange { node: NodeId, alternative: usize },

    #[error("node {from} links to missing node {to}")]
    DanglingLink { from: NodeId, to: NodeId },

    #[error("node {0} links back to the root")]
    LinkToRoot(NodeId),

    #[error("node {0} cannot be placed relative to itself")]
    SelfPlacement(NodeId),

    #[error("a new root cannot be attached below a parent")]
    RootWithParent,

    #[error("root {0} has no successor that could take its place")]
    RootNotMovable(NodeId),

    #[error("branching question {0} has no empty alternative left")]
    NoFreeAlternative(NodeId),

    #[error("branching question {0} still has outgoing links and cannot be replaced")]
    BranchingTarget(NodeId),

    #[error("branching question {0} cannot be placed inside its own branches")]
    InsideOwnBranches(NodeId),

    #[error(transparent)]
    Content(#[from] ContentError),
}

/// One outgoing link of a node: its single link for a plain node, or one
/// alternative of a branching question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSlot {
    node: NodeId,
    alternative: usize,
}

impl LinkSlot {
    /// The link of a plain node.
    pub fn next(node: NodeId) -> Self {
        Self {
            node,
            alternative: 0,
        }
    }

    /// Alternative `alternative` of a branching question.
    pub fn alternative(node: NodeId, alternative: usize) -> Self {
        Self { node, alternative }
    }

    pub fn node(self) -> NodeId {
        self.node
    }

    pub fn alternative_index(self) -> usize {
        self.alternative
    }
}

/// Ordered, position-addressed collection of scenario nodes.
///
/// # Invariants
///
/// - Every [`Link::Node`] refers to an existing position.
/// - No link refers to the root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentTree {
    nodes: Vec<Node>,
}

impl ContentTree {
    /// Creates an empty scenario.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from nodes whose links are already positions.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DanglingLink`] or [`TreeError::LinkToRoot`] if a
    /// link breaks the tree invariants.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, TreeError> {
        let tree = Self { nodes };
        tree.check_consistency()?;
        Ok(tree)
    }

    /// Reads a scenario from its persisted JSON array.
    pub fn from_json(json: &str) -> Result<Self, crate::StoryweaveError> {
        let nodes: Vec<Node> = serde_json::from_str(json)?;
        debug!(nodes_len = nodes.len(); "Loaded scenario");
        Ok(Self::from_nodes(nodes)?)
    }

    /// Writes the scenario as a pretty-printed JSON array.
    pub fn to_json(&self) -> Result<String, crate::StoryweaveError> {
        Ok(serde_json::to_string_pretty(&self.nodes)?)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Returns the node at `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeOutOfRange`] if there is no such node.
    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).ok_or(TreeError::NodeOutOfRange(id))
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Iterates over all nodes with their positions.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId::new(index), node))
    }

    /// Outgoing links of `id`, in order.
    pub fn children(&self, id: NodeId) -> Result<Vec<Link>, TreeError> {
        Ok(self.node(id)?.links().collect())
    }

    /// Returns `true` if `id` has no outgoing link.
    pub fn is_leaf(&self, id: NodeId) -> Result<bool, TreeError> {
        Ok(self.node(id)?.is_leaf())
    }

    /// All link slots that currently point at `id`.
    pub fn parents(&self, id: NodeId) -> Vec<LinkSlot> {
        self.iter()
            .flat_map(|(parent, node)| {
                node.links()
                    .enumerate()
                    .filter(move |(_, link)| *link == Link::Node(id))
                    .map(move |(alternative, _)| LinkSlot::alternative(parent, alternative))
            })
            .collect()
    }

    /// Finds the current position of the node with the given sub-content
    /// identifier.
    ///
    /// Positions change with every structural edit; the sub-content
    /// identifier does not.
    pub fn position_of(&self, sub_content_id: Uuid) -> Option<NodeId> {
        self.iter()
            .find(|(_, node)| node.content_type().sub_content_id() == sub_content_id)
            .map(|(id, _)| id)
    }

    /// Writes the result of the property editing form into node `id`.
    ///
    /// Edited branching alternatives may carry links; they are validated
    /// before anything is stored.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] if `id` does not exist, the edited content is
    /// malformed or its links break the tree invariants.
    pub fn apply_edit(&mut self, id: NodeId, edited: EditedContent) -> Result<(), TreeError> {
        let mut node = self.node(id)?.clone();
        node.apply_edit(edited)?;
        self.check_links(id, &node)?;

        self.nodes[id.index()] = node;
        debug!(node = id.index(); "Applied node edit");
        Ok(())
    }

    /// Verifies that every link refers to an existing, non-root position.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_consistency(&self) -> Result<(), TreeError> {
        self.iter()
            .try_for_each(|(id, node)| self.check_links(id, node))
    }

    fn check_links(&self, from: NodeId, node: &Node) -> Result<(), TreeError> {
        check_link_targets(from, node, self.nodes.len())
    }

    /// Checks the links a new node brings along, as if it were already
    /// appended at position `id`.
    fn check_new_node(&self, id: NodeId, node: &Node) -> Result<(), TreeError> {
        check_link_targets(id, node, self.nodes.len() + 1)
    }

    /// Returns `true` if `to` can be reached by following links from `from`.
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            for next in node.links().filter_map(Link::node) {
                if next == to {
                    return true;
                }
                if let Some(seen) = visited.get_mut(next.index()) {
                    if !*seen {
                        *seen = true;
                        stack.push(next);
                    }
                }
            }
        }
        false
    }

    fn check_node(&self, id: NodeId) -> Result<(), TreeError> {
        self.node(id).map(|_| ())
    }

    /// Checks that `slot` names an existing link.
    fn check_slot(&self, slot: LinkSlot) -> Result<(), TreeError> {
        let node = self.node(slot.node)?;
        match node.alternatives() {
            Some(alternatives) if slot.alternative >= alternatives.len() => {
                Err(TreeError::AlternativeOutOfRange {
                    node: slot.node,
                    alternative: slot.alternative,
                })
            }
            _ => Ok(()),
        }
    }

    /// Rewrites every node link through `rewrite`.
    fn renumber(&mut self, mut rewrite: impl FnMut(NodeId) -> Link) {
        for node in &mut self.nodes {
            for link in node.links_mut() {
                *link = link.map_node(&mut rewrite);
            }
        }
    }

    /// Clears links that ended up pointing at the root after a node was
    /// promoted into first position.
    fn release_root_links(&mut self) {
        let mut released = 0usize;
        for node in &mut self.nodes {
            for link in node.links_mut() {
                if *link == Link::Node(NodeId::ROOT) {
                    *link = Link::None;
                    released += 1;
                }
            }
        }
        if released > 0 {
            debug!(released; "Released links to the new root");
        }
        trace!(nodes_len = self.nodes.len(); "Renumbered scenario");
    }
}

fn check_link_targets(from: NodeId, node: &Node, len: usize) -> Result<(), TreeError> {
    node.links()
        .filter_map(Link::node)
        .try_for_each(|to| {
            if to.is_root() {
                Err(TreeError::LinkToRoot(from))
            } else if to.index() >= len {
                Err(TreeError::DanglingLink { from, to })
            } else {
                Ok(())
            }
        })
}

impl TryFrom<Vec<Node>> for ContentTree {
    type Error = TreeError;

    fn try_from(nodes: Vec<Node>) -> Result<Self, Self::Error> {
        Self::from_nodes(nodes)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::json;

    use storyweave_core::content::{Alternative, ContentType, Link, Node, NodeId};

    pub fn text(title: &str, next: Option<usize>) -> Node {
        Node::new(ContentType::new("H5P.Text 1.1", json!({})), title)
            .unwrap()
            .with_next(next.map_or(Link::None, |index| Link::Node(NodeId::new(index))))
    }

    pub fn question(title: &str, links: &[Link]) -> Node {
        Node::new(
            ContentType::new("H5P.BranchingQuestion 1.0", json!({})),
            title,
        )
        .unwrap()
        .with_alternatives(links.iter().copied().map(Alternative::new).collect())
    }

    pub fn to(index: usize) -> Link {
        Link::Node(NodeId::new(index))
    }

    pub fn titles(tree: &super::ContentTree) -> Vec<&str> {
        tree.nodes().iter().map(Node::title).collect()
    }

    pub fn links(tree: &super::ContentTree) -> Vec<Vec<Link>> {
        tree.nodes().iter().map(|node| node.links().collect()).collect()
    }
}
