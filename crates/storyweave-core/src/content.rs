//! Branching scenario content model.
//!
//! A scenario is an ordered sequence of [`Node`]s in which a node's position is
//! its identity ([`NodeId`]). Nodes point forward through [`Link`]s: a plain
//! node has a single link, a branching question has one link per authored
//! [`Alternative`].
//!
//! The persisted JSON form (field names `contentTitle`, `showContentTitle`,
//! `type.library`, `type.params`, `type.subContentId`, `nextContentId` and
//! `type.params.alternatives[].nextContentId`) is handled by the
//! [`persisted`] module through serde conversions on [`Node`].

mod persisted;

pub use persisted::ContentError;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Machine name of the library whose nodes fan out into alternatives.
pub const BRANCHING_QUESTION_LIBRARY: &str = "H5P.BranchingQuestion";

/// Returns the machine name part of a library identifier.
///
/// Library identifiers carry a version suffix separated by a space
/// (`"H5P.BranchingQuestion 1.0"`).
///
/// # Examples
///
/// ```
/// # use storyweave_core::content::machine_name;
/// assert_eq!(machine_name("H5P.Text 1.1"), "H5P.Text");
/// assert_eq!(machine_name("H5P.Text"), "H5P.Text");
/// ```
pub fn machine_name(library: &str) -> &str {
    library
        .split_once(' ')
        .map_or(library, |(machine_name, _)| machine_name)
}

/// Position-based identifier of a node inside a scenario.
///
/// Index `0` is always the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The root of every non-empty scenario.
    pub const ROOT: NodeId = NodeId(0);

    /// Creates an identifier for the node at `index`.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the position this identifier refers to.
    pub fn index(self) -> usize {
        self.0
    }

    /// Returns `true` for the root position.
    pub fn is_root(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outgoing reference of a node or of a branching alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Link {
    /// No successor; the owner is a leaf.
    #[default]
    None,
    /// Continue with another node.
    Node(NodeId),
    /// Explicit jump to the end screen. Never an index.
    EndScreen,
}

impl Link {
    /// Raw value used for the end screen in the persisted form.
    pub const END_SCREEN_RAW: i64 = -1;

    /// Decodes a persisted `nextContentId`.
    ///
    /// Missing values and negative values other than `-1` read as [`Link::None`].
    pub fn from_raw(raw: Option<i64>) -> Self {
        match raw {
            Some(Self::END_SCREEN_RAW) => Self::EndScreen,
            Some(index) if index >= 0 => Self::Node(NodeId::new(index as usize)),
            _ => Self::None,
        }
    }

    /// Encodes this link as a persisted `nextContentId`.
    pub fn to_raw(self) -> Option<i64> {
        match self {
            Self::None => None,
            Self::Node(id) => Some(id.index() as i64),
            Self::EndScreen => Some(Self::END_SCREEN_RAW),
        }
    }

    /// Returns the target node, if this link points at one.
    pub fn node(self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(id),
            Self::None | Self::EndScreen => None,
        }
    }

    /// Returns `true` when there is no successor.
    pub fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// Rewrites the target of a node link; other links are returned unchanged.
    pub fn map_node(self, f: impl FnOnce(NodeId) -> Link) -> Link {
        match self {
            Self::Node(id) => f(id),
            other => other,
        }
    }
}

impl From<NodeId> for Link {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

/// Reference to the content type (library and parameters) of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentType {
    library: String,
    params: Value,
    sub_content_id: Uuid,
}

impl ContentType {
    /// Creates a content type with a fresh sub-content identifier.
    pub fn new(library: impl Into<String>, params: Value) -> Self {
        Self {
            library: library.into(),
            params,
            sub_content_id: Uuid::new_v4(),
        }
    }

    /// Replaces the sub-content identifier (builder style).
    pub fn with_sub_content_id(mut self, sub_content_id: Uuid) -> Self {
        self.sub_content_id = sub_content_id;
        self
    }

    /// Full library identifier, including the version suffix.
    pub fn library(&self) -> &str {
        &self.library
    }

    /// Library-specific parameters. Alternatives of a branching question are
    /// held by [`NodeKind::Branching`], not here.
    pub fn params(&self) -> &Value {
        &self.params
    }

    /// Unique identifier of this piece of sub-content.
    pub fn sub_content_id(&self) -> Uuid {
        self.sub_content_id
    }

    /// Returns `true` if nodes of this type are branching questions.
    pub fn is_branching(&self) -> bool {
        machine_name(&self.library) == BRANCHING_QUESTION_LIBRARY
    }

    /// Default display title for a new node of this type.
    ///
    /// Uses the part of the machine name after the vendor prefix
    /// (`"H5P.Text 1.1"` becomes `"Text"`).
    pub fn default_title(&self) -> String {
        let name = machine_name(&self.library);
        name.split_once('.')
            .map_or(name, |(_, short)| short)
            .to_string()
    }
}

/// One authored choice of a branching question.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Alternative {
    next: Link,
    data: Map<String, Value>,
}

impl Alternative {
    /// Creates an alternative leading to `next` with no extra data.
    pub fn new(next: Link) -> Self {
        Self {
            next,
            data: Map::new(),
        }
    }

    /// Attaches alternative-specific data (builder style).
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn next(&self) -> Link {
        self.next
    }

    pub fn set_next(&mut self, next: Link) {
        self.next = next;
    }

    /// Alternative-specific fields other than the link (e.g. the choice text).
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}

/// Structural variant of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Plain { next: Link },
    Branching { alternatives: Vec<Alternative> },
}

/// Values returned by the property-editing form for a node.
///
/// They are written back verbatim; no validation happens in the model.
#[derive(Debug, Clone, PartialEq)]
pub struct EditedContent {
    pub title: String,
    pub show_title: bool,
    pub params: Value,
}

/// One content item of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "persisted::RawNode", into = "persisted::RawNode")]
pub struct Node {
    content_type: ContentType,
    title: String,
    show_title: bool,
    kind: NodeKind,
}

impl Node {
    /// Builds a node from a content type.
    ///
    /// Branching questions take their alternatives from `params.alternatives`;
    /// every other node starts as a leaf.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if a branching question carries malformed
    /// alternatives.
    pub fn new(content_type: ContentType, title: impl Into<String>) -> Result<Self, ContentError> {
        let (content_type, kind) = persisted::split_kind(content_type, None)?;
        Ok(Self {
            content_type,
            title: title.into(),
            show_title: false,
            kind,
        })
    }

    /// Sets the outgoing link of a plain node (builder style).
    ///
    /// Branching questions are left untouched; see [`Node::attach`].
    pub fn with_next(mut self, next: Link) -> Self {
        if let NodeKind::Plain { next: link } = &mut self.kind {
            *link = next;
        }
        self
    }

    /// Replaces the alternatives of a branching question (builder style).
    pub fn with_alternatives(mut self, alternatives: Vec<Alternative>) -> Self {
        if let NodeKind::Branching {
            alternatives: current,
        } = &mut self.kind
        {
            *current = alternatives;
        }
        self
    }

    /// Sets the "show title" flag (builder style).
    pub fn with_show_title(mut self, show_title: bool) -> Self {
        self.show_title = show_title;
        self
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    pub fn library(&self) -> &str {
        self.content_type.library()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn show_title(&self) -> bool {
        self.show_title
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_branching(&self) -> bool {
        matches!(self.kind, NodeKind::Branching { .. })
    }

    /// Returns the alternatives of a branching question, or `None` for a plain node.
    pub fn alternatives(&self) -> Option<&[Alternative]> {
        match &self.kind {
            NodeKind::Branching { alternatives } => Some(alternatives),
            NodeKind::Plain { .. } => None,
        }
    }

    /// All outgoing links in order: one for a plain node, one per alternative
    /// for a branching question.
    pub fn links(&self) -> impl Iterator<Item = Link> + '_ {
        let (single, alternatives) = match &self.kind {
            NodeKind::Plain { next } => (Some(*next), &[][..]),
            NodeKind::Branching { alternatives } => (None, alternatives.as_slice()),
        };
        single
            .into_iter()
            .chain(alternatives.iter().map(Alternative::next))
    }

    /// Mutable access to every outgoing link, in the order of [`Node::links`].
    pub fn links_mut(&mut self) -> Box<dyn Iterator<Item = &mut Link> + '_> {
        match &mut self.kind {
            NodeKind::Plain { next } => Box::new(std::iter::once(next)),
            NodeKind::Branching { alternatives } => {
                Box::new(alternatives.iter_mut().map(|alternative| &mut alternative.next))
            }
        }
    }

    /// Mutable access to one specific outgoing link.
    ///
    /// For a plain node the alternative index is ignored; for a branching
    /// question it selects the alternative.
    pub fn link_mut(&mut self, alternative: usize) -> Option<&mut Link> {
        match &mut self.kind {
            NodeKind::Plain { next } => Some(next),
            NodeKind::Branching { alternatives } => alternatives
                .get_mut(alternative)
                .map(|alternative| &mut alternative.next),
        }
    }

    /// Returns `true` if the node has no outgoing link at all.
    ///
    /// An end-screen link counts as outgoing.
    pub fn is_leaf(&self) -> bool {
        self.links().all(Link::is_none)
    }

    /// The link a node leaves behind when it is moved away.
    ///
    /// Plain nodes hand their successor over to their previous parent;
    /// a branching question takes its alternatives along.
    pub fn detachable_next(&self) -> Link {
        match &self.kind {
            NodeKind::Plain { next } => *next,
            NodeKind::Branching { .. } => Link::None,
        }
    }

    /// Makes `link` this node's successor.
    ///
    /// A plain node replaces its link. A branching question stores it in its
    /// first empty alternative. Returns `false` if a non-empty link could not
    /// be stored.
    pub fn attach(&mut self, link: Link) -> bool {
        match &mut self.kind {
            NodeKind::Plain { next } => {
                *next = link;
                true
            }
            NodeKind::Branching { .. } if link.is_none() => true,
            NodeKind::Branching { alternatives } => {
                match alternatives.iter_mut().find(|alt| alt.next.is_none()) {
                    Some(alternative) => {
                        alternative.next = link;
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Returns `true` if a non-empty link could be stored by [`Node::attach`].
    pub fn can_attach(&self) -> bool {
        match &self.kind {
            NodeKind::Plain { .. } => true,
            NodeKind::Branching { alternatives } => alternatives.iter().any(|alt| alt.next.is_none()),
        }
    }

    /// Writes the edit-form result into this node.
    ///
    /// A branching question re-reads its alternatives from the edited
    /// parameters; links of alternatives that are missing there are kept by
    /// position.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if the edited alternatives are malformed. The
    /// node is unchanged in that case.
    pub fn apply_edit(&mut self, edited: EditedContent) -> Result<(), ContentError> {
        let content_type = ContentType {
            library: self.content_type.library.clone(),
            params: edited.params,
            sub_content_id: self.content_type.sub_content_id,
        };
        let (content_type, kind) = persisted::split_kind(content_type, Some(&self.kind))?;

        self.content_type = content_type;
        self.kind = kind;
        self.title = edited.title;
        self.show_title = edited.show_title;
        Ok(())
    }
}
