//! Scenario layout.
//!
//! The [`Engine`] turns a [`ContentTree`](crate::tree::ContentTree) into a
//! flat list of positioned [`Element`]s: node boxes, placeholders for empty
//! or finishing alternatives, connector lines, alternative markers and,
//! while a node is being placed, the dropzones it can go to.
//!
//! Positions are top-left corners in canvas space. The layout is a pure
//! function of the tree, the library registry and the placing state.

mod engine;

pub use engine::Engine;

use storyweave_core::{
    content::{Link, NodeId},
    geometry::{Bounds, Point, Size},
};

use crate::tree::LinkSlot;

/// The node currently being placed, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placing {
    /// A node of a freshly picked content type.
    New,
    /// An existing node being moved.
    Existing(NodeId),
}

impl Placing {
    /// Returns `true` if `id` is the node being placed.
    pub fn is(self, id: NodeId) -> bool {
        self == Self::Existing(id)
    }
}

/// A laid-out content node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBox {
    id: NodeId,
    position: Point,
    size: Size,
    label: String,
    title: String,
    branching: bool,
}

impl NodeBox {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Top-left corner.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Display title of the node's library.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The node's own content title.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_branching(&self) -> bool {
        self.branching
    }

    pub fn center_x(&self) -> f32 {
        self.position.x() + self.size.width() / 2.0
    }
}

/// What a placeholder stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// An alternative with no successor yet.
    EmptyAlternative,
    /// An alternative that finishes the scenario.
    EndScreen,
}

/// Box drawn where an alternative has no node to show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placeholder {
    kind: PlaceholderKind,
    slot: LinkSlot,
    position: Point,
    size: Size,
}

impl Placeholder {
    pub fn kind(&self) -> PlaceholderKind {
        self.kind
    }

    /// The alternative this placeholder belongs to.
    pub fn slot(&self) -> LinkSlot {
        self.slot
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }
}

/// Role of a connector line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorKind {
    /// Vertical line above a node, up to its parent or its alternative stem.
    Incoming,
    /// Short vertical line below a branching question.
    BranchStub,
    /// Horizontal line spanning the alternatives of a branching question.
    BranchBar,
    /// Vertical line from the branch bar down to one alternative.
    AlternativeStem,
}

/// Straight line between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connector {
    kind: ConnectorKind,
    start: Point,
    end: Point,
}

impl Connector {
    pub fn kind(&self) -> ConnectorKind {
        self.kind
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }
}

/// Numbered marker ("A1", "A2", ...) on the stem of an alternative.
#[derive(Debug, Clone, PartialEq)]
pub struct AlternativeMarker {
    slot: LinkSlot,
    position: Point,
    size: Size,
    label: String,
}

impl AlternativeMarker {
    pub fn slot(&self) -> LinkSlot {
        self.slot
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A place the node being placed can be dropped on.
///
/// `target` and `parent` are exactly the arguments
/// [`ContentTree::place_node`](crate::tree::ContentTree::place_node) expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dropzone {
    position: Point,
    size: Size,
    target: Link,
    parent: Option<LinkSlot>,
}

impl Dropzone {
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn target(&self) -> Link {
        self.target
    }

    pub fn parent(&self) -> Option<LinkSlot> {
        self.parent
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(self.position, self.size)
    }
}

/// One positioned item of a layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Node(NodeBox),
    Placeholder(Placeholder),
    Connector(Connector),
    Marker(AlternativeMarker),
    Dropzone(Dropzone),
}

impl Element {
    /// Area covered by this element.
    pub fn bounds(&self) -> Bounds {
        match self {
            Self::Node(node) => Bounds::new_from_top_left(node.position, node.size),
            Self::Placeholder(placeholder) => {
                Bounds::new_from_top_left(placeholder.position, placeholder.size)
            }
            Self::Connector(connector) => Bounds::new_from_points(connector.start, connector.end),
            Self::Marker(marker) => Bounds::new_from_top_left(marker.position, marker.size),
            Self::Dropzone(dropzone) => dropzone.bounds(),
        }
    }
}

/// Whether the layout could be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStatus {
    Ready,
    /// The library registry is not available yet; nothing is drawn.
    Loading,
}

/// Result of a layout run.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    elements: Vec<Element>,
    width: f32,
    status: LayoutStatus,
}

impl Layout {
    fn loading() -> Self {
        Self {
            elements: Vec::new(),
            width: 0.0,
            status: LayoutStatus::Loading,
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Horizontal extent of the drawing, from `x = 0`.
    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn status(&self) -> LayoutStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LayoutStatus::Loading
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeBox> {
        self.elements.iter().filter_map(|element| match element {
            Element::Node(node) => Some(node),
            _ => None,
        })
    }

    /// First box drawn for `id`.
    ///
    /// A node reachable through several parents is drawn once per parent.
    pub fn node(&self, id: NodeId) -> Option<&NodeBox> {
        self.nodes().find(|node| node.id == id)
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.elements.iter().filter_map(|element| match element {
            Element::Placeholder(placeholder) => Some(placeholder),
            _ => None,
        })
    }

    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.elements.iter().filter_map(|element| match element {
            Element::Connector(connector) => Some(connector),
            _ => None,
        })
    }

    pub fn markers(&self) -> impl Iterator<Item = &AlternativeMarker> {
        self.elements.iter().filter_map(|element| match element {
            Element::Marker(marker) => Some(marker),
            _ => None,
        })
    }

    pub fn dropzones(&self) -> impl Iterator<Item = &Dropzone> {
        self.elements.iter().filter_map(|element| match element {
            Element::Dropzone(dropzone) => Some(dropzone),
            _ => None,
        })
    }

    /// Smallest box containing every element, or `None` for an empty layout.
    pub fn bounds(&self) -> Option<Bounds> {
        self.elements
            .iter()
            .map(Element::bounds)
            .reduce(|acc, bounds| acc.merge(&bounds))
    }

    /// Horizontal offset that centers the drawing in a container of the
    /// given width. Drawings wider than the container start at the left edge.
    pub fn centering_offset(&self, container_width: f32) -> f32 {
        ((container_width - self.width) / 2.0).max(0.0)
    }
}
