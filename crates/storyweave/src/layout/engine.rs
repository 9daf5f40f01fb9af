//! Recursive tree layout.
//!
//! Each branch (the children of one node) is laid out left to right. A
//! node's subtree is laid out first so the node can be centered above it;
//! the horizontal cursor then advances by whichever is wider, the subtree
//! or the element itself.

use log::{debug, trace};

use storyweave_core::{
    content::{Link, Node, NodeId, NodeKind},
    geometry::{Point, Size},
};

use crate::{
    config::LayoutConfig,
    layout::{
        AlternativeMarker, Connector, ConnectorKind, Dropzone, Element, Layout, LayoutStatus,
        NodeBox, Placeholder, PlaceholderKind, Placing,
    },
    library::LibraryRegistry,
    tree::{ContentTree, LinkSlot},
};

/// Vertical distance from a plain node's level to its children, in units of
/// `spacing_y`.
const PLAIN_LEVEL_STEP: f32 = 5.5;
/// Same for the alternatives of a branching question, which need room for
/// the branch bar and markers.
const BRANCHING_LEVEL_STEP: f32 = 8.0;
const INCOMING_LINE_STEPS: f32 = 3.5;

/// Layout engine for scenario trees.
#[derive(Debug, Clone)]
pub struct Engine {
    node_size: Size,
    spacing_x: f32,
    spacing_y: f32,
    start_y: f32,
    placeholder_size: f32,
}

impl Default for Engine {
    fn default() -> Self {
        Self::from(&LayoutConfig::default())
    }
}

impl From<&LayoutConfig> for Engine {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            node_size: Size::new(config.node_width(), config.node_height()),
            spacing_x: config.spacing_x(),
            spacing_y: config.spacing_y(),
            start_y: config.start_y(),
            placeholder_size: config.placeholder_size(),
        }
    }
}

/// A child slot of a node as the layout sees it.
#[derive(Debug, Clone, Copy)]
enum Child {
    Node(NodeId),
    Empty,
    EndScreen,
}

struct Context<'a> {
    tree: &'a ContentTree,
    libraries: &'a LibraryRegistry,
    placing: Option<Placing>,
    /// Nodes on the path from the root to the branch being laid out.
    path: Vec<NodeId>,
}

/// Laid-out branch.
struct Branch {
    elements: Vec<Element>,
    /// Horizontal cursor after the last element of the branch.
    cursor: f32,
    first_center: Option<f32>,
    last_center: f32,
    has_nodes: bool,
}

impl Branch {
    /// Distance between the centers of the first and the last element.
    fn span(&self) -> f32 {
        self.first_center
            .map_or(0.0, |first| self.last_center - first)
    }
}

impl Engine {
    /// Creates an engine with the default node dimensions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size of node boxes
    pub fn set_node_size(&mut self, size: Size) -> &mut Self {
        self.node_size = size;
        self
    }

    /// Set the horizontal and vertical spacing units
    pub fn set_spacing(&mut self, spacing_x: f32, spacing_y: f32) -> &mut Self {
        self.spacing_x = spacing_x;
        self.spacing_y = spacing_y;
        self
    }

    /// Calculates the layout of `tree`.
    ///
    /// Without a library registry the layout is empty and flagged as
    /// [`LayoutStatus::Loading`]. Dropzones are included only when a node is
    /// being placed.
    pub fn calculate(
        &self,
        tree: &ContentTree,
        libraries: Option<&LibraryRegistry>,
        placing: Option<Placing>,
    ) -> Layout {
        let Some(libraries) = libraries else {
            debug!("Library registry not loaded, skipping layout");
            return Layout::loading();
        };

        if tree.is_empty() {
            let elements = placing
                .map(|_| {
                    Element::Dropzone(Dropzone {
                        position: Point::new(0.0, self.start_y),
                        size: self.placeholder(),
                        target: Link::None,
                        parent: None,
                    })
                })
                .into_iter()
                .collect();
            return Layout {
                elements,
                width: 0.0,
                status: LayoutStatus::Ready,
            };
        }

        let mut context = Context {
            tree,
            libraries,
            placing,
            path: Vec::new(),
        };
        let branch = self.layout_branch(
            &mut context,
            &[Child::Node(NodeId::ROOT)],
            0.0,
            self.start_y,
            None,
        );

        debug!(
            elements_len = branch.elements.len(),
            width = branch.cursor;
            "Calculated scenario layout"
        );
        Layout {
            elements: branch.elements,
            width: branch.cursor,
            status: LayoutStatus::Ready,
        }
    }

    fn placeholder(&self) -> Size {
        Size::new(self.placeholder_size, self.placeholder_size)
    }

    fn layout_branch(
        &self,
        context: &mut Context<'_>,
        branch: &[Child],
        start_x: f32,
        y: f32,
        parent: Option<(NodeId, bool)>,
    ) -> Branch {
        let tree = context.tree;
        let parent_is_branching = parent.is_some_and(|(_, branching)| branching);
        let level_step = if parent_is_branching {
            BRANCHING_LEVEL_STEP
        } else {
            PLAIN_LEVEL_STEP
        };
        let branch_y = y + level_step * self.spacing_y;
        let incoming_line = self.spacing_y * INCOMING_LINE_STEPS;
        let dropzone_gap = (incoming_line - self.placeholder_size) / 2.0;

        let mut elements = Vec::new();
        let mut x = start_x;
        let mut placed_any = false;
        let mut first_center = None;
        let mut last_center = 0.0;
        let mut has_nodes = false;

        for (alternative, child) in branch.iter().copied().enumerate() {
            let content = match child {
                Child::Node(id) => {
                    if context.path.contains(&id) {
                        debug!(node = id.index(); "Skipped cyclic link in layout");
                        continue;
                    }
                    match tree.get(id) {
                        Some(node) => Some((id, node)),
                        None => continue,
                    }
                }
                Child::Empty | Child::EndScreen if !parent_is_branching => continue,
                Child::Empty | Child::EndScreen => None,
            };

            if placed_any {
                x += self.spacing_x;
            }
            placed_any = true;

            let subtree = match content {
                Some((id, node)) => {
                    let children = children_of(tree, node);
                    if children.is_empty() {
                        None
                    } else {
                        context.path.push(id);
                        let subtree = self.layout_branch(
                            context,
                            &children,
                            x,
                            branch_y,
                            Some((id, node.is_branching())),
                        );
                        context.path.pop();
                        Some(subtree)
                    }
                }
                None => None,
            };
            let subtree_width = subtree.as_ref().map_or(0.0, |subtree| subtree.cursor - x);

            let mut position = Point::new(x, branch_y - 2.0 * self.spacing_y);
            if subtree_width >= self.node_size.width() {
                position = position.with_x(x + subtree_width / 2.0 - self.node_size.width() / 2.0);
            }

            let element_size = match content {
                Some(_) => self.node_size,
                None => self.placeholder(),
            };
            let center = position.x() + element_size.width() / 2.0;
            first_center.get_or_insert(center);
            last_center = center;

            let parent_slot = parent.map(|(parent_id, _)| LinkSlot::alternative(parent_id, alternative));

            match content {
                Some((id, node)) => {
                    has_nodes = true;
                    elements.push(Element::Node(NodeBox {
                        id,
                        position,
                        size: self.node_size,
                        label: context.libraries.display_title(node.library()).to_string(),
                        title: node.title().to_string(),
                        branching: node.is_branching(),
                    }));

                    if !id.is_root() {
                        elements.push(vertical(
                            ConnectorKind::Incoming,
                            center,
                            position.y() - incoming_line,
                            incoming_line,
                        ));
                    }

                    let fans_out = node.alternatives().is_some_and(|alts| alts.len() > 1);
                    if let (true, Some(subtree)) = (fans_out, &subtree) {
                        let stub_top = position.y() + self.node_size.height();
                        let bar_y = stub_top + self.spacing_y / 2.0;
                        elements.push(vertical(
                            ConnectorKind::BranchStub,
                            center,
                            stub_top,
                            self.spacing_y / 2.0,
                        ));
                        if let Some(first) = subtree.first_center {
                            elements.push(Element::Connector(Connector {
                                kind: ConnectorKind::BranchBar,
                                start: Point::new(first, bar_y),
                                end: Point::new(first + subtree.span(), bar_y),
                            }));
                        }
                    }
                }
                None => {
                    let kind = match child {
                        Child::EndScreen => PlaceholderKind::EndScreen,
                        _ => PlaceholderKind::EmptyAlternative,
                    };
                    if let Some(slot) = parent_slot {
                        elements.push(Element::Placeholder(Placeholder {
                            kind,
                            slot,
                            position,
                            size: element_size,
                        }));
                    }
                }
            }

            if let (true, Some(slot)) = (parent_is_branching, parent_slot) {
                let stem = self.spacing_y * if branch.len() > 1 { 2.0 } else { 2.5 };
                let line_top = position.y() - incoming_line;
                elements.push(vertical(
                    ConnectorKind::AlternativeStem,
                    center,
                    line_top - stem,
                    stem,
                ));

                let marker_size = self.spacing_y * 1.5 - 2.0;
                elements.push(Element::Marker(AlternativeMarker {
                    slot,
                    position: Point::new(
                        center - self.spacing_y * 0.75 + 1.0,
                        line_top - self.spacing_y * 1.5,
                    ),
                    size: Size::new(marker_size, marker_size),
                    label: format!("A{}", alternative + 1),
                }));
            }

            if let Some(placing) = context.placing {
                let moving_this = matches!(content, Some((id, _)) if placing.is(id));
                let moving_parent = parent.is_some_and(|(parent_id, _)| placing.is(parent_id));
                let inside_moved_question = context.path.iter().any(|&ancestor| {
                    placing.is(ancestor) && tree.get(ancestor).is_some_and(Node::is_branching)
                });
                let dropzone_x = center - self.placeholder_size / 2.0;

                if !moving_this && !moving_parent && !inside_moved_question {
                    let (target, slot) = match (child, parent_is_branching) {
                        (Child::Node(id), false) => (Link::Node(id), None),
                        (Child::Node(id), true) => (Link::Node(id), parent_slot),
                        (Child::EndScreen, _) => (Link::EndScreen, parent_slot),
                        (Child::Empty, _) => (Link::None, parent_slot),
                    };
                    elements.push(Element::Dropzone(Dropzone {
                        position: Point::new(
                            dropzone_x,
                            position.y() - self.placeholder_size - dropzone_gap,
                        ),
                        size: self.placeholder(),
                        target,
                        parent: slot,
                    }));
                }

                let leaf_end = subtree.as_ref().is_none_or(|subtree| !subtree.has_nodes);
                if let (false, false, true, Some((id, node))) =
                    (moving_this, inside_moved_question, leaf_end, content)
                {
                    if let NodeKind::Plain { next } = node.kind() {
                        let target = match next {
                            Link::EndScreen => Link::EndScreen,
                            _ => Link::None,
                        };
                        elements.push(Element::Dropzone(Dropzone {
                            position: Point::new(
                                dropzone_x,
                                position.y() + self.spacing_y * 2.0 + dropzone_gap,
                            ),
                            size: self.placeholder(),
                            target,
                            parent: Some(LinkSlot::next(id)),
                        }));
                    }
                }
            }

            x += if subtree_width >= self.node_size.width() {
                subtree_width
            } else {
                element_size.width()
            };

            if let Some(subtree) = subtree {
                has_nodes |= subtree.has_nodes;
                elements.extend(subtree.elements);
            }
        }

        trace!(
            start_x,
            cursor = x,
            elements_len = elements.len();
            "Laid out branch"
        );
        Branch {
            elements,
            cursor: x,
            first_center,
            last_center,
            has_nodes,
        }
    }
}

fn vertical(kind: ConnectorKind, x: f32, top: f32, height: f32) -> Element {
    Element::Connector(Connector {
        kind,
        start: Point::new(x, top),
        end: Point::new(x, top + height),
    })
}

fn children_of(tree: &ContentTree, node: &Node) -> Vec<Child> {
    match node.kind() {
        NodeKind::Plain { next } => match next {
            Link::Node(id) if tree.get(*id).is_some() => vec![Child::Node(*id)],
            _ => Vec::new(),
        },
        NodeKind::Branching { alternatives } => alternatives
            .iter()
            .map(|alternative| match alternative.next() {
                Link::Node(id) if tree.get(id).is_some() => Child::Node(id),
                Link::EndScreen => Child::EndScreen,
                Link::Node(_) | Link::None => Child::Empty,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::{
        library::Library,
        tree::test_support::{question, text, to},
    };

    fn registry() -> LibraryRegistry {
        LibraryRegistry::new(vec![
            Library::new("H5P.Text 1.1", "Text"),
            Library::new("H5P.BranchingQuestion 1.0", "Branching Question"),
        ])
    }

    fn layout(tree: &ContentTree, placing: Option<Placing>) -> Layout {
        Engine::new().calculate(tree, Some(&registry()), placing)
    }

    #[test]
    fn test_missing_registry_is_loading() {
        let tree = ContentTree::from_nodes(vec![text("A", None)]).unwrap();
        let layout = Engine::new().calculate(&tree, None, None);

        assert!(layout.is_loading());
        assert!(layout.elements().is_empty());
    }

    #[test]
    fn test_single_root() {
        let tree = ContentTree::from_nodes(vec![text("A", None)]).unwrap();
        let layout = layout(&tree, None);

        let root = layout.node(NodeId::ROOT).unwrap();
        assert_approx_eq!(f32, root.position().x(), 0.0);
        assert_approx_eq!(f32, root.position().y(), 156.0);
        assert_eq!(root.label(), "Text");
        assert_eq!(root.title(), "A");
        assert_eq!(layout.connectors().count(), 0);
        assert_approx_eq!(f32, layout.width(), 121.0);
    }

    #[test]
    fn test_chain_levels() {
        let tree = ContentTree::from_nodes(vec![text("A", Some(1)), text("B", None)]).unwrap();
        let layout = layout(&tree, None);

        let child = layout.node(NodeId::new(1)).unwrap();
        assert_approx_eq!(f32, child.position().x(), 0.0);
        assert_approx_eq!(f32, child.position().y(), 244.0);

        let incoming: Vec<_> = layout.connectors().collect();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].kind(), ConnectorKind::Incoming);
        assert_approx_eq!(f32, incoming[0].start().x(), 60.5);
        assert_approx_eq!(f32, incoming[0].start().y(), 188.0);
        assert_approx_eq!(f32, incoming[0].end().y(), 244.0);
    }

    #[test]
    fn test_branching_root_is_centered_over_alternatives() {
        let tree = ContentTree::from_nodes(vec![
            question("Q", &[to(1), to(2), to(3)]),
            text("X", None),
            text("Y", None),
            text("Z", None),
        ])
        .unwrap();
        let layout = layout(&tree, None);

        // Three leaves: 3 * 121 + 2 * 29 = 421.
        assert_approx_eq!(f32, layout.width(), 421.0);
        let root = layout.node(NodeId::ROOT).unwrap();
        assert_approx_eq!(f32, root.position().x(), 150.0);

        let xs: Vec<f32> = (1..=3)
            .map(|index| layout.node(NodeId::new(index)).unwrap().position().x())
            .collect();
        assert_approx_eq!(f32, xs[0], 0.0);
        assert_approx_eq!(f32, xs[1], 150.0);
        assert_approx_eq!(f32, xs[2], 300.0);
        // Alternatives sit one branching level below the question.
        assert_approx_eq!(
            f32,
            layout.node(NodeId::new(1)).unwrap().position().y(),
            156.0 + 128.0
        );

        let labels: Vec<&str> = layout.markers().map(AlternativeMarker::label).collect();
        assert_eq!(labels, vec!["A1", "A2", "A3"]);

        let bar = layout
            .connectors()
            .find(|connector| connector.kind() == ConnectorKind::BranchBar)
            .unwrap();
        assert_approx_eq!(f32, bar.start().x(), 60.5);
        assert_approx_eq!(f32, bar.end().x(), 360.5);
        assert_approx_eq!(f32, bar.start().y(), 196.0);
    }

    #[test]
    fn test_placeholders_for_empty_and_end_screen_alternatives() {
        let tree =
            ContentTree::from_nodes(vec![question("Q", &[Link::None, Link::EndScreen])]).unwrap();
        let layout = layout(&tree, None);

        let kinds: Vec<_> = layout.placeholders().map(Placeholder::kind).collect();
        assert_eq!(
            kinds,
            vec![PlaceholderKind::EmptyAlternative, PlaceholderKind::EndScreen]
        );
        let second = layout.placeholders().nth(1).unwrap();
        assert_eq!(second.slot(), LinkSlot::alternative(NodeId::ROOT, 1));
        assert_approx_eq!(f32, second.position().x(), 71.0);
        // 42 + 29 + 42
        assert_approx_eq!(f32, layout.width(), 113.0);
    }

    #[test]
    fn test_single_alternative_has_longer_stem_and_no_bar() {
        let tree = ContentTree::from_nodes(vec![question("Q", &[to(1)]), text("X", None)]).unwrap();
        let layout = layout(&tree, None);

        assert!(
            layout
                .connectors()
                .all(|connector| connector.kind() != ConnectorKind::BranchBar)
        );
        let stem = layout
            .connectors()
            .find(|connector| connector.kind() == ConnectorKind::AlternativeStem)
            .unwrap();
        assert_approx_eq!(f32, stem.end().y() - stem.start().y(), 40.0);
    }

    #[test]
    fn test_unknown_library_label_falls_back_to_machine_name() {
        let node = Node::new(
            storyweave_core::content::ContentType::new("H5P.Video 1.5", serde_json::json!({})),
            "Clip",
        )
        .unwrap();
        let tree = ContentTree::from_nodes(vec![node]).unwrap();

        assert_eq!(layout(&tree, None).node(NodeId::ROOT).unwrap().label(), "H5P.Video");
    }

    #[test]
    fn test_no_dropzones_without_placing() {
        let tree = ContentTree::from_nodes(vec![text("A", Some(1)), text("B", None)]).unwrap();
        assert_eq!(layout(&tree, None).dropzones().count(), 0);
    }

    #[test]
    fn test_dropzones_for_new_node() {
        let tree = ContentTree::from_nodes(vec![text("A", Some(1)), text("B", None)]).unwrap();
        let layout = layout(&tree, Some(Placing::New));

        let dropzones: Vec<_> = layout
            .dropzones()
            .map(|dropzone| (dropzone.target(), dropzone.parent()))
            .collect();
        assert_eq!(
            dropzones,
            vec![
                (to(0), None),
                (to(1), None),
                (Link::None, Some(LinkSlot::next(NodeId::new(1)))),
            ]
        );
    }

    #[test]
    fn test_moving_node_hides_its_own_dropzones() {
        let tree = ContentTree::from_nodes(vec![
            text("A", Some(1)),
            text("B", Some(2)),
            text("C", None),
        ])
        .unwrap();
        let layout = layout(&tree, Some(Placing::Existing(NodeId::new(1))));

        let targets: Vec<_> = layout.dropzones().map(Dropzone::target).collect();
        // Above A and below C; B and its child offer nothing.
        assert_eq!(targets, vec![to(0), Link::None]);
        assert_eq!(
            layout.dropzones().nth(1).unwrap().parent(),
            Some(LinkSlot::next(NodeId::new(2)))
        );
    }

    #[test]
    fn test_moving_question_hides_dropzones_in_its_branches() {
        let tree = ContentTree::from_nodes(vec![
            text("A", Some(1)),
            question("Q", &[to(2), Link::None]),
            text("X", Some(3)),
            text("Y", None),
        ])
        .unwrap();
        let layout = layout(&tree, Some(Placing::Existing(NodeId::new(1))));

        let dropzones: Vec<_> = layout
            .dropzones()
            .map(|dropzone| (dropzone.target(), dropzone.parent()))
            .collect();
        assert_eq!(dropzones, vec![(to(0), None)]);
    }

    #[test]
    fn test_alternative_dropzones_carry_slot() {
        let tree = ContentTree::from_nodes(vec![
            question("Q", &[to(1), Link::EndScreen]),
            text("X", None),
        ])
        .unwrap();
        let layout = layout(&tree, Some(Placing::New));

        let slots: Vec<_> = layout
            .dropzones()
            .map(|dropzone| (dropzone.target(), dropzone.parent()))
            .collect();
        assert_eq!(
            slots,
            vec![
                (to(0), None),
                (to(1), Some(LinkSlot::alternative(NodeId::ROOT, 0))),
                (Link::None, Some(LinkSlot::next(NodeId::new(1)))),
                (Link::EndScreen, Some(LinkSlot::alternative(NodeId::ROOT, 1))),
            ]
        );
    }

    #[test]
    fn test_empty_tree_offers_start_dropzone() {
        let tree = ContentTree::new();

        assert_eq!(layout(&tree, None).elements().len(), 0);
        let layout = layout(&tree, Some(Placing::New));
        let dropzone = layout.dropzones().next().unwrap();
        assert_eq!(dropzone.target(), Link::None);
        assert_eq!(dropzone.parent(), None);
    }

    #[test]
    fn test_cycle_is_drawn_once() {
        let tree = ContentTree::from_nodes(vec![
            text("A", Some(1)),
            question("Q", &[to(2)]),
            text("B", Some(1)),
        ])
        .unwrap();
        let layout = layout(&tree, None);

        assert_eq!(layout.nodes().count(), 3);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let tree = ContentTree::from_nodes(vec![
            question("Q", &[to(1), Link::None, to(2)]),
            text("X", Some(3)),
            text("Y", None),
            text("Z", None).with_next(Link::EndScreen),
        ])
        .unwrap();

        assert_eq!(layout(&tree, Some(Placing::New)), layout(&tree, Some(Placing::New)));
    }

    #[test]
    fn test_centering_offset() {
        let tree = ContentTree::from_nodes(vec![text("A", None)]).unwrap();
        let layout = layout(&tree, None);

        assert_approx_eq!(f32, layout.centering_offset(321.0), 100.0);
        assert_approx_eq!(f32, layout.centering_offset(50.0), 0.0);
    }
}
