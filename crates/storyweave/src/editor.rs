//! Interactive editing session.
//!
//! An [`Editor`] wraps a [`ContentTree`] together with the transient state of
//! the authoring canvas: which node is being placed, which replacement is
//! awaiting confirmation, and whether the library registry has arrived. Hosts
//! observe committed changes through [`EditorObserver`].
//!
//! ```text
//!            start_inserting / select
//!   Idle ───────────────────────────────► Placing
//!    ▲                                     │   │
//!    │ drop_on / cancel                    │   │ select(other node)
//!    └─────────────────────────────────────┘   ▼
//!    ▲                               ConfirmingReplace
//!    └──────── confirm_replace / cancel ───────┘
//! ```

use log::{debug, info};
use thiserror::Error;

use storyweave_core::content::{ContentError, ContentType, EditedContent, Node, NodeId};

use crate::{
    layout::{Dropzone, Engine, Layout, Placing},
    library::LibraryRegistry,
    tree::{ContentTree, Placement, Replacement, Subject, TreeError},
};

/// Errors raised by editor interactions.
#[derive(Debug, Error, PartialEq)]
pub enum EditorError {
    #[error("no node is being placed")]
    NotPlacing,

    #[error("no replacement is awaiting confirmation")]
    NothingToConfirm,

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Receives notifications about committed edits.
pub trait EditorObserver {
    /// The scenario changed; `tree` is its new state.
    fn content_changed(&mut self, _tree: &ContentTree) {}

    /// A new node was inserted at `id` and may be opened for editing.
    fn node_inserted(&mut self, _id: NodeId, _node: &Node) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EditorObserver for NoopObserver {}

/// Current interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Placing(Placing),
    /// `placing` was dropped on `target`; the host must confirm the
    /// replacement.
    ConfirmingReplace { placing: Placing, target: NodeId },
}

/// Editing session over one scenario.
#[derive(Debug)]
pub struct Editor<O: EditorObserver = NoopObserver> {
    tree: ContentTree,
    observer: O,
    engine: Engine,
    libraries: Option<LibraryRegistry>,
    interaction: Interaction,
    pending_content: Option<ContentType>,
}

impl Editor<NoopObserver> {
    pub fn new(tree: ContentTree) -> Self {
        Self::with_observer(tree, NoopObserver)
    }
}

impl<O: EditorObserver> Editor<O> {
    pub fn with_observer(tree: ContentTree, observer: O) -> Self {
        Self {
            tree,
            observer,
            engine: Engine::default(),
            libraries: None,
            interaction: Interaction::Idle,
            pending_content: None,
        }
    }

    /// Replaces the layout engine (builder style).
    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Provides the library registry once it is available.
    pub fn set_libraries(&mut self, libraries: LibraryRegistry) {
        debug!(libraries_len = libraries.len(); "Library registry loaded");
        self.libraries = Some(libraries);
    }

    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    pub fn into_tree(self) -> ContentTree {
        self.tree
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    fn placing(&self) -> Option<Placing> {
        match self.interaction {
            Interaction::Idle => None,
            Interaction::Placing(placing) | Interaction::ConfirmingReplace { placing, .. } => {
                Some(placing)
            }
        }
    }

    /// Current layout, including dropzones while placing.
    pub fn layout(&self) -> Layout {
        let placing = match self.interaction {
            Interaction::Placing(placing) => Some(placing),
            _ => None,
        };
        self.engine
            .calculate(&self.tree, self.libraries.as_ref(), placing)
    }

    /// Starts placing a new node of `content_type`.
    pub fn start_inserting(&mut self, content_type: ContentType) {
        debug!(library = content_type.library(); "Started inserting");
        self.pending_content = Some(content_type);
        self.interaction = Interaction::Placing(Placing::New);
    }

    /// Handles a click on node `id`.
    ///
    /// While another node is being placed this asks for a replacement of
    /// `id`; otherwise `id` is picked up for moving.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeOutOfRange`] if `id` does not exist.
    pub fn select(&mut self, id: NodeId) -> Result<(), EditorError> {
        self.tree.node(id)?;
        self.interaction = match self.placing() {
            Some(placing) if !placing.is(id) => Interaction::ConfirmingReplace {
                placing,
                target: id,
            },
            _ => {
                self.pending_content = None;
                Interaction::Placing(Placing::Existing(id))
            }
        };
        debug!(node = id.index(), interaction:? = self.interaction; "Selected node");
        Ok(())
    }

    /// Drops the node being placed on `dropzone`.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NotPlacing`] outside of a placing interaction,
    /// or the error of the underlying tree edit. The session stays in the
    /// placing state on error.
    pub fn drop_on(&mut self, dropzone: &Dropzone) -> Result<Placement, EditorError> {
        let Interaction::Placing(placing) = self.interaction else {
            return Err(EditorError::NotPlacing);
        };

        let subject = self.subject(placing)?;
        let placement = self
            .tree
            .place_node(subject, dropzone.target(), dropzone.parent())?;

        self.finish();
        if placement.inserted() {
            if let Some(node) = self.tree.get(placement.node()) {
                self.observer.node_inserted(placement.node(), node);
            }
        }
        self.observer.content_changed(&self.tree);
        info!(node = placement.node().index(), inserted = placement.inserted(); "Placed node");
        Ok(placement)
    }

    /// Carries out the replacement awaiting confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NothingToConfirm`] when no replacement is
    /// pending, or the error of the underlying tree edit. The session returns
    /// to the placing state on a tree error.
    pub fn confirm_replace(&mut self) -> Result<Replacement, EditorError> {
        let Interaction::ConfirmingReplace { placing, target } = self.interaction else {
            return Err(EditorError::NothingToConfirm);
        };

        let subject = self.subject(placing)?;
        let replacement = match self.tree.delete_and_replace(target, subject) {
            Ok(replacement) => replacement,
            Err(err) => {
                self.interaction = Interaction::Placing(placing);
                return Err(err.into());
            }
        };

        self.finish();
        self.observer.content_changed(&self.tree);
        info!(target_node = target.index(), node = replacement.node().index(); "Replaced node");
        Ok(replacement)
    }

    /// Abandons the current interaction.
    pub fn cancel(&mut self) {
        if self.interaction != Interaction::Idle {
            debug!(interaction:? = self.interaction; "Cancelled interaction");
        }
        self.finish();
    }

    /// Writes the result of the property editing form into node `id`.
    ///
    /// # Errors
    ///
    /// Returns the tree error if the edit is rejected; nothing changes then.
    pub fn apply_edit(&mut self, id: NodeId, edited: EditedContent) -> Result<(), EditorError> {
        self.tree.apply_edit(id, edited)?;
        self.observer.content_changed(&self.tree);
        Ok(())
    }

    /// Deletes `id` if it is a leaf. Returns `false` if it was kept.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeOutOfRange`] if `id` does not exist.
    pub fn remove_leaf(&mut self, id: NodeId) -> Result<bool, EditorError> {
        let removed = self.tree.remove_leaf(id)?;
        if removed {
            self.observer.content_changed(&self.tree);
        }
        Ok(removed)
    }

    fn subject(&self, placing: Placing) -> Result<Subject, EditorError> {
        match placing {
            Placing::Existing(id) => Ok(Subject::Existing(id)),
            Placing::New => {
                let content_type = self
                    .pending_content
                    .clone()
                    .ok_or(EditorError::NotPlacing)?;
                let title = content_type.default_title();
                Ok(Subject::new_node(Node::new(content_type, title)?))
            }
        }
    }

    fn finish(&mut self) {
        self.interaction = Interaction::Idle;
        self.pending_content = None;
    }
}
