//! Storyweave - tree model and layout engine for branching scenarios.
//!
//! A branching scenario is an ordered list of content nodes where every node
//! links to the node that follows it, and branching questions link to one
//! node per alternative. This crate keeps that list consistent under
//! structural edits ([`tree`]), lays it out as a top-down tree for the
//! authoring canvas ([`layout`]), tracks the canvas interaction
//! ([`editor`]) and renders SVG previews ([`export`]).

pub mod config;
pub mod editor;
pub mod export;
pub mod layout;
pub mod library;
pub mod params;
pub mod schema;
pub mod translations;
pub mod tree;

mod error;

pub use storyweave_core::{color, content, geometry};

pub use error::StoryweaveError;

use log::{debug, info, trace};

use config::AppConfig;
use editor::Editor;
use layout::{Engine, Layout, Placing};
use library::LibraryRegistry;
use tree::ContentTree;

/// Builder for loading, laying out and rendering scenarios.
///
/// # Examples
///
/// ```rust
/// use storyweave::{ScenarioBuilder, config::AppConfig};
///
/// let json = r#"[
///     {"type": {"library": "H5P.Text 1.1", "params": {}}, "contentTitle": "Intro", "nextContentId": 1},
///     {"type": {"library": "H5P.Text 1.1", "params": {}}, "contentTitle": "Outro", "nextContentId": -1}
/// ]"#;
///
/// let builder = ScenarioBuilder::new(AppConfig::default());
/// let tree = builder.parse(json).expect("Failed to parse scenario");
/// assert_eq!(tree.len(), 2);
///
/// let svg = builder.render_svg(&tree).expect("Failed to render scenario");
/// assert!(svg.contains("Intro"));
/// ```
#[derive(Debug, Default)]
pub struct ScenarioBuilder {
    config: AppConfig,
}

impl ScenarioBuilder {
    /// Create a new scenario builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse the persisted JSON content list into a tree.
    ///
    /// # Errors
    ///
    /// Returns `StoryweaveError` for malformed JSON, invalid nodes, or links
    /// that do not resolve inside the list.
    pub fn parse(&self, json: &str) -> Result<ContentTree, StoryweaveError> {
        info!("Parsing scenario");
        let tree = ContentTree::from_json(json)?;

        debug!(nodes_len = tree.len(); "Scenario parsed successfully");
        trace!(tree:?; "Parsed scenario");
        Ok(tree)
    }

    /// Library registry built from the configured libraries.
    pub fn registry(&self) -> LibraryRegistry {
        LibraryRegistry::from(self.config.libraries())
    }

    /// Layout engine using the configured dimensions.
    pub fn engine(&self) -> Engine {
        Engine::from(self.config.layout())
    }

    /// Lay out `tree`, optionally with dropzones for a node being placed.
    pub fn layout(&self, tree: &ContentTree, placing: Option<Placing>) -> Layout {
        self.engine()
            .calculate(tree, Some(&self.registry()), placing)
    }

    /// Render `tree` to an SVG string.
    ///
    /// # Errors
    ///
    /// Returns `StoryweaveError` if the configured style cannot be used.
    pub fn render_svg(&self, tree: &ContentTree) -> Result<String, StoryweaveError> {
        info!(nodes_len = tree.len(); "Rendering scenario");
        let layout = self.layout(tree, None);
        let svg = export::svg::Svg::new(self.config.style())?.render_to_string(&layout);

        info!("SVG rendered successfully");
        Ok(svg)
    }

    /// Open an editing session on `tree` using the configured engine and
    /// libraries.
    pub fn editor(&self, tree: ContentTree) -> Editor {
        let mut editor = Editor::new(tree).with_engine(self.engine());
        editor.set_libraries(self.registry());
        editor
    }
}
