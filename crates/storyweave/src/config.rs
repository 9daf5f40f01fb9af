//! Configuration types for scenario layout and preview rendering.
//!
//! All types implement [`serde::Deserialize`] for loading from external
//! sources such as TOML files.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout, style and the
//!   known content libraries.
//! - [`LayoutConfig`] - Node dimensions and spacing used by the layout engine.
//! - [`StyleConfig`] - Colors used by the SVG preview.
//!
//! # Example
//!
//! ```
//! # use storyweave::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().node_width(), 121.0);
//! assert!(config.style().background_color().is_ok());
//! ```

use serde::Deserialize;

use storyweave_core::color::Color;

use crate::library::Library;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,

    /// Content libraries available to authors, with their display titles.
    #[serde(default)]
    libraries: Vec<Library>,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(layout: LayoutConfig, style: StyleConfig, libraries: Vec<Library>) -> Self {
        Self {
            layout,
            style,
            libraries,
        }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Returns the configured content libraries.
    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }
}

/// Node dimensions and spacing for the layout engine.
///
/// Vertical distances are expressed as multiples of `spacing_y`, so scaling
/// it scales the whole drawing vertically.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_node_width")]
    node_width: f32,

    #[serde(default = "default_node_height")]
    node_height: f32,

    /// Horizontal gap between sibling subtrees.
    #[serde(default = "default_spacing_x")]
    spacing_x: f32,

    /// Base unit for vertical distances.
    #[serde(default = "default_spacing_y")]
    spacing_y: f32,

    /// Vertical offset of the first level.
    #[serde(default = "default_start_y")]
    start_y: f32,

    /// Width and height of empty alternatives, end screens and dropzones.
    #[serde(default = "default_placeholder_size")]
    placeholder_size: f32,
}

fn default_node_width() -> f32 {
    121.0
}

fn default_node_height() -> f32 {
    32.0
}

fn default_spacing_x() -> f32 {
    29.0
}

fn default_spacing_y() -> f32 {
    16.0
}

fn default_start_y() -> f32 {
    100.0
}

fn default_placeholder_size() -> f32 {
    42.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: default_node_width(),
            node_height: default_node_height(),
            spacing_x: default_spacing_x(),
            spacing_y: default_spacing_y(),
            start_y: default_start_y(),
            placeholder_size: default_placeholder_size(),
        }
    }
}

impl LayoutConfig {
    pub fn node_width(&self) -> f32 {
        self.node_width
    }

    pub fn node_height(&self) -> f32 {
        self.node_height
    }

    pub fn spacing_x(&self) -> f32 {
        self.spacing_x
    }

    pub fn spacing_y(&self) -> f32 {
        self.spacing_y
    }

    pub fn start_y(&self) -> f32 {
        self.start_y
    }

    pub fn placeholder_size(&self) -> f32 {
        self.placeholder_size
    }
}

/// Visual styling configuration for SVG previews.
///
/// Fields that are not set fall back to renderer defaults.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StyleConfig {
    /// Background [`Color`] of the preview, as a color string.
    #[serde(default)]
    background_color: Option<String>,

    /// Fill [`Color`] of node boxes.
    #[serde(default)]
    node_fill_color: Option<String>,

    /// [`Color`] of connectors, node outlines and markers.
    #[serde(default)]
    line_color: Option<String>,
}

impl StyleConfig {
    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        parse_color(self.background_color.as_deref(), "background")
    }

    /// Returns the parsed node fill [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn node_fill_color(&self) -> Result<Option<Color>, String> {
        parse_color(self.node_fill_color.as_deref(), "node fill")
    }

    /// Returns the parsed line [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn line_color(&self) -> Result<Option<Color>, String> {
        parse_color(self.line_color.as_deref(), "line")
    }
}

fn parse_color(color: Option<&str>, what: &str) -> Result<Option<Color>, String> {
    color
        .map(Color::new)
        .transpose()
        .map_err(|err| format!("Invalid {what} color in config: {err}"))
}
