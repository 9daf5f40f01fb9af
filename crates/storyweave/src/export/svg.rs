//! SVG preview of a scenario layout.

use std::{fs::File, io::Write};

use log::{debug, error, info};
use svg::{Document, node::element as svg_element};

use storyweave_core::{
    color::Color,
    geometry::{Bounds, Insets, Point, Size},
};

use crate::{
    config::StyleConfig,
    export,
    layout::{
        AlternativeMarker, Connector, Dropzone, Layout, NodeBox, Placeholder, PlaceholderKind,
    },
};

const MARGIN: f32 = 20.0;
const FONT_FAMILY: &str = "sans-serif";
const LABEL_FONT_SIZE: f32 = 10.0;
const TITLE_FONT_SIZE: f32 = 12.0;
const DASH: &str = "4 3";

/// Renders [`Layout`]s as SVG documents.
#[derive(Debug, Clone)]
pub struct Svg {
    background: Option<Color>,
    node_fill: Color,
    line: Color,
}

impl Svg {
    /// Creates a renderer using the colors of `style`.
    ///
    /// # Errors
    ///
    /// Returns [`export::Error::Render`] if a configured color cannot be parsed.
    pub fn new(style: &StyleConfig) -> Result<Self, export::Error> {
        let background = style.background_color().map_err(export::Error::Render)?;
        let node_fill = style
            .node_fill_color()
            .map_err(export::Error::Render)?
            .map_or_else(|| Color::new("white"), Ok)
            .map_err(export::Error::Render)?;
        let line = style
            .line_color()
            .map_err(export::Error::Render)?
            .unwrap_or_default();

        Ok(Self {
            background,
            node_fill,
            line,
        })
    }

    /// Draws every element of `layout`, connectors first so that boxes cover
    /// their ends.
    pub fn render(&self, layout: &Layout) -> Document {
        let view = layout
            .bounds()
            .unwrap_or_else(|| {
                Bounds::new_from_top_left(Point::default(), Size::new(layout.width(), 0.0))
            })
            .add_padding(Insets::uniform(MARGIN));

        let mut doc = Document::new()
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    view.min_x(),
                    view.min_y(),
                    view.width(),
                    view.height()
                ),
            )
            .set("width", view.width())
            .set("height", view.height());

        if let Some(background) = &self.background {
            doc = doc.add(
                svg_element::Rectangle::new()
                    .set("x", view.min_x())
                    .set("y", view.min_y())
                    .set("width", view.width())
                    .set("height", view.height())
                    .set("fill", background.to_string())
                    .set("fill-opacity", background.alpha()),
            );
        }

        if layout.is_loading() {
            debug!("Layout still loading, rendering notice");
            let corner = view.min_point().add_point(Point::new(MARGIN, MARGIN));
            return doc.add(self.text(corner, TITLE_FONT_SIZE, "Loading..."));
        }

        for connector in layout.connectors() {
            doc = doc.add(self.connector(connector));
        }
        for placeholder in layout.placeholders() {
            doc = doc.add(self.placeholder(placeholder));
        }
        for dropzone in layout.dropzones() {
            doc = doc.add(self.dropzone(dropzone));
        }
        for node in layout.nodes() {
            doc = doc.add(self.node(node));
        }
        for marker in layout.markers() {
            doc = doc.add(self.marker(marker));
        }

        debug!(elements_len = layout.elements().len(); "SVG document rendered");
        doc
    }

    /// Renders `layout` into SVG markup.
    pub fn render_to_string(&self, layout: &Layout) -> String {
        self.render(layout).to_string()
    }

    /// Writes an SVG document to `file_name`.
    pub fn write_document(&self, doc: &Document, file_name: &str) -> Result<(), export::Error> {
        info!(file_name; "Creating SVG file");
        let mut file = File::create(file_name).map_err(|err| {
            error!(file_name, err:err; "Failed to create SVG file");
            export::Error::Io(err)
        })?;

        write!(file, "{doc}").map_err(|err| {
            error!(file_name, err:err; "Failed to write SVG content");
            export::Error::Io(err)
        })
    }

    fn node(&self, node: &NodeBox) -> svg_element::Group {
        let position = node.position();
        let size = node.size();
        let center = Point::new(node.center_x(), position.y() + size.height() / 2.0);

        let frame = svg_element::Rectangle::new()
            .set("x", position.x())
            .set("y", position.y())
            .set("width", size.width())
            .set("height", size.height())
            .set("rx", if node.is_branching() { 0.0 } else { 3.0 })
            .set("fill", self.node_fill.to_string())
            .set("fill-opacity", self.node_fill.alpha())
            .set("stroke", self.line.to_string())
            .set("stroke-opacity", self.line.alpha());
        let label = center.with_y(center.y() - LABEL_FONT_SIZE / 2.0);
        let title = center.with_y(center.y() + TITLE_FONT_SIZE / 2.0);

        svg_element::Group::new()
            .set("data-node", node.id().index())
            .add(frame)
            .add(self.text(label, LABEL_FONT_SIZE, node.label()))
            .add(self.text(title, TITLE_FONT_SIZE, node.title()))
    }

    fn placeholder(&self, placeholder: &Placeholder) -> svg_element::Rectangle {
        let kind = match placeholder.kind() {
            PlaceholderKind::EmptyAlternative => "empty",
            PlaceholderKind::EndScreen => "end",
        };
        self.dashed(placeholder.position(), placeholder.size())
            .set("data-placeholder", kind)
    }

    fn dropzone(&self, dropzone: &Dropzone) -> svg_element::Rectangle {
        let rect = self.dashed(dropzone.position(), dropzone.size());
        match dropzone.target().to_raw() {
            Some(raw) => rect.set("data-target", raw),
            None => rect,
        }
    }

    fn connector(&self, connector: &Connector) -> svg_element::Line {
        let (start, end) = (connector.start(), connector.end());
        svg_element::Line::new()
            .set("x1", start.x())
            .set("y1", start.y())
            .set("x2", end.x())
            .set("y2", end.y())
            .set("stroke", self.line.to_string())
            .set("stroke-opacity", self.line.alpha())
    }

    fn marker(&self, marker: &AlternativeMarker) -> svg_element::Group {
        let size = marker.size();
        let radius = size.width().min(size.height()) / 2.0;
        let center = marker
            .position()
            .add_point(Point::new(size.width() / 2.0, size.height() / 2.0));

        let circle = svg_element::Circle::new()
            .set("cx", center.x())
            .set("cy", center.y())
            .set("r", radius)
            .set("fill", self.node_fill.to_string())
            .set("stroke", self.line.to_string());

        svg_element::Group::new()
            .add(circle)
            .add(self.text(center, LABEL_FONT_SIZE, marker.label()))
    }

    fn dashed(&self, position: Point, size: Size) -> svg_element::Rectangle {
        svg_element::Rectangle::new()
            .set("x", position.x())
            .set("y", position.y())
            .set("width", size.width())
            .set("height", size.height())
            .set("fill", "none")
            .set("stroke", self.line.to_string())
            .set("stroke-opacity", self.line.alpha())
            .set("stroke-dasharray", DASH)
    }

    fn text(&self, position: Point, font_size: f32, content: &str) -> svg_element::Text {
        svg_element::Text::new(content)
            .set("x", position.x())
            .set("y", position.y())
            .set("text-anchor", "middle")
            .set("dominant-baseline", "central")
            .set("font-family", FONT_FAMILY)
            .set("font-size", font_size)
            .set("fill", self.line.to_string())
    }
}
