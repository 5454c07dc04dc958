//! SVG export of a [`RenderScene`].
//!
//! Shapes are drawn as plain rectangles tagged with their kind, connectors as
//! paths referencing shared marker definitions. Visual styling is left to the
//! host stylesheet; only dashed lines and markers are baked in.

use std::{collections::BTreeSet, fs::File, io::Write, path::Path as FsPath};

use log::{debug, error, info};
use svg::{
    Document,
    node::{
        Text as SvgText,
        element::{Definitions, Group, Marker, Path, Rectangle, Text},
    },
};

use easel_core::{
    geometry::{Bounds, Point},
    routing::ConnectorPath,
};

use crate::{
    export,
    model::{LineKind, MarkerKind},
    scene::{RenderConnector, RenderScene, RenderShape},
};

/// Margin added around the scene content.
const MARGIN: f32 = 50.0;

const DASH_PATTERN: &str = "6 4";

/// Renders `scene` to an SVG string.
pub fn render_scene_svg(scene: &RenderScene) -> String {
    let doc = render_document(scene);
    debug!("SVG document rendered");
    doc.to_string()
}

/// Builds the SVG document for `scene`.
pub fn render_document(scene: &RenderScene) -> Document {
    let view = scene
        .bounds()
        .unwrap_or_else(|| Bounds::new_from_corners(Point::default(), Point::default()))
        .expand(MARGIN);
    debug!(width = view.width(), height = view.height(); "Final SVG dimensions");

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

    let markers: BTreeSet<&'static str> = scene
        .connectors()
        .iter()
        .flat_map(|connector| [connector.start_marker, connector.end_marker])
        .filter(|marker| *marker != MarkerKind::None)
        .map(MarkerKind::name)
        .collect();
    if !markers.is_empty() {
        doc = doc.add(create_marker_definitions(markers));
    }

    let mut shapes = Group::new().set("class", "shapes");
    for shape in scene.shapes() {
        shapes = shapes.add(render_shape(shape));
    }
    doc = doc.add(shapes);

    let mut connectors = Group::new().set("class", "connectors");
    for connector in scene.connectors() {
        connectors = connectors.add(render_connector(connector));
    }
    doc = doc.add(connectors);

    if let Some(preview) = scene.preview() {
        doc = doc.add(
            Path::new()
                .set("class", "preview")
                .set("d", preview.path.path_data())
                .set("fill", "none")
                .set("stroke", "black")
                .set("stroke-dasharray", DASH_PATTERN),
        );
    }

    doc
}

/// Writes `doc` to the file at `path`.
pub fn write_document(doc: &Document, path: &FsPath) -> Result<(), export::Error> {
    info!(file_name:? = path; "Creating SVG file");
    let f = match File::create(path) {
        Ok(file) => file,
        Err(err) => {
            error!(file_name:? = path, err:err; "Failed to create SVG file");
            return Err(export::Error::Io(err));
        }
    };

    if let Err(err) = write!(&f, "{doc}") {
        error!(file_name:? = path, err:err; "Failed to write SVG content");
        return Err(export::Error::Io(err));
    }

    Ok(())
}

/// Creates one marker definition per marker name in use.
///
/// Markers are oriented with `auto-start-reverse`, so the same definition
/// serves both connector ends.
fn create_marker_definitions(names: BTreeSet<&'static str>) -> Definitions {
    let mut defs = Definitions::new();
    for name in names {
        let (d, fill, ref_x) = match name {
            "arrow" => ("M 0 0 L 10 5 L 0 10 z", "black", 9),
            "open_arrow" => ("M 0 0 L 10 5 L 0 10", "none", 9),
            "triangle" => ("M 0 0 L 10 5 L 0 10 z", "white", 9),
            "diamond" => ("M 0 5 L 5 0 L 10 5 L 5 10 z", "white", 10),
            "filled_diamond" => ("M 0 5 L 5 0 L 10 5 L 5 10 z", "black", 10),
            _ => ("M 5 0 A 5 5 0 1 1 5 10 A 5 5 0 1 1 5 0 z", "white", 10),
        };
        let marker = Marker::new()
            .set("id", marker_id(name))
            .set("viewBox", "0 0 10 10")
            .set("refX", ref_x)
            .set("refY", 5)
            .set("markerWidth", 8)
            .set("markerHeight", 8)
            .set("orient", "auto-start-reverse")
            .add(
                Path::new()
                    .set("d", d)
                    .set("fill", fill)
                    .set("stroke", "black"),
            );
        defs = defs.add(marker);
    }
    defs
}

fn marker_id(name: &str) -> String {
    format!("marker-{name}")
}

fn marker_url(marker: MarkerKind) -> Option<String> {
    (marker != MarkerKind::None).then(|| format!("url(#{})", marker_id(marker.name())))
}

fn render_shape(shape: &RenderShape) -> Group {
    let min = shape.bounds.min_point();
    let mut class = format!("shape {}", shape.kind.name());
    if shape.selected {
        class.push_str(" selected");
    }
    if shape.hovered {
        class.push_str(" hovered");
    }

    let mut group = Group::new()
        .set("class", class)
        .set("data-id", shape.id.to_string())
        .add(
            Rectangle::new()
                .set("x", min.x())
                .set("y", min.y())
                .set("width", shape.bounds.width())
                .set("height", shape.bounds.height())
                .set("fill", "none")
                .set("stroke", "black"),
        );
    if let Some(label) = &shape.label {
        let center = shape.bounds.center();
        group = group.add(render_label(label, center));
    }
    group
}

fn render_connector(connector: &RenderConnector) -> Group {
    let mut class = format!("connector {}", connector.connector_type);
    if connector.selected {
        class.push_str(" selected");
    }
    if connector.hovered {
        class.push_str(" hovered");
    }

    let mut path = Path::new()
        .set("d", connector.path.path_data())
        .set("fill", "none")
        .set("stroke", "black");
    if connector.line == LineKind::Dashed {
        path = path.set("stroke-dasharray", DASH_PATTERN);
    }
    if let Some(marker) = marker_url(connector.start_marker) {
        path = path.set("marker-start", marker);
    }
    if let Some(marker) = marker_url(connector.end_marker) {
        path = path.set("marker-end", marker);
    }

    let mut group = Group::new()
        .set("class", class)
        .set("data-id", connector.id.to_string())
        .add(path);
    if let Some(label) = &connector.label {
        group = group.add(render_label(label, label_anchor(&connector.path)));
    }
    group
}

fn render_label(label: &str, position: Point) -> Text {
    Text::new("")
        .set("x", position.x())
        .set("y", position.y())
        .set("text-anchor", "middle")
        .set("dominant-baseline", "central")
        .add(SvgText::new(label))
}

/// Middle of the drawn path, by vertex count.
fn label_anchor(path: &ConnectorPath) -> Point {
    let points = path.polyline();
    let n = points.len();
    match n {
        0 => Point::default(),
        _ if n % 2 == 1 => points[n / 2],
        _ => points[n / 2 - 1].midpoint(points[n / 2]),
    }
}

#[cfg(test)]
mod tests {
    use easel_core::{
        connection::Direction,
        geometry::Size,
        identifier::{ConnectorId, ConnectorTypeId, ShapeId},
        kind::ShapeKind,
        routing::{self, ConnectorStyle},
    };

    use super::*;
    use crate::model::ShapePayload;

    fn scene() -> RenderScene {
        RenderScene::from_parts(
            vec![RenderShape {
                id: ShapeId::new("A"),
                kind: ShapeKind::Task,
                bounds: Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 60.0)),
                label: Some("Review".to_string()),
                payload: ShapePayload::None,
                selected: true,
                hovered: false,
            }],
            vec![RenderConnector {
                id: ConnectorId::new("f"),
                connector_type: ConnectorTypeId::new("message_flow"),
                path: routing::route(
                    Point::new(100.0, 30.0),
                    Point::new(200.0, 30.0),
                    Direction::East,
                    Direction::West,
                    ConnectorStyle::Straight,
                ),
                start_marker: MarkerKind::Circle,
                end_marker: MarkerKind::OpenArrow,
                line: LineKind::Dashed,
                label: None,
                selected: false,
                hovered: false,
            }],
        )
    }

    #[test]
    fn test_render_scene_svg() {
        let svg = render_scene_svg(&scene());
        assert!(svg.contains("viewBox=\"-50 -50 300 160\""));
        assert!(svg.contains("class=\"shape task selected\""));
        assert!(svg.contains("d=\"M 100 30 L 200 30\""));
        assert!(svg.contains("stroke-dasharray=\"6 4\""));
        assert!(svg.contains("marker-start=\"url(#marker-circle)\""));
        assert!(svg.contains("marker-end=\"url(#marker-open_arrow)\""));
        assert!(svg.contains("id=\"marker-circle\""));
        assert!(!svg.contains("id=\"marker-arrow\""));
        assert!(svg.contains("Review"));
    }

    #[test]
    fn test_empty_scene() {
        let svg = render_scene_svg(&RenderScene::default());
        assert!(svg.contains("viewBox=\"-50 -50 100 100\""));
        assert!(!svg.contains("<defs"));
    }

    #[test]
    fn test_label_anchor() {
        let path = routing::route(
            Point::new(0.0, 0.0),
            Point::new(100.0, 40.0),
            Direction::East,
            Direction::North,
            ConnectorStyle::Orthogonal,
        );
        assert_eq!(label_anchor(&path), Point::new(100.0, 0.0));
    }
}
