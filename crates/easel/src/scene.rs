//! Render scene derivation.
//!
//! A [`RenderScene`] is the read-only description of what a canvas shows:
//! shapes in containment order, connectors routed and ordered by z-index,
//! and the live preview of a connector being drawn. It is rebuilt from the
//! model after every change and never mutated by the host.

use std::collections::HashSet;

use log::{debug, trace};

use easel_core::{
    connection::{self, ResolvedPoint},
    geometry::Bounds,
    identifier::{ConnectorId, ConnectorTypeId, OverlayTag, PortRef, ShapeId},
    kind::ShapeKind,
    routing::{self, ConnectorPath},
};

use crate::{
    catalog::ConnectorCatalog,
    interaction::{
        Interaction,
        context::{ContextMenu, Selectable},
        gesture::{Gesture, LabelTarget},
    },
    model::{Connector, DiagramModel, LineKind, MarkerKind, Shape, ShapePayload},
    order,
};

/// Endpoints and routed path of a drawable connector.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConnector {
    pub source: ResolvedPoint,
    pub target: ResolvedPoint,
    pub path: ConnectorPath,
}

/// Resolves the endpoints of `connector` and routes its path.
///
/// Returns `None` when either shape is missing or hidden, or when an
/// explicit connection point does not exist on its shape.
pub fn resolve_connector(
    model: &DiagramModel,
    connector: &Connector,
    hidden_overlays: &HashSet<OverlayTag>,
) -> Option<ResolvedConnector> {
    let source = model
        .shape(connector.source())
        .filter(|shape| order::is_visible(shape, hidden_overlays))?;
    let target = model
        .shape(connector.target())
        .filter(|shape| order::is_visible(shape, hidden_overlays))?;

    let (source_point, target_point) = match (connector.source_point(), connector.target_point()) {
        (Some(source_id), Some(target_id)) => (
            connection::resolve_point(source.kind(), source.bounds(), source_id)?,
            connection::resolve_point(target.kind(), target.bounds(), target_id)?,
        ),
        (Some(source_id), None) => {
            let source_point =
                connection::resolve_point(source.kind(), source.bounds(), source_id)?;
            let target_point = resolve_nearest(target, source_point)?;
            (source_point, target_point)
        }
        (None, Some(target_id)) => {
            let target_point =
                connection::resolve_point(target.kind(), target.bounds(), target_id)?;
            let source_point = resolve_nearest(source, target_point)?;
            (source_point, target_point)
        }
        (None, None) => {
            let (nearest_source, nearest_target) = connection::nearest_point_pair(
                source.kind(),
                source.bounds(),
                target.kind(),
                target.bounds(),
            )?;
            (
                connection::resolve_point(source.kind(), source.bounds(), nearest_source.id())?,
                connection::resolve_point(target.kind(), target.bounds(), nearest_target.id())?,
            )
        }
    };

    let path = routing::route(
        source_point.position,
        target_point.position,
        source_point.direction,
        target_point.direction,
        connector.style(),
    );
    trace!(connector:% = connector.id(), path = path.path_data(); "Connector resolved");
    Some(ResolvedConnector {
        source: source_point,
        target: target_point,
        path,
    })
}

/// Resolves the point of `shape` nearest the already resolved other end.
fn resolve_nearest(shape: &Shape, other: ResolvedPoint) -> Option<ResolvedPoint> {
    let point = connection::nearest_point(shape.kind(), shape.bounds(), other.position)?;
    connection::resolve_point(shape.kind(), shape.bounds(), point.id())
}

/// Returns every connector that can be drawn, in paint order: ascending
/// `z_index`, ties kept in model order.
pub fn drawable_connectors<'a>(
    model: &'a DiagramModel,
    hidden_overlays: &HashSet<OverlayTag>,
) -> Vec<(&'a Connector, ResolvedConnector)> {
    let mut drawable: Vec<_> = model
        .connectors()
        .filter_map(|connector| {
            let resolved = resolve_connector(model, connector, hidden_overlays);
            if resolved.is_none() {
                trace!(connector:% = connector.id(); "Connector omitted from scene");
            }
            Some((connector, resolved?))
        })
        .collect();
    drawable.sort_by_key(|(connector, _)| connector.z_index());
    drawable
}

/// A shape as drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderShape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    pub bounds: Bounds,
    /// Label text; the edit buffer while the label is being edited.
    pub label: Option<String>,
    pub payload: ShapePayload,
    pub selected: bool,
    pub hovered: bool,
}

/// A connector as drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConnector {
    pub id: ConnectorId,
    pub connector_type: ConnectorTypeId,
    pub path: ConnectorPath,
    pub start_marker: MarkerKind,
    pub end_marker: MarkerKind,
    pub line: LineKind,
    pub label: Option<String>,
    pub selected: bool,
    pub hovered: bool,
}

/// Live preview of a connector being drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingPreview {
    pub from: PortRef,
    pub target: Option<PortRef>,
    pub connector_type: ConnectorTypeId,
    pub path: ConnectorPath,
}

/// Everything a host needs to paint one canvas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderScene {
    shapes: Vec<RenderShape>,
    connectors: Vec<RenderConnector>,
    preview: Option<DrawingPreview>,
    context_menu: Option<ContextMenu>,
}

impl RenderScene {
    /// Creates a scene from already ordered shapes and connectors.
    pub fn from_parts(shapes: Vec<RenderShape>, connectors: Vec<RenderConnector>) -> Self {
        Self {
            shapes,
            connectors,
            ..Self::default()
        }
    }

    /// Shapes in paint order (containers before their children)
    pub fn shapes(&self) -> &[RenderShape] {
        &self.shapes
    }

    /// Connectors in paint order, drawn above all shapes
    pub fn connectors(&self) -> &[RenderConnector] {
        &self.connectors
    }

    pub fn shape(&self, id: ShapeId) -> Option<&RenderShape> {
        self.shapes.iter().find(|shape| shape.id == id)
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&RenderConnector> {
        self.connectors.iter().find(|connector| connector.id == id)
    }

    pub fn preview(&self) -> Option<&DrawingPreview> {
        self.preview.as_ref()
    }

    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.context_menu.as_ref()
    }

    /// Returns the bounds enclosing every shape, connector and preview, or
    /// `None` for an empty scene.
    pub fn bounds(&self) -> Option<Bounds> {
        self.shapes
            .iter()
            .map(|shape| shape.bounds)
            .chain(self.connectors.iter().map(|connector| connector.path.bounds()))
            .chain(self.preview.iter().map(|preview| preview.path.bounds()))
            .reduce(|acc, bounds| acc.merge(&bounds))
    }
}

/// Builds the scene for `model` as seen through `interaction`.
///
/// Uncommitted resize and drag previews are applied to a copy of the model,
/// so the committed model is never touched.
pub fn build_scene(
    model: &DiagramModel,
    interaction: &Interaction,
    catalog: &dyn ConnectorCatalog,
) -> RenderScene {
    let context = interaction.context();
    let hidden = context.hidden_overlays();
    let model = interaction.gesture().preview_model(model);
    let editing = match interaction.gesture() {
        Gesture::EditingLabel(edit) => Some((edit.target(), edit.buffer())),
        _ => None,
    };
    let edited_label = |target: LabelTarget, label: Option<&str>| match editing {
        Some((editing, buffer)) if editing == target => Some(buffer.to_string()),
        _ => label.map(str::to_string),
    };

    let shapes: Vec<RenderShape> = order::derive_render_order(&model, hidden)
        .into_iter()
        .map(|shape| {
            let item = Selectable::Shape(shape.id());
            RenderShape {
                id: shape.id(),
                kind: shape.kind(),
                bounds: shape.bounds(),
                label: edited_label(LabelTarget::Shape(shape.id()), shape.label()),
                payload: shape.payload().clone(),
                selected: context.is_selected(item),
                hovered: context.hover() == Some(item),
            }
        })
        .collect();

    let connectors: Vec<RenderConnector> = drawable_connectors(&model, hidden)
        .into_iter()
        .map(|(connector, resolved)| {
            let item = Selectable::Connector(connector.id());
            RenderConnector {
                id: connector.id(),
                connector_type: connector.connector_type(),
                path: resolved.path,
                start_marker: connector.start_marker(),
                end_marker: connector.end_marker(),
                line: connector.line(),
                label: edited_label(LabelTarget::Connector(connector.id()), connector.label()),
                selected: context.is_selected(item),
                hovered: context.hover() == Some(item),
            }
        })
        .collect();

    let preview = interaction.drawing().map(|drawing| {
        let style = catalog
            .tool(drawing.connector_type())
            .unwrap_or_else(|| catalog.default_tool())
            .style();
        DrawingPreview {
            from: drawing.from(),
            target: drawing.target(),
            connector_type: drawing.connector_type(),
            path: routing::route(
                drawing.source_position(),
                drawing.preview_end(),
                drawing.source_direction(),
                drawing.target_direction(),
                style,
            ),
        }
    });

    debug!(
        shapes = shapes.len(),
        connectors = connectors.len(),
        preview = preview.is_some();
        "Scene built"
    );
    RenderScene {
        shapes,
        connectors,
        preview,
        context_menu: context.context_menu().cloned(),
    }
}
