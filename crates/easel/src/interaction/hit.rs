//! Hit testing in canvas coordinates.
//!
//! Targets are tested in priority order: resize handles of selected
//! containers, connection points, connectors, then shape bodies. Within each
//! group the topmost element (reverse paint order) wins.

use std::collections::HashSet;

use easel_core::{
    connection::{self, ResolvedPoint},
    geometry::{Bounds, Point},
    identifier::{ConnectorId, OverlayTag, PortRef, ShapeId},
};

use crate::{
    interaction::context::{InteractionContext, Selectable},
    model::DiagramModel,
    order, scene,
};

/// Corner of a shape's bounds, used for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
    ];

    pub fn is_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft)
    }

    pub fn is_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight)
    }

    /// Returns the position of this corner on `bounds`
    pub fn position(self, bounds: Bounds) -> Point {
        Point::new(
            if self.is_left() { bounds.min_x() } else { bounds.max_x() },
            if self.is_top() { bounds.min_y() } else { bounds.max_y() },
        )
    }
}

/// Hit radii in canvas units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRadii {
    pub point: f32,
    pub handle: f32,
    pub connector: f32,
}

/// What lies under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    ResizeHandle { shape: ShapeId, corner: Corner },
    ConnectionPoint { port: PortRef, point: ResolvedPoint },
    Connector(ConnectorId),
    Shape(ShapeId),
    Empty,
}

impl HitTarget {
    /// The selectable element behind this target, if any.
    pub fn selectable(self) -> Option<Selectable> {
        match self {
            Self::ResizeHandle { shape, .. } | Self::Shape(shape) => Some(Selectable::Shape(shape)),
            Self::ConnectionPoint { port, .. } => Some(Selectable::Shape(port.shape())),
            Self::Connector(id) => Some(Selectable::Connector(id)),
            Self::Empty => None,
        }
    }
}

/// Returns the topmost target under `point`.
pub fn hit_test(
    model: &DiagramModel,
    context: &InteractionContext,
    point: Point,
    radii: HitRadii,
) -> HitTarget {
    let hidden = context.hidden_overlays();
    if let Some((shape, corner)) = resize_handle_at(model, context, point, radii.handle) {
        return HitTarget::ResizeHandle { shape, corner };
    }
    if let Some((port, resolved)) = connection_point_at(model, hidden, point, radii.point) {
        return HitTarget::ConnectionPoint {
            port,
            point: resolved,
        };
    }
    if let Some(connector) = connector_at(model, hidden, point, radii.connector) {
        return HitTarget::Connector(connector);
    }
    if let Some(shape) = shape_at(model, hidden, point) {
        return HitTarget::Shape(shape);
    }
    HitTarget::Empty
}

/// Finds a resize handle of a selected, container-capable shape.
pub fn resize_handle_at(
    model: &DiagramModel,
    context: &InteractionContext,
    point: Point,
    radius: f32,
) -> Option<(ShapeId, Corner)> {
    order::hit_order(model, context.hidden_overlays())
        .into_iter()
        .filter(|shape| {
            shape.kind().is_container() && context.is_selected(Selectable::Shape(shape.id()))
        })
        .find_map(|shape| {
            Corner::ALL
                .into_iter()
                .find(|corner| corner.position(shape.bounds()).distance(point) <= radius)
                .map(|corner| (shape.id(), corner))
        })
}

/// Finds the connection point nearest to `point` on the topmost shape that
/// has one within `radius`.
pub fn connection_point_at(
    model: &DiagramModel,
    hidden_overlays: &HashSet<OverlayTag>,
    point: Point,
    radius: f32,
) -> Option<(PortRef, ResolvedPoint)> {
    order::hit_order(model, hidden_overlays)
        .into_iter()
        .find_map(|shape| {
            let bounds = shape.bounds();
            let found = connection::point_near(shape.kind(), bounds, point, radius)?;
            Some((
                PortRef::new(shape.id(), found.id()),
                ResolvedPoint {
                    position: connection::absolute_position(&found, bounds),
                    direction: found.direction(),
                },
            ))
        })
}

/// Finds the topmost connector whose path passes within `tolerance`.
pub fn connector_at(
    model: &DiagramModel,
    hidden_overlays: &HashSet<OverlayTag>,
    point: Point,
    tolerance: f32,
) -> Option<ConnectorId> {
    scene::drawable_connectors(model, hidden_overlays)
        .into_iter()
        .rev()
        .find(|(_, resolved)| resolved.path.distance_to(point) <= tolerance)
        .map(|(connector, _)| connector.id())
}

/// Finds the topmost visible shape containing `point`.
pub fn shape_at(
    model: &DiagramModel,
    hidden_overlays: &HashSet<OverlayTag>,
    point: Point,
) -> Option<ShapeId> {
    order::hit_order(model, hidden_overlays)
        .into_iter()
        .find(|shape| shape.bounds().contains(point))
        .map(|shape| shape.id())
}
