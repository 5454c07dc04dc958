//! Shape and connector model.
//!
//! [`DiagramModel`] is the single source of truth for one diagram. Its
//! mutators are crate-private: every change goes through
//! [`Command::apply`](crate::command::Command::apply), which keeps undo/redo
//! exact. Shapes and connectors are stored in insertion order; that order is
//! part of the model's identity and drives the render order of siblings.

use std::{collections::HashSet, fmt};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use easel_core::{
    geometry::{Bounds, Point, Size},
    identifier::{ConnectorId, ConnectorTypeId, OverlayTag, PointId, ShapeId},
    kind::{DiagramVariant, ShapeKind},
    routing::ConnectorStyle,
};

use crate::{catalog, command::CommandError};

/// Decoration drawn at a connector end.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    #[default]
    None,
    Arrow,
    OpenArrow,
    Triangle,
    Diamond,
    FilledDiamond,
    Circle,
}

impl MarkerKind {
    /// Returns the marker name used in SVG marker ids
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Arrow => "arrow",
            Self::OpenArrow => "open_arrow",
            Self::Triangle => "triangle",
            Self::Diamond => "diamond",
            Self::FilledDiamond => "filled_diamond",
            Self::Circle => "circle",
        }
    }
}

/// Stroke pattern of a connector.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    #[default]
    Solid,
    Dashed,
}

/// Kind-specific content of a shape.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapePayload {
    #[default]
    None,
    Class {
        #[serde(default)]
        attributes: Vec<String>,
        #[serde(default)]
        methods: Vec<String>,
    },
    Enumeration {
        #[serde(default)]
        literals: Vec<String>,
    },
}

/// A diagram element placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    id: ShapeId,
    kind: ShapeKind,
    /// Top-left corner in canvas units.
    position: Point,
    size: Size,
    #[serde(default)]
    parent: Option<ShapeId>,
    #[serde(default)]
    children: Vec<ShapeId>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    overlay: Option<OverlayTag>,
    #[serde(default)]
    payload: ShapePayload,
}

impl Shape {
    pub fn new(id: ShapeId, kind: ShapeKind, position: Point, size: Size) -> Self {
        Self {
            id,
            kind,
            position,
            size,
            parent: None,
            children: Vec::new(),
            label: None,
            overlay: None,
            payload: ShapePayload::None,
        }
    }

    pub fn with_parent(mut self, parent: ShapeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_overlay(mut self, overlay: OverlayTag) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn with_payload(mut self, payload: ShapePayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Returns the shape's bounds in canvas coordinates
    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(self.position, self.size)
    }

    pub fn parent(&self) -> Option<ShapeId> {
        self.parent
    }

    /// Returns the ordered child ids
    pub fn children(&self) -> &[ShapeId] {
        &self.children
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn overlay(&self) -> Option<OverlayTag> {
        self.overlay
    }

    pub fn payload(&self) -> &ShapePayload {
        &self.payload
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Moves and resizes the shape to `bounds`.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.position = bounds.min_point();
        self.size = bounds.to_size();
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }
}

/// A routed link between two shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    id: ConnectorId,
    source: ShapeId,
    target: ShapeId,
    #[serde(default)]
    source_point: Option<PointId>,
    #[serde(default)]
    target_point: Option<PointId>,
    connector_type: ConnectorTypeId,
    #[serde(default)]
    style: ConnectorStyle,
    #[serde(default)]
    start_marker: MarkerKind,
    #[serde(default)]
    end_marker: MarkerKind,
    #[serde(default)]
    line: LineKind,
    #[serde(default)]
    z_index: i32,
    #[serde(default)]
    label: Option<String>,
}

impl Connector {
    pub fn new(
        id: ConnectorId,
        source: ShapeId,
        target: ShapeId,
        connector_type: ConnectorTypeId,
    ) -> Self {
        Self {
            id,
            source,
            target,
            source_point: None,
            target_point: None,
            connector_type,
            style: ConnectorStyle::default(),
            start_marker: MarkerKind::None,
            end_marker: MarkerKind::None,
            line: LineKind::Solid,
            z_index: 0,
            label: None,
        }
    }

    /// Pins both endpoints to explicit connection points.
    pub fn with_points(self, source_point: PointId, target_point: PointId) -> Self {
        self.with_source_point(source_point)
            .with_target_point(target_point)
    }

    /// Pins the source end. An unpinned target then resolves to its point
    /// nearest this one.
    pub fn with_source_point(mut self, source_point: PointId) -> Self {
        self.source_point = Some(source_point);
        self
    }

    pub fn with_target_point(mut self, target_point: PointId) -> Self {
        self.target_point = Some(target_point);
        self
    }

    pub fn with_style(mut self, style: ConnectorStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_markers(mut self, start: MarkerKind, end: MarkerKind) -> Self {
        self.start_marker = start;
        self.end_marker = end;
        self
    }

    pub fn with_line(mut self, line: LineKind) -> Self {
        self.line = line;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> ConnectorId {
        self.id
    }

    pub fn source(&self) -> ShapeId {
        self.source
    }

    pub fn target(&self) -> ShapeId {
        self.target
    }

    pub fn source_point(&self) -> Option<PointId> {
        self.source_point
    }

    pub fn target_point(&self) -> Option<PointId> {
        self.target_point
    }

    pub fn connector_type(&self) -> ConnectorTypeId {
        self.connector_type
    }

    pub fn style(&self) -> ConnectorStyle {
        self.style
    }

    pub fn start_marker(&self) -> MarkerKind {
        self.start_marker
    }

    pub fn end_marker(&self) -> MarkerKind {
        self.end_marker
    }

    pub fn line(&self) -> LineKind {
        self.line
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns true if either end attaches to `shape`
    pub fn touches(&self, shape: ShapeId) -> bool {
        self.source == shape || self.target == shape
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// Switches the connector to another catalog type with that type's defaults.
    pub fn set_type(
        &mut self,
        connector_type: ConnectorTypeId,
        style: ConnectorStyle,
        markers: (MarkerKind, MarkerKind),
        line: LineKind,
    ) {
        self.connector_type = connector_type;
        self.style = style;
        (self.start_marker, self.end_marker) = markers;
        self.line = line;
    }
}

/// Position of a shape inside the model, recorded so a delete can be undone
/// into the exact same place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeSlot {
    /// Index in the model's shape order.
    pub index: usize,
    /// Index in the parent's child list, if the shape has a parent.
    pub child_index: Option<usize>,
}

/// A structural problem found by [`DiagramModel::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum ModelIssue {
    MissingParent { shape: ShapeId, parent: ShapeId },
    MissingChild { shape: ShapeId, child: ShapeId },
    ChildListMismatch { shape: ShapeId, parent: ShapeId },
    Cycle { shape: ShapeId },
    DanglingEndpoint { connector: ConnectorId, shape: ShapeId },
    SelfConnection { connector: ConnectorId },
}

impl fmt::Display for ModelIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParent { shape, parent } => {
                write!(f, "shape `{shape}` references missing parent `{parent}`")
            }
            Self::MissingChild { shape, child } => {
                write!(f, "shape `{shape}` lists missing child `{child}`")
            }
            Self::ChildListMismatch { shape, parent } => write!(
                f,
                "shape `{shape}` names `{parent}` as parent but is not in its child list"
            ),
            Self::Cycle { shape } => write!(f, "shape `{shape}` is part of a containment cycle"),
            Self::DanglingEndpoint { connector, shape } => {
                write!(f, "connector `{connector}` references missing shape `{shape}`")
            }
            Self::SelfConnection { connector } => {
                write!(f, "connector `{connector}` connects a shape to itself")
            }
        }
    }
}

/// The shapes and connectors of one diagram.
#[derive(Debug, Clone)]
pub struct DiagramModel {
    variant: DiagramVariant,
    shapes: IndexMap<ShapeId, Shape>,
    connectors: IndexMap<ConnectorId, Connector>,
}

impl PartialEq for DiagramModel {
    /// Equal only if shapes and connectors match in the same order.
    fn eq(&self, other: &Self) -> bool {
        self.variant == other.variant
            && self.shapes.iter().eq(other.shapes.iter())
            && self.connectors.iter().eq(other.connectors.iter())
    }
}

impl DiagramModel {
    /// Creates an empty model.
    pub fn new(variant: DiagramVariant) -> Self {
        Self {
            variant,
            shapes: IndexMap::new(),
            connectors: IndexMap::new(),
        }
    }

    /// Builds a model from loaded data, keeping shapes and connectors as given.
    ///
    /// Later duplicates of an id replace earlier ones. Structural problems are
    /// kept; see [`DiagramModel::validate`].
    pub fn from_parts(
        variant: DiagramVariant,
        shapes: impl IntoIterator<Item = Shape>,
        connectors: impl IntoIterator<Item = Connector>,
    ) -> Self {
        Self {
            variant,
            shapes: shapes.into_iter().map(|shape| (shape.id, shape)).collect(),
            connectors: connectors
                .into_iter()
                .map(|connector| (connector.id, connector))
                .collect(),
        }
    }

    /// Builds a model from shapes that only carry parent links, deriving every
    /// child list from those links in shape order.
    pub fn from_parent_links(
        variant: DiagramVariant,
        shapes: impl IntoIterator<Item = Shape>,
        connectors: impl IntoIterator<Item = Connector>,
    ) -> Self {
        let mut model = Self::from_parts(variant, shapes, connectors);
        for shape in model.shapes.values_mut() {
            shape.children.clear();
        }
        let links: Vec<(ShapeId, ShapeId)> = model
            .shapes
            .values()
            .filter_map(|shape| shape.parent.map(|parent| (parent, shape.id)))
            .collect();
        for (parent, child) in links {
            if let Some(parent) = model.shapes.get_mut(&parent) {
                parent.children.push(child);
            }
        }
        model
    }

    pub fn variant(&self) -> DiagramVariant {
        self.variant
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    /// Returns all shapes in model order
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.values()
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn contains_shape(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.connectors.get(&id)
    }

    /// Returns all connectors in model order
    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.values()
    }

    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    /// Returns the largest connector z-index, or `None` for an empty model.
    pub fn max_z_index(&self) -> Option<i32> {
        self.connectors.values().map(Connector::z_index).max()
    }

    /// Returns the current slot of a shape.
    pub fn shape_slot(&self, id: ShapeId) -> Option<ShapeSlot> {
        let (index, _, shape) = self.shapes.get_full(&id)?;
        let child_index = shape.parent.and_then(|parent| {
            self.shapes
                .get(&parent)
                .and_then(|parent| parent.children.iter().position(|child| *child == id))
        });
        Some(ShapeSlot { index, child_index })
    }

    /// Returns the current index of a connector in model order.
    pub fn connector_index(&self, id: ConnectorId) -> Option<usize> {
        self.connectors.get_index_of(&id)
    }

    /// Returns every descendant of `id` in depth-first pre-order, excluding
    /// `id` itself. Cycle-safe.
    pub fn descendants(&self, id: ShapeId) -> Vec<ShapeId> {
        let mut visited = HashSet::from([id]);
        let mut result = Vec::new();
        let mut stack: Vec<ShapeId> = match self.shapes.get(&id) {
            Some(shape) => shape.children.iter().rev().copied().collect(),
            None => return result,
        };
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(shape) = self.shapes.get(&current) else {
                continue;
            };
            result.push(current);
            stack.extend(shape.children.iter().rev().copied());
        }
        result
    }

    /// Returns the number of ancestors of `id`. Cycle-safe.
    pub fn depth(&self, id: ShapeId) -> usize {
        let mut visited = HashSet::from([id]);
        let mut depth = 0;
        let mut current = self.shapes.get(&id).and_then(Shape::parent);
        while let Some(parent) = current {
            if !visited.insert(parent) {
                break;
            }
            let Some(shape) = self.shapes.get(&parent) else {
                break;
            };
            depth += 1;
            current = shape.parent;
        }
        depth
    }

    /// Returns the connectors attached to any of `shapes`, in model order.
    pub fn connectors_touching(&self, shapes: &HashSet<ShapeId>) -> Vec<&Connector> {
        self.connectors
            .values()
            .filter(|connector| {
                shapes.contains(&connector.source) || shapes.contains(&connector.target)
            })
            .collect()
    }

    /// Reports structural problems without modifying the model.
    pub fn validate(&self) -> Vec<ModelIssue> {
        let mut issues = Vec::new();
        let allows_self = catalog::catalog_for(self.variant).allows_self_connection();

        for shape in self.shapes.values() {
            if let Some(parent_id) = shape.parent {
                match self.shapes.get(&parent_id) {
                    None => issues.push(ModelIssue::MissingParent {
                        shape: shape.id,
                        parent: parent_id,
                    }),
                    Some(parent) if !parent.children.contains(&shape.id) => {
                        issues.push(ModelIssue::ChildListMismatch {
                            shape: shape.id,
                            parent: parent_id,
                        })
                    }
                    Some(_) => {}
                }
            }
            for child in &shape.children {
                if !self.shapes.contains_key(child) {
                    issues.push(ModelIssue::MissingChild {
                        shape: shape.id,
                        child: *child,
                    });
                }
            }
            if self.has_ancestor_cycle(shape.id) {
                issues.push(ModelIssue::Cycle { shape: shape.id });
            }
        }

        for connector in self.connectors.values() {
            for end in [connector.source, connector.target] {
                if !self.shapes.contains_key(&end) {
                    issues.push(ModelIssue::DanglingEndpoint {
                        connector: connector.id,
                        shape: end,
                    });
                }
            }
            if connector.source == connector.target && !allows_self {
                issues.push(ModelIssue::SelfConnection {
                    connector: connector.id,
                });
            }
        }
        issues
    }

    fn has_ancestor_cycle(&self, id: ShapeId) -> bool {
        let mut visited = HashSet::from([id]);
        let mut current = self.shapes.get(&id).and_then(Shape::parent);
        while let Some(parent) = current {
            if parent == id {
                return true;
            }
            if !visited.insert(parent) {
                return false;
            }
            current = self.shapes.get(&parent).and_then(Shape::parent);
        }
        false
    }

    pub(crate) fn insert_shape(
        &mut self,
        shape: Shape,
        slot: ShapeSlot,
    ) -> Result<(), CommandError> {
        if self.shapes.contains_key(&shape.id) {
            return Err(CommandError::DuplicateShape(shape.id));
        }
        if let Some(child) = shape.children.first() {
            return Err(CommandError::HasChildren {
                shape: shape.id,
                child: *child,
            });
        }
        if let Some(parent_id) = shape.parent {
            let parent = self
                .shapes
                .get_mut(&parent_id)
                .ok_or(CommandError::UnknownShape(parent_id))?;
            let child_index = slot
                .child_index
                .unwrap_or(parent.children.len())
                .min(parent.children.len());
            parent.children.insert(child_index, shape.id);
        }
        let index = slot.index.min(self.shapes.len());
        self.shapes.shift_insert(index, shape.id, shape);
        Ok(())
    }

    pub(crate) fn remove_shape(&mut self, id: ShapeId) -> Result<(Shape, ShapeSlot), CommandError> {
        let shape = self.shapes.get(&id).ok_or(CommandError::UnknownShape(id))?;
        if let Some(child) = shape.children.first() {
            return Err(CommandError::HasChildren {
                shape: id,
                child: *child,
            });
        }
        if let Some(connector) = self.connectors.values().find(|c| c.touches(id)) {
            return Err(CommandError::ShapeInUse {
                shape: id,
                connector: connector.id,
            });
        }

        let parent = shape.parent;
        let slot = self.shape_slot(id).ok_or(CommandError::UnknownShape(id))?;
        if let (Some(parent_id), Some(child_index)) = (parent, slot.child_index)
            && let Some(parent) = self.shapes.get_mut(&parent_id)
        {
            parent.children.remove(child_index);
        }
        let (_, _, shape) = self
            .shapes
            .shift_remove_full(&id)
            .ok_or(CommandError::UnknownShape(id))?;
        Ok((shape, slot))
    }

    /// Replaces a shape's contents. The parent link and child list are
    /// structural and must not change through an update.
    pub(crate) fn replace_shape(
        &mut self,
        before: &Shape,
        after: Shape,
    ) -> Result<(), CommandError> {
        let current = self
            .shapes
            .get_mut(&after.id)
            .ok_or(CommandError::UnknownShape(after.id))?;
        if before.id != after.id || current != before {
            return Err(CommandError::StaleShape(after.id));
        }
        if after.parent != current.parent || after.children != current.children {
            return Err(CommandError::Reparent(after.id));
        }
        *current = after;
        Ok(())
    }

    /// Edits a shape in place, bypassing commands. Only used on scratch
    /// copies for gesture previews.
    pub(crate) fn preview_shape(&mut self, id: ShapeId, edit: impl FnOnce(&mut Shape)) {
        if let Some(shape) = self.shapes.get_mut(&id) {
            edit(shape);
        }
    }

    pub(crate) fn insert_connector(
        &mut self,
        connector: Connector,
        index: usize,
    ) -> Result<(), CommandError> {
        if self.connectors.contains_key(&connector.id) {
            return Err(CommandError::DuplicateConnector(connector.id));
        }
        self.check_endpoints(&connector)?;
        let index = index.min(self.connectors.len());
        self.connectors.shift_insert(index, connector.id, connector);
        Ok(())
    }

    pub(crate) fn remove_connector(
        &mut self,
        id: ConnectorId,
    ) -> Result<(Connector, usize), CommandError> {
        let (index, _, connector) = self
            .connectors
            .shift_remove_full(&id)
            .ok_or(CommandError::UnknownConnector(id))?;
        Ok((connector, index))
    }

    pub(crate) fn replace_connector(
        &mut self,
        before: &Connector,
        after: Connector,
    ) -> Result<(), CommandError> {
        self.check_endpoints(&after)?;
        let current = self
            .connectors
            .get_mut(&after.id)
            .ok_or(CommandError::UnknownConnector(after.id))?;
        if before.id != after.id || current != before {
            return Err(CommandError::StaleConnector(after.id));
        }
        *current = after;
        Ok(())
    }

    fn check_endpoints(&self, connector: &Connector) -> Result<(), CommandError> {
        for end in [connector.source, connector.target] {
            if !self.shapes.contains_key(&end) {
                return Err(CommandError::UnknownShape(end));
            }
        }
        if connector.source == connector.target
            && !catalog::catalog_for(self.variant).allows_self_connection()
        {
            return Err(CommandError::SelfConnection(connector.source));
        }
        Ok(())
    }
}
