//! Gesture states.
//!
//! A canvas runs at most one gesture at a time. Each state carries only the
//! transient data needed to show a preview and build the final command.

use std::borrow::Cow;

use easel_core::{
    connection::Direction,
    geometry::{Bounds, Point, Size},
    identifier::{ConnectorId, ConnectorTypeId, PortRef, ShapeId},
};

use crate::{
    interaction::{Modifiers, hit::Corner},
    model::DiagramModel,
};

/// The active gesture of a canvas.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    DrawingConnector(DrawingConnector),
    ResizingShape(ResizingShape),
    DraggingSelection(DraggingSelection),
    EditingLabel(EditingLabel),
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Short state name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DrawingConnector(_) => "drawing_connector",
            Self::ResizingShape(_) => "resizing_shape",
            Self::DraggingSelection(_) => "dragging_selection",
            Self::EditingLabel(_) => "editing_label",
        }
    }

    /// Returns `model` with the gesture's uncommitted changes applied, for
    /// rendering. Borrows `model` when there is nothing to preview.
    pub fn preview_model<'a>(&self, model: &'a DiagramModel) -> Cow<'a, DiagramModel> {
        match self {
            Self::ResizingShape(resize) if resize.preview != resize.original => {
                let mut preview = model.clone();
                preview.preview_shape(resize.shape, |shape| shape.set_bounds(resize.preview));
                Cow::Owned(preview)
            }
            Self::DraggingSelection(drag) if drag.active && !drag.offset().is_zero() => {
                let mut preview = model.clone();
                let offset = drag.offset();
                for id in &drag.moving {
                    preview.preview_shape(*id, |shape| {
                        shape.set_bounds(shape.bounds().translate(offset))
                    });
                }
                Cow::Owned(preview)
            }
            _ => Cow::Borrowed(model),
        }
    }
}

/// A connector being drawn from a connection point.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingConnector {
    pub(crate) from: PortRef,
    pub(crate) source_position: Point,
    pub(crate) source_direction: Direction,
    pub(crate) current: Point,
    pub(crate) connector_type: ConnectorTypeId,
    pub(crate) target: Option<PortRef>,
    pub(crate) target_position: Option<Point>,
    pub(crate) target_direction: Direction,
}

impl DrawingConnector {
    pub fn from(&self) -> PortRef {
        self.from
    }

    /// Canvas position of the source point
    pub fn source_position(&self) -> Point {
        self.source_position
    }

    pub fn source_direction(&self) -> Direction {
        self.source_direction
    }

    /// Current pointer position in canvas coordinates
    pub fn current(&self) -> Point {
        self.current
    }

    pub fn connector_type(&self) -> ConnectorTypeId {
        self.connector_type
    }

    /// The acceptable connection point under the pointer, if any
    pub fn target(&self) -> Option<PortRef> {
        self.target
    }

    pub fn target_direction(&self) -> Direction {
        self.target_direction
    }

    /// End of the preview path: the hovered target point, else the pointer.
    pub fn preview_end(&self) -> Point {
        self.target_position.unwrap_or(self.current)
    }
}

/// A selected container being resized by a corner handle.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizingShape {
    pub(crate) shape: ShapeId,
    pub(crate) corner: Corner,
    pub(crate) original: Bounds,
    pub(crate) preview: Bounds,
}

impl ResizingShape {
    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    pub fn corner(&self) -> Corner {
        self.corner
    }

    pub fn preview(&self) -> Bounds {
        self.preview
    }
}

/// A press on a shape body that may turn into a drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DraggingSelection {
    pub(crate) pressed: ShapeId,
    pub(crate) modifiers: Modifiers,
    pub(crate) screen_origin: Point,
    pub(crate) origin: Point,
    pub(crate) current: Point,
    /// Set once the pointer travelled past the drag threshold.
    pub(crate) active: bool,
    /// Shapes moved by the drag: the selection plus descendants.
    pub(crate) moving: Vec<ShapeId>,
}

impl DraggingSelection {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Canvas offset from the press position
    pub fn offset(&self) -> Point {
        self.current.sub_point(self.origin)
    }

    pub fn moving(&self) -> &[ShapeId] {
        &self.moving
    }
}

/// What a label edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelTarget {
    Shape(ShapeId),
    Connector(ConnectorId),
}

/// In-place label editing.
#[derive(Debug, Clone, PartialEq)]
pub struct EditingLabel {
    pub(crate) target: LabelTarget,
    pub(crate) original: Option<String>,
    pub(crate) buffer: String,
}

impl EditingLabel {
    pub fn target(&self) -> LabelTarget {
        self.target
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// The label the buffer would commit; empty text clears the label.
    pub fn committed_label(&self) -> Option<String> {
        (!self.buffer.is_empty()).then(|| self.buffer.clone())
    }

    pub fn is_changed(&self) -> bool {
        self.committed_label() != self.original
    }
}

/// Computes the bounds of a shape resized by dragging `corner` to `pointer`.
///
/// The opposite corner stays fixed and the result is never smaller than `min`.
pub fn resized_bounds(original: Bounds, corner: Corner, pointer: Point, min: Size) -> Bounds {
    let (min_x, max_x) = if corner.is_left() {
        (pointer.x().min(original.max_x() - min.width()), original.max_x())
    } else {
        (original.min_x(), pointer.x().max(original.min_x() + min.width()))
    };
    let (min_y, max_y) = if corner.is_top() {
        (pointer.y().min(original.max_y() - min.height()), original.max_y())
    } else {
        (original.min_y(), pointer.y().max(original.min_y() + min.height()))
    };
    Bounds::new_from_corners(Point::new(min_x, min_y), Point::new(max_x, max_y))
}
