//! Containment ordering.
//!
//! Shapes are painted parent-before-children so nested shapes appear on top
//! of their containers. Hit testing walks the same order backwards.

use std::collections::HashSet;

use log::debug;

use easel_core::identifier::{OverlayTag, ShapeId};

use crate::model::{DiagramModel, Shape};

/// Returns the shapes of `model` in paint order.
///
/// Traversal is depth-first from parentless shapes in model order, visiting
/// children in their listed order. Every shape appears at most once, even if
/// the containment data contains a cycle; shapes unreachable from a root are
/// appended afterwards in model order. Shapes whose overlay is hidden are
/// left out while their descendants are still visited.
pub fn derive_render_order<'a>(
    model: &'a DiagramModel,
    hidden_overlays: &HashSet<OverlayTag>,
) -> Vec<&'a Shape> {
    let mut visited: HashSet<ShapeId> = HashSet::with_capacity(model.shape_count());
    let mut order = Vec::with_capacity(model.shape_count());

    let roots = model
        .shapes()
        .filter(|shape| shape.parent().is_none_or(|parent| !model.contains_shape(parent)));
    for root in roots {
        visit(model, root, hidden_overlays, &mut visited, &mut order);
    }

    let unreachable: Vec<&Shape> = model
        .shapes()
        .filter(|shape| !visited.contains(&shape.id()))
        .collect();
    if !unreachable.is_empty() {
        debug!(count = unreachable.len(); "Appending shapes unreachable from any root");
    }
    for shape in unreachable {
        visit(model, shape, hidden_overlays, &mut visited, &mut order);
    }
    order
}

/// Returns the shapes of `model` topmost first.
pub fn hit_order<'a>(
    model: &'a DiagramModel,
    hidden_overlays: &HashSet<OverlayTag>,
) -> Vec<&'a Shape> {
    let mut order = derive_render_order(model, hidden_overlays);
    order.reverse();
    order
}

/// Returns true if `shape` is drawn, i.e. its overlay (if any) is visible.
pub fn is_visible(shape: &Shape, hidden_overlays: &HashSet<OverlayTag>) -> bool {
    shape
        .overlay()
        .is_none_or(|overlay| !hidden_overlays.contains(&overlay))
}

fn visit<'a>(
    model: &'a DiagramModel,
    start: &'a Shape,
    hidden_overlays: &HashSet<OverlayTag>,
    visited: &mut HashSet<ShapeId>,
    order: &mut Vec<&'a Shape>,
) {
    let mut stack = vec![start];
    while let Some(shape) = stack.pop() {
        if !visited.insert(shape.id()) {
            continue;
        }
        if is_visible(shape, hidden_overlays) {
            order.push(shape);
        }
        stack.extend(
            shape
                .children()
                .iter()
                .rev()
                .filter_map(|child| model.shape(*child)),
        );
    }
}

#[cfg(test)]
mod tests {
    use easel_core::{
        geometry::{Point, Size},
        kind::{DiagramVariant, ShapeKind},
    };

    use super::*;

    fn shape(id: &str) -> Shape {
        Shape::new(
            ShapeId::new(id),
            ShapeKind::Rectangle,
            Point::new(0.0, 0.0),
            Size::new(10.0, 10.0),
        )
    }

    fn ids(shapes: &[&Shape]) -> Vec<String> {
        shapes.iter().map(|shape| shape.id().to_string()).collect()
    }

    #[test]
    fn test_parent_before_child_regardless_of_input_order() {
        let model = DiagramModel::from_parent_links(
            DiagramVariant::Bpmn,
            vec![
                shape("C").with_parent(ShapeId::new("B")),
                shape("B").with_parent(ShapeId::new("A")),
                shape("A"),
            ],
            vec![],
        );
        let order = derive_render_order(&model, &HashSet::new());
        assert_eq!(ids(&order), ["A", "B", "C"]);
        assert_eq!(ids(&hit_order(&model, &HashSet::new())), ["C", "B", "A"]);
    }

    #[test]
    fn test_siblings_follow_child_order() {
        let model = DiagramModel::from_parent_links(
            DiagramVariant::Bpmn,
            vec![
                shape("pool"),
                shape("lane1").with_parent(ShapeId::new("pool")),
                shape("task").with_parent(ShapeId::new("lane1")),
                shape("lane2").with_parent(ShapeId::new("pool")),
                shape("free"),
            ],
            vec![],
        );
        let order = derive_render_order(&model, &HashSet::new());
        assert_eq!(ids(&order), ["pool", "lane1", "task", "lane2", "free"]);
    }

    #[test]
    fn test_cycle_is_visited_once() {
        let model = DiagramModel::from_parent_links(
            DiagramVariant::Bpmn,
            vec![
                shape("x").with_parent(ShapeId::new("y")),
                shape("y").with_parent(ShapeId::new("x")),
                shape("root"),
            ],
            vec![],
        );
        let order = derive_render_order(&model, &HashSet::new());
        assert_eq!(ids(&order), ["root", "x", "y"]);
    }

    #[test]
    fn test_missing_parent_is_treated_as_root() {
        let model = DiagramModel::from_parts(
            DiagramVariant::Bpmn,
            vec![shape("child").with_parent(ShapeId::new("gone"))],
            vec![],
        );
        assert_eq!(ids(&derive_render_order(&model, &HashSet::new())), ["child"]);
    }

    #[test]
    fn test_hidden_overlay_skips_shape_but_not_descendants() {
        let overlay = OverlayTag::new("annotations");
        let model = DiagramModel::from_parent_links(
            DiagramVariant::Bpmn,
            vec![
                shape("group").with_overlay(overlay),
                shape("inner").with_parent(ShapeId::new("group")),
            ],
            vec![],
        );
        let hidden = HashSet::from([overlay]);
        assert_eq!(ids(&derive_render_order(&model, &hidden)), ["inner"]);
    }
}
