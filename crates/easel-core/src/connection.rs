//! Connection points and endpoint resolution.
//!
//! Every [`ShapeKind`] exposes a catalog of [`ConnectionPoint`]s: named,
//! directional anchors on (or inside) the shape's bounds where connectors may
//! attach. Anchors are stored as fractions of the bounds so the same catalog
//! serves every size of a shape; lifeline-style kinds additionally derive the
//! number of points from the shape's height.
//!
//! All lookups return `Option`. A missing point means "do not render this
//! connector or preview" and is never an error.

use std::fmt;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::{
    geometry::{Bounds, Point},
    identifier::PointId,
    kind::{PointLayout, ShapeKind},
};

/// Height of the lifeline header box; message points start below it.
pub const LIFELINE_HEADER_HEIGHT: f32 = 40.0;

/// Vertical distance between consecutive lifeline message points.
pub const LIFELINE_POINT_SPACING: f32 = 20.0;

/// Cardinal direction a connector leaves or enters a shape edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Returns true for East and West
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::East | Self::West)
    }

    /// Returns the direction pointing the other way
    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Unit vector in canvas coordinates (Y grows downward).
    pub fn unit(self) -> Point {
        match self {
            Self::North => Point::new(0.0, -1.0),
            Self::East => Point::new(1.0, 0.0),
            Self::South => Point::new(0.0, 1.0),
            Self::West => Point::new(-1.0, 0.0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::North => "N",
            Self::East => "E",
            Self::South => "S",
            Self::West => "W",
        })
    }
}

/// Position of a connection point relative to its shape's bounds.
///
/// Both fractions are in `0.0..=1.0`: `(0, 0)` is the top-left corner and
/// `(1, 1)` the bottom-right one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    fx: f32,
    fy: f32,
}

impl Anchor {
    /// Creates an anchor, clamping both fractions into the unit range.
    pub fn new(fx: f32, fy: f32) -> Self {
        Self {
            fx: fx.clamp(0.0, 1.0),
            fy: fy.clamp(0.0, 1.0),
        }
    }

    /// Horizontal fraction of the width
    pub fn fx(self) -> f32 {
        self.fx
    }

    /// Vertical fraction of the height
    pub fn fy(self) -> f32 {
        self.fy
    }
}

/// A named, directional anchor on a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionPoint {
    id: PointId,
    direction: Direction,
    anchor: Anchor,
}

impl ConnectionPoint {
    pub fn new(id: PointId, direction: Direction, anchor: Anchor) -> Self {
        Self {
            id,
            direction,
            anchor,
        }
    }

    /// Returns the point id, unique only within its shape kind
    pub fn id(&self) -> PointId {
        self.id
    }

    /// Returns the direction connectors leave the shape from this point
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the relative anchor
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }
}

/// A connection point placed on a concrete shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPoint {
    pub position: Point,
    pub direction: Direction,
}

/// Returns the connection point catalog for a shape kind.
///
/// `height` only matters for lifeline-style kinds, whose message points are
/// spaced every [`LIFELINE_POINT_SPACING`] units below the header.
///
/// # Examples
///
/// ```
/// # use easel_core::{connection::connection_points_for, kind::ShapeKind};
/// let task = connection_points_for(ShapeKind::Task, 60.0);
/// assert_eq!(task.len(), 4);
///
/// let lifeline = connection_points_for(ShapeKind::Lifeline, 100.0);
/// // top + (100 - 40) / 20 = 3 rows of left/right points
/// assert_eq!(lifeline.len(), 1 + 3 * 2);
/// ```
pub fn connection_points_for(kind: ShapeKind, height: f32) -> Vec<ConnectionPoint> {
    match kind.point_layout() {
        PointLayout::Cardinal => cardinal_points(),
        PointLayout::Distributed => distributed_points(),
        PointLayout::Lifeline => lifeline_points(height),
    }
}

fn point(id: &str, direction: Direction, fx: f32, fy: f32) -> ConnectionPoint {
    ConnectionPoint::new(PointId::new(id), direction, Anchor::new(fx, fy))
}

fn cardinal_points() -> Vec<ConnectionPoint> {
    vec![
        point("top", Direction::North, 0.5, 0.0),
        point("right", Direction::East, 1.0, 0.5),
        point("bottom", Direction::South, 0.5, 1.0),
        point("left", Direction::West, 0.0, 0.5),
    ]
}

fn distributed_points() -> Vec<ConnectionPoint> {
    const STOPS: [(&str, f32); 3] = [("1", 0.25), ("2", 0.5), ("3", 0.75)];

    let mut points = Vec::with_capacity(12);
    for (suffix, t) in STOPS {
        points.push(point(&format!("top-{suffix}"), Direction::North, t, 0.0));
    }
    for (suffix, t) in STOPS {
        points.push(point(&format!("right-{suffix}"), Direction::East, 1.0, t));
    }
    for (suffix, t) in STOPS {
        points.push(point(&format!("bottom-{suffix}"), Direction::South, t, 1.0));
    }
    for (suffix, t) in STOPS {
        points.push(point(&format!("left-{suffix}"), Direction::West, 0.0, t));
    }
    points
}

fn lifeline_points(height: f32) -> Vec<ConnectionPoint> {
    let mut points = vec![point("top", Direction::North, 0.5, 0.0)];
    if height.is_nan() || height <= LIFELINE_HEADER_HEIGHT {
        return points;
    }

    let rows = ((height - LIFELINE_HEADER_HEIGHT) / LIFELINE_POINT_SPACING).floor() as usize;
    for row in 0..rows {
        let y = LIFELINE_HEADER_HEIGHT + LIFELINE_POINT_SPACING * (row + 1) as f32;
        let fy = y / height;
        points.push(point(&format!("left-{row}"), Direction::West, 0.5, fy));
        points.push(point(&format!("right-{row}"), Direction::East, 0.5, fy));
    }
    points
}

/// Returns the absolute canvas position of a connection point on a shape.
///
/// The result always lies on or within `bounds`.
pub fn absolute_position(point: &ConnectionPoint, bounds: Bounds) -> Point {
    // Clamped: min + (max - min) may round past max.
    Point::new(
        (bounds.min_x() + point.anchor.fx * bounds.width())
            .max(bounds.min_x())
            .min(bounds.max_x()),
        (bounds.min_y() + point.anchor.fy * bounds.height())
            .max(bounds.min_y())
            .min(bounds.max_y()),
    )
}

/// Looks up a connection point by its scoped id.
pub fn find_connection_point(points: &[ConnectionPoint], id: PointId) -> Option<&ConnectionPoint> {
    points.iter().find(|point| point.id == id)
}

/// Resolves a point id on a shape of the given kind and bounds.
pub fn resolve_point(kind: ShapeKind, bounds: Bounds, id: PointId) -> Option<ResolvedPoint> {
    let points = connection_points_for(kind, bounds.height());
    let Some(point) = find_connection_point(&points, id) else {
        trace!(kind:% = kind, point_id:% = id; "Connection point not found");
        return None;
    };
    Some(ResolvedPoint {
        position: absolute_position(point, bounds),
        direction: point.direction,
    })
}

/// Picks the cardinal direction pointing from `start` toward `end`.
///
/// The axis with the larger absolute delta wins; ties (including a zero
/// delta) prefer the horizontal axis, and a zero horizontal delta resolves
/// to East.
///
/// # Examples
///
/// ```
/// # use easel_core::{connection::{infer_direction, Direction}, geometry::Point};
/// let origin = Point::new(0.0, 0.0);
/// assert_eq!(infer_direction(origin, Point::new(-10.0, 3.0)), Direction::West);
/// assert_eq!(infer_direction(origin, Point::new(2.0, 9.0)), Direction::South);
/// assert_eq!(infer_direction(origin, Point::new(5.0, -5.0)), Direction::East);
/// ```
pub fn infer_direction(start: Point, end: Point) -> Direction {
    let delta = end.sub_point(start);
    if delta.x().abs() >= delta.y().abs() {
        if delta.x() >= 0.0 {
            Direction::East
        } else {
            Direction::West
        }
    } else if delta.y() > 0.0 {
        Direction::South
    } else {
        Direction::North
    }
}

/// Finds the pair of connection points (source, target) with the shortest
/// distance between them.
///
/// Ties keep the earliest pair in catalog order, so the choice is stable.
/// Returns `None` if either catalog is empty.
pub fn nearest_point_pair(
    source_kind: ShapeKind,
    source_bounds: Bounds,
    target_kind: ShapeKind,
    target_bounds: Bounds,
) -> Option<(ConnectionPoint, ConnectionPoint)> {
    let source_points = connection_points_for(source_kind, source_bounds.height());
    let target_points = connection_points_for(target_kind, target_bounds.height());

    let mut best: Option<(f32, ConnectionPoint, ConnectionPoint)> = None;
    for source in &source_points {
        let source_position = absolute_position(source, source_bounds);
        for target in &target_points {
            let distance = source_position.distance(absolute_position(target, target_bounds));
            if best.is_none_or(|(best_distance, _, _)| distance < best_distance) {
                best = Some((distance, *source, *target));
            }
        }
    }
    best.map(|(_, source, target)| (source, target))
}

/// Finds the connection point of a shape closest to `position`.
///
/// Ties keep the earliest point in catalog order.
pub fn nearest_point(kind: ShapeKind, bounds: Bounds, position: Point) -> Option<ConnectionPoint> {
    connection_points_for(kind, bounds.height())
        .into_iter()
        .map(|point| (absolute_position(&point, bounds).distance(position), point))
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, point)| point)
}

/// Finds the connection point of a shape closest to `position`, if any lies
/// within `radius`.
pub fn point_near(
    kind: ShapeKind,
    bounds: Bounds,
    position: Point,
    radius: f32,
) -> Option<ConnectionPoint> {
    nearest_point(kind, bounds, position)
        .filter(|point| absolute_position(point, bounds).distance(position) <= radius)
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::geometry::Size;

    fn bounds(x: f32, y: f32, w: f32, h: f32) -> Bounds {
        Bounds::new_from_top_left(Point::new(x, y), Size::new(w, h))
    }

    #[test]
    fn test_cardinal_positions() {
        let shape = bounds(0.0, 0.0, 100.0, 60.0);
        let points = connection_points_for(ShapeKind::Task, shape.height());

        let right = find_connection_point(&points, PointId::new("right")).unwrap();
        assert_eq!(right.direction(), Direction::East);
        assert_eq!(absolute_position(right, shape), Point::new(100.0, 30.0));

        let top = find_connection_point(&points, PointId::new("top")).unwrap();
        assert_eq!(absolute_position(top, shape), Point::new(50.0, 0.0));
    }

    #[test]
    fn test_distributed_points_cover_each_side() {
        let points = connection_points_for(ShapeKind::Class, 120.0);
        assert_eq!(points.len(), 12);

        let shape = bounds(10.0, 10.0, 200.0, 120.0);
        let left_3 = find_connection_point(&points, PointId::new("left-3")).unwrap();
        assert_eq!(left_3.direction(), Direction::West);
        assert_eq!(absolute_position(left_3, shape), Point::new(10.0, 100.0));
    }

    #[test]
    fn test_lifeline_points_depend_on_height() {
        assert_eq!(connection_points_for(ShapeKind::Lifeline, 30.0).len(), 1);
        assert_eq!(connection_points_for(ShapeKind::Lifeline, 0.0).len(), 1);
        assert_eq!(connection_points_for(ShapeKind::Lifeline, 200.0).len(), 1 + 8 * 2);

        let shape = bounds(0.0, 0.0, 80.0, 200.0);
        let resolved = resolve_point(ShapeKind::Lifeline, shape, PointId::new("right-2")).unwrap();
        assert_eq!(resolved.direction, Direction::East);
        assert_approx_eq!(f32, resolved.position.x(), 40.0);
        assert_approx_eq!(f32, resolved.position.y(), 100.0, epsilon = 0.001);
    }

    #[test]
    fn test_unknown_point_resolves_to_none() {
        let shape = bounds(0.0, 0.0, 10.0, 10.0);
        assert!(resolve_point(ShapeKind::Task, shape, PointId::new("left-9")).is_none());
        assert!(resolve_point(ShapeKind::Lifeline, shape, PointId::new("right-0")).is_none());
    }

    #[test]
    fn test_infer_direction_prefers_horizontal_on_ties() {
        let origin = Point::new(0.0, 0.0);
        assert_eq!(infer_direction(origin, Point::new(3.0, 3.0)), Direction::East);
        assert_eq!(infer_direction(origin, Point::new(-3.0, -3.0)), Direction::West);
        assert_eq!(infer_direction(origin, Point::new(0.0, -1.0)), Direction::North);
        assert_eq!(infer_direction(origin, origin), Direction::East);
    }

    #[test]
    fn test_nearest_point_pair() {
        let a = bounds(0.0, 0.0, 100.0, 60.0);
        let b = bounds(200.0, 0.0, 100.0, 60.0);
        let (source, target) = nearest_point_pair(ShapeKind::Task, a, ShapeKind::Task, b).unwrap();
        assert_eq!(source.id(), PointId::new("right"));
        assert_eq!(target.id(), PointId::new("left"));

        let below = bounds(0.0, 200.0, 100.0, 60.0);
        let (source, target) =
            nearest_point_pair(ShapeKind::Task, a, ShapeKind::Task, below).unwrap();
        assert_eq!(source.id(), PointId::new("bottom"));
        assert_eq!(target.id(), PointId::new("top"));
    }

    #[test]
    fn test_point_near() {
        let shape = bounds(0.0, 0.0, 100.0, 60.0);
        let hit = point_near(ShapeKind::Task, shape, Point::new(97.0, 32.0), 6.0).unwrap();
        assert_eq!(hit.id(), PointId::new("right"));
        assert!(point_near(ShapeKind::Task, shape, Point::new(50.0, 30.0), 6.0).is_none());
    }

    #[test]
    fn test_nearest_point_has_no_radius() {
        let shape = bounds(0.0, 0.0, 100.0, 60.0);
        let far = nearest_point(ShapeKind::Task, shape, Point::new(50.0, 500.0)).unwrap();
        assert_eq!(far.id(), PointId::new("bottom"));
        // Equidistant from every point: the first in catalog order wins.
        let square = bounds(0.0, 0.0, 60.0, 60.0);
        let center = nearest_point(ShapeKind::Rectangle, square, Point::new(30.0, 30.0)).unwrap();
        assert_eq!(center.id(), PointId::new("top"));
    }

    #[test]
    fn test_direction_helpers() {
        assert!(Direction::East.is_horizontal());
        assert!(!Direction::North.is_horizontal());
        assert_eq!(Direction::South.opposite(), Direction::North);
        assert_eq!(Direction::West.unit(), Point::new(-1.0, 0.0));
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;
    use crate::geometry::Size;

    fn bounds_strategy() -> impl Strategy<Value = Bounds> {
        (
            -1000.0f32..1000.0,
            -1000.0f32..1000.0,
            0.0f32..500.0,
            0.0f32..500.0,
        )
            .prop_map(|(x, y, w, h)| Bounds::new_from_top_left(Point::new(x, y), Size::new(w, h)))
    }

    fn kind_strategy() -> impl Strategy<Value = ShapeKind> {
        proptest::sample::select(ShapeKind::ALL.to_vec())
    }

    /// Every connection point of every kind lies on or within the shape bounds.
    fn check_points_within_bounds(kind: ShapeKind, bounds: Bounds) -> Result<(), TestCaseError> {
        for point in connection_points_for(kind, bounds.height()) {
            let position = absolute_position(&point, bounds);
            prop_assert!(
                bounds.contains(position),
                "{kind} point {} at {position:?} outside {bounds:?}",
                point.id()
            );
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn points_within_bounds(kind in kind_strategy(), bounds in bounds_strategy()) {
            check_points_within_bounds(kind, bounds)?;
        }
    }
}
