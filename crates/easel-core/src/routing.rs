//! Connector path routing.
//!
//! [`route`] turns two endpoints, the direction the connector leaves the
//! source and the direction of the target connection point into a
//! [`ConnectorPath`]. The same function serves committed connectors and the
//! live preview while a connector is being drawn, so both always look alike.
//!
//! Directions follow the connection point convention: a direction points
//! *out of* its shape. A connector therefore departs along `source_direction`
//! and arrives travelling opposite to `target_direction`.

use std::{fmt, str};

use serde::{Deserialize, Serialize};

use crate::{
    connection::Direction,
    geometry::{Bounds, Point, distance_to_segment},
};

/// Smallest distance between a curve endpoint and its control point.
pub const MIN_CURVE_OFFSET: f32 = 20.0;

/// Distance an orthogonal U-route keeps beyond the outermost endpoint.
pub const ROUTE_CLEARANCE: f32 = 20.0;

/// Coordinates closer than this are treated as equal when simplifying routes.
const COINCIDENT_EPSILON: f32 = 1e-3;

/// Number of samples used to flatten a curve for hit testing.
const CURVE_SAMPLES: usize = 16;

/// Defines the visual style of connector paths.
///
/// # Variants
///
/// - `Straight`: A direct line between the endpoints
/// - `Curved`: A cubic bezier leaving and entering perpendicular to the shape edges
/// - `Orthogonal`: Only horizontal and vertical segments with at most two corners
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorStyle {
    #[default]
    Straight,
    Curved,
    Orthogonal,
}

impl str::FromStr for ConnectorStyle {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "straight" => Ok(Self::Straight),
            "curved" => Ok(Self::Curved),
            "orthogonal" => Ok(Self::Orthogonal),
            _ => Err("Invalid connector style"),
        }
    }
}

impl fmt::Display for ConnectorStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Straight => "straight",
            Self::Curved => "curved",
            Self::Orthogonal => "orthogonal",
        })
    }
}

/// A routed connector path.
///
/// For `Straight` and `Orthogonal` styles the points are the polyline
/// vertices. For `Curved` they are the four bezier points
/// `[start, control1, control2, end]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorPath {
    style: ConnectorStyle,
    points: Vec<Point>,
}

impl ConnectorPath {
    /// Returns the style the path was routed with
    pub fn style(&self) -> ConnectorStyle {
        self.style
    }

    /// Returns the path vertices (or bezier points for curves)
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Returns the first point of the path
    pub fn start(&self) -> Point {
        self.points[0]
    }

    /// Returns the last point of the path
    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Returns the SVG path data for this path.
    ///
    /// # Examples
    ///
    /// ```
    /// # use easel_core::connection::Direction;
    /// # use easel_core::geometry::Point;
    /// # use easel_core::routing::{ConnectorStyle, route};
    /// let path = route(
    ///     Point::new(10.0, 20.0),
    ///     Point::new(100.0, 50.0),
    ///     Direction::East,
    ///     Direction::West,
    ///     ConnectorStyle::Straight,
    /// );
    /// assert_eq!(path.path_data(), "M 10 20 L 100 50");
    /// ```
    pub fn path_data(&self) -> String {
        let start = self.start();
        let mut data = format!("M {} {}", start.x(), start.y());
        match self.style {
            ConnectorStyle::Curved => {
                let [_, c1, c2, end] = [
                    self.points[0],
                    self.points[1],
                    self.points[2],
                    self.points[3],
                ];
                data.push_str(&format!(
                    " C {} {}, {} {}, {} {}",
                    c1.x(),
                    c1.y(),
                    c2.x(),
                    c2.y(),
                    end.x(),
                    end.y()
                ));
            }
            ConnectorStyle::Straight | ConnectorStyle::Orthogonal => {
                for point in &self.points[1..] {
                    data.push_str(&format!(" L {} {}", point.x(), point.y()));
                }
            }
        }
        data
    }

    /// Returns the polyline approximating the drawn path.
    pub fn polyline(&self) -> Vec<Point> {
        match self.style {
            ConnectorStyle::Curved => (0..=CURVE_SAMPLES)
                .map(|i| self.cubic_at(i as f32 / CURVE_SAMPLES as f32))
                .collect(),
            ConnectorStyle::Straight | ConnectorStyle::Orthogonal => self.points.clone(),
        }
    }

    /// Shortest distance from `point` to the drawn path.
    pub fn distance_to(&self, point: Point) -> f32 {
        let polyline = self.polyline();
        polyline
            .windows(2)
            .map(|segment| distance_to_segment(point, segment[0], segment[1]))
            .fold(point.distance(self.start()), f32::min)
    }

    /// Bounding box of every path point (including curve control points).
    pub fn bounds(&self) -> Bounds {
        let first = Bounds::new_from_corners(self.start(), self.start());
        self.points.iter().fold(first, |acc, point| {
            acc.merge(&Bounds::new_from_corners(*point, *point))
        })
    }

    fn cubic_at(&self, t: f32) -> Point {
        let [p0, p1, p2, p3] = [self.points[0], self.points[1], self.points[2], self.points[3]];
        let u = 1.0 - t;
        p0.scale(u * u * u)
            .add_point(p1.scale(3.0 * u * u * t))
            .add_point(p2.scale(3.0 * u * t * t))
            .add_point(p3.scale(t * t * t))
    }
}

/// Routes a connector between two points.
///
/// # Arguments
///
/// * `start` - Source endpoint in canvas coordinates.
/// * `end` - Target endpoint in canvas coordinates.
/// * `source_direction` - Direction of the source connection point.
/// * `target_direction` - Direction of the target connection point.
/// * `style` - Path style to produce.
///
/// # Examples
///
/// ```
/// # use easel_core::{connection::Direction, geometry::Point, routing::{route, ConnectorStyle}};
/// // East point of one box to the north point of another: a single elbow.
/// let path = route(
///     Point::new(100.0, 30.0),
///     Point::new(250.0, 200.0),
///     Direction::East,
///     Direction::North,
///     ConnectorStyle::Orthogonal,
/// );
/// assert_eq!(path.path_data(), "M 100 30 L 250 30 L 250 200");
/// ```
pub fn route(
    start: Point,
    end: Point,
    source_direction: Direction,
    target_direction: Direction,
    style: ConnectorStyle,
) -> ConnectorPath {
    let points = match style {
        ConnectorStyle::Straight => vec![start, end],
        ConnectorStyle::Curved => curved_points(start, end, source_direction, target_direction),
        ConnectorStyle::Orthogonal => {
            orthogonal_points(start, end, source_direction, target_direction)
        }
    };
    ConnectorPath { style, points }
}

fn curved_points(start: Point, end: Point, source: Direction, target: Direction) -> Vec<Point> {
    let offset = (start.distance(end) * 0.5).max(MIN_CURVE_OFFSET);
    vec![
        start,
        start.add_point(source.unit().scale(offset)),
        end.add_point(target.unit().scale(offset)),
        end,
    ]
}

fn orthogonal_points(start: Point, end: Point, source: Direction, target: Direction) -> Vec<Point> {
    let corners = match (source.is_horizontal(), target.is_horizontal()) {
        // Perpendicular axes: one elbow.
        (true, false) => vec![Point::new(end.x(), start.y())],
        (false, true) => vec![Point::new(start.x(), end.y())],
        // Both horizontal: S-route when facing each other, U-route otherwise.
        (true, true) => {
            let x = if source == target.opposite() {
                start.midpoint(end).x()
            } else if source == Direction::East {
                start.x().max(end.x()) + ROUTE_CLEARANCE
            } else {
                start.x().min(end.x()) - ROUTE_CLEARANCE
            };
            vec![Point::new(x, start.y()), Point::new(x, end.y())]
        }
        (false, false) => {
            let y = if source == target.opposite() {
                start.midpoint(end).y()
            } else if source == Direction::South {
                start.y().max(end.y()) + ROUTE_CLEARANCE
            } else {
                start.y().min(end.y()) - ROUTE_CLEARANCE
            };
            vec![Point::new(start.x(), y), Point::new(end.x(), y)]
        }
    };

    let mut points = Vec::with_capacity(corners.len() + 2);
    points.push(start);
    points.extend(corners);
    points.push(end);
    simplify(points)
}

/// Removes zero-length segments and interior points lying on a straight run.
fn simplify(points: Vec<Point>) -> Vec<Point> {
    let mut deduped: Vec<Point> = Vec::with_capacity(points.len());
    for point in points {
        if deduped
            .last()
            .is_none_or(|last| last.distance(point) > COINCIDENT_EPSILON)
        {
            deduped.push(point);
        }
    }

    let mut simplified: Vec<Point> = Vec::with_capacity(deduped.len());
    for point in deduped {
        if simplified.len() >= 2 {
            let prev = simplified[simplified.len() - 2];
            let last = simplified[simplified.len() - 1];
            if is_collinear_axis(prev, last, point) {
                simplified.pop();
            }
        }
        simplified.push(point);
    }

    // A zero-length route still needs two endpoints.
    if simplified.len() == 1 {
        simplified.push(simplified[0]);
    }
    simplified
}

fn is_collinear_axis(a: Point, b: Point, c: Point) -> bool {
    let same_x = (a.x() - b.x()).abs() <= COINCIDENT_EPSILON
        && (b.x() - c.x()).abs() <= COINCIDENT_EPSILON;
    let same_y = (a.y() - b.y()).abs() <= COINCIDENT_EPSILON
        && (b.y() - c.y()).abs() <= COINCIDENT_EPSILON;
    same_x || same_y
}
