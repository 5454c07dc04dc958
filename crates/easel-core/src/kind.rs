//! Kinds of diagram elements.
//!
//! [`ShapeKind`] enumerates every element the canvas can place, grouped by the
//! diagram variant that usually offers it. A kind decides how a shape exposes
//! connection points ([`PointLayout`]) and whether it may contain other shapes.

use std::{fmt, str};

use serde::{Deserialize, Serialize};

/// The diagram variants supported by the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramVariant {
    Bpmn,
    Class,
    Sequence,
    Dataflow,
}

impl str::FromStr for DiagramVariant {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bpmn" => Ok(Self::Bpmn),
            "class" => Ok(Self::Class),
            "sequence" => Ok(Self::Sequence),
            "dataflow" => Ok(Self::Dataflow),
            _ => Err("Invalid diagram variant"),
        }
    }
}

impl fmt::Display for DiagramVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bpmn => "bpmn",
            Self::Class => "class",
            Self::Sequence => "sequence",
            Self::Dataflow => "dataflow",
        })
    }
}

/// How a shape kind distributes its connection points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLayout {
    /// One point at the middle of each edge.
    Cardinal,
    /// Three points per edge at 25/50/75 % of its length.
    Distributed,
    /// A header point plus evenly spaced points along the vertical axis.
    Lifeline,
}

/// The kind of a diagram element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    // Generic
    Rectangle,
    Note,
    // BPMN
    Task,
    Event,
    Gateway,
    DataObject,
    Pool,
    Lane,
    // Class
    Class,
    Interface,
    Enumeration,
    Package,
    // Sequence
    Lifeline,
    Actor,
    Fragment,
    // Dataflow
    Process,
    DataStore,
    ExternalEntity,
    TrustBoundary,
}

impl ShapeKind {
    /// Returns the connection point layout of this kind.
    pub fn point_layout(self) -> PointLayout {
        match self {
            Self::Class | Self::Interface | Self::Enumeration => PointLayout::Distributed,
            Self::Lifeline | Self::Actor => PointLayout::Lifeline,
            _ => PointLayout::Cardinal,
        }
    }

    /// Returns true if shapes of this kind may own child shapes and be resized
    /// through handles.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            Self::Rectangle
                | Self::Pool
                | Self::Lane
                | Self::Package
                | Self::Fragment
                | Self::TrustBoundary
                | Self::Class
                | Self::Note
                | Self::Lifeline
        )
    }

    /// Returns the snake_case name used in configuration and session files
    pub fn name(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Note => "note",
            Self::Task => "task",
            Self::Event => "event",
            Self::Gateway => "gateway",
            Self::DataObject => "data_object",
            Self::Pool => "pool",
            Self::Lane => "lane",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Enumeration => "enumeration",
            Self::Package => "package",
            Self::Lifeline => "lifeline",
            Self::Actor => "actor",
            Self::Fragment => "fragment",
            Self::Process => "process",
            Self::DataStore => "data_store",
            Self::ExternalEntity => "external_entity",
            Self::TrustBoundary => "trust_boundary",
        }
    }

    /// All kinds, in declaration order.
    pub const ALL: [ShapeKind; 19] = [
        Self::Rectangle,
        Self::Note,
        Self::Task,
        Self::Event,
        Self::Gateway,
        Self::DataObject,
        Self::Pool,
        Self::Lane,
        Self::Class,
        Self::Interface,
        Self::Enumeration,
        Self::Package,
        Self::Lifeline,
        Self::Actor,
        Self::Fragment,
        Self::Process,
        Self::DataStore,
        Self::ExternalEntity,
        Self::TrustBoundary,
    ];
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl str::FromStr for ShapeKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or("Invalid shape kind")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_kind_from_str_round_trips_names() {
        for kind in ShapeKind::ALL {
            let parsed: ShapeKind = kind.name().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("hexagon".parse::<ShapeKind>().is_err());
    }

    #[test]
    fn test_point_layouts() {
        assert_eq!(ShapeKind::Task.point_layout(), PointLayout::Cardinal);
        assert_eq!(ShapeKind::Class.point_layout(), PointLayout::Distributed);
        assert_eq!(ShapeKind::Lifeline.point_layout(), PointLayout::Lifeline);
        assert_eq!(ShapeKind::Actor.point_layout(), PointLayout::Lifeline);
    }

    #[test]
    fn test_diagram_variant_from_str() {
        assert_eq!("sequence".parse::<DiagramVariant>(), Ok(DiagramVariant::Sequence));
        assert_eq!(DiagramVariant::Dataflow.to_string(), "dataflow");
        assert!("erd".parse::<DiagramVariant>().is_err());
    }
}
