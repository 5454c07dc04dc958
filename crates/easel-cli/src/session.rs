//! Session files.
//!
//! A session is a TOML document describing a diagram (variant, shapes and
//! connectors) followed by the input events to replay against it:
//!
//! ```toml
//! diagram = "order-process"
//! variant = "bpmn"
//!
//! [[shapes]]
//! id = "A"
//! kind = "task"
//! x = 0
//! y = 0
//! width = 100
//! height = 60
//!
//! [[events]]
//! kind = "pointer_down"
//! x = 100
//! y = 30
//! ```
//!
//! Event positions are screen coordinates.

use std::{fs, path::Path};

use log::debug;
use serde::Deserialize;
use thiserror::Error;

use easel::{
    catalog::{self, ConnectorCatalog},
    geometry::{Point, Size},
    identifier::{ConnectorId, ConnectorTypeId, DiagramId, OverlayTag, PointId, ShapeId},
    interaction::{InputEvent, Key, Modifiers, PointerButton},
    kind::{DiagramVariant, ShapeKind},
    model::{Connector, DiagramModel, Shape, ShapePayload},
    routing::ConnectorStyle,
};

/// Errors raised while reading a session file.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to read session file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse session: {0}")]
    Parse(String),

    #[error("Connector `{connector}` uses unknown type `{connector_type}`")]
    UnknownConnectorType {
        connector: ConnectorId,
        connector_type: ConnectorTypeId,
    },
}

/// A diagram plus the events to replay against it.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    #[serde(default = "default_diagram")]
    diagram: DiagramId,
    variant: DiagramVariant,
    #[serde(default)]
    shapes: Vec<ShapeEntry>,
    #[serde(default)]
    connectors: Vec<ConnectorEntry>,
    #[serde(default)]
    events: Vec<SessionEvent>,
}

fn default_diagram() -> DiagramId {
    DiagramId::new("session")
}

#[derive(Debug, Clone, Deserialize)]
struct ShapeEntry {
    id: ShapeId,
    kind: ShapeKind,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    #[serde(default)]
    parent: Option<ShapeId>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    overlay: Option<OverlayTag>,
    #[serde(default)]
    payload: ShapePayload,
}

#[derive(Debug, Clone, Deserialize)]
struct ConnectorEntry {
    id: ConnectorId,
    source: ShapeId,
    target: ShapeId,
    /// Catalog tool; the variant's default tool when omitted.
    #[serde(default, rename = "type")]
    connector_type: Option<ConnectorTypeId>,
    #[serde(default)]
    source_point: Option<PointId>,
    #[serde(default)]
    target_point: Option<PointId>,
    /// Overrides the tool's style.
    #[serde(default)]
    style: Option<ConnectorStyle>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    z_index: Option<i32>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ButtonName {
    #[default]
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ModifierName {
    Shift,
    Ctrl,
    Meta,
    Alt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum KeyName {
    Escape,
    Enter,
    Delete,
    Backspace,
}

/// One scripted user action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SessionEvent {
    PointerDown {
        x: f32,
        y: f32,
        #[serde(default)]
        button: ButtonName,
        #[serde(default)]
        modifiers: Vec<ModifierName>,
    },
    PointerMove {
        x: f32,
        y: f32,
    },
    PointerUp {
        x: f32,
        y: f32,
        #[serde(default)]
        button: ButtonName,
    },
    /// Pointer down and up at the same position.
    Click {
        x: f32,
        y: f32,
        #[serde(default)]
        modifiers: Vec<ModifierName>,
    },
    DoubleClick {
        x: f32,
        y: f32,
    },
    Wheel {
        x: f32,
        y: f32,
        #[serde(default)]
        dx: f32,
        #[serde(default)]
        dy: f32,
        #[serde(default)]
        modifiers: Vec<ModifierName>,
    },
    Key {
        key: KeyName,
        #[serde(default)]
        modifiers: Vec<ModifierName>,
    },
    Text {
        text: String,
    },
    Blur,
    MenuSelect {
        connector_type: ConnectorTypeId,
    },
    Undo,
    Redo,
    Overlay {
        overlay: OverlayTag,
        visible: bool,
    },
}

/// A replay step derived from a session event.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Input(InputEvent),
    Undo,
    Redo,
    Overlay { overlay: OverlayTag, visible: bool },
}

impl Session {
    /// Reads and parses a session file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, SessionError> {
        toml::from_str(content).map_err(|err| SessionError::Parse(err.to_string()))
    }

    pub fn diagram(&self) -> DiagramId {
        self.diagram
    }

    pub fn variant(&self) -> DiagramVariant {
        self.variant
    }

    /// Builds the diagram model. Connectors take their defaults from the
    /// variant's catalog.
    pub fn model(&self) -> Result<DiagramModel, SessionError> {
        let catalog = catalog::catalog_for(self.variant);
        let shapes = self.shapes.iter().map(ShapeEntry::to_shape);
        let connectors = self
            .connectors
            .iter()
            .map(|entry| entry.to_connector(catalog.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            shapes = self.shapes.len(),
            connectors = connectors.len();
            "Session diagram built"
        );
        Ok(DiagramModel::from_parent_links(self.variant, shapes, connectors))
    }

    /// Returns the replay steps in order.
    pub fn steps(&self) -> Vec<Step> {
        self.events.iter().flat_map(SessionEvent::to_steps).collect()
    }
}

impl ShapeEntry {
    fn to_shape(&self) -> Shape {
        let mut shape = Shape::new(
            self.id,
            self.kind,
            Point::new(self.x, self.y),
            Size::new(self.width, self.height),
        )
        .with_payload(self.payload.clone());
        if let Some(parent) = self.parent {
            shape = shape.with_parent(parent);
        }
        if let Some(label) = &self.label {
            shape = shape.with_label(label.clone());
        }
        if let Some(overlay) = self.overlay {
            shape = shape.with_overlay(overlay);
        }
        shape
    }
}

impl ConnectorEntry {
    fn to_connector(&self, catalog: &dyn ConnectorCatalog) -> Result<Connector, SessionError> {
        let tool = match self.connector_type {
            Some(connector_type) => {
                catalog
                    .tool(connector_type)
                    .ok_or(SessionError::UnknownConnectorType {
                        connector: self.id,
                        connector_type,
                    })?
            }
            None => catalog.default_tool(),
        };

        let mut connector = tool.build(self.id, self.source, self.target);
        if let Some(source_point) = self.source_point {
            connector = connector.with_source_point(source_point);
        }
        if let Some(target_point) = self.target_point {
            connector = connector.with_target_point(target_point);
        }
        if let Some(style) = self.style {
            connector = connector.with_style(style);
        }
        if let Some(label) = &self.label {
            connector = connector.with_label(label.clone());
        }
        if let Some(z_index) = self.z_index {
            connector = connector.with_z_index(z_index);
        }
        Ok(connector)
    }
}

impl SessionEvent {
    fn to_steps(&self) -> Vec<Step> {
        let input = |event| vec![Step::Input(event)];
        match self {
            Self::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => input(InputEvent::PointerDown {
                position: Point::new(*x, *y),
                button: button.to_button(),
                modifiers: to_modifiers(modifiers),
            }),
            Self::PointerMove { x, y } => input(InputEvent::PointerMove {
                position: Point::new(*x, *y),
            }),
            Self::PointerUp { x, y, button } => input(InputEvent::PointerUp {
                position: Point::new(*x, *y),
                button: button.to_button(),
            }),
            Self::Click { x, y, modifiers } => {
                let position = Point::new(*x, *y);
                vec![
                    Step::Input(InputEvent::PointerDown {
                        position,
                        button: PointerButton::Primary,
                        modifiers: to_modifiers(modifiers),
                    }),
                    Step::Input(InputEvent::PointerUp {
                        position,
                        button: PointerButton::Primary,
                    }),
                ]
            }
            Self::DoubleClick { x, y } => input(InputEvent::DoubleClick {
                position: Point::new(*x, *y),
            }),
            Self::Wheel {
                x,
                y,
                dx,
                dy,
                modifiers,
            } => input(InputEvent::Wheel {
                position: Point::new(*x, *y),
                delta: Point::new(*dx, *dy),
                modifiers: to_modifiers(modifiers),
            }),
            Self::Key { key, modifiers } => input(InputEvent::KeyDown {
                key: key.to_key(),
                modifiers: to_modifiers(modifiers),
            }),
            Self::Text { text } => input(InputEvent::TextInput(text.clone())),
            Self::Blur => input(InputEvent::Blur),
            Self::MenuSelect { connector_type } => input(InputEvent::MenuSelect(*connector_type)),
            Self::Undo => vec![Step::Undo],
            Self::Redo => vec![Step::Redo],
            Self::Overlay { overlay, visible } => vec![Step::Overlay {
                overlay: *overlay,
                visible: *visible,
            }],
        }
    }
}

impl ButtonName {
    fn to_button(self) -> PointerButton {
        match self {
            Self::Primary => PointerButton::Primary,
            Self::Secondary => PointerButton::Secondary,
            Self::Middle => PointerButton::Middle,
        }
    }
}

impl KeyName {
    fn to_key(self) -> Key {
        match self {
            Self::Escape => Key::Escape,
            Self::Enter => Key::Enter,
            Self::Delete => Key::Delete,
            Self::Backspace => Key::Backspace,
        }
    }
}

fn to_modifiers(names: &[ModifierName]) -> Modifiers {
    names.iter().fold(Modifiers::NONE, |mut modifiers, name| {
        match name {
            ModifierName::Shift => modifiers.shift = true,
            ModifierName::Ctrl => modifiers.ctrl = true,
            ModifierName::Meta => modifiers.meta = true,
            ModifierName::Alt => modifiers.alt = true,
        }
        modifiers
    })
}

#[cfg(test)]
mod tests {
    use easel::model::LineKind;

    use super::*;

    const SESSION: &str = r#"
diagram = "orders"
variant = "bpmn"

[[shapes]]
id = "pool"
kind = "pool"
x = 0
y = 0
width = 500
height = 200

[[shapes]]
id = "A"
kind = "task"
x = 20
y = 20
width = 100
height = 60
parent = "pool"
label = "Receive order"

[[connectors]]
id = "notify"
source = "A"
target = "pool"
type = "message_flow"
source_point = "bottom"
target_point = "bottom"

[[events]]
kind = "click"
x = 300
y = 150
modifiers = ["shift"]

[[events]]
kind = "undo"

[[events]]
kind = "overlay"
overlay = "notes"
visible = false
"#;

    #[test]
    fn test_parse_session_model() {
        let session = Session::parse(SESSION).unwrap();
        assert_eq!(session.diagram(), DiagramId::new("orders"));
        assert_eq!(session.variant(), DiagramVariant::Bpmn);

        let model = session.model().unwrap();
        assert!(model.validate().is_empty());
        let pool = model.shape(ShapeId::new("pool")).unwrap();
        assert_eq!(pool.children(), &[ShapeId::new("A")]);
        assert_eq!(model.shape(ShapeId::new("A")).unwrap().label(), Some("Receive order"));

        let connector = model.connector(ConnectorId::new("notify")).unwrap();
        assert_eq!(connector.line(), LineKind::Dashed);
        assert_eq!(connector.source_point(), Some(PointId::new("bottom")));
    }

    #[test]
    fn test_steps_expand_clicks() {
        let steps = Session::parse(SESSION).unwrap().steps();
        assert_eq!(steps.len(), 4);
        assert_eq!(
            steps[0],
            Step::Input(InputEvent::PointerDown {
                position: Point::new(300.0, 150.0),
                button: PointerButton::Primary,
                modifiers: Modifiers::SHIFT,
            })
        );
        assert!(matches!(steps[1], Step::Input(InputEvent::PointerUp { .. })));
        assert_eq!(steps[2], Step::Undo);
        assert_eq!(
            steps[3],
            Step::Overlay {
                overlay: OverlayTag::new("notes"),
                visible: false,
            }
        );
    }

    #[test]
    fn test_unknown_connector_type() {
        let session = Session::parse(
            r#"
variant = "class"

[[connectors]]
id = "c"
source = "a"
target = "b"
type = "sequence_flow"
"#,
        )
        .unwrap();
        assert_eq!(session.diagram(), DiagramId::new("session"));
        assert!(matches!(
            session.model(),
            Err(SessionError::UnknownConnectorType { .. })
        ));
    }

    #[test]
    fn test_single_pinned_point() {
        let session = Session::parse(
            r#"
variant = "dataflow"

[[connectors]]
id = "c"
source = "a"
target = "b"
source_point = "right"
"#,
        )
        .unwrap();
        let model = session.model().unwrap();
        let connector = model.connector(ConnectorId::new("c")).unwrap();
        assert_eq!(connector.source_point(), Some(PointId::new("right")));
        assert_eq!(connector.target_point(), None);
    }

    #[test]
    fn test_invalid_session() {
        assert!(matches!(
            Session::parse("variant = \"uml\""),
            Err(SessionError::Parse(_))
        ));
    }
}
