//! Easel - an interactive diagram canvas engine.
//!
//! Shapes are placed on a canvas, connected with routed connectors and edited
//! in place. Every change is a [`Command`] executed through a per-diagram
//! history, so any edit can be undone and redone.
//!
//! # Examples
//!
//! ```rust
//! use easel::{
//!     Workspace,
//!     config::EditorConfig,
//!     geometry::{Point, Size},
//!     identifier::{DiagramId, ShapeId},
//!     interaction::{InputEvent, Modifiers, PointerButton},
//!     kind::{DiagramVariant, ShapeKind},
//!     model::{DiagramModel, Shape},
//!     store::MemoryStore,
//! };
//!
//! let task = |id: &str, x: f32| {
//!     let size = Size::new(100.0, 60.0);
//!     Shape::new(ShapeId::new(id), ShapeKind::Task, Point::new(x, 0.0), size)
//! };
//!
//! let diagram = DiagramId::new("order-process");
//! let mut store = MemoryStore::new();
//! store.insert(
//!     diagram,
//!     DiagramModel::from_parent_links(
//!         DiagramVariant::Bpmn,
//!         vec![task("A", 0.0), task("B", 200.0)],
//!         vec![],
//!     ),
//! );
//!
//! let mut workspace = Workspace::new(store, EditorConfig::default());
//! workspace.open(diagram).unwrap();
//!
//! // Drag from the right point of A to the left point of B.
//! for event in [
//!     InputEvent::PointerDown {
//!         position: Point::new(100.0, 30.0),
//!         button: PointerButton::Primary,
//!         modifiers: Modifiers::default(),
//!     },
//!     InputEvent::PointerMove { position: Point::new(200.0, 30.0) },
//!     InputEvent::PointerUp { position: Point::new(200.0, 30.0), button: PointerButton::Primary },
//! ] {
//!     workspace.dispatch(diagram, &event).unwrap();
//! }
//!
//! let scene = workspace.scene(diagram).unwrap();
//! assert_eq!(scene.connectors()[0].path.path_data(), "M 100 30 L 200 30");
//!
//! workspace.undo(diagram).unwrap();
//! assert!(workspace.scene(diagram).unwrap().connectors().is_empty());
//! ```

pub mod canvas;
pub mod catalog;
pub mod command;
pub mod config;
pub mod export;
pub mod history;
pub mod interaction;
pub mod model;
pub mod order;
pub mod scene;
pub mod store;
pub mod workspace;

mod error;

pub use easel_core::{connection, geometry, identifier, kind, routing, viewport};

pub use canvas::Canvas;
pub use command::{Command, CommandError};
pub use error::EaselError;
pub use workspace::Workspace;
