//! Model commands.
//!
//! A [`Command`] is a self-describing, invertible mutation of a
//! [`DiagramModel`]. Commands carry full before/after snapshots (and the
//! slots deleted entities occupied), so [`Command::inverse`] is a pure table
//! lookup and applying a command followed by its inverse restores the model
//! exactly, including ordering.

use log::{debug, error};
use thiserror::Error;

use easel_core::identifier::{ConnectorId, DiagramId, ShapeId};

use crate::{
    model::{Connector, DiagramModel, Shape, ShapeSlot},
    store::StoreError,
};

/// Errors raised when a command cannot be applied or persisted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("Unknown shape `{0}`")]
    UnknownShape(ShapeId),

    #[error("Unknown connector `{0}`")]
    UnknownConnector(ConnectorId),

    #[error("Shape `{0}` already exists")]
    DuplicateShape(ShapeId),

    #[error("Connector `{0}` already exists")]
    DuplicateConnector(ConnectorId),

    #[error("Shape `{shape}` still contains `{child}`")]
    HasChildren { shape: ShapeId, child: ShapeId },

    #[error("Shape `{shape}` is still attached to connector `{connector}`")]
    ShapeInUse {
        shape: ShapeId,
        connector: ConnectorId,
    },

    #[error("Shape `{0}` cannot be connected to itself in this diagram")]
    SelfConnection(ShapeId),

    #[error("Shape `{0}` changed since the command was created")]
    StaleShape(ShapeId),

    #[error("Connector `{0}` changed since the command was created")]
    StaleConnector(ConnectorId),

    #[error("An update cannot change the parent or children of shape `{0}`")]
    Reparent(ShapeId),

    #[error("Failed to persist change to diagram `{diagram}`: {source}")]
    Persist {
        diagram: DiagramId,
        #[source]
        source: StoreError,
    },
}

/// An invertible model mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateShape { shape: Shape, slot: ShapeSlot },
    DeleteShape { shape: Shape, slot: ShapeSlot },
    UpdateShape { before: Shape, after: Shape },
    CreateConnector { connector: Connector, index: usize },
    DeleteConnector { connector: Connector, index: usize },
    UpdateConnector { before: Connector, after: Connector },
    /// Applied in order, undone in reverse order, as one history entry.
    Batch { label: String, commands: Vec<Command> },
}

impl Command {
    /// Creates `shape` at the end of the model and of its parent's children.
    pub fn create_shape(model: &DiagramModel, shape: Shape) -> Self {
        let child_index = shape
            .parent()
            .and_then(|parent| model.shape(parent))
            .map(|parent| parent.children().len());
        Self::CreateShape {
            shape,
            slot: ShapeSlot {
                index: model.shape_count(),
                child_index,
            },
        }
    }

    /// Deletes the shape `id` as it currently is. Returns `None` for unknown ids.
    pub fn delete_shape(model: &DiagramModel, id: ShapeId) -> Option<Self> {
        Some(Self::DeleteShape {
            shape: model.shape(id)?.clone(),
            slot: model.shape_slot(id)?,
        })
    }

    /// Returns `None` when nothing changes.
    pub fn update_shape(before: Shape, after: Shape) -> Option<Self> {
        (before != after).then_some(Self::UpdateShape { before, after })
    }

    /// Appends `connector` to the model.
    pub fn create_connector(model: &DiagramModel, connector: Connector) -> Self {
        Self::CreateConnector {
            connector,
            index: model.connector_count(),
        }
    }

    /// Deletes the connector `id` as it currently is. Returns `None` for unknown ids.
    pub fn delete_connector(model: &DiagramModel, id: ConnectorId) -> Option<Self> {
        Some(Self::DeleteConnector {
            connector: model.connector(id)?.clone(),
            index: model.connector_index(id)?,
        })
    }

    /// Returns `None` when nothing changes.
    pub fn update_connector(before: Connector, after: Connector) -> Option<Self> {
        (before != after).then_some(Self::UpdateConnector { before, after })
    }

    pub fn batch(label: impl Into<String>, commands: Vec<Command>) -> Self {
        Self::Batch {
            label: label.into(),
            commands,
        }
    }

    /// Human readable description, used for undo/redo menu entries.
    pub fn label(&self) -> String {
        match self {
            Self::CreateShape { .. } => "Create shape".to_string(),
            Self::DeleteShape { .. } => "Delete shape".to_string(),
            Self::UpdateShape { .. } => "Update shape".to_string(),
            Self::CreateConnector { .. } => "Create connector".to_string(),
            Self::DeleteConnector { .. } => "Delete connector".to_string(),
            Self::UpdateConnector { .. } => "Update connector".to_string(),
            Self::Batch { label, .. } => label.clone(),
        }
    }

    /// Returns the command that undoes this one.
    pub fn inverse(&self) -> Self {
        match self {
            Self::CreateShape { shape, slot } => Self::DeleteShape {
                shape: shape.clone(),
                slot: *slot,
            },
            Self::DeleteShape { shape, slot } => Self::CreateShape {
                shape: shape.clone(),
                slot: *slot,
            },
            Self::UpdateShape { before, after } => Self::UpdateShape {
                before: after.clone(),
                after: before.clone(),
            },
            Self::CreateConnector { connector, index } => Self::DeleteConnector {
                connector: connector.clone(),
                index: *index,
            },
            Self::DeleteConnector { connector, index } => Self::CreateConnector {
                connector: connector.clone(),
                index: *index,
            },
            Self::UpdateConnector { before, after } => Self::UpdateConnector {
                before: after.clone(),
                after: before.clone(),
            },
            Self::Batch { label, commands } => Self::Batch {
                label: label.clone(),
                commands: commands.iter().rev().map(Command::inverse).collect(),
            },
        }
    }

    /// Applies the command to `model`.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] if the command does not fit the current
    /// model. The model is left unchanged; a failing batch first undoes the
    /// commands it already applied.
    pub fn apply(&self, model: &mut DiagramModel) -> Result<(), CommandError> {
        match self {
            Self::CreateShape { shape, slot } => model.insert_shape(shape.clone(), *slot),
            Self::DeleteShape { shape, .. } => {
                if model.shape(shape.id()) != Some(shape) {
                    return Err(stale_or_unknown_shape(model, shape.id()));
                }
                model.remove_shape(shape.id()).map(|_| ())
            }
            Self::UpdateShape { before, after } => model.replace_shape(before, after.clone()),
            Self::CreateConnector { connector, index } => {
                model.insert_connector(connector.clone(), *index)
            }
            Self::DeleteConnector { connector, .. } => {
                match model.connector(connector.id()) {
                    None => return Err(CommandError::UnknownConnector(connector.id())),
                    Some(current) if current != connector => {
                        return Err(CommandError::StaleConnector(connector.id()));
                    }
                    Some(_) => {}
                }
                model.remove_connector(connector.id()).map(|_| ())
            }
            Self::UpdateConnector { before, after } => {
                model.replace_connector(before, after.clone())
            }
            Self::Batch { label, commands } => apply_batch(model, label, commands),
        }
    }
}

fn stale_or_unknown_shape(model: &DiagramModel, id: ShapeId) -> CommandError {
    if model.contains_shape(id) {
        CommandError::StaleShape(id)
    } else {
        CommandError::UnknownShape(id)
    }
}

fn apply_batch(
    model: &mut DiagramModel,
    label: &str,
    commands: &[Command],
) -> Result<(), CommandError> {
    for (applied, command) in commands.iter().enumerate() {
        if let Err(err) = command.apply(model) {
            debug!(label, applied, err:% = err; "Batch failed, rolling back");
            for done in commands[..applied].iter().rev() {
                if let Err(rollback_err) = done.inverse().apply(model) {
                    error!(label, err:% = rollback_err; "Failed to roll back batch step");
                }
            }
            return Err(err);
        }
    }
    Ok(())
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use easel_core::{
        geometry::{Point, Size},
        identifier::ConnectorTypeId,
        kind::{DiagramVariant, ShapeKind},
    };

    use super::*;

    const SHAPES: usize = 6;

    fn model() -> DiagramModel {
        let shapes = (0..SHAPES).map(|i| {
            let shape = Shape::new(
                ShapeId::new(&format!("s{i}")),
                ShapeKind::Rectangle,
                Point::new(i as f32 * 50.0, 0.0),
                Size::new(40.0, 40.0),
            );
            // s3..s5 live inside s0
            if i >= 3 {
                shape.with_parent(ShapeId::new("s0"))
            } else {
                shape
            }
        });
        let connectors = (1..3).map(|i| {
            Connector::new(
                ConnectorId::new(&format!("c{i}")),
                ShapeId::new("s1"),
                ShapeId::new(&format!("s{}", i + 1)),
                ConnectorTypeId::new("sequence_flow"),
            )
        });
        DiagramModel::from_parent_links(DiagramVariant::Bpmn, shapes, connectors)
    }

    #[derive(Debug, Clone)]
    enum Op {
        Create,
        DeleteLeaf(usize),
        Move(usize, f32, f32),
        DeleteConnector(usize),
        Relabel(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Create),
            (0..SHAPES).prop_map(Op::DeleteLeaf),
            (0..SHAPES, -100.0f32..100.0, -100.0f32..100.0).prop_map(|(i, x, y)| Op::Move(i, x, y)),
            (1..3usize).prop_map(Op::DeleteConnector),
            (1..3usize).prop_map(Op::Relabel),
        ]
    }

    fn build(model: &DiagramModel, op: &Op) -> Option<Command> {
        match op {
            Op::Create => Some(Command::create_shape(
                model,
                Shape::new(
                    ShapeId::new("new"),
                    ShapeKind::Task,
                    Point::new(10.0, 10.0),
                    Size::new(20.0, 20.0),
                )
                .with_parent(ShapeId::new("s0")),
            )),
            Op::DeleteLeaf(i) => {
                let id = ShapeId::new(&format!("s{i}"));
                let shape = model.shape(id)?;
                let in_use = model.connectors().any(|c| c.touches(id));
                (shape.children().is_empty() && !in_use)
                    .then(|| Command::delete_shape(model, id))
                    .flatten()
            }
            Op::Move(i, x, y) => {
                let before = model.shape(ShapeId::new(&format!("s{i}")))?.clone();
                let mut after = before.clone();
                after.set_position(Point::new(*x, *y));
                Command::update_shape(before, after)
            }
            Op::DeleteConnector(i) => {
                Command::delete_connector(model, ConnectorId::new(&format!("c{i}")))
            }
            Op::Relabel(i) => {
                let before = model.connector(ConnectorId::new(&format!("c{i}")))?.clone();
                let mut after = before.clone();
                after.set_label(Some(format!("label {i}")));
                Command::update_connector(before, after)
            }
        }
    }

    /// Applying a command then its inverse restores the model exactly.
    fn check_inverse_restores(op: Op) -> Result<(), TestCaseError> {
        let mut model = model();
        let original = model.clone();
        let Some(command) = build(&model, &op) else {
            return Ok(());
        };
        prop_assert!(command.apply(&mut model).is_ok());
        prop_assert!(command.inverse().apply(&mut model).is_ok());
        prop_assert_eq!(model, original);
        Ok(())
    }

    /// A batch of valid commands is undone by its inverse in one step.
    fn check_batch_inverse_restores(ops: Vec<Op>) -> Result<(), TestCaseError> {
        let mut model = model();
        let original = model.clone();
        let mut scratch = model.clone();
        let mut commands = Vec::new();
        for op in &ops {
            if let Some(command) = build(&scratch, op)
                && command.apply(&mut scratch).is_ok()
            {
                commands.push(command);
            }
        }
        let batch = Command::batch("Batch", commands);
        prop_assert!(batch.apply(&mut model).is_ok());
        prop_assert_eq!(&model, &scratch);
        prop_assert!(batch.inverse().apply(&mut model).is_ok());
        prop_assert_eq!(model, original);
        Ok(())
    }

    proptest! {
        #[test]
        fn inverse_restores(op in op_strategy()) {
            check_inverse_restores(op)?;
        }

        #[test]
        fn batch_inverse_restores(ops in proptest::collection::vec(op_strategy(), 0..8)) {
            check_batch_inverse_restores(ops)?;
        }
    }
}
