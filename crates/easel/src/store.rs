//! Data-access boundary.
//!
//! The canvas engine loads diagrams through a [`DataSource`] and reports every
//! applied mutation to a [`Persistence`] backend. Calls are synchronous: the
//! command manager mutates the local model first and compensates with the
//! inverse command when persisting fails.
//!
//! [`MemoryStore`] implements both traits and is used by the CLI and tests.

use std::collections::HashMap;

use log::{debug, warn};
use thiserror::Error;

use easel_core::{identifier::DiagramId, kind::DiagramVariant};

use crate::{
    command::Command,
    model::{Connector, DiagramModel, Shape},
};

/// Errors reported by a data-access backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Unknown diagram `{0}`")]
    UnknownDiagram(DiagramId),

    #[error("Backend rejected the change: {0}")]
    Rejected(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Source of diagram data.
pub trait DataSource {
    /// Returns the variant of a stored diagram.
    fn load_variant(&self, diagram: DiagramId) -> Result<DiagramVariant, StoreError>;

    /// Returns the diagram's shapes in model order.
    fn load_shapes(&self, diagram: DiagramId) -> Result<Vec<Shape>, StoreError>;

    /// Returns the diagram's connectors in model order.
    fn load_connectors(&self, diagram: DiagramId) -> Result<Vec<Connector>, StoreError>;
}

/// Sink for applied model mutations.
pub trait Persistence {
    /// Persists a command that was just applied to the local model.
    fn persist(&mut self, diagram: DiagramId, command: &Command) -> Result<(), StoreError>;
}

/// In-memory backend.
///
/// Keeps its own copy of every diagram and applies persisted commands to it,
/// so a reload reflects every successful change.
#[derive(Debug, Default)]
pub struct MemoryStore {
    diagrams: HashMap<DiagramId, DiagramModel>,
    fail_next_persist: Option<String>,
    persisted: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a diagram, replacing any previous one with the same id.
    pub fn insert(&mut self, diagram: DiagramId, model: DiagramModel) {
        self.diagrams.insert(diagram, model);
    }

    /// Returns the stored copy of a diagram.
    pub fn diagram(&self, diagram: DiagramId) -> Option<&DiagramModel> {
        self.diagrams.get(&diagram)
    }

    /// Makes the next [`Persistence::persist`] call fail with `reason`.
    pub fn fail_next_persist(&mut self, reason: impl Into<String>) {
        self.fail_next_persist = Some(reason.into());
    }

    /// Number of commands persisted successfully.
    pub fn persisted_count(&self) -> usize {
        self.persisted
    }

    fn stored(&self, diagram: DiagramId) -> Result<&DiagramModel, StoreError> {
        self.diagrams
            .get(&diagram)
            .ok_or(StoreError::UnknownDiagram(diagram))
    }
}

impl DataSource for MemoryStore {
    fn load_variant(&self, diagram: DiagramId) -> Result<DiagramVariant, StoreError> {
        Ok(self.stored(diagram)?.variant())
    }

    fn load_shapes(&self, diagram: DiagramId) -> Result<Vec<Shape>, StoreError> {
        Ok(self.stored(diagram)?.shapes().cloned().collect())
    }

    fn load_connectors(&self, diagram: DiagramId) -> Result<Vec<Connector>, StoreError> {
        Ok(self.stored(diagram)?.connectors().cloned().collect())
    }
}

impl Persistence for MemoryStore {
    fn persist(&mut self, diagram: DiagramId, command: &Command) -> Result<(), StoreError> {
        if let Some(reason) = self.fail_next_persist.take() {
            warn!(diagram:% = diagram, reason; "Injected persistence failure");
            return Err(StoreError::Unavailable(reason));
        }
        let model = self
            .diagrams
            .get_mut(&diagram)
            .ok_or(StoreError::UnknownDiagram(diagram))?;
        command
            .apply(model)
            .map_err(|err| StoreError::Rejected(err.to_string()))?;
        self.persisted += 1;
        debug!(diagram:% = diagram, command = command.label(); "Persisted command");
        Ok(())
    }
}
