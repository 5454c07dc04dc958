//! Error types for Easel operations.
//!
//! [`EaselError`] is returned at the library boundary and wraps the errors
//! of the individual layers.

use std::io;

use thiserror::Error;

use easel_core::identifier::DiagramId;

use crate::{command::CommandError, export, store::StoreError};

/// The main error type for Easel operations.
#[derive(Debug, Error)]
pub enum EaselError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Diagram `{0}` is not open")]
    UnknownDiagram(DiagramId),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error>),
}

impl From<export::Error> for EaselError {
    fn from(error: export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}
