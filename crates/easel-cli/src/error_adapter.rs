//! Error adapter for converting [`CliError`] to miette diagnostics.
//!
//! The library error types stay free of miette; this module attaches a
//! diagnostic code and, where a fix is obvious, a help message.

use std::fmt;

use miette::{Diagnostic, LabeledSpan};

use easel::EaselError;

use crate::{CliError, config::ConfigError, session::SessionError};

/// Adapter rendering a [`CliError`] through miette.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl Diagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            CliError::Config(_) => "easel::config",
            CliError::Session(_) => "easel::session",
            CliError::Easel(EaselError::Io(_)) => "easel::io",
            CliError::Easel(EaselError::Store(_)) => "easel::store",
            CliError::Easel(EaselError::Command(_)) => "easel::command",
            CliError::Easel(EaselError::UnknownDiagram(_)) => "easel::diagram",
            CliError::Easel(EaselError::Export(_)) => "easel::export",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.0 {
            CliError::Config(ConfigError::MissingFile(_)) => {
                "pass an existing file to --config or omit it to use the defaults"
            }
            CliError::Config(ConfigError::Parse(_)) => {
                "valid sections are [interaction], [viewport] and [history]"
            }
            CliError::Session(SessionError::UnknownConnectorType { .. }) => {
                "the connector type must be one of the tools of the session's variant"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use easel::{
        identifier::{ConnectorId, ConnectorTypeId},
        store::StoreError,
    };

    use super::*;

    fn code(err: &CliError) -> Option<String> {
        ErrorAdapter(err).code().map(|code| code.to_string())
    }

    #[test]
    fn test_codes() {
        let err = CliError::Config(ConfigError::Parse("bad".to_string()));
        assert_eq!(code(&err).as_deref(), Some("easel::config"));

        let err = CliError::Easel(EaselError::Store(StoreError::Rejected(
            "read only".to_string(),
        )));
        assert_eq!(code(&err).as_deref(), Some("easel::store"));
        assert_eq!(
            ErrorAdapter(&err).to_string(),
            "Store error: Backend rejected the change: read only"
        );
    }

    #[test]
    fn test_help_only_for_known_fixes() {
        let err = CliError::Session(SessionError::UnknownConnectorType {
            connector: ConnectorId::new("c"),
            connector_type: ConnectorTypeId::new("wire"),
        });
        assert!(ErrorAdapter(&err).help().is_some());

        let err = CliError::Session(SessionError::Parse("eof".to_string()));
        assert!(ErrorAdapter(&err).help().is_none());
    }
}
