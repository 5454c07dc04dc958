//! CLI logic for the Easel diagram canvas.
//!
//! The CLI replays a session file, a diagram plus scripted input events,
//! against a workspace and exports the resulting canvas as SVG.

pub mod error_adapter;
pub mod session;

mod args;
mod config;
mod error;

pub use args::Args;
pub use error::CliError;

use log::{info, trace, warn};

use easel::{Workspace, store::MemoryStore};

use session::{Session, Step};

/// Run the Easel CLI application
///
/// Loads the configuration and the session, replays every step through a
/// [`Workspace`] backed by an in-memory store, and writes the final canvas
/// to the output file.
///
/// # Errors
///
/// Returns [`CliError`] for:
/// - Configuration loading errors
/// - Session reading or model errors
/// - Commands rejected while replaying
/// - Export errors
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Replaying session"
    );

    let config = config::load_config(args.config.as_ref())?;
    let session = Session::load(&args.input)?;
    let diagram = session.diagram();

    let mut store = MemoryStore::new();
    store.insert(diagram, session.model()?);

    let mut workspace = Workspace::new(store, config);
    workspace.open(diagram)?;

    for (index, step) in session.steps().into_iter().enumerate() {
        trace!(index, step:?; "Replaying step");
        match step {
            Step::Input(event) => {
                workspace.dispatch(diagram, &event)?;
            }
            Step::Undo => {
                if !workspace.undo(diagram)? {
                    warn!(index; "Nothing to undo");
                }
            }
            Step::Redo => {
                if !workspace.redo(diagram)? {
                    warn!(index; "Nothing to redo");
                }
            }
            Step::Overlay { overlay, visible } => {
                workspace
                    .canvas_mut(diagram)?
                    .set_overlay_visible(overlay, visible);
            }
        }
    }

    workspace.export_svg(diagram, &args.output)?;

    info!(
        output_file = args.output,
        persisted = workspace.store().persisted_count();
        "SVG exported successfully"
    );

    Ok(())
}
