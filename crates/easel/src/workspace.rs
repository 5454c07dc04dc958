//! Workspace facade over open canvases.
//!
//! A [`Workspace`] loads diagrams from a backend, owns one [`Canvas`] per open
//! diagram and routes every command through the shared [`CommandManager`],
//! which keeps a separate undo history per diagram.

use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info, warn};

use easel_core::identifier::DiagramId;

use crate::{
    EaselError,
    canvas::Canvas,
    command::Command,
    config::EditorConfig,
    export,
    history::CommandManager,
    interaction::{InputEvent, Outcome},
    model::DiagramModel,
    scene::RenderScene,
    store::{DataSource, Persistence},
};

#[derive(Debug)]
pub struct Workspace<S> {
    store: S,
    manager: CommandManager,
    canvases: IndexMap<DiagramId, Canvas>,
    config: EditorConfig,
}

impl<S: DataSource + Persistence> Workspace<S> {
    pub fn new(store: S, config: EditorConfig) -> Self {
        let manager = CommandManager::new(config.history().limit());
        Self {
            store,
            manager,
            canvases: IndexMap::new(),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Loads `diagram` from the store and opens a canvas for it.
    ///
    /// Opening an already open diagram returns the existing canvas.
    /// Inconsistent data is kept and logged; it is left out of the scene.
    ///
    /// # Errors
    ///
    /// Returns [`EaselError::Store`] if the diagram cannot be loaded.
    pub fn open(&mut self, diagram: DiagramId) -> Result<&mut Canvas, EaselError> {
        if !self.canvases.contains_key(&diagram) {
            info!(diagram:% = diagram; "Opening diagram");
            let variant = self.store.load_variant(diagram)?;
            let shapes = self.store.load_shapes(diagram)?;
            let connectors = self.store.load_connectors(diagram)?;
            let model = DiagramModel::from_parts(variant, shapes, connectors);
            for issue in model.validate() {
                warn!(diagram:% = diagram, issue:% = issue; "Inconsistent diagram data");
            }
            debug!(
                diagram:% = diagram,
                shapes = model.shape_count(),
                connectors = model.connector_count();
                "Diagram loaded"
            );
            let canvas = Canvas::new(diagram, model, &self.config);
            self.canvases.insert(diagram, canvas);
        }
        self.canvas_mut(diagram)
    }

    /// Closes the canvas of `diagram` and drops its history.
    ///
    /// Returns false if the diagram was not open.
    pub fn close(&mut self, diagram: DiagramId) -> bool {
        self.manager.clear(diagram);
        let closed = self.canvases.shift_remove(&diagram).is_some();
        if closed {
            info!(diagram:% = diagram; "Closed diagram");
        }
        closed
    }

    /// Open diagrams in the order they were opened
    pub fn diagrams(&self) -> impl Iterator<Item = DiagramId> + '_ {
        self.canvases.keys().copied()
    }

    pub fn canvas(&self, diagram: DiagramId) -> Result<&Canvas, EaselError> {
        self.canvases
            .get(&diagram)
            .ok_or(EaselError::UnknownDiagram(diagram))
    }

    pub fn canvas_mut(&mut self, diagram: DiagramId) -> Result<&mut Canvas, EaselError> {
        self.canvases
            .get_mut(&diagram)
            .ok_or(EaselError::UnknownDiagram(diagram))
    }

    /// Delivers an input event to the canvas of `diagram` and executes the
    /// command it commits, if any.
    ///
    /// # Errors
    ///
    /// Returns [`EaselError::Command`] if the committed command fails; the
    /// model and history are unchanged in that case.
    pub fn dispatch(
        &mut self,
        diagram: DiagramId,
        event: &InputEvent,
    ) -> Result<Outcome, EaselError> {
        let outcome = self.canvas_mut(diagram)?.handle_event(event);
        if let Some(command) = &outcome.command {
            self.execute(diagram, command.clone())?;
        }
        Ok(outcome)
    }

    /// Executes `command` on `diagram` and records it for undo.
    pub fn execute(&mut self, diagram: DiagramId, command: Command) -> Result<(), EaselError> {
        let canvas = self
            .canvases
            .get_mut(&diagram)
            .ok_or(EaselError::UnknownDiagram(diagram))?;
        let result = self
            .manager
            .execute(diagram, canvas.model_mut(), command, &mut self.store);
        canvas.model_changed();
        Ok(result?)
    }

    /// Undoes the last command of `diagram`. Returns false if there was none.
    pub fn undo(&mut self, diagram: DiagramId) -> Result<bool, EaselError> {
        let canvas = self
            .canvases
            .get_mut(&diagram)
            .ok_or(EaselError::UnknownDiagram(diagram))?;
        let result = self
            .manager
            .undo(diagram, canvas.model_mut(), &mut self.store);
        canvas.model_changed();
        Ok(result?)
    }

    /// Redoes the last undone command of `diagram`. Returns false if there
    /// was none.
    pub fn redo(&mut self, diagram: DiagramId) -> Result<bool, EaselError> {
        let canvas = self
            .canvases
            .get_mut(&diagram)
            .ok_or(EaselError::UnknownDiagram(diagram))?;
        let result = self
            .manager
            .redo(diagram, canvas.model_mut(), &mut self.store);
        canvas.model_changed();
        Ok(result?)
    }

    pub fn can_undo(&self, diagram: DiagramId) -> bool {
        self.manager.can_undo(diagram)
    }

    pub fn can_redo(&self, diagram: DiagramId) -> bool {
        self.manager.can_redo(diagram)
    }

    pub fn undo_label(&self, diagram: DiagramId) -> Option<String> {
        self.manager.undo_label(diagram)
    }

    pub fn redo_label(&self, diagram: DiagramId) -> Option<String> {
        self.manager.redo_label(diagram)
    }

    pub fn scene(&self, diagram: DiagramId) -> Result<RenderScene, EaselError> {
        Ok(self.canvas(diagram)?.scene())
    }

    /// Renders the current scene of `diagram` to an SVG file.
    pub fn export_svg(&self, diagram: DiagramId, path: impl AsRef<Path>) -> Result<(), EaselError> {
        let scene = self.scene(diagram)?;
        let doc = export::svg::render_document(&scene);
        export::svg::write_document(&doc, path.as_ref())?;
        info!(diagram:% = diagram; "Diagram exported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use easel_core::{
        geometry::{Point, Size},
        identifier::ShapeId,
        kind::{DiagramVariant, ShapeKind},
    };

    use super::*;
    use crate::{
        command::CommandError,
        interaction::{Modifiers, PointerButton},
        model::Shape,
        store::MemoryStore,
    };

    fn workspace() -> (Workspace<MemoryStore>, DiagramId) {
        let diagram = DiagramId::new("d");
        let mut store = MemoryStore::new();
        store.insert(
            diagram,
            DiagramModel::from_parent_links(
                DiagramVariant::Bpmn,
                vec![Shape::new(
                    ShapeId::new("A"),
                    ShapeKind::Task,
                    Point::new(0.0, 0.0),
                    Size::new(100.0, 60.0),
                )],
                vec![],
            ),
        );
        (Workspace::new(store, EditorConfig::default()), diagram)
    }

    #[test]
    fn test_open_unknown_diagram_fails() {
        let (mut workspace, _) = workspace();
        let err = workspace.open(DiagramId::new("missing")).unwrap_err();
        assert!(matches!(err, EaselError::Store(_)));
        assert!(matches!(
            workspace.undo(DiagramId::new("missing")),
            Err(EaselError::UnknownDiagram(_))
        ));
    }

    #[test]
    fn test_dispatch_clears_selection_of_deleted_shape() {
        let (mut workspace, diagram) = workspace();
        workspace.open(diagram).unwrap();
        workspace
            .dispatch(
                diagram,
                &InputEvent::PointerDown {
                    position: Point::new(50.0, 20.0),
                    button: PointerButton::Primary,
                    modifiers: Modifiers::NONE,
                },
            )
            .unwrap();
        workspace
            .dispatch(
                diagram,
                &InputEvent::PointerUp {
                    position: Point::new(50.0, 20.0),
                    button: PointerButton::Primary,
                },
            )
            .unwrap();
        let selection_len = |workspace: &Workspace<MemoryStore>| {
            let canvas = workspace.canvas(diagram).unwrap();
            canvas.interaction().context().selection().len()
        };
        assert_eq!(selection_len(&workspace), 1);

        let model = workspace.canvas(diagram).unwrap().model();
        let delete = Command::delete_shape(model, ShapeId::new("A")).unwrap();
        workspace.execute(diagram, delete).unwrap();
        assert_eq!(selection_len(&workspace), 0);
        assert_eq!(workspace.undo_label(diagram).as_deref(), Some("Delete shape"));
    }

    #[test]
    fn test_failed_persist_keeps_model() {
        let (mut workspace, diagram) = workspace();
        workspace.open(diagram).unwrap();
        workspace.store_mut().fail_next_persist("offline");

        let model = workspace.canvas(diagram).unwrap().model().clone();
        let delete = Command::delete_shape(&model, ShapeId::new("A")).unwrap();
        let err = workspace.execute(diagram, delete).unwrap_err();
        assert!(matches!(err, EaselError::Command(CommandError::Persist { .. })));
        assert_eq!(workspace.canvas(diagram).unwrap().model(), &model);
        assert!(!workspace.can_undo(diagram));
    }

    #[test]
    fn test_close_drops_history() {
        let (mut workspace, diagram) = workspace();
        workspace.open(diagram).unwrap();
        let model = workspace.canvas(diagram).unwrap().model().clone();
        workspace
            .execute(diagram, Command::delete_shape(&model, ShapeId::new("A")).unwrap())
            .unwrap();
        assert!(workspace.close(diagram));
        assert!(!workspace.can_undo(diagram));
        assert!(!workspace.close(diagram));

        // The store kept the change.
        workspace.open(diagram).unwrap();
        assert_eq!(workspace.canvas(diagram).unwrap().model().shape_count(), 0);
    }
}
