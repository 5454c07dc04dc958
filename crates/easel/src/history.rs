//! Undo/redo history and the command manager.
//!
//! [`CommandManager`] is the only path through which the canvas mutates a
//! model: it applies a [`Command`], persists it, and records it in the
//! diagram's [`CommandHistory`]. Histories are kept per [`DiagramId`], so
//! undo in one diagram never touches another.

use std::collections::{HashMap, VecDeque};

use log::{debug, error, info, warn};

use easel_core::identifier::DiagramId;

use crate::{
    command::{Command, CommandError},
    model::DiagramModel,
    store::Persistence,
};

/// Default maximum number of undo entries per diagram.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Undo and redo stacks of one diagram.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    undo: VecDeque<Command>,
    redo: Vec<Command>,
    limit: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl CommandHistory {
    /// Creates an empty history keeping at most `limit` undo entries.
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Records an executed command; clears the redo stack.
    pub fn push(&mut self, command: Command) {
        self.undo.push_back(command);
        if self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Label of the command the next undo reverts
    pub fn undo_label(&self) -> Option<String> {
        self.undo.back().map(Command::label)
    }

    /// Label of the command the next redo reapplies
    pub fn redo_label(&self) -> Option<String> {
        self.redo.last().map(Command::label)
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

/// Executes commands against models and keeps one history per diagram.
#[derive(Debug, Default)]
pub struct CommandManager {
    histories: HashMap<DiagramId, CommandHistory>,
    limit: usize,
}

impl CommandManager {
    /// Creates a manager whose histories keep at most `limit` undo entries.
    pub fn new(limit: usize) -> Self {
        Self {
            histories: HashMap::new(),
            limit,
        }
    }

    /// Returns the history of a diagram, if any command was executed in it.
    pub fn history(&self, diagram: DiagramId) -> Option<&CommandHistory> {
        self.histories.get(&diagram)
    }

    fn history_mut(&mut self, diagram: DiagramId) -> &mut CommandHistory {
        let limit = if self.limit == 0 {
            DEFAULT_HISTORY_LIMIT
        } else {
            self.limit
        };
        self.histories
            .entry(diagram)
            .or_insert_with(|| CommandHistory::new(limit))
    }

    /// Applies `command`, persists it and records it for undo.
    ///
    /// # Errors
    ///
    /// Returns the apply error if the command does not fit the model, or
    /// [`CommandError::Persist`] if the backend rejects it. In both cases the
    /// model and the history are left as they were.
    pub fn execute(
        &mut self,
        diagram: DiagramId,
        model: &mut DiagramModel,
        command: Command,
        store: &mut dyn Persistence,
    ) -> Result<(), CommandError> {
        command.apply(model)?;
        if let Err(source) = store.persist(diagram, &command) {
            warn!(
                diagram:% = diagram,
                command = command.label(),
                err:% = source;
                "Persist failed, reverting"
            );
            revert(model, &command.inverse());
            return Err(CommandError::Persist { diagram, source });
        }
        info!(diagram:% = diagram, command = command.label(); "Executed command");
        self.history_mut(diagram).push(command);
        Ok(())
    }

    /// Reverts the most recent command of `diagram`.
    ///
    /// Returns `Ok(false)` if there is nothing to undo.
    ///
    /// # Errors
    ///
    /// On failure the model and both stacks are left unchanged.
    pub fn undo(
        &mut self,
        diagram: DiagramId,
        model: &mut DiagramModel,
        store: &mut dyn Persistence,
    ) -> Result<bool, CommandError> {
        let history = self.history_mut(diagram);
        let Some(command) = history.undo.pop_back() else {
            debug!(diagram:% = diagram; "Nothing to undo");
            return Ok(false);
        };

        match apply_and_persist(diagram, model, &command.inverse(), store) {
            Ok(()) => {
                info!(diagram:% = diagram, command = command.label(); "Undid command");
                history.redo.push(command);
                Ok(true)
            }
            Err(err) => {
                history.undo.push_back(command);
                Err(err)
            }
        }
    }

    /// Reapplies the most recently undone command of `diagram`.
    ///
    /// Returns `Ok(false)` if there is nothing to redo.
    ///
    /// # Errors
    ///
    /// On failure the model and both stacks are left unchanged.
    pub fn redo(
        &mut self,
        diagram: DiagramId,
        model: &mut DiagramModel,
        store: &mut dyn Persistence,
    ) -> Result<bool, CommandError> {
        let history = self.history_mut(diagram);
        let Some(command) = history.redo.pop() else {
            debug!(diagram:% = diagram; "Nothing to redo");
            return Ok(false);
        };

        match apply_and_persist(diagram, model, &command, store) {
            Ok(()) => {
                info!(diagram:% = diagram, command = command.label(); "Redid command");
                history.undo.push_back(command);
                Ok(true)
            }
            Err(err) => {
                history.redo.push(command);
                Err(err)
            }
        }
    }

    pub fn can_undo(&self, diagram: DiagramId) -> bool {
        self.history(diagram).is_some_and(CommandHistory::can_undo)
    }

    pub fn can_redo(&self, diagram: DiagramId) -> bool {
        self.history(diagram).is_some_and(CommandHistory::can_redo)
    }

    pub fn undo_label(&self, diagram: DiagramId) -> Option<String> {
        self.history(diagram)?.undo_label()
    }

    pub fn redo_label(&self, diagram: DiagramId) -> Option<String> {
        self.history(diagram)?.redo_label()
    }

    /// Drops the history of `diagram`.
    pub fn clear(&mut self, diagram: DiagramId) {
        self.histories.remove(&diagram);
    }
}

fn apply_and_persist(
    diagram: DiagramId,
    model: &mut DiagramModel,
    command: &Command,
    store: &mut dyn Persistence,
) -> Result<(), CommandError> {
    command.apply(model)?;
    if let Err(source) = store.persist(diagram, command) {
        warn!(
            diagram:% = diagram,
            command = command.label(),
            err:% = source;
            "Persist failed, reverting"
        );
        revert(model, &command.inverse());
        return Err(CommandError::Persist { diagram, source });
    }
    Ok(())
}

fn revert(model: &mut DiagramModel, inverse: &Command) {
    if let Err(err) = inverse.apply(model) {
        error!(command = inverse.label(), err:% = err; "Failed to revert command");
    }
}
