//! Interaction state machine.
//!
//! [`Interaction`] turns pointer and keyboard input into gesture state and,
//! when a gesture commits, into a [`Command`]. It never mutates the model:
//! commands are returned in an [`Outcome`] for the caller to execute through
//! the command manager.
//!
//! Gestures:
//!
//! - `Idle → DrawingConnector` on a press over a connection point; commits a
//!   connector on release over an acceptable point.
//! - `Idle → ResizingShape` on a press over a corner handle of a selected
//!   container.
//! - `Idle → DraggingSelection` on a press over a shape body; a release
//!   without travel is a click.
//! - `Idle → EditingLabel` on a double click over a shape or connector.
//!
//! A press while any gesture is active is ignored.

pub mod context;
pub mod gesture;
pub mod hit;

use std::{collections::HashSet, mem};

use log::{debug, trace};

use easel_core::{
    connection,
    geometry::Point,
    identifier::{ConnectorId, ConnectorTypeId, Id, PortRef, ShapeId},
    viewport::Viewport,
};

use crate::{
    catalog::{self, ConnectorCatalog},
    command::Command,
    config::InteractionConfig,
    model::DiagramModel,
};

use context::{ContextMenu, InteractionContext, Selectable};
use gesture::{
    DraggingSelection, DrawingConnector, EditingLabel, Gesture, LabelTarget, ResizingShape,
};
use hit::{HitRadii, HitTarget};

/// Pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Keyboard modifiers held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    /// Cmd on macOS.
    pub meta: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        meta: false,
        alt: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Self::NONE
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Self::NONE
    };
    pub const META: Modifiers = Modifiers {
        meta: true,
        ..Self::NONE
    };

    /// Shift, Ctrl or Cmd: click toggles selection membership.
    pub fn toggles_selection(self) -> bool {
        self.shift || self.ctrl || self.meta
    }

    /// Ctrl or Cmd: the wheel zooms instead of panning.
    pub fn zooms(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Keys the canvas reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Delete,
    Backspace,
}

/// Input delivered to a canvas. Positions are in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        position: Point,
        button: PointerButton,
        modifiers: Modifiers,
    },
    PointerMove {
        position: Point,
    },
    PointerUp {
        position: Point,
        button: PointerButton,
    },
    DoubleClick {
        position: Point,
    },
    Wheel {
        position: Point,
        delta: Point,
        modifiers: Modifiers,
    },
    KeyDown {
        key: Key,
        modifiers: Modifiers,
    },
    /// Replaces the text of the label being edited.
    TextInput(String),
    /// The label editor lost focus.
    Blur,
    /// An entry of the connector-type menu was chosen.
    MenuSelect(ConnectorTypeId),
}

/// Result of handling one event.
#[derive(Debug, Default, PartialEq)]
pub struct Outcome {
    /// Command to execute, if the event committed a change.
    pub command: Option<Command>,
    /// Whether the scene needs to be redrawn.
    pub redraw: bool,
}

impl Outcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn redraw() -> Self {
        Self {
            command: None,
            redraw: true,
        }
    }

    pub fn command(command: Command) -> Self {
        Self {
            command: Some(command),
            redraw: true,
        }
    }

    fn with_optional(command: Option<Command>) -> Self {
        Self {
            command,
            redraw: true,
        }
    }
}

/// Read-only view of the canvas an event is interpreted against.
pub struct Env<'a> {
    pub model: &'a DiagramModel,
    pub catalog: &'a dyn ConnectorCatalog,
    pub viewport: &'a Viewport,
}

/// Gesture state machine plus the interaction context of one canvas.
#[derive(Debug, Default)]
pub struct Interaction {
    gesture: Gesture,
    context: InteractionContext,
    config: InteractionConfig,
    next_connector: usize,
}

impl Interaction {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn context(&self) -> &InteractionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut InteractionContext {
        &mut self.context
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Returns the connector being drawn, if any.
    pub fn drawing(&self) -> Option<&DrawingConnector> {
        match &self.gesture {
            Gesture::DrawingConnector(drawing) => Some(drawing),
            _ => None,
        }
    }

    /// Handles one input event. Wheel events are handled by the canvas.
    pub fn handle(&mut self, event: &InputEvent, env: &Env) -> Outcome {
        trace!(gesture = self.gesture.name(), event:? = event; "Handling event");
        match event {
            InputEvent::PointerDown {
                position,
                button,
                modifiers,
            } => self.on_pointer_down(*position, *button, *modifiers, env),
            InputEvent::PointerMove { position } => self.on_pointer_move(*position, env),
            InputEvent::PointerUp { position, .. } => self.on_pointer_up(*position, env),
            InputEvent::DoubleClick { position } => self.on_double_click(*position, env),
            InputEvent::KeyDown { key, .. } => self.on_key_down(*key, env),
            InputEvent::TextInput(text) => self.on_text_input(text),
            InputEvent::Blur => self.on_blur(env),
            InputEvent::MenuSelect(connector_type) => self.on_menu_select(*connector_type, env),
            InputEvent::Wheel { .. } => Outcome::none(),
        }
    }

    fn radii(&self, viewport: &Viewport) -> HitRadii {
        HitRadii {
            point: viewport.canvas_length(self.config.connection_point_radius()),
            handle: viewport.canvas_length(self.config.resize_handle_radius()),
            connector: viewport.canvas_length(self.config.connector_hit_tolerance()),
        }
    }

    fn on_pointer_down(
        &mut self,
        screen: Point,
        button: PointerButton,
        modifiers: Modifiers,
        env: &Env,
    ) -> Outcome {
        if !self.gesture.is_idle() {
            debug!(gesture = self.gesture.name(); "Pointer down ignored during active gesture");
            return Outcome::none();
        }

        let point = env.viewport.screen_to_canvas(screen);
        let target = hit::hit_test(env.model, &self.context, point, self.radii(env.viewport));

        match button {
            PointerButton::Secondary => return self.open_context_menu(target, point, env),
            PointerButton::Middle => return Outcome::none(),
            PointerButton::Primary => {}
        }
        let menu_closed = self.context.close_menu().is_some();

        match target {
            HitTarget::ResizeHandle { shape, corner } => {
                let Some(bounds) = env.model.shape(shape).map(|shape| shape.bounds()) else {
                    return Outcome::none();
                };
                debug!(shape:% = shape, corner:? = corner; "Start resizing");
                self.gesture = Gesture::ResizingShape(ResizingShape {
                    shape,
                    corner,
                    original: bounds,
                    preview: bounds,
                });
                Outcome::redraw()
            }
            HitTarget::ConnectionPoint { port, point: resolved } => {
                debug!(from:% = port; "Start drawing connector");
                self.gesture = Gesture::DrawingConnector(DrawingConnector {
                    from: port,
                    source_position: resolved.position,
                    source_direction: resolved.direction,
                    current: point,
                    connector_type: env.catalog.default_tool().id(),
                    target: None,
                    target_position: None,
                    target_direction: resolved.direction.opposite(),
                });
                Outcome::redraw()
            }
            HitTarget::Shape(shape) => {
                self.gesture = Gesture::DraggingSelection(DraggingSelection {
                    pressed: shape,
                    modifiers,
                    screen_origin: screen,
                    origin: point,
                    current: point,
                    active: false,
                    moving: Vec::new(),
                });
                Outcome {
                    command: None,
                    redraw: menu_closed,
                }
            }
            HitTarget::Connector(connector) => {
                self.context.click(Selectable::Connector(connector), modifiers);
                Outcome::redraw()
            }
            HitTarget::Empty => {
                if !modifiers.toggles_selection() {
                    self.context.clear_selection();
                }
                Outcome::redraw()
            }
        }
    }

    fn open_context_menu(&mut self, target: HitTarget, point: Point, env: &Env) -> Outcome {
        let HitTarget::Connector(connector) = target else {
            return Outcome {
                command: None,
                redraw: self.context.close_menu().is_some(),
            };
        };
        match ContextMenu::for_connector(env.catalog, env.model, connector, point) {
            Some(menu) => {
                debug!(connector:% = connector; "Opening connector type menu");
                self.context.open_menu(menu);
                Outcome::redraw()
            }
            None => Outcome::none(),
        }
    }

    fn on_pointer_move(&mut self, screen: Point, env: &Env) -> Outcome {
        let point = env.viewport.screen_to_canvas(screen);
        let radii = self.radii(env.viewport);
        let hover = hit::hit_test(env.model, &self.context, point, radii).selectable();
        let hover_changed = self.context.set_hover(hover);

        let gesture_changed = match &mut self.gesture {
            Gesture::DrawingConnector(drawing) => {
                drawing.current = point;
                let hidden = self.context.hidden_overlays();
                let candidate = hit::connection_point_at(env.model, hidden, point, radii.point)
                    .filter(|(port, _)| accepts_target(drawing.from, *port, env.catalog));
                match candidate {
                    Some((port, resolved)) => {
                        drawing.target = Some(port);
                        drawing.target_position = Some(resolved.position);
                        drawing.target_direction = resolved.direction;
                    }
                    None => {
                        drawing.target = None;
                        drawing.target_position = None;
                        drawing.target_direction =
                            connection::infer_direction(point, drawing.source_position);
                    }
                }
                true
            }
            Gesture::ResizingShape(resize) => {
                resize.preview = gesture::resized_bounds(
                    resize.original,
                    resize.corner,
                    point,
                    self.config.min_shape_size(),
                );
                true
            }
            Gesture::DraggingSelection(drag) => {
                drag.current = point;
                if !drag.active
                    && screen.distance(drag.screen_origin) > self.config.drag_threshold()
                {
                    drag.active = true;
                    let pressed = Selectable::Shape(drag.pressed);
                    if !self.context.is_selected(pressed) {
                        if drag.modifiers.toggles_selection() {
                            self.context.add_to_selection(pressed);
                        } else {
                            self.context.select_only(pressed);
                        }
                    }
                    drag.moving = moving_shapes(env.model, &self.context.selected_shapes());
                    debug!(count = drag.moving.len(); "Start dragging selection");
                }
                drag.active
            }
            Gesture::Idle | Gesture::EditingLabel(_) => false,
        };

        Outcome {
            command: None,
            redraw: hover_changed || gesture_changed,
        }
    }

    fn on_pointer_up(&mut self, screen: Point, env: &Env) -> Outcome {
        let point = env.viewport.screen_to_canvas(screen);
        match mem::take(&mut self.gesture) {
            Gesture::DrawingConnector(drawing) => {
                let radius = self.radii(env.viewport).point;
                let target = hit::connection_point_at(
                    env.model,
                    self.context.hidden_overlays(),
                    point,
                    radius,
                )
                .map(|(port, _)| port)
                .filter(|port| accepts_target(drawing.from, *port, env.catalog));
                let Some(target) = target else {
                    debug!(from:% = drawing.from; "Connector aborted, no acceptable target");
                    return Outcome::redraw();
                };
                Outcome::command(self.create_connector(&drawing, target, env))
            }
            Gesture::ResizingShape(resize) => {
                let command = env.model.shape(resize.shape).and_then(|before| {
                    let mut after = before.clone();
                    after.set_bounds(resize.preview);
                    Command::update_shape(before.clone(), after)
                });
                Outcome::with_optional(command)
            }
            Gesture::DraggingSelection(drag) if !drag.active => {
                self.context
                    .click(Selectable::Shape(drag.pressed), drag.modifiers);
                Outcome::redraw()
            }
            Gesture::DraggingSelection(drag) => {
                Outcome::with_optional(move_command(env.model, &drag))
            }
            gesture @ (Gesture::Idle | Gesture::EditingLabel(_)) => {
                self.gesture = gesture;
                Outcome::none()
            }
        }
    }

    fn on_double_click(&mut self, screen: Point, env: &Env) -> Outcome {
        if !self.gesture.is_idle() {
            return Outcome::none();
        }
        let point = env.viewport.screen_to_canvas(screen);
        let target = hit::hit_test(env.model, &self.context, point, self.radii(env.viewport));
        let (target, original) = match target {
            HitTarget::Shape(id) | HitTarget::ResizeHandle { shape: id, .. } => {
                let Some(shape) = env.model.shape(id) else {
                    return Outcome::none();
                };
                (LabelTarget::Shape(id), shape.label().map(str::to_string))
            }
            HitTarget::Connector(id) => {
                let Some(connector) = env.model.connector(id) else {
                    return Outcome::none();
                };
                (LabelTarget::Connector(id), connector.label().map(str::to_string))
            }
            HitTarget::ConnectionPoint { .. } | HitTarget::Empty => return Outcome::none(),
        };
        debug!(target:? = target; "Start editing label");
        self.gesture = Gesture::EditingLabel(EditingLabel {
            target,
            buffer: original.clone().unwrap_or_default(),
            original,
        });
        Outcome::redraw()
    }

    fn on_key_down(&mut self, key: Key, env: &Env) -> Outcome {
        match (key, &self.gesture) {
            (Key::Escape, Gesture::EditingLabel(_)) => {
                if self.config.escape_commits_label() {
                    self.commit_label(env)
                } else {
                    self.gesture = Gesture::Idle;
                    Outcome::redraw()
                }
            }
            (Key::Enter, Gesture::EditingLabel(_)) => self.commit_label(env),
            (_, Gesture::EditingLabel(_)) => Outcome::none(),
            (Key::Escape, Gesture::Idle) => Outcome {
                command: None,
                redraw: self.context.close_menu().is_some(),
            },
            (Key::Escape, gesture) => {
                debug!(gesture = gesture.name(); "Gesture cancelled");
                self.gesture = Gesture::Idle;
                Outcome::redraw()
            }
            (Key::Delete | Key::Backspace, Gesture::Idle) => {
                Outcome::with_optional(delete_selection(env.model, &self.context))
            }
            _ => Outcome::none(),
        }
    }

    fn on_text_input(&mut self, text: &str) -> Outcome {
        match &mut self.gesture {
            Gesture::EditingLabel(edit) => {
                edit.buffer = text.to_string();
                Outcome::redraw()
            }
            _ => Outcome::none(),
        }
    }

    fn on_blur(&mut self, env: &Env) -> Outcome {
        if matches!(self.gesture, Gesture::EditingLabel(_)) {
            self.commit_label(env)
        } else {
            Outcome::none()
        }
    }

    fn on_menu_select(&mut self, connector_type: ConnectorTypeId, env: &Env) -> Outcome {
        let Some(menu) = self.context.close_menu() else {
            return Outcome::none();
        };
        Outcome::with_optional(catalog::change_connector_type(
            env.catalog,
            env.model,
            menu.connector(),
            connector_type,
        ))
    }

    fn commit_label(&mut self, env: &Env) -> Outcome {
        let Gesture::EditingLabel(edit) = mem::take(&mut self.gesture) else {
            return Outcome::none();
        };
        if !edit.is_changed() {
            return Outcome::redraw();
        }
        let label = edit.committed_label();
        let command = match edit.target {
            LabelTarget::Shape(id) => env.model.shape(id).and_then(|before| {
                let mut after = before.clone();
                after.set_label(label);
                Command::update_shape(before.clone(), after)
            }),
            LabelTarget::Connector(id) => env.model.connector(id).and_then(|before| {
                let mut after = before.clone();
                after.set_label(label);
                Command::update_connector(before.clone(), after)
            }),
        };
        Outcome::with_optional(command)
    }

    fn create_connector(
        &mut self,
        drawing: &DrawingConnector,
        target: PortRef,
        env: &Env,
    ) -> Command {
        let tool = env
            .catalog
            .tool(drawing.connector_type)
            .unwrap_or_else(|| env.catalog.default_tool());
        let id = self.next_connector_id(env.model);
        let z_index = env.model.max_z_index().map_or(0, |z| z.saturating_add(1));
        let connector = tool
            .build(id, drawing.from.shape(), target.shape())
            .with_points(drawing.from.point(), target.point())
            .with_z_index(z_index);
        debug!(connector:% = id, from:% = drawing.from, to:% = target; "Connector committed");
        Command::create_connector(env.model, connector)
    }

    fn next_connector_id(&mut self, model: &DiagramModel) -> ConnectorId {
        loop {
            let id = ConnectorId::from(Id::from_anonymous(self.next_connector));
            self.next_connector += 1;
            if model.connector(id).is_none() {
                return id;
            }
        }
    }
}

/// A target is acceptable unless it is the source point itself, or on the
/// source shape in a variant that forbids self connections.
fn accepts_target(from: PortRef, target: PortRef, catalog: &dyn ConnectorCatalog) -> bool {
    target != from && (target.shape() != from.shape() || catalog.allows_self_connection())
}

/// Returns the selected shapes plus their descendants, without duplicates.
fn moving_shapes(model: &DiagramModel, selected: &[ShapeId]) -> Vec<ShapeId> {
    let mut seen = HashSet::new();
    let mut moving = Vec::new();
    for id in selected {
        if !model.contains_shape(*id) {
            continue;
        }
        for shape in std::iter::once(*id).chain(model.descendants(*id)) {
            if seen.insert(shape) {
                moving.push(shape);
            }
        }
    }
    moving
}

fn move_command(model: &DiagramModel, drag: &DraggingSelection) -> Option<Command> {
    let offset = drag.offset();
    if offset.is_zero() {
        return None;
    }
    let commands: Vec<Command> = drag
        .moving
        .iter()
        .filter_map(|id| {
            let before = model.shape(*id)?;
            let mut after = before.clone();
            after.set_bounds(before.bounds().translate(offset));
            Command::update_shape(before.clone(), after)
        })
        .collect();
    (!commands.is_empty()).then(|| Command::batch("Move selection", commands))
}

/// Builds one batch deleting the selection: connectors attached to any
/// removed shape first, then shapes deepest first.
fn delete_selection(model: &DiagramModel, context: &InteractionContext) -> Option<Command> {
    let mut shapes: Vec<ShapeId> = Vec::new();
    let mut seen = HashSet::new();
    for id in context.selected_shapes() {
        if !model.contains_shape(id) {
            continue;
        }
        for shape in std::iter::once(id).chain(model.descendants(id)) {
            if seen.insert(shape) {
                shapes.push(shape);
            }
        }
    }
    // Stable sort keeps selection order among shapes of equal depth.
    shapes.sort_by_key(|id| std::cmp::Reverse(model.depth(*id)));

    let mut connectors: Vec<ConnectorId> = context
        .selected_connectors()
        .into_iter()
        .filter(|id| model.connector(*id).is_some())
        .collect();
    for connector in model.connectors_touching(&seen) {
        if !connectors.contains(&connector.id()) {
            connectors.push(connector.id());
        }
    }
    if shapes.is_empty() && connectors.is_empty() {
        return None;
    }

    let mut scratch = model.clone();
    let mut commands = Vec::with_capacity(shapes.len() + connectors.len());
    for id in connectors {
        let Some(command) = Command::delete_connector(&scratch, id) else {
            continue;
        };
        if let Err(err) = command.apply(&mut scratch) {
            debug!(connector:% = id, err:% = err; "Cannot delete connector");
            return None;
        }
        commands.push(command);
    }
    for id in shapes {
        let Some(command) = Command::delete_shape(&scratch, id) else {
            continue;
        };
        if let Err(err) = command.apply(&mut scratch) {
            debug!(shape:% = id, err:% = err; "Cannot delete shape");
            return None;
        }
        commands.push(command);
    }
    debug!(count = commands.len(); "Deleting selection");
    Some(Command::batch("Delete selection", commands))
}
