//! Per-canvas interaction context: selection, hover, context menu and
//! overlay visibility.

use std::collections::HashSet;

use indexmap::IndexSet;

use easel_core::{
    geometry::Point,
    identifier::{ConnectorId, ConnectorTypeId, OverlayTag, ShapeId},
};

use crate::{catalog::ConnectorCatalog, interaction::Modifiers, model::DiagramModel};

/// Something the user can select or hover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selectable {
    Shape(ShapeId),
    Connector(ConnectorId),
}

/// One entry of the connector-type menu.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub connector_type: ConnectorTypeId,
    pub label: &'static str,
    /// True for the connector's current type.
    pub current: bool,
}

/// Connector-type menu opened by a right-click on a connector.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    connector: ConnectorId,
    position: Point,
    entries: Vec<MenuEntry>,
}

impl ContextMenu {
    /// Lists the catalog tools for `connector`, marking its current type.
    pub fn for_connector(
        catalog: &dyn ConnectorCatalog,
        model: &DiagramModel,
        connector: ConnectorId,
        position: Point,
    ) -> Option<Self> {
        let current = model.connector(connector)?.connector_type();
        let entries = catalog
            .tools()
            .iter()
            .map(|tool| MenuEntry {
                connector_type: tool.id(),
                label: tool.label(),
                current: tool.id() == current,
            })
            .collect();
        Some(Self {
            connector,
            position,
            entries,
        })
    }

    pub fn connector(&self) -> ConnectorId {
        self.connector
    }

    /// Canvas position the menu was opened at
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }
}

/// Interaction state that outlives a single gesture.
#[derive(Debug, Clone, Default)]
pub struct InteractionContext {
    selection: IndexSet<Selectable>,
    hover: Option<Selectable>,
    context_menu: Option<ContextMenu>,
    hidden_overlays: HashSet<OverlayTag>,
}

impl InteractionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the selection in the order items were selected
    pub fn selection(&self) -> &IndexSet<Selectable> {
        &self.selection
    }

    pub fn is_selected(&self, item: Selectable) -> bool {
        self.selection.contains(&item)
    }

    pub fn selected_shapes(&self) -> Vec<ShapeId> {
        self.selection
            .iter()
            .filter_map(|item| match item {
                Selectable::Shape(id) => Some(*id),
                Selectable::Connector(_) => None,
            })
            .collect()
    }

    pub fn selected_connectors(&self) -> Vec<ConnectorId> {
        self.selection
            .iter()
            .filter_map(|item| match item {
                Selectable::Connector(id) => Some(*id),
                Selectable::Shape(_) => None,
            })
            .collect()
    }

    /// Applies a click on `item`.
    ///
    /// With Shift/Ctrl/Cmd the item's membership is toggled. Without, the
    /// item becomes the only selected item, or the selection is cleared if it
    /// already was.
    pub fn click(&mut self, item: Selectable, modifiers: Modifiers) {
        if modifiers.toggles_selection() {
            if !self.selection.shift_remove(&item) {
                self.selection.insert(item);
            }
        } else if self.selection.len() == 1 && self.selection.contains(&item) {
            self.selection.clear();
        } else {
            self.select_only(item);
        }
    }

    pub fn select_only(&mut self, item: Selectable) {
        self.selection.clear();
        self.selection.insert(item);
    }

    pub fn add_to_selection(&mut self, item: Selectable) {
        self.selection.insert(item);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn hover(&self) -> Option<Selectable> {
        self.hover
    }

    /// Returns true if the hover target changed.
    pub fn set_hover(&mut self, hover: Option<Selectable>) -> bool {
        let changed = self.hover != hover;
        self.hover = hover;
        changed
    }

    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.context_menu.as_ref()
    }

    pub fn open_menu(&mut self, menu: ContextMenu) {
        self.context_menu = Some(menu);
    }

    /// Closes the context menu, returning it if one was open.
    pub fn close_menu(&mut self) -> Option<ContextMenu> {
        self.context_menu.take()
    }

    pub fn hidden_overlays(&self) -> &HashSet<OverlayTag> {
        &self.hidden_overlays
    }

    pub fn set_overlay_visible(&mut self, overlay: OverlayTag, visible: bool) {
        if visible {
            self.hidden_overlays.remove(&overlay);
        } else {
            self.hidden_overlays.insert(overlay);
        }
    }

    /// Drops references to shapes and connectors no longer in `model`, and
    /// deselects shapes that are hidden.
    pub fn retain_existing(&mut self, model: &DiagramModel) {
        let hidden = &self.hidden_overlays;
        let exists = |item: &Selectable| match item {
            Selectable::Shape(id) => model.shape(*id).is_some_and(|shape| {
                shape
                    .overlay()
                    .is_none_or(|overlay| !hidden.contains(&overlay))
            }),
            Selectable::Connector(id) => model.connector(*id).is_some(),
        };
        self.selection.retain(|item| exists(item));
        if self.hover.is_some_and(|item| !exists(&item)) {
            self.hover = None;
        }
        if self
            .context_menu
            .as_ref()
            .is_some_and(|menu| model.connector(menu.connector).is_none())
        {
            self.context_menu = None;
        }
    }
}
