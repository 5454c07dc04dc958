//! A single open diagram.
//!
//! [`Canvas`] owns the model of one diagram together with its connector
//! catalog, viewport and interaction state. Input is interpreted here; the
//! resulting commands are executed by the [`Workspace`](crate::Workspace),
//! which owns the command history and the persistence backend.

use std::fmt;

use log::{debug, trace};

use easel_core::{
    geometry::Point,
    identifier::{DiagramId, OverlayTag},
    viewport::Viewport,
};

use crate::{
    catalog::{self, ConnectorCatalog},
    config::{EditorConfig, ViewportConfig},
    interaction::{Env, InputEvent, Interaction, Modifiers, Outcome},
    model::DiagramModel,
    scene::{self, RenderScene},
};

pub struct Canvas {
    diagram: DiagramId,
    model: DiagramModel,
    catalog: Box<dyn ConnectorCatalog>,
    viewport: Viewport,
    interaction: Interaction,
    viewport_config: ViewportConfig,
}

impl Canvas {
    /// Creates a canvas for `model`, choosing the catalog of its variant.
    pub fn new(diagram: DiagramId, model: DiagramModel, config: &EditorConfig) -> Self {
        let catalog = catalog::catalog_for(model.variant());
        Self {
            diagram,
            model,
            catalog,
            viewport: Viewport::default(),
            interaction: Interaction::new(config.interaction().clone()),
            viewport_config: config.viewport().clone(),
        }
    }

    pub fn diagram(&self) -> DiagramId {
        self.diagram
    }

    pub fn model(&self) -> &DiagramModel {
        &self.model
    }

    pub fn catalog(&self) -> &dyn ConnectorCatalog {
        self.catalog.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Replaces the viewport, clamping its zoom into the configured range.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        let zoom = self.viewport_config.clamp_zoom(viewport.zoom());
        self.viewport = Viewport::new(zoom, viewport.pan()).unwrap_or(viewport);
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Shows or hides every shape tagged with `overlay`.
    ///
    /// Hidden shapes are dropped from the selection.
    pub fn set_overlay_visible(&mut self, overlay: OverlayTag, visible: bool) {
        debug!(overlay:% = overlay, visible; "Overlay visibility changed");
        let context = self.interaction.context_mut();
        context.set_overlay_visible(overlay, visible);
        context.retain_existing(&self.model);
    }

    /// Interprets one input event.
    ///
    /// Viewport input is applied directly. Any command in the returned
    /// [`Outcome`] has not been executed yet.
    pub fn handle_event(&mut self, event: &InputEvent) -> Outcome {
        if let InputEvent::Wheel {
            position,
            delta,
            modifiers,
        } = event
        {
            return self.on_wheel(*position, *delta, *modifiers);
        }

        let env = Env {
            model: &self.model,
            catalog: self.catalog.as_ref(),
            viewport: &self.viewport,
        };
        self.interaction.handle(event, &env)
    }

    /// Builds the render scene, including any gesture preview.
    pub fn scene(&self) -> RenderScene {
        scene::build_scene(&self.model, &self.interaction, self.catalog.as_ref())
    }

    pub(crate) fn model_mut(&mut self) -> &mut DiagramModel {
        &mut self.model
    }

    /// Drops interaction references to elements removed by a model change.
    pub(crate) fn model_changed(&mut self) {
        self.interaction.context_mut().retain_existing(&self.model);
    }

    fn on_wheel(&mut self, position: Point, delta: Point, modifiers: Modifiers) -> Outcome {
        if !modifiers.zooms() {
            if delta.is_zero() {
                return Outcome::none();
            }
            self.viewport.pan_by(delta.scale(-1.0));
            trace!(pan:? = self.viewport.pan(); "Viewport panned");
            return Outcome::redraw();
        }

        // Scrolling up zooms in, one configured step per event.
        let step = self.viewport_config.zoom_step();
        let factor = if delta.y() < 0.0 {
            step
        } else if delta.y() > 0.0 {
            1.0 / step
        } else {
            return Outcome::none();
        };
        let zoom = self
            .viewport_config
            .clamp_zoom(self.viewport.zoom() * factor);
        if zoom == self.viewport.zoom() {
            return Outcome::none();
        }
        match self.viewport.zoom_at(position, zoom) {
            Ok(()) => {
                trace!(zoom; "Viewport zoomed");
                Outcome::redraw()
            }
            Err(err) => {
                debug!(err:% = err; "Zoom rejected");
                Outcome::none()
            }
        }
    }
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("diagram", &self.diagram)
            .field("variant", &self.catalog.variant())
            .field("viewport", &self.viewport)
            .field("gesture", &self.interaction.gesture().name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use easel_core::kind::DiagramVariant;

    use super::*;

    fn canvas() -> Canvas {
        Canvas::new(
            DiagramId::new("d"),
            DiagramModel::new(DiagramVariant::Bpmn),
            &EditorConfig::default(),
        )
    }

    fn wheel(canvas: &mut Canvas, dy: f32, modifiers: Modifiers) -> Outcome {
        canvas.handle_event(&InputEvent::Wheel {
            position: Point::new(100.0, 100.0),
            delta: Point::new(0.0, dy),
            modifiers,
        })
    }

    #[test]
    fn test_wheel_pans() {
        let mut canvas = canvas();
        let outcome = wheel(&mut canvas, 30.0, Modifiers::NONE);
        assert!(outcome.redraw);
        assert_eq!(canvas.viewport().pan(), Point::new(0.0, -30.0));
        assert_approx_eq!(f32, canvas.viewport().zoom(), 1.0);
    }

    #[test]
    fn test_ctrl_wheel_zooms_about_pointer() {
        let mut canvas = canvas();
        let anchor = canvas.viewport().screen_to_canvas(Point::new(100.0, 100.0));
        wheel(&mut canvas, -1.0, Modifiers::CTRL);
        assert_approx_eq!(f32, canvas.viewport().zoom(), 1.1);

        let after = canvas.viewport().screen_to_canvas(Point::new(100.0, 100.0));
        assert_approx_eq!(f32, after.x(), anchor.x(), epsilon = 1e-3);
        assert_approx_eq!(f32, after.y(), anchor.y(), epsilon = 1e-3);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut canvas = canvas();
        for _ in 0..100 {
            wheel(&mut canvas, 1.0, Modifiers::META);
        }
        assert_approx_eq!(f32, canvas.viewport().zoom(), 0.1);
        let outcome = wheel(&mut canvas, 1.0, Modifiers::META);
        assert!(!outcome.redraw);
    }
}
