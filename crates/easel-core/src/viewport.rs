//! Screen ↔ canvas coordinate conversion.
//!
//! A [`Viewport`] is a uniform scale followed by a translation:
//!
//! ```text
//! canvas = (screen - pan) / zoom
//! screen = canvas * zoom + pan
//! ```
//!
//! The zoom factor must be strictly positive and finite, which keeps the
//! transform invertible. Invalid zoom values are rejected with
//! [`ViewportError::InvalidZoom`]; clamping to a usable range is the caller's
//! responsibility.

use thiserror::Error;

use crate::geometry::Point;

/// Errors produced when constructing or updating a [`Viewport`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ViewportError {
    #[error("Zoom must be finite and greater than zero, got {0}")]
    InvalidZoom(f32),
}

/// Zoom and pan state of a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    zoom: f32,
    pan: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Point::default(),
        }
    }
}

impl Viewport {
    /// Creates a viewport with the given zoom factor and pan offset.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError::InvalidZoom`] if `zoom` is not a finite positive number.
    ///
    /// # Examples
    ///
    /// ```
    /// # use easel_core::{geometry::Point, viewport::Viewport};
    /// let viewport = Viewport::new(2.0, Point::new(10.0, 20.0)).unwrap();
    /// let canvas = viewport.screen_to_canvas(Point::new(110.0, 80.0));
    /// assert_eq!(canvas, Point::new(50.0, 30.0));
    /// assert_eq!(viewport.canvas_to_screen(canvas), Point::new(110.0, 80.0));
    ///
    /// assert!(Viewport::new(0.0, Point::default()).is_err());
    /// ```
    pub fn new(zoom: f32, pan: Point) -> Result<Self, ViewportError> {
        validate_zoom(zoom)?;
        Ok(Self { zoom, pan })
    }

    /// Returns the zoom factor
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Returns the pan offset in screen units
    pub fn pan(&self) -> Point {
        self.pan
    }

    /// Converts a screen position to canvas coordinates.
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        screen.sub_point(self.pan).scale(1.0 / self.zoom)
    }

    /// Converts a canvas position to screen coordinates.
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        canvas.scale(self.zoom).add_point(self.pan)
    }

    /// Converts a screen-space length (e.g. a hit radius in pixels) to canvas units.
    pub fn canvas_length(&self, screen_length: f32) -> f32 {
        screen_length / self.zoom
    }

    /// Shifts the pan offset by a screen-space delta.
    pub fn pan_by(&mut self, delta: Point) {
        self.pan = self.pan.add_point(delta);
    }

    /// Changes the zoom factor while keeping the canvas point under `anchor`
    /// (a screen position) fixed on screen.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError::InvalidZoom`] and leaves the viewport unchanged
    /// if `zoom` is not a finite positive number.
    pub fn zoom_at(&mut self, anchor: Point, zoom: f32) -> Result<(), ViewportError> {
        validate_zoom(zoom)?;
        let canvas_anchor = self.screen_to_canvas(anchor);
        self.zoom = zoom;
        self.pan = anchor.sub_point(canvas_anchor.scale(zoom));
        Ok(())
    }
}

fn validate_zoom(zoom: f32) -> Result<(), ViewportError> {
    if zoom.is_finite() && zoom > 0.0 {
        Ok(())
    } else {
        Err(ViewportError::InvalidZoom(zoom))
    }
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn viewport_strategy() -> impl Strategy<Value = Viewport> {
        (0.05f32..20.0, -5000.0f32..5000.0, -5000.0f32..5000.0).prop_map(|(zoom, x, y)| {
            Viewport::new(zoom, Point::new(x, y)).expect("strategy only yields positive zoom")
        })
    }

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-5000.0f32..5000.0, -5000.0f32..5000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    /// Rounding error scales with the largest magnitude the transform passes through.
    fn tolerance(viewport: Viewport, p: Point) -> f32 {
        let pan = viewport.pan().abs();
        let scale = (1.0 / viewport.zoom()).max(1.0);
        let magnitude = p.abs().x().max(p.abs().y()) + pan.x().max(pan.y()) * scale;
        1e-4 * (magnitude + 1.0)
    }

    /// screen → canvas → screen is the identity.
    fn check_screen_roundtrip(viewport: Viewport, p: Point) -> Result<(), TestCaseError> {
        let back = viewport.canvas_to_screen(viewport.screen_to_canvas(p));
        prop_assert!(approx_eq!(f32, back.x(), p.x(), epsilon = tolerance(viewport, p)));
        prop_assert!(approx_eq!(f32, back.y(), p.y(), epsilon = tolerance(viewport, p)));
        Ok(())
    }

    /// canvas → screen → canvas is the identity.
    fn check_canvas_roundtrip(viewport: Viewport, p: Point) -> Result<(), TestCaseError> {
        let back = viewport.screen_to_canvas(viewport.canvas_to_screen(p));
        prop_assert!(approx_eq!(f32, back.x(), p.x(), epsilon = tolerance(viewport, p)));
        prop_assert!(approx_eq!(f32, back.y(), p.y(), epsilon = tolerance(viewport, p)));
        Ok(())
    }

    proptest! {
        #[test]
        fn screen_roundtrip(viewport in viewport_strategy(), p in point_strategy()) {
            check_screen_roundtrip(viewport, p)?;
        }

        #[test]
        fn canvas_roundtrip(viewport in viewport_strategy(), p in point_strategy()) {
            check_canvas_roundtrip(viewport, p)?;
        }
    }
}
