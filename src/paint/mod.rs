//! Painter interface.
//!
//! The drawing backend is a collaborator: the tree only needs text metrics,
//! a handful of primitives, a save/translate/clip/restore stack and,
//! optionally, scene caching. All coordinates are in the current (translated)
//! local space.
//!
//! # Scene caching
//!
//! A backend that can record isolated sub-scenes exposes a [`SceneCache`]
//! through [`Painter::scene_cache`]. The redraw walk then records each dirty
//! child into its own scene and appends clean children's scenes unchanged.
//! Without it the walk falls back to painting dirty children in place.

mod recording;

pub use recording::*;

use std::path::Path;

use crate::engine::WidgetId;
use crate::error::PaintError;
use crate::types::{Point, Rect, Rgba};

/// Handle to an image loaded by a painter.
pub type ImageId = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: String,
    pub size: f32,
    pub bold: bool,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: String::from("sans-serif"),
            size: 14.0,
            bold: false,
        }
    }
}

impl Font {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Drawing backend.
pub trait Painter {
    // Text metrics
    fn text_width(&self, font: &Font, text: &str) -> f32;
    fn ascent(&self, font: &Font) -> f32;
    fn line_height(&self, font: &Font) -> f32;

    // Primitives
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    /// Rounded when `radius > 0`.
    fn fill_round_rect(&mut self, rect: Rect, radius: f32, color: Rgba) {
        let _ = radius;
        self.fill_rect(rect, color);
    }
    fn stroke_rect(&mut self, rect: Rect, color: Rgba, width: f32);
    fn circle(&mut self, center: Point, radius: f32, color: Rgba, filled: bool);
    /// Angles in radians, clockwise from the positive x axis.
    fn arc(&mut self, center: Point, radius: f32, start: f32, end: f32, color: Rgba, width: f32);
    fn line(&mut self, from: Point, to: Point, color: Rgba, width: f32);
    fn triangle(&mut self, a: Point, b: Point, c: Point, color: Rgba);
    fn path(&mut self, points: &[Point], color: Rgba, width: f32, closed: bool);
    /// `pos` is the top-left corner of the text box.
    fn text(&mut self, pos: Point, font: &Font, text: &str, color: Rgba);
    fn image(&mut self, image: ImageId, rect: Rect);
    fn load_image(&mut self, path: &Path) -> Result<ImageId, PaintError>;

    // State stack
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    /// Intersect the clip with `rect`.
    fn clip(&mut self, rect: Rect);

    // Colour composition
    fn blend(&self, src: Rgba, dst: Rgba) -> Rgba {
        Rgba::blend(src, dst)
    }

    fn lerp(&self, a: Rgba, b: Rgba, t: f32) -> Rgba {
        Rgba::lerp(a, b, t)
    }

    fn lighten(&self, color: Rgba, amount: f32) -> Rgba {
        color.lighten(amount)
    }

    fn darken(&self, color: Rgba, amount: f32) -> Rgba {
        color.darken(amount)
    }

    /// Optional scene-caching extension.
    fn scene_cache(&mut self) -> Option<&mut dyn SceneCache> {
        None
    }
}

/// Per-widget recorded sub-scenes.
pub trait SceneCache {
    /// Start (re)recording the scene of `id`. Drawing goes there until the
    /// matching [`end_scene`](Self::end_scene). Calls nest.
    fn begin_scene(&mut self, id: WidgetId);
    fn end_scene(&mut self);
    fn has_scene(&self, id: WidgetId) -> bool;
    /// Replay the scene of `id` into the current target at `offset`.
    /// Returns `false` if there is none.
    fn append_scene(&mut self, id: WidgetId, offset: Point) -> bool;
    /// Drop the scene of `id`.
    fn reset_scene(&mut self, id: WidgetId);
}
