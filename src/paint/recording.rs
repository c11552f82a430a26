//! RecordingPainter - a headless painter that records draw commands.
//!
//! Used by tests and by hosts without a graphics backend. Text metrics are
//! monospace approximations derived from the font size. With
//! [`RecordingPainter::with_scene_cache`] it also implements [`SceneCache`],
//! storing each widget's scene as its own command list.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::engine::WidgetId;
use crate::error::PaintError;
use crate::types::{Point, Rect, Rgba, point};

use super::{Font, ImageId, Painter, SceneCache};

/// Width of one character relative to the font size.
const CHAR_WIDTH: f32 = 0.5;
const ASCENT: f32 = 0.8;
const LINE_HEIGHT: f32 = 1.2;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect { rect: Rect, color: Rgba },
    FillRoundRect { rect: Rect, radius: f32, color: Rgba },
    StrokeRect { rect: Rect, color: Rgba, width: f32 },
    Circle { center: Point, radius: f32, color: Rgba, filled: bool },
    Arc { center: Point, radius: f32, start: f32, end: f32, color: Rgba, width: f32 },
    Line { from: Point, to: Point, color: Rgba, width: f32 },
    Triangle { a: Point, b: Point, c: Point, color: Rgba },
    Path { points: Vec<Point>, color: Rgba, width: f32, closed: bool },
    Text { pos: Point, size: f32, text: String, color: Rgba },
    Image { image: ImageId, rect: Rect },
    Save,
    Restore,
    Translate { dx: f32, dy: f32 },
    Clip { rect: Rect },
    /// Replay of a recorded widget scene.
    Scene { id: WidgetId, offset: Point },
}

#[derive(Debug, Default)]
pub struct RecordingPainter {
    commands: Vec<DrawCommand>,
    recording: Vec<(WidgetId, Vec<DrawCommand>)>,
    scenes: Option<HashMap<WidgetId, Vec<DrawCommand>>>,
    images: Vec<PathBuf>,
    scenes_recorded: u64,
}

impl RecordingPainter {
    /// Painter without scene caching (fallback path).
    pub fn new() -> Self {
        Self::default()
    }

    /// Painter with scene caching.
    pub fn with_scene_cache() -> Self {
        Self {
            scenes: Some(HashMap::new()),
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the top-level commands, keeping cached scenes.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Scenes recorded (or re-recorded) so far.
    pub fn scenes_recorded(&self) -> u64 {
        self.scenes_recorded
    }

    pub fn scene(&self, id: WidgetId) -> Option<&[DrawCommand]> {
        self.scenes.as_ref()?.get(&id).map(Vec::as_slice)
    }

    fn push(&mut self, command: DrawCommand) {
        match self.recording.last_mut() {
            Some((_, buffer)) => buffer.push(command),
            None => self.commands.push(command),
        }
    }

    /// Every filled rectangle in absolute coordinates, with scene replays
    /// expanded. Clips are ignored.
    pub fn fills(&self) -> Vec<(Rect, Rgba)> {
        let mut out = Vec::new();
        let mut origin = point(0.0, 0.0);
        let mut saved = Vec::new();
        self.collect_fills(&self.commands, &mut origin, &mut saved, &mut out);
        out
    }

    fn collect_fills(
        &self,
        commands: &[DrawCommand],
        origin: &mut Point,
        saved: &mut Vec<Point>,
        out: &mut Vec<(Rect, Rgba)>,
    ) {
        for command in commands {
            match command {
                DrawCommand::FillRect { rect, color }
                | DrawCommand::FillRoundRect { rect, color, .. } => {
                    out.push((rect.translate(origin.x, origin.y), *color));
                }
                DrawCommand::Save => saved.push(*origin),
                DrawCommand::Restore => {
                    if let Some(prev) = saved.pop() {
                        *origin = prev;
                    }
                }
                DrawCommand::Translate { dx, dy } => {
                    origin.x += dx;
                    origin.y += dy;
                }
                DrawCommand::Scene { id, offset } => {
                    let Some(scene) = self.scene(*id) else {
                        continue;
                    };
                    let outer = *origin;
                    origin.x += offset.x;
                    origin.y += offset.y;
                    self.collect_fills(scene, origin, saved, out);
                    *origin = outer;
                }
                _ => {}
            }
        }
    }
}

impl Painter for RecordingPainter {
    fn text_width(&self, font: &Font, text: &str) -> f32 {
        text.chars().count() as f32 * font.size * CHAR_WIDTH
    }

    fn ascent(&self, font: &Font) -> f32 {
        font.size * ASCENT
    }

    fn line_height(&self, font: &Font) -> f32 {
        font.size * LINE_HEIGHT
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.push(DrawCommand::FillRect { rect, color });
    }

    fn fill_round_rect(&mut self, rect: Rect, radius: f32, color: Rgba) {
        self.push(DrawCommand::FillRoundRect { rect, radius, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba, width: f32) {
        self.push(DrawCommand::StrokeRect { rect, color, width });
    }

    fn circle(&mut self, center: Point, radius: f32, color: Rgba, filled: bool) {
        self.push(DrawCommand::Circle {
            center,
            radius,
            color,
            filled,
        });
    }

    fn arc(&mut self, center: Point, radius: f32, start: f32, end: f32, color: Rgba, width: f32) {
        self.push(DrawCommand::Arc {
            center,
            radius,
            start,
            end,
            color,
            width,
        });
    }

    fn line(&mut self, from: Point, to: Point, color: Rgba, width: f32) {
        self.push(DrawCommand::Line {
            from,
            to,
            color,
            width,
        });
    }

    fn triangle(&mut self, a: Point, b: Point, c: Point, color: Rgba) {
        self.push(DrawCommand::Triangle { a, b, c, color });
    }

    fn path(&mut self, points: &[Point], color: Rgba, width: f32, closed: bool) {
        self.push(DrawCommand::Path {
            points: points.to_vec(),
            color,
            width,
            closed,
        });
    }

    fn text(&mut self, pos: Point, font: &Font, text: &str, color: Rgba) {
        self.push(DrawCommand::Text {
            pos,
            size: font.size,
            text: text.to_owned(),
            color,
        });
    }

    fn image(&mut self, image: ImageId, rect: Rect) {
        self.push(DrawCommand::Image { image, rect });
    }

    /// Registers the path without decoding anything.
    fn load_image(&mut self, path: &Path) -> Result<ImageId, PaintError> {
        if path.as_os_str().is_empty() {
            return Err(PaintError::Image {
                path: String::new(),
                reason: String::from("empty path"),
            });
        }
        if let Some(existing) = self.images.iter().position(|p| p == path) {
            return Ok(existing as ImageId);
        }
        self.images.push(path.to_path_buf());
        Ok((self.images.len() - 1) as ImageId)
    }

    fn save(&mut self) {
        self.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.push(DrawCommand::Restore);
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.push(DrawCommand::Translate { dx, dy });
    }

    fn clip(&mut self, rect: Rect) {
        self.push(DrawCommand::Clip { rect });
    }

    fn scene_cache(&mut self) -> Option<&mut dyn SceneCache> {
        if self.scenes.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl SceneCache for RecordingPainter {
    fn begin_scene(&mut self, id: WidgetId) {
        self.recording.push((id, Vec::new()));
    }

    fn end_scene(&mut self) {
        let Some((id, buffer)) = self.recording.pop() else {
            return;
        };
        if let Some(scenes) = self.scenes.as_mut() {
            scenes.insert(id, buffer);
            self.scenes_recorded += 1;
        }
    }

    fn has_scene(&self, id: WidgetId) -> bool {
        self.scenes.as_ref().is_some_and(|s| s.contains_key(&id))
    }

    fn append_scene(&mut self, id: WidgetId, offset: Point) -> bool {
        if !self.has_scene(id) {
            return false;
        }
        self.push(DrawCommand::Scene { id, offset });
        true
    }

    fn reset_scene(&mut self, id: WidgetId) {
        if let Some(scenes) = self.scenes.as_mut() {
            scenes.remove(&id);
        }
    }
}
