//! Shared test widgets.
//!
//! `Spy` records every hook it receives into a shared log and paints a
//! filled rectangle over its bounds, so tests can assert on both the event
//! sequence and the painted output.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use spark_widgets::{
    EventCx, Key, MeasureCx, Modifiers, MouseButton, PaintCx, Point, Rect, Rgba, Size, Widget,
    point, size,
};

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Drain the log.
pub fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

/// Entries of `log` that start with `prefix`.
pub fn entries(log: &Log, prefix: &str) -> Vec<String> {
    log.borrow()
        .iter()
        .filter(|e| e.starts_with(prefix))
        .cloned()
        .collect()
}

pub fn count(log: &Log, entry: &str) -> usize {
    log.borrow().iter().filter(|e| *e == entry).count()
}

// =============================================================================
// SPY
// =============================================================================

pub struct Spy {
    pub name: String,
    pub color: Rgba,
    pub natural: Size,
    pub log: Log,
    pub text_input: bool,
    pub consume_keys: bool,
    pub ticks_left: u32,
    pub scroll: bool,
}

impl Spy {
    pub fn new(name: &str, log: &Log) -> Self {
        Self {
            name: name.to_owned(),
            color: Rgba::GRAY,
            natural: size(0.0, 0.0),
            log: Rc::clone(log),
            text_input: false,
            consume_keys: false,
            ticks_left: 0,
            scroll: false,
        }
    }

    pub fn color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    pub fn natural(mut self, width: f32, height: f32) -> Self {
        self.natural = size(width, height);
        self
    }

    pub fn text_input(mut self) -> Self {
        self.text_input = true;
        self
    }

    pub fn consume_keys(mut self) -> Self {
        self.consume_keys = true;
        self
    }

    pub fn ticks(mut self, n: u32) -> Self {
        self.ticks_left = n;
        self
    }

    /// Consumes every wheel event.
    pub fn scroll(mut self) -> Self {
        self.scroll = true;
        self
    }

    fn record(&self, event: impl AsRef<str>) {
        self.log
            .borrow_mut()
            .push(format!("{}:{}", self.name, event.as_ref()));
    }
}

fn fmt_point(p: Point) -> String {
    format!("{},{}", p.x, p.y)
}

impl Widget for Spy {
    fn measure(&self, _cx: &MeasureCx<'_>) -> Size {
        self.natural
    }

    fn paint(&mut self, cx: &mut PaintCx<'_>) {
        self.record("paint");
        let bounds = Rect::from_origin_size(point(0.0, 0.0), cx.size());
        cx.painter().fill_rect(bounds, self.color);
    }

    fn on_mount(&mut self, _cx: &mut EventCx<'_>) {
        self.record("mount");
    }

    fn on_unmount(&mut self, _cx: &mut EventCx<'_>) {
        self.record("unmount");
    }

    fn mouse_down(&mut self, _cx: &mut EventCx<'_>, pos: Point, _button: MouseButton) {
        self.record(format!("down@{}", fmt_point(pos)));
    }

    fn mouse_up(&mut self, _cx: &mut EventCx<'_>, pos: Point, _button: MouseButton) {
        self.record(format!("up@{}", fmt_point(pos)));
    }

    fn mouse_drag(&mut self, _cx: &mut EventCx<'_>, pos: Point, delta: Point) {
        self.record(format!("drag@{}+{}", fmt_point(pos), fmt_point(delta)));
    }

    fn mouse_enter(&mut self, _cx: &mut EventCx<'_>) {
        self.record("enter");
    }

    fn mouse_leave(&mut self, _cx: &mut EventCx<'_>) {
        self.record("leave");
    }

    fn mouse_wheel(&mut self, _cx: &mut EventCx<'_>, delta: Point) -> bool {
        self.record(format!("wheel{}", fmt_point(delta)));
        self.scroll
    }

    fn input_char(&mut self, _cx: &mut EventCx<'_>, ch: char) {
        self.record(format!("char:{ch}"));
    }

    fn input_key(&mut self, _cx: &mut EventCx<'_>, key: Key, _modifiers: Modifiers) -> bool {
        self.record(format!("key:{key:?}"));
        self.consume_keys
    }

    fn input_ime(&mut self, _cx: &mut EventCx<'_>, text: &str, cursor: usize) {
        self.record(format!("ime:{text}@{cursor}"));
    }

    fn focus(&mut self, _cx: &mut EventCx<'_>) {
        self.record("focus");
    }

    fn unfocus(&mut self, _cx: &mut EventCx<'_>) {
        self.record("unfocus");
    }

    fn tick(&mut self, _cx: &mut EventCx<'_>, dt: f32) -> bool {
        self.record(format!("tick:{dt}"));
        self.ticks_left = self.ticks_left.saturating_sub(1);
        self.ticks_left > 0
    }

    fn accepts_text_input(&self) -> bool {
        self.text_input
    }
}
