//! Host - the windowing side of the application loop.
//!
//! The host delivers [`HostEvent`](crate::event::HostEvent)s and calls
//! [`App::frame`](super::App::frame) once per frame with its painter. In the
//! other direction the app asks it for redraws, clipboard access, text-input
//! mode and IME placement.

use crate::types::Rect;

pub trait Host {
    /// Schedule a frame.
    fn request_redraw(&mut self);
    fn clipboard_get(&mut self) -> Option<String>;
    fn clipboard_set(&mut self, text: &str);
    /// Soft keyboard / IME on or off.
    fn set_text_input(&mut self, enabled: bool);
    /// Where the IME composition box goes, in root coordinates.
    fn set_ime_rect(&mut self, rect: Rect);
}

/// Host without a window: clipboard in an internal buffer, everything else
/// remembered for inspection.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HeadlessHost {
    pub clipboard: Option<String>,
    pub redraw_requests: u64,
    pub text_input: bool,
    pub ime_rect: Option<Rect>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Host for HeadlessHost {
    fn request_redraw(&mut self) {
        self.redraw_requests += 1;
    }

    fn clipboard_get(&mut self) -> Option<String> {
        self.clipboard.clone()
    }

    fn clipboard_set(&mut self, text: &str) {
        self.clipboard = Some(text.to_owned());
    }

    fn set_text_input(&mut self, enabled: bool) {
        self.text_input = enabled;
    }

    fn set_ime_rect(&mut self, rect: Rect) {
        self.ime_rect = Some(rect);
    }
}
