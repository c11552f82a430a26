//! Input Module - crossterm event conversion and polling
//!
//! Bridges crossterm's event system with [`HostEvent`] so a terminal host can
//! drive an [`App`](super::App). Terminal cells map 1:1 to layout units.
//!
//! # API
//!
//! - `convert_event` - crossterm `Event` to `HostEvent` (None if irrelevant)
//! - `convert_key_event` / `convert_mouse_event` - the individual parts
//! - `poll_event` - non-blocking read with timeout
//!
//! # Example
//!
//! ```ignore
//! use spark_widgets::app::input::poll_event;
//! use std::time::Duration;
//!
//! loop {
//!     if let Ok(Some(event)) = poll_event(Duration::from_millis(16)) {
//!         app.handle(event);
//!     }
//!     app.frame(&mut painter, false);
//! }
//! ```

use std::time::Duration;

use crossterm::event::{
    Event as CrosstermEvent, KeyCode, KeyEvent as CrosstermKeyEvent, KeyEventKind, KeyModifiers,
    MouseButton as CrosstermMouseButton, MouseEvent as CrosstermMouseEvent, MouseEventKind, poll,
    read,
};

use crate::event::{HostEvent, Key, Modifiers, MouseButton};
use crate::types::{point, size};

// =============================================================================
// EVENT CONVERSION
// =============================================================================

/// `Key::Other` ranges for crossterm media and bare modifier keys, offset by
/// the key's position in crossterm's enum.
pub const MEDIA_KEY_BASE: u32 = 0x0100_0000;
pub const MODIFIER_KEY_BASE: u32 = 0x0200_0000;

pub fn convert_event(event: CrosstermEvent) -> Option<HostEvent> {
    match event {
        CrosstermEvent::Key(key) => convert_key_event(key),
        CrosstermEvent::Mouse(mouse) => convert_mouse_event(mouse),
        CrosstermEvent::Resize(w, h) => Some(HostEvent::Resize(size(f32::from(w), f32::from(h)))),
        _ => None,
    }
}

// =============================================================================
// MOUSE EVENT CONVERSION
// =============================================================================

pub fn convert_mouse_event(event: CrosstermMouseEvent) -> Option<HostEvent> {
    let pos = point(f32::from(event.column), f32::from(event.row));
    let wheel = |dx: f32, dy: f32| Some(HostEvent::Wheel { pos, delta: point(dx, dy) });
    match event.kind {
        MouseEventKind::Down(btn) => Some(HostEvent::PointerDown {
            pos,
            button: convert_mouse_button(btn),
        }),
        MouseEventKind::Up(btn) => Some(HostEvent::PointerUp {
            pos,
            button: convert_mouse_button(btn),
        }),
        MouseEventKind::Drag(_) | MouseEventKind::Moved => Some(HostEvent::PointerMove { pos }),
        MouseEventKind::ScrollUp => wheel(0.0, -1.0),
        MouseEventKind::ScrollDown => wheel(0.0, 1.0),
        MouseEventKind::ScrollLeft => wheel(-1.0, 0.0),
        MouseEventKind::ScrollRight => wheel(1.0, 0.0),
    }
}

fn convert_mouse_button(btn: CrosstermMouseButton) -> MouseButton {
    match btn {
        CrosstermMouseButton::Left => MouseButton::Left,
        CrosstermMouseButton::Right => MouseButton::Right,
        CrosstermMouseButton::Middle => MouseButton::Middle,
    }
}

// =============================================================================
// KEY EVENT CONVERSION
// =============================================================================

/// Plain characters (no Ctrl/Alt) become [`HostEvent::Char`]; everything else
/// a [`HostEvent::Key`]. Releases are dropped.
pub fn convert_key_event(event: CrosstermKeyEvent) -> Option<HostEvent> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let mut modifiers = convert_modifiers(event.modifiers);
    let key = match event.code {
        KeyCode::Char(c) => {
            if !modifiers.intersects(Modifiers::CTRL | Modifiers::ALT) {
                return Some(HostEvent::Char(c));
            }
            Key::Char(c)
        }
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => {
            modifiers |= Modifiers::SHIFT;
            Key::Tab
        }
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Esc => Key::Escape,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Insert => Key::Insert,
        KeyCode::F(n) => Key::F(n),
        KeyCode::CapsLock => Key::Other(0xFFE5),
        KeyCode::ScrollLock => Key::Other(0xFF14),
        KeyCode::NumLock => Key::Other(0xFF7F),
        KeyCode::PrintScreen => Key::Other(0xFF61),
        KeyCode::Pause => Key::Other(0xFF13),
        KeyCode::Menu => Key::Other(0xFF67),
        KeyCode::KeypadBegin => Key::Other(0xFF9D),
        KeyCode::Media(media) => Key::Other(MEDIA_KEY_BASE + media as u32),
        KeyCode::Modifier(modifier) => Key::Other(MODIFIER_KEY_BASE + modifier as u32),
        KeyCode::Null => return None,
    };
    Some(HostEvent::Key { key, modifiers })
}

fn convert_modifiers(mods: KeyModifiers) -> Modifiers {
    let mut out = Modifiers::empty();
    out.set(Modifiers::SHIFT, mods.contains(KeyModifiers::SHIFT));
    out.set(Modifiers::CTRL, mods.contains(KeyModifiers::CONTROL));
    out.set(Modifiers::ALT, mods.contains(KeyModifiers::ALT));
    out.set(Modifiers::META, mods.intersects(KeyModifiers::SUPER | KeyModifiers::META));
    out
}

// =============================================================================
// EVENT POLLING
// =============================================================================

/// Poll for an event with timeout. Returns `None` on timeout or for events
/// with no [`HostEvent`] counterpart.
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<HostEvent>> {
    if poll(timeout)? {
        Ok(convert_event(read()?))
    } else {
        Ok(None)
    }
}
