//! Host input events.
//!
//! Positions are in the root widget's coordinate space; the host normalizes
//! device pixels before delivering them.

use bitflags::bitflags;

use crate::types::{Point, Size};

bitflags! {
    /// Modifier key bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Non-character keys plus a raw code for everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Tab,
    Enter,
    Escape,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Char(char),
    Insert,
    F(u8),
    /// Raw code of a key with no variant of its own. Lock, print and menu
    /// keys use their X11 keysym.
    Other(u32),
}

/// Everything a host can deliver to [`App::handle`](crate::app::App::handle).
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    PointerDown { pos: Point, button: MouseButton },
    PointerUp { pos: Point, button: MouseButton },
    PointerMove { pos: Point },
    Wheel { pos: Point, delta: Point },
    Char(char),
    Key { key: Key, modifiers: Modifiers },
    /// IME composition text with the cursor position in chars.
    Ime { text: String, cursor: usize },
    Resize(Size),
}
