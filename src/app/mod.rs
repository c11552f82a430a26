//! Application loop.
//!
//! [`App`] owns the tree, the build owner and the host. It turns host events
//! into widget hooks:
//!
//! - pointer down hit-tests the root and presses the target
//! - pointer up moves focus to the pressed widget and delivers the release in
//!   its (possibly moved) local space
//! - pointer move fires hover enter/leave, or, while pressed, drags the
//!   pressed widget without hit-testing again
//! - the wheel bubbles from the hit widget up until someone scrolls
//! - Tab / Shift+Tab cycle focus unless the focused widget takes the key
//!
//! Once per frame the host calls [`App::frame`], which turns scheduled
//! rebuilds into dirt and repaints the root.

pub mod focus;
pub mod host;
pub mod input;

pub use focus::FocusOrder;
pub use host::{HeadlessHost, Host};

use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use crate::config::AppConfig;
use crate::engine::{Tree, WidgetId};
use crate::event::{HostEvent, Key, Modifiers, MouseButton};
use crate::paint::Painter;
use crate::state::BuildOwner;
use crate::types::{Point, Rect, Size, point};

pub struct App<H: Host = HeadlessHost> {
    tree: Tree,
    owner: Rc<BuildOwner>,
    host: H,
    config: AppConfig,
    focus_order: FocusOrder,
    text_input: bool,
    ime_rect: Option<Rect>,
    frames: u64,
}

impl App<HeadlessHost> {
    /// App with a [`HeadlessHost`] and default configuration.
    pub fn headless() -> Self {
        Self::new(HeadlessHost::new(), AppConfig::default())
    }
}

impl<H: Host> App<H> {
    pub fn new(host: H, config: AppConfig) -> Self {
        let owner = Rc::new(BuildOwner::new());
        Self {
            tree: Tree::new(Rc::clone(&owner)),
            owner,
            host,
            config,
            focus_order: FocusOrder::new(),
            text_input: false,
            ime_rect: None,
            frames: 0,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn owner(&self) -> &Rc<BuildOwner> {
        &self.owner
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Frames actually painted.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn set_root(&mut self, id: WidgetId) {
        self.tree.set_root(id);
        self.host.request_redraw();
    }

    /// Run `f` inside one rebuild batch.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.owner.batch(f)
    }

    pub fn clipboard_get(&mut self) -> Option<String> {
        self.host.clipboard_get()
    }

    pub fn clipboard_set(&mut self, text: &str) {
        self.host.clipboard_set(text);
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Route a host event. Returns `true` if a widget consumed it (only
    /// meaningful for keys and the wheel).
    pub fn handle(&mut self, event: HostEvent) -> bool {
        let consumed = match event {
            HostEvent::PointerDown { pos, button } => {
                self.pointer_down(pos, button);
                true
            }
            HostEvent::PointerUp { pos, button } => {
                self.pointer_up(pos, button);
                true
            }
            HostEvent::PointerMove { pos } => {
                self.pointer_move(pos);
                true
            }
            HostEvent::Wheel { pos, delta } => self.wheel(pos, delta),
            HostEvent::Char(ch) => self.char_input(ch),
            HostEvent::Key { key, modifiers } => self.key_input(key, modifiers),
            HostEvent::Ime { text, cursor } => self.ime_preedit(&text, cursor),
            HostEvent::Resize(size) => {
                self.resize(size);
                true
            }
        };
        self.request_frame_if_dirty();
        consumed
    }

    pub fn pointer_down(&mut self, pos: Point, button: MouseButton) {
        self.tree.interaction_mut().last_cursor = Some(pos);
        let Some(root) = self.tree.root() else {
            return;
        };
        let Some((target, local)) = self.tree.dispatch(root, pos) else {
            return;
        };
        let interaction = self.tree.interaction_mut();
        interaction.pressed = Some(target);
        interaction.pressed_button = Some(button);
        self.tree
            .with_hook(target, |w, cx| w.mouse_down(cx, local, button));
    }

    pub fn pointer_up(&mut self, pos: Point, button: MouseButton) {
        self.tree.interaction_mut().last_cursor = Some(pos);
        let interaction = self.tree.interaction_mut();
        let Some(pressed) = interaction.pressed.take() else {
            return;
        };
        interaction.pressed_button = None;
        if !self.tree.contains(pressed) {
            return;
        }
        self.set_focus(Some(pressed));
        let local = self.tree.to_local(pressed, pos);
        self.tree
            .with_hook(pressed, |w, cx| w.mouse_up(cx, local, button));
    }

    pub fn pointer_move(&mut self, pos: Point) {
        let previous = self.tree.interaction_mut().last_cursor.replace(pos);
        if let Some(pressed) = self.tree.interaction().pressed {
            let delta = previous.map_or(point(0.0, 0.0), |p| point(pos.x - p.x, pos.y - p.y));
            let local = self.tree.to_local(pressed, pos);
            self.tree
                .with_hook(pressed, |w, cx| w.mouse_drag(cx, local, delta));
            return;
        }

        let hit = self
            .tree
            .root()
            .and_then(|root| self.tree.dispatch(root, pos))
            .map(|(id, _)| id);
        let old = self.tree.interaction().hovered;
        if hit == old {
            return;
        }
        self.tree.interaction_mut().hovered = hit;
        if let Some(old) = old {
            self.tree.with_hook(old, |w, cx| w.mouse_leave(cx));
        }
        if let Some(new) = hit {
            self.tree.with_hook(new, |w, cx| w.mouse_enter(cx));
        }
    }

    /// Deliver to the hit widget, then its ancestors, until one scrolls.
    pub fn wheel(&mut self, pos: Point, delta: Point) -> bool {
        let Some(root) = self.tree.root() else {
            return false;
        };
        let Some((target, _)) = self.tree.dispatch(root, pos) else {
            return false;
        };
        let step = self.config.wheel_step;
        let scaled = point(delta.x * step, delta.y * step);
        let mut cursor = Some(target);
        while let Some(id) = cursor {
            if self.tree.with_hook(id, |w, cx| w.mouse_wheel(cx, scaled)) == Some(true) {
                return true;
            }
            cursor = self.tree.parent(id);
        }
        false
    }

    pub fn char_input(&mut self, ch: char) -> bool {
        let Some(focused) = self.tree.interaction().focused else {
            return false;
        };
        self.tree
            .with_hook(focused, |w, cx| w.input_char(cx, ch))
            .is_some()
    }

    pub fn key_input(&mut self, key: Key, modifiers: Modifiers) -> bool {
        if let Some(focused) = self.tree.interaction().focused {
            let consumed = self
                .tree
                .with_hook(focused, |w, cx| w.input_key(cx, key, modifiers));
            if consumed == Some(true) {
                return true;
            }
        }
        if key == Key::Tab && self.config.tab_cycles_focus {
            if modifiers.contains(Modifiers::SHIFT) {
                self.focus_previous();
            } else {
                self.focus_next();
            }
            return true;
        }
        false
    }

    pub fn ime_preedit(&mut self, text: &str, cursor: usize) -> bool {
        let Some(focused) = self.tree.interaction().focused else {
            return false;
        };
        self.tree
            .with_hook(focused, |w, cx| w.input_ime(cx, text, cursor))
            .is_some()
    }

    pub fn resize(&mut self, size: Size) {
        if let Some(root) = self.tree.root() {
            self.tree.resize(root, size);
        }
    }

    // =========================================================================
    // FOCUS
    // =========================================================================

    pub fn focused(&self) -> Option<WidgetId> {
        self.tree.interaction().focused
    }

    /// Focus a focusable widget. Returns `false` if it is not focusable.
    pub fn focus(&mut self, id: WidgetId) -> bool {
        if !self.tree.base(id).is_some_and(|b| b.is_focusable()) {
            return false;
        }
        self.set_focus(Some(id));
        true
    }

    pub fn blur(&mut self) {
        self.set_focus(None);
    }

    pub fn focus_next(&mut self) -> bool {
        self.focus_order.sync(&self.tree);
        let current = self.focused();
        match self.focus_order.next(current) {
            Some(next) if Some(next) != current => self.set_focus(Some(next)),
            _ => false,
        }
    }

    pub fn focus_previous(&mut self) -> bool {
        self.focus_order.sync(&self.tree);
        let current = self.focused();
        match self.focus_order.previous(current) {
            Some(prev) if Some(prev) != current => self.set_focus(Some(prev)),
            _ => false,
        }
    }

    /// Focusable widgets in traversal order.
    pub fn focus_order(&mut self) -> Vec<WidgetId> {
        self.focus_order.sync(&self.tree).to_vec()
    }

    /// Fires unfocus / focus hooks. Returns `false` if nothing changed.
    fn set_focus(&mut self, target: Option<WidgetId>) -> bool {
        let current = self.focused();
        if current == target {
            return false;
        }
        if let Some(old) = current {
            self.tree.interaction_mut().focused = None;
            self.tree.with_hook(old, |w, cx| w.unfocus(cx));
            self.tree.mark_paint_dirty(old);
        }
        self.tree.interaction_mut().focused = target;
        if let Some(new) = target {
            self.tree.with_hook(new, |w, cx| w.focus(cx));
            self.tree.mark_paint_dirty(new);
        }
        debug!(from = ?current, to = ?target, "focus moved");
        self.sync_text_input();
        true
    }

    /// Text-input mode and the IME box follow the focused widget.
    fn sync_text_input(&mut self) {
        let focused = self.focused();
        let accepts = focused.is_some_and(|f| self.tree.accepts_text_input(f));
        if accepts != self.text_input {
            self.text_input = accepts;
            self.host.set_text_input(accepts);
        }
        match focused.filter(|_| accepts) {
            Some(f) => {
                let rect = self.tree.absolute_rect(f);
                if self.ime_rect != Some(rect) {
                    self.ime_rect = Some(rect);
                    self.host.set_ime_rect(rect);
                }
            }
            None => self.ime_rect = None,
        }
    }

    // =========================================================================
    // FRAME / TICK
    // =========================================================================

    /// Paint one frame. Scheduled rebuilds become layout dirt first. Returns
    /// whether anything was painted.
    pub fn frame(&mut self, painter: &mut dyn Painter, full: bool) -> bool {
        self.tree.apply_scheduled();
        self.drop_freed_scenes(painter);
        let painted = self.tree.paint_root(painter, full);
        self.drop_freed_scenes(painter);
        if painted {
            self.frames += 1;
        }
        self.sync_text_input();
        self.request_frame_if_dirty();
        painted
    }

    /// Advance animations by `elapsed`, capped at `config.max_tick`. Returns
    /// whether any widget keeps animating.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        let dt = elapsed.as_secs_f32().min(self.config.max_tick);
        for id in self.tree.take_animating() {
            if self.tree.with_hook(id, |w, cx| w.tick(cx, dt)) == Some(true) {
                self.tree.request_animation(id);
            }
        }
        self.request_frame_if_dirty();
        self.tree.is_animating()
    }

    fn drop_freed_scenes(&mut self, painter: &mut dyn Painter) {
        let freed = self.tree.take_freed();
        if let Some(scenes) = painter.scene_cache() {
            for id in freed {
                scenes.reset_scene(id);
            }
        }
    }

    fn request_frame_if_dirty(&mut self) {
        let dirty = self.tree.root().is_some_and(|r| self.tree.is_dirty(r));
        if dirty || self.owner.has_work() || self.tree.is_animating() {
            self.host.request_redraw();
        }
    }
}
