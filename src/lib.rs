//! # spark-widgets
//!
//! Retained-mode widget runtime for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! observable state.
//!
//! ## Architecture
//!
//! Widgets live in a generational arena ([`Tree`]) and refer to each other by
//! [`WidgetId`]. Each widget carries a [`RenderNode`] of dirty flags; marking
//! a widget dirty sets `SUBTREE` on its ancestors so a redraw only walks the
//! branches that changed:
//!
//! ```text
//! State::set → observers → BuildOwner (batched, depth-sorted)
//!            → Component::rebuild (keyed reuse) → dirty flags
//!            → App::frame → layout → paint (scene replay for clean children)
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Geometry, colours, size policies
//! - [`engine`] - Arena tree, render nodes, widget trait, hook contexts
//! - [`layout`] - Column / row flex layout with scrolling, stacks
//! - [`state`] - Observable state, build owner, components
//! - [`paint`] - Painter interface and the recording painter
//! - [`app`] - Event routing, focus, frame and tick loop
//! - [`config`] - Runtime configuration

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod layout;
pub mod paint;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use engine::{
    DirtyFlags, EventCx, Interaction, LayoutCx, MeasureCx, PaintCx, Props, RenderNode, Tree,
    TreeStats, Widget, WidgetBase, WidgetId,
};

pub use layout::{Linear, Stack, fit_child};

pub use state::{BuildCx, BuildOwner, Component, Observer, ObserverList, State};

pub use paint::{DrawCommand, Font, ImageId, Painter, RecordingPainter, SceneCache};

pub use app::{App, FocusOrder, HeadlessHost, Host};

pub use config::AppConfig;
pub use error::{ConfigError, PaintError};
pub use event::{HostEvent, Key, Modifiers, MouseButton};
