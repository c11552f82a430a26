//! State Module - reactive values and rebuild scheduling
//!
//! - **Observable** - `State<T>`, the `Observer` protocol, observer lists
//! - **BuildOwner** - batching scheduler deduplicating component rebuilds
//! - **Component** - view-function widget with keyed widget reuse

mod build_owner;
mod component;
mod observable;

pub use build_owner::*;
pub use component::*;
pub use observable::*;
