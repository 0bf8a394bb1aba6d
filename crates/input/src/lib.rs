//! Modal key handling: stream, binding tries, motions, actions, handler.

pub mod actions;
pub mod bindings;
pub mod handler;
pub mod keymap;
pub mod keystream;
pub mod motions;

pub use actions::{Action, InsertTarget, Repeat};
pub use bindings::{BindingTarget, KeyBindingsTree, LookupOutcome};
pub use handler::KeyHandler;
pub use keymap::default_bindings;
pub use keystream::KeyStream;
pub use motions::Motion;
