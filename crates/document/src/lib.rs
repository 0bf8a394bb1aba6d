//! The loft document tree model.
//!
//! Rows, parent/child edges (with cloning), a lazy read-through cache, and
//! path-based navigation over a multi-parent DAG. Everything above this
//! layer (mutations, cursors, modes) talks to the tree exclusively through
//! [`Document`].

mod cache;
mod document;
mod events;
mod path;
mod search;
mod serialize;
mod traversal;

pub use cache::{Cache, RowInfo};
pub use document::Document;
pub use events::{DocEvent, EventRegistry};
pub use path::Path;
pub use search::Searcher;
