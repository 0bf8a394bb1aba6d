//! Core value types shared by every loft crate.
//!
//! Nothing here touches storage or input; these are the plain data shapes
//! the rest of the workspace agrees on:
//!
//! * [`Row`]: opaque integer identity of a node's content.
//! * [`Line`] / [`Char`]: per-character text with render style flags.
//! * [`Key`]: a normalized input key token (`a`, `ctrl+c`, `shift+tab`).
//! * [`SerializedBlock`]: the nested import/export format.
//! * [`Error`]: the shared error taxonomy.

pub mod error;
pub mod key;
pub mod line;
pub mod mode;
pub mod row;
pub mod serialized;

pub use error::{Error, Result};
pub use key::Key;
pub use line::{Char, Line, StyleFlags, line_from_str, line_to_string};
pub use mode::{ModeBehavior, ModeId};
pub use row::Row;
pub use serialized::{SerializedBlock, SerializedNode};

use std::future::Future;
use std::pin::Pin;

/// Boxed local future used for stored async callbacks (hooks, actions).
///
/// The whole engine runs on a single logical thread, so these are not `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;
