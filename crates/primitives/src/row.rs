//! Row identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque integer identity of a node's content, independent of tree position.
///
/// Ids are assigned monotonically by the store and never reused. Row `0` is
/// the document root. Detaching a row removes edges, never the row itself,
/// so an id stays valid for clones and for undo of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub u64);

impl Row {
	/// The document root row.
	pub const ROOT: Row = Row(0);

	/// Returns `true` for the document root.
	pub fn is_root(self) -> bool {
		self == Self::ROOT
	}
}

impl fmt::Display for Row {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}
