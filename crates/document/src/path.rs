//! Paths: one concrete traversal from the document root to a row.
//!
//! A cloned row is reachable through several parents, so "which row" and
//! "which occurrence of the row" are different questions. [`Path`] answers
//! the second: it is an immutable cons list of row ids from the root, and
//! [`Path::is`] compares the full ancestor chain, not just the tip row.

use std::fmt;
use std::sync::Arc;

use loft_primitives::{Error, Result, Row};

/// An immutable handle for one traversal from the root to a row.
///
/// Cloning a `Path` is cheap; the ancestor chain is shared via [`Arc`].
#[derive(Debug, Clone)]
pub struct Path {
	parent: Option<Arc<Path>>,
	row: Row,
}

impl Path {
	/// The root path: no parent, row 0.
	pub fn root() -> Self {
		Self {
			parent: None,
			row: Row::ROOT,
		}
	}

	/// Extends this path downward to `row`.
	///
	/// A trivial self-loop (`row == self.row()`) is rejected; deeper cycles
	/// are impossible because attach refuses to create them.
	pub fn child(&self, row: Row) -> Result<Path> {
		if row == self.row {
			return Err(Error::invariant(format!("path {self} cannot have itself as child")));
		}
		Ok(Path {
			parent: Some(Arc::new(self.clone())),
			row,
		})
	}

	/// Extends this path through each row of `rows` in order.
	pub fn extend(&self, rows: &[Row]) -> Result<Path> {
		let mut path = self.clone();
		for &row in rows {
			path = path.child(row)?;
		}
		Ok(path)
	}

	/// The row this path ends at.
	pub fn row(&self) -> Row {
		self.row
	}

	/// The path one step up, `None` at the root.
	pub fn parent(&self) -> Option<&Path> {
		self.parent.as_deref()
	}

	/// Returns `true` for the root path.
	pub fn is_root(&self) -> bool {
		self.parent.is_none()
	}

	/// Number of edges from the root.
	pub fn depth(&self) -> usize {
		match &self.parent {
			None => 0,
			Some(p) => p.depth() + 1,
		}
	}

	/// Structural equality: same rows through the same ancestor chain.
	///
	/// Two paths to the same (cloned) row via different parents are distinct.
	pub fn is(&self, other: &Path) -> bool {
		if self.row != other.row {
			return false;
		}
		match (&self.parent, &other.parent) {
			(None, None) => true,
			(Some(a), Some(b)) => Arc::ptr_eq(a, b) || a.is(b),
			_ => false,
		}
	}

	/// Returns `true` if `ancestor` is a strict prefix of this path.
	pub fn is_descendant_of(&self, ancestor: &Path) -> bool {
		let mut cur = self.parent();
		while let Some(p) = cur {
			if p.is(ancestor) {
				return true;
			}
			cur = p.parent();
		}
		false
	}

	/// Row ids from the root to this row, root first.
	pub fn ancestry(&self) -> Vec<Row> {
		let mut rows = match &self.parent {
			None => Vec::new(),
			Some(p) => p.ancestry(),
		};
		rows.push(self.row);
		rows
	}

	/// Every path from the root down to this one, shallowest first.
	pub fn chain(&self) -> Vec<Path> {
		let mut out = match &self.parent {
			None => Vec::new(),
			Some(p) => p.chain(),
		};
		out.push(self.clone());
		out
	}
}

impl PartialEq for Path {
	fn eq(&self, other: &Self) -> bool {
		self.is(other)
	}
}

impl Eq for Path {}

impl fmt::Display for Path {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.parent {
			None => write!(f, "{}", self.row),
			Some(p) => write!(f, "{}/{}", p, self.row),
		}
	}
}
