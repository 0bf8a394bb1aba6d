//! In-memory write-through mirror of store state.
//!
//! The cache is an arena of immutable row records keyed by id; parent/child
//! edges are id lists, never owned recursive structures (a clone graph has
//! no sensible ownership tree). Records are pure derived data: every write
//! goes to the store first and then replaces the record wholesale, so a
//! record is never mutated in place and `clear` is always a safe, blunt
//! invalidation strategy.
//!
//! Because children are referenced by id rather than by pointer, replacing a
//! child's record is automatically visible through every cached ancestor; no
//! bubble-up repointing pass is needed.

use std::sync::Arc;

use loft_primitives::{Line, Row};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Immutable snapshot of one row's stored fields.
#[derive(Debug, Clone)]
pub struct RowInfo {
	pub row: Row,
	pub line: Line,
	pub collapsed: bool,
	/// Rows this row is attached under. More than one ⇒ clone candidate.
	pub parent_rows: SmallVec<[Row; 2]>,
	pub child_rows: SmallVec<[Row; 8]>,
}

impl RowInfo {
	/// A fresh, empty, detached record for a newly assigned row.
	pub fn empty(row: Row) -> Self {
		Self {
			row,
			line: Line::new(),
			collapsed: false,
			parent_rows: SmallVec::new(),
			child_rows: SmallVec::new(),
		}
	}
}

/// Arena of cached row records.
#[derive(Debug, Default)]
pub struct Cache {
	entries: FxHashMap<Row, Arc<RowInfo>>,
}

impl Cache {
	pub fn new() -> Self {
		Self::default()
	}

	/// The cached record, if this row has been loaded.
	pub fn get(&self, row: Row) -> Option<Arc<RowInfo>> {
		self.entries.get(&row).cloned()
	}

	/// Replaces the record for `info.row`.
	pub fn set(&mut self, info: RowInfo) -> Arc<RowInfo> {
		let info = Arc::new(info);
		self.entries.insert(info.row, info.clone());
		info
	}

	/// Applies `edit` to a copy of the cached record and swaps it in.
	///
	/// No-op when the row is not loaded; the next read-through load will see
	/// the store's version.
	pub fn update(&mut self, row: Row, edit: impl FnOnce(&mut RowInfo)) -> Option<Arc<RowInfo>> {
		let current = self.entries.get(&row)?;
		let mut next = RowInfo::clone(current);
		edit(&mut next);
		Some(self.set(next))
	}

	/// Drops everything. Used as a blunt invalidation after plugin-driven
	/// side effects that bypass the document API.
	pub fn clear(&mut self) {
		self.entries.clear();
	}

	/// The loaded records for `row`'s children, `None` per unloaded child.
	pub fn loaded_children(&self, row: Row) -> Vec<Option<Arc<RowInfo>>> {
		match self.entries.get(&row) {
			None => Vec::new(),
			Some(info) => info.child_rows.iter().map(|c| self.get(*c)).collect(),
		}
	}
}
