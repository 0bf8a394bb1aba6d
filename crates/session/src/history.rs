//! Undo/redo history types.
//!
//! History is a log of checkpoints over the mutation list, not a stack of
//! document snapshots. Each entry marks where its edit burst starts in the
//! log and carries the view state captured around that burst:
//!
//! * `before`: cursor and view root when the burst's first mutation ran.
//! * `after`: cursor and view root when the burst was committed by `save()`.
//!
//! Undo restores `before` of the entry being rewound to; redo restores
//! `after` of the entry being replayed.

use loft_document::Path;

/// Cursor and view-root snapshot captured at checkpoint boundaries.
#[derive(Debug, Clone)]
pub struct ViewState {
	pub cursor_path: Path,
	pub cursor_col: usize,
	pub view_root: Path,
}

/// One checkpoint boundary in the mutation log.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
	/// Offset into the mutation log where this entry's burst starts.
	pub index: usize,
	/// View state before the burst's first mutation.
	pub before: Option<ViewState>,
	/// View state when the burst was committed.
	pub after: Option<ViewState>,
}

impl HistoryEntry {
	pub fn at(index: usize) -> Self {
		Self {
			index,
			before: None,
			after: None,
		}
	}
}
