//! Reversible document mutations.
//!
//! Every structural or textual change goes through a [`Mutation`]: a tagged
//! variant carrying its forward parameters and, once applied, the pre-state
//! captured for rewind. The contract:
//!
//! * [`Mutation::mutate`] applies the change and captures whatever the
//!   inverse will need (deleted characters, former child indices, …).
//! * [`Mutation::rewind`] computes, but does not apply, mutations that
//!   restore the pre-mutation state exactly. It requires captured state and
//!   fails on a mutation that never ran.
//! * [`Mutation::validate`] re-checks applicability; it must be callable
//!   long after creation because redo re-validates from the log.
//! * [`Mutation::remutate`] replays an already-captured mutation for redo.
//!
//! Each variant also owns its cursor-placement rule: a mutation knows how
//! the cursor shifts when it lands on the affected row.

use loft_document::Document;
use loft_primitives::{Error, Line, Result, Row};
use tracing::trace;

use crate::cursor::Cursor;

/// One atomic, reversible document edit.
#[derive(Debug, Clone)]
pub enum Mutation {
	/// Insert `chars` into `row`'s line at `col`.
	AddChars { row: Row, col: usize, chars: Line },
	/// Delete `count` chars of `row`'s line starting at `col`.
	DelChars {
		row: Row,
		col: usize,
		count: usize,
		/// Captured on apply; rewind re-inserts them.
		deleted: Option<Line>,
	},
	/// Replace `row`'s whole line.
	SetLine {
		row: Row,
		line: Line,
		/// Captured on apply.
		old: Option<Line>,
	},
	/// Attach `rows` under `parent` as a contiguous run starting at `index`.
	AttachBlocks {
		parent: Row,
		rows: Vec<Row>,
		index: usize,
	},
	/// Detach `rows` from `parent`.
	DetachBlocks {
		parent: Row,
		rows: Vec<Row>,
		/// Former child indices, captured in detach order.
		indices: Option<Vec<usize>>,
	},
	/// Move `row` from `old_parent` to `new_parent` at `index`.
	MoveBlock {
		row: Row,
		old_parent: Row,
		new_parent: Row,
		index: usize,
		/// Former index under `old_parent`, captured on apply.
		old_index: Option<usize>,
	},
	/// Flip `row`'s collapsed flag.
	ToggleCollapse { row: Row },
}

impl Mutation {
	/// Can this mutation (still) apply cleanly?
	pub async fn validate(&self, doc: &mut Document) -> Result<bool> {
		match self {
			Mutation::AddChars { row, col, .. } => {
				Ok(*col <= doc.line_length(*row).await?)
			}
			Mutation::DelChars { row, col, count, .. } => {
				Ok(col + count <= doc.line_length(*row).await?)
			}
			Mutation::SetLine { .. } | Mutation::ToggleCollapse { .. } => Ok(true),
			Mutation::AttachBlocks { parent, rows, index } => {
				let children = doc.get_children(*parent).await?;
				if *index > children.len() {
					return Ok(false);
				}
				for &row in rows {
					if children.contains(&row) {
						return Ok(false);
					}
					if doc.all_ancestors(*parent, true).await?.contains(&row) {
						return Ok(false);
					}
				}
				Ok(true)
			}
			Mutation::DetachBlocks { parent, rows, .. } => {
				for &row in rows {
					if doc.child_index(*parent, row).await?.is_none() {
						return Ok(false);
					}
				}
				Ok(true)
			}
			Mutation::MoveBlock {
				row,
				old_parent,
				new_parent,
				..
			} => {
				if doc.child_index(*old_parent, *row).await?.is_none() {
					return Ok(false);
				}
				if old_parent != new_parent
					&& doc.all_ancestors(*new_parent, true).await?.contains(row)
				{
					return Ok(false);
				}
				Ok(true)
			}
		}
	}

	/// Applies the mutation, capturing pre-state and placing the cursor.
	pub async fn mutate(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<()> {
		trace!(mutation = ?self, "mutate");
		match self {
			Mutation::AddChars { row, col, chars } => {
				let mut line = doc.get_line(*row).await?;
				line.splice(*col..*col, chars.iter().copied());
				doc.set_line(*row, line).await?;
				if cursor.path.row() == *row && cursor.col >= *col {
					cursor.set_col(cursor.col + chars.len());
				}
			}
			Mutation::DelChars {
				row,
				col,
				count,
				deleted,
			} => {
				let mut line = doc.get_line(*row).await?;
				if col.checked_add(*count).is_none_or(|end| end > line.len()) {
					return Err(Error::invariant(format!(
						"delete of {count} chars at col {col} exceeds line of row {row}"
					)));
				}
				let removed: Line = line.splice(*col..*col + *count, std::iter::empty()).collect();
				if deleted.is_none() {
					*deleted = Some(removed);
				}
				doc.set_line(*row, line).await?;
				if cursor.path.row() == *row && cursor.col >= *col {
					let new_col = if cursor.col >= *col + *count {
						cursor.col - *count
					} else {
						*col
					};
					cursor.set_col(new_col);
				}
			}
			Mutation::SetLine { row, line, old } => {
				let current = doc.get_line(*row).await?;
				if old.is_none() {
					*old = Some(current);
				}
				doc.set_line(*row, line.clone()).await?;
				if cursor.path.row() == *row {
					let max = line.len().saturating_sub(1);
					cursor.set_col(cursor.col.min(max));
				}
			}
			Mutation::AttachBlocks { parent, rows, index } => {
				for (i, &row) in rows.iter().enumerate() {
					doc.attach(row, *parent, *index + i).await?;
				}
			}
			Mutation::DetachBlocks {
				parent,
				rows,
				indices,
			} => {
				let mut captured = Vec::with_capacity(rows.len());
				for &row in rows.iter() {
					captured.push(doc.detach(row, *parent).await?);
				}
				if indices.is_none() {
					*indices = Some(captured);
				}
			}
			Mutation::MoveBlock {
				row,
				old_parent,
				new_parent,
				index,
				old_index,
			} => {
				let former = doc.move_row(*row, *old_parent, *new_parent, *index).await?;
				if old_index.is_none() {
					*old_index = Some(former);
				}
				if cursor.path.ancestry().contains(row)
					&& let Some(path) = doc.canonical_path(cursor.path.row()).await?
				{
					cursor.path = path;
				}
			}
			Mutation::ToggleCollapse { row } => {
				let collapsed = doc.is_collapsed(*row).await?;
				doc.set_collapsed(*row, !collapsed).await?;
			}
		}
		Ok(())
	}

	/// Replays an already-applied mutation for redo; captured state is kept.
	pub async fn remutate(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<()> {
		self.mutate(doc, cursor).await
	}

	/// The inverse mutation(s), from state captured before this one applied.
	/// Applying them in order restores the pre-mutation document exactly.
	pub fn rewind(&self) -> Result<Vec<Mutation>> {
		let missing =
			|what: &str| Error::invariant(format!("rewind of unapplied mutation: missing {what}"));
		Ok(match self {
			Mutation::AddChars { row, col, chars } => vec![Mutation::DelChars {
				row: *row,
				col: *col,
				count: chars.len(),
				deleted: None,
			}],
			Mutation::DelChars {
				row, col, deleted, ..
			} => vec![Mutation::AddChars {
				row: *row,
				col: *col,
				chars: deleted.clone().ok_or_else(|| missing("deleted chars"))?,
			}],
			Mutation::SetLine { row, old, .. } => vec![Mutation::SetLine {
				row: *row,
				line: old.clone().ok_or_else(|| missing("old line"))?,
				old: None,
			}],
			Mutation::AttachBlocks { parent, rows, .. } => vec![Mutation::DetachBlocks {
				parent: *parent,
				rows: rows.clone(),
				indices: None,
			}],
			Mutation::DetachBlocks {
				parent,
				rows,
				indices,
			} => {
				let indices = indices.as_ref().ok_or_else(|| missing("detach indices"))?;
				// Re-attach in reverse detach order so each captured index is
				// valid at the moment it is used.
				rows.iter()
					.zip(indices)
					.rev()
					.map(|(&row, &index)| Mutation::AttachBlocks {
						parent: *parent,
						rows: vec![row],
						index,
					})
					.collect()
			}
			Mutation::MoveBlock {
				row,
				old_parent,
				new_parent,
				old_index,
				..
			} => vec![Mutation::MoveBlock {
				row: *row,
				old_parent: *new_parent,
				new_parent: *old_parent,
				index: old_index.ok_or_else(|| missing("old index"))?,
				old_index: None,
			}],
			Mutation::ToggleCollapse { row } => vec![Mutation::ToggleCollapse { row: *row }],
		})
	}
}
