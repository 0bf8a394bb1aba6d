//! Session orchestration: one open document plus everything the key handler
//! needs to edit it.
//!
//! All document edits funnel through [`Session::apply`], which runs a
//! [`Mutation`] and records it in the log; [`Session::save`] commits the
//! pending burst as one undo checkpoint. Undo rewinds bursts from the log,
//! redo replays them after re-validating each mutation against the current
//! document.

use loft_document::{Document, Path};
use loft_primitives::{Char, Error, Line, ModeId, Result, Row};
use tracing::{debug, trace};

use crate::cursor::Cursor;
use crate::events::{SessionEvent, SessionEventRegistry};
use crate::history::{HistoryEntry, ViewState};
use crate::mutation::Mutation;
use crate::register::{Register, RegisterContent};

/// Where a paste or row insertion lands relative to the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Before,
	After,
}

pub struct Session {
	pub document: Document,
	pub cursor: Cursor,
	/// Selection anchor; `Some` exactly while a visual mode is active.
	pub anchor: Option<Cursor>,
	pub register: Register,
	pub view_root: Path,
	pub search_buffer: String,
	/// Cleared during macro playback so the whole replay commits as one
	/// checkpoint.
	pub save_enabled: bool,
	mode: ModeId,
	mutations: Vec<Mutation>,
	history: Vec<HistoryEntry>,
	history_index: usize,
	jumps: Vec<ViewState>,
	jump_index: usize,
	events: SessionEventRegistry,
	/// Last cursor position reported to subscribers.
	reported: (Path, usize),
}

impl Session {
	/// Opens a session over `document`, restoring the persisted view root
	/// and creating an initial empty row when the view is empty. The cursor
	/// starts on the first visible row.
	pub async fn new(mut document: Document) -> Result<Self> {
		let view_root = document.load_view_root().await?.unwrap_or_else(Path::root);
		let first = match document.get_children(view_root.row()).await?.first() {
			Some(&row) => row,
			None => {
				let row = document.new_row().await?;
				document.attach(row, view_root.row(), 0).await?;
				row
			}
		};
		let cursor = Cursor::new(view_root.child(first)?);
		let reported = (cursor.path.clone(), cursor.col);
		Ok(Self {
			document,
			cursor,
			anchor: None,
			register: Register::new(),
			view_root,
			search_buffer: String::new(),
			save_enabled: true,
			mode: ModeId::Normal,
			mutations: Vec::new(),
			history: vec![HistoryEntry::at(0)],
			history_index: 0,
			jumps: Vec::new(),
			jump_index: 0,
			events: SessionEventRegistry::new(),
			reported,
		})
	}

	pub fn mode(&self) -> ModeId {
		self.mode
	}

	/// Whether the cursor sits between characters, so it may rest one past
	/// the last one.
	pub fn past_end(&self) -> bool {
		self.mode.behavior().cursor_between
	}

	/// Registers a session observer; see [`SessionEvent`] for what it sees.
	pub fn subscribe(&mut self, handler: impl Fn(&SessionEvent<'_>) + Send + 'static) {
		self.events.subscribe(handler);
	}

	/// Reports cursor movement since the last call to subscribers. The
	/// cursor is a plain value, so changes are detected by position at
	/// command boundaries rather than intercepted per assignment.
	pub fn flush_cursor_events(&mut self) {
		if !self.cursor.path.is(&self.reported.0) {
			self.events
				.emit(&SessionEvent::CursorRowChanged { path: &self.cursor.path });
			self.reported.0 = self.cursor.path.clone();
		}
		if self.cursor.col != self.reported.1 {
			self.events.emit(&SessionEvent::CursorColChanged { col: self.cursor.col });
			self.reported.1 = self.cursor.col;
		}
	}

	/// Switches mode: the old mode's exit hook runs, then the new mode's
	/// enter hook, then subscribers are notified.
	pub async fn set_mode(&mut self, mode: ModeId) -> Result<()> {
		if mode == self.mode {
			return Ok(());
		}
		trace!(from = self.mode.name(), to = mode.name(), "mode change");
		self.run_exit_hook().await?;
		let from = self.mode;
		self.mode = mode;
		self.run_enter_hook().await?;
		self.events.emit(&SessionEvent::ModeChanged { from, to: mode });
		Ok(())
	}

	/// Per-mode exit adjustments, keyed on the mode being left.
	async fn run_exit_hook(&mut self) -> Result<()> {
		match self.mode {
			// Leaving insert steps back onto the last character, like vim.
			ModeId::Insert => self.cursor.clamp(&mut self.document, false).await?,
			ModeId::Visual | ModeId::VisualLine => self.anchor = None,
			_ => {}
		}
		Ok(())
	}

	/// Per-mode entry setup, keyed on the mode being entered.
	async fn run_enter_hook(&mut self) -> Result<()> {
		match self.mode {
			ModeId::Visual | ModeId::VisualLine => self.anchor = Some(self.cursor.clone()),
			ModeId::Search => self.search_buffer.clear(),
			_ => {}
		}
		Ok(())
	}

	/// Number of committed undo checkpoints behind the current position.
	pub fn checkpoint_count(&self) -> usize {
		self.history_index
	}

	pub fn view_state(&self) -> ViewState {
		ViewState {
			cursor_path: self.cursor.path.clone(),
			cursor_col: self.cursor.col,
			view_root: self.view_root.clone(),
		}
	}

	async fn restore_view_state(&mut self, state: &ViewState) -> Result<bool> {
		if !self.document.is_attached(state.view_root.row()).await?
			|| !self.document.is_attached(state.cursor_path.row()).await?
		{
			return Ok(false);
		}
		self.view_root = state.view_root.clone();
		self.cursor.set_position(state.cursor_path.clone(), state.cursor_col);
		let past_end = self.past_end();
		self.cursor.clamp(&mut self.document, past_end).await?;
		Ok(true)
	}

	// ------------------------------------------------------------------
	// Mutation log and undo history
	// ------------------------------------------------------------------

	/// Validates and applies `mutation`, appending it to the log.
	///
	/// Returns `Ok(false)` when validation rejects it; the document and the
	/// log are untouched in that case.
	pub async fn apply(&mut self, mut mutation: Mutation) -> Result<bool> {
		// Anything redoable is forfeited by a fresh edit.
		if self.history_index + 1 < self.history.len() {
			self.history.truncate(self.history_index + 1);
			self.mutations.truncate(self.history[self.history_index].index);
		}
		if !mutation.validate(&mut self.document).await? {
			debug!(?mutation, "mutation rejected");
			return Ok(false);
		}
		let entry = &mut self.history[self.history_index];
		if self.mutations.len() == entry.index {
			// First mutation of a new burst; remember where the cursor was.
			entry.before = Some(ViewState {
				cursor_path: self.cursor.path.clone(),
				cursor_col: self.cursor.col,
				view_root: self.view_root.clone(),
			});
		}
		mutation.mutate(&mut self.document, &mut self.cursor).await?;
		self.mutations.push(mutation);
		Ok(true)
	}

	/// Commits the pending burst as one undo checkpoint. Idempotent when
	/// nothing has mutated since the last save, a no-op during macro playback.
	pub fn save(&mut self) {
		if !self.save_enabled {
			return;
		}
		// A pending burst only ever exists at the tip; after an undo there
		// is nothing to commit.
		if self.history_index + 1 != self.history.len() {
			return;
		}
		let entry = &mut self.history[self.history_index];
		if self.mutations.len() == entry.index {
			return;
		}
		entry.after = Some(ViewState {
			cursor_path: self.cursor.path.clone(),
			cursor_col: self.cursor.col,
			view_root: self.view_root.clone(),
		});
		self.history.push(HistoryEntry::at(self.mutations.len()));
		self.history_index += 1;
	}

	/// Rewinds the most recent checkpoint, restoring the view state from
	/// before its first mutation.
	pub async fn undo(&mut self) -> Result<()> {
		self.save();
		if self.history_index == 0 {
			return Ok(());
		}
		let end = self.history[self.history_index].index;
		self.history_index -= 1;
		let target = self.history[self.history_index].clone();
		let Session {
			document,
			cursor,
			mutations,
			..
		} = self;
		for j in (target.index..end).rev() {
			for mut inverse in mutations[j].rewind()? {
				inverse.mutate(document, cursor).await?;
			}
		}
		debug!(count = end - target.index, "undid mutations");
		if let Some(before) = &target.before {
			self.restore_view_state(before).await?;
		}
		Ok(())
	}

	/// Replays the next checkpoint. Every mutation is re-validated first; a
	/// mutation that no longer applies is a hard error, since replaying part
	/// of a burst would leave the document inconsistent.
	pub async fn redo(&mut self) -> Result<()> {
		if self.history_index + 1 >= self.history.len() {
			return Ok(());
		}
		let replayed = self.history[self.history_index].clone();
		self.history_index += 1;
		let end = self.history[self.history_index].index;
		let Session {
			document,
			cursor,
			mutations,
			..
		} = self;
		for j in replayed.index..end {
			if !mutations[j].validate(document).await? {
				return Err(Error::StaleMutation(format!(
					"mutation {j} no longer applies"
				)));
			}
			mutations[j].remutate(document, cursor).await?;
		}
		debug!(count = end - replayed.index, "redid mutations");
		if let Some(after) = &replayed.after {
			self.restore_view_state(after).await?;
		}
		Ok(())
	}

	// ------------------------------------------------------------------
	// Character edits
	// ------------------------------------------------------------------

	pub async fn add_chars_at_cursor(&mut self, chars: Line) -> Result<()> {
		self.apply(Mutation::AddChars {
			row: self.cursor.path.row(),
			col: self.cursor.col,
			chars,
		})
		.await?;
		Ok(())
	}

	/// Deletes up to `count` characters left of the cursor (backspace, `X`).
	pub async fn del_chars_before_cursor(&mut self, count: usize, yank: bool) -> Result<()> {
		let n = count.min(self.cursor.col);
		if n == 0 {
			return Ok(());
		}
		let row = self.cursor.path.row();
		let col = self.cursor.col - n;
		if yank {
			let line = self.document.get_line(row).await?;
			self.register.save_chars(line[col..col + n].to_vec());
		}
		self.apply(Mutation::DelChars {
			row,
			col,
			count: n,
			deleted: None,
		})
		.await?;
		Ok(())
	}

	/// Deletes up to `count` characters at and after the cursor (`x`).
	pub async fn del_chars_after_cursor(&mut self, count: usize, yank: bool) -> Result<()> {
		let row = self.cursor.path.row();
		let len = self.document.line_length(row).await?;
		let n = count.min(len.saturating_sub(self.cursor.col));
		if n == 0 {
			return Ok(());
		}
		if yank {
			let line = self.document.get_line(row).await?;
			self.register
				.save_chars(line[self.cursor.col..self.cursor.col + n].to_vec());
		}
		self.apply(Mutation::DelChars {
			row,
			col: self.cursor.col,
			count: n,
			deleted: None,
		})
		.await?;
		Ok(())
	}

	/// Deletes the span between `from` and the cursor column, exclusive of
	/// whichever end is rightmost when `inclusive` is false. Used by
	/// `d<motion>` within a row and by visual-mode delete.
	pub async fn del_chars_between(&mut self, from: usize, inclusive: bool, yank: bool) -> Result<()> {
		let (lo, hi) = if from <= self.cursor.col {
			(from, self.cursor.col)
		} else {
			(self.cursor.col, from)
		};
		let count = hi - lo + usize::from(inclusive);
		let row = self.cursor.path.row();
		let len = self.document.line_length(row).await?;
		let count = count.min(len.saturating_sub(lo));
		if count == 0 {
			return Ok(());
		}
		if yank {
			let line = self.document.get_line(row).await?;
			self.register.save_chars(line[lo..lo + count].to_vec());
		}
		self.apply(Mutation::DelChars {
			row,
			col: lo,
			count,
			deleted: None,
		})
		.await?;
		Ok(())
	}

	/// Deletes from the cursor to the end of the line (`D`).
	pub async fn del_chars_to_eol(&mut self, yank: bool) -> Result<()> {
		let len = self.document.line_length(self.cursor.path.row()).await?;
		self.del_chars_after_cursor(len.saturating_sub(self.cursor.col), yank)
			.await
	}

	// ------------------------------------------------------------------
	// Row edits
	// ------------------------------------------------------------------

	fn cursor_parent(&self) -> Result<Path> {
		self.cursor
			.path
			.parent()
			.cloned()
			.ok_or_else(|| Error::invariant("cursor is at the root".to_string()))
	}

	async fn cursor_index(&mut self) -> Result<usize> {
		let parent = self.cursor_parent()?;
		self.document
			.child_index(parent.row(), self.cursor.path.row())
			.await?
			.ok_or_else(|| Error::invariant(format!("cursor path {} is stale", self.cursor.path)))
	}

	/// Insertion point below the cursor row: its first child slot when its
	/// children are visible, otherwise the next sibling slot.
	async fn below_insertion(&mut self) -> Result<(Path, usize)> {
		let path = self.cursor.path.clone();
		if self.document.has_children(&path).await?
			&& self.document.is_expanded(&path, &self.view_root).await?
		{
			Ok((path, 0))
		} else {
			let index = self.cursor_index().await?;
			Ok((self.cursor_parent()?, index + 1))
		}
	}

	/// `o`: opens an empty row below the cursor and moves onto it.
	pub async fn new_row_below(&mut self) -> Result<()> {
		let (parent, index) = self.below_insertion().await?;
		self.insert_new_row(parent, index).await
	}

	/// `O`: opens an empty row above the cursor and moves onto it.
	pub async fn new_row_above(&mut self) -> Result<()> {
		let index = self.cursor_index().await?;
		let parent = self.cursor_parent()?;
		self.insert_new_row(parent, index).await
	}

	async fn insert_new_row(&mut self, parent: Path, index: usize) -> Result<()> {
		let row = self.document.new_row().await?;
		self.apply(Mutation::AttachBlocks {
			parent: parent.row(),
			rows: vec![row],
			index,
		})
		.await?;
		self.cursor.set_position(parent.child(row)?, 0);
		Ok(())
	}

	/// Enter in insert mode: the text right of the cursor moves to a fresh
	/// row below.
	pub async fn split_line_at_cursor(&mut self) -> Result<()> {
		let row = self.cursor.path.row();
		let line = self.document.get_line(row).await?;
		let tail: Line = line[self.cursor.col.min(line.len())..].to_vec();
		if !tail.is_empty() {
			self.apply(Mutation::DelChars {
				row,
				col: self.cursor.col,
				count: tail.len(),
				deleted: None,
			})
			.await?;
		}
		let (parent, index) = self.below_insertion().await?;
		let new_row = self.document.new_row().await?;
		self.apply(Mutation::AttachBlocks {
			parent: parent.row(),
			rows: vec![new_row],
			index,
		})
		.await?;
		if !tail.is_empty() {
			self.apply(Mutation::SetLine {
				row: new_row,
				line: tail,
				old: None,
			})
			.await?;
		}
		self.cursor.set_position(parent.child(new_row)?, 0);
		Ok(())
	}

	/// `J`: joins the next visible row onto the cursor row. Its children are
	/// moved to the end of the cursor row's children.
	pub async fn join_row_below(&mut self) -> Result<()> {
		let Some(below) = self.document.next_visible(&self.cursor.path, &self.view_root).await?
		else {
			return Ok(());
		};
		let row = self.cursor.path.row();
		let below_row = below.row();
		let below_parent = below
			.parent()
			.ok_or_else(|| Error::invariant("visible row without parent".to_string()))?;

		let mut line = self.document.get_line(row).await?;
		let below_line = self.document.get_line(below_row).await?;
		let join_col = line.len();
		if !line.is_empty() && !below_line.is_empty() {
			line.push(Char::plain(' '));
		}
		line.extend(below_line);

		for child in self.document.get_children(below_row).await? {
			let index = self.document.get_children(row).await?.len();
			self.apply(Mutation::MoveBlock {
				row: child,
				old_parent: below_row,
				new_parent: row,
				index,
				old_index: None,
			})
			.await?;
		}
		self.apply(Mutation::DetachBlocks {
			parent: below_parent.row(),
			rows: vec![below_row],
			indices: None,
		})
		.await?;
		self.apply(Mutation::SetLine {
			row,
			line,
			old: None,
		})
		.await?;
		self.cursor.set_col(join_col);
		Ok(())
	}

	// ------------------------------------------------------------------
	// Block operations
	// ------------------------------------------------------------------

	/// The `count` consecutive siblings starting at the cursor row, clamped
	/// to the end of the sibling list.
	async fn sibling_range(&mut self, count: usize) -> Result<(Path, usize, usize)> {
		let parent = self.cursor_parent()?;
		let index = self.cursor_index().await?;
		let len = self.document.get_children(parent.row()).await?.len();
		let hi = (index + count.max(1) - 1).min(len.saturating_sub(1));
		Ok((parent, index, hi))
	}

	/// `dd`: deletes whole blocks, yanking them first.
	pub async fn delete_blocks(&mut self, count: usize) -> Result<()> {
		let (parent, lo, hi) = self.sibling_range(count).await?;
		self.delete_block_range(&parent, lo, hi).await
	}

	/// Deletes `parent`'s children in `lo..=hi`, yanking them serialized.
	pub async fn delete_block_range(&mut self, parent: &Path, lo: usize, hi: usize) -> Result<()> {
		let children = self.document.get_children(parent.row()).await?;
		if children.is_empty() || lo >= children.len() {
			return Ok(());
		}
		let rows: Vec<Row> = children[lo..=hi.min(children.len() - 1)].to_vec();
		let blocks = self.document.serialize_rows(&rows).await?;
		self.register.save_serialized_rows(blocks);
		self.apply(Mutation::DetachBlocks {
			parent: parent.row(),
			rows,
			indices: None,
		})
		.await?;

		let remaining = self.document.get_children(parent.row()).await?;
		if let Some(&row) = remaining.get(lo).or(remaining.last()) {
			self.cursor.set_position(parent.child(row)?, 0);
		} else if parent.is(&self.view_root) {
			// The view emptied out entirely; keep one row to stand on.
			self.insert_new_row(parent.clone(), 0).await?;
		} else {
			self.cursor.set_position(parent.clone(), 0);
		}
		let past_end = self.past_end();
		self.cursor.clamp(&mut self.document, past_end).await?;
		Ok(())
	}

	/// `yy`: yanks blocks serialized, so paste creates fresh rows.
	pub async fn yank_blocks(&mut self, count: usize) -> Result<()> {
		let (parent, lo, hi) = self.sibling_range(count).await?;
		self.yank_block_range(&parent, lo, hi).await
	}

	pub async fn yank_block_range(&mut self, parent: &Path, lo: usize, hi: usize) -> Result<()> {
		let children = self.document.get_children(parent.row()).await?;
		if children.is_empty() || lo >= children.len() {
			return Ok(());
		}
		let rows: Vec<Row> = children[lo..=hi.min(children.len() - 1)].to_vec();
		let blocks = self.document.serialize_rows(&rows).await?;
		self.register.save_serialized_rows(blocks);
		Ok(())
	}

	/// Yanks row ids, so paste attaches the same rows as clones.
	pub async fn clone_blocks(&mut self, count: usize) -> Result<()> {
		let (parent, lo, hi) = self.sibling_range(count).await?;
		self.clone_block_range(&parent, lo, hi).await
	}

	pub async fn clone_block_range(&mut self, parent: &Path, lo: usize, hi: usize) -> Result<()> {
		let children = self.document.get_children(parent.row()).await?;
		if children.is_empty() || lo >= children.len() {
			return Ok(());
		}
		let rows: Vec<Row> = children[lo..=hi.min(children.len() - 1)].to_vec();
		self.register.save_cloned_rows(rows);
		Ok(())
	}

	/// `p` / `P`: pastes the register. What happens depends on what was
	/// yanked; see [`RegisterContent`].
	pub async fn paste(&mut self, direction: Direction) -> Result<()> {
		match self.register.content().clone() {
			RegisterContent::None => Ok(()),
			RegisterContent::Chars(chars) => {
				if chars.is_empty() {
					return Ok(());
				}
				let len = self.document.line_length(self.cursor.path.row()).await?;
				let col = match direction {
					Direction::After => (self.cursor.col + 1).min(len),
					Direction::Before => self.cursor.col,
				};
				let end = col + chars.len() - 1;
				self.apply(Mutation::AddChars {
					row: self.cursor.path.row(),
					col,
					chars,
				})
				.await?;
				self.cursor.set_col(end);
				Ok(())
			}
			RegisterContent::SerializedRows(blocks) => {
				let rows = self.document.instantiate(&blocks).await?;
				self.paste_rows(rows, direction).await
			}
			RegisterContent::ClonedRows(rows) => self.paste_rows(rows, direction).await,
		}
	}

	async fn paste_rows(&mut self, rows: Vec<Row>, direction: Direction) -> Result<()> {
		if rows.is_empty() {
			return Ok(());
		}
		let (parent, index) = match direction {
			Direction::After => self.below_insertion().await?,
			Direction::Before => {
				let index = self.cursor_index().await?;
				(self.cursor_parent()?, index)
			}
		};
		let first = rows[0];
		// A clone paste that would make a row its own ancestor fails
		// validation and is dropped silently.
		if self
			.apply(Mutation::AttachBlocks {
				parent: parent.row(),
				rows,
				index,
			})
			.await?
		{
			self.cursor.set_position(parent.child(first)?, 0);
		}
		Ok(())
	}

	// ------------------------------------------------------------------
	// Structure
	// ------------------------------------------------------------------

	/// `z`: collapses or expands the cursor row.
	pub async fn toggle_collapse(&mut self) -> Result<()> {
		let row = self.cursor.path.row();
		if !self.document.has_children(&self.cursor.path).await? {
			return Ok(());
		}
		self.apply(Mutation::ToggleCollapse { row }).await?;
		Ok(())
	}

	/// Tab: moves the cursor block under its previous sibling.
	pub async fn indent_block(&mut self) -> Result<()> {
		let parent = self.cursor_parent()?;
		let Some(prev) = self.document.prev_sibling(&self.cursor.path).await? else {
			return Ok(());
		};
		let index = self.document.get_children(prev.row()).await?.len();
		self.apply(Mutation::MoveBlock {
			row: self.cursor.path.row(),
			old_parent: parent.row(),
			new_parent: prev.row(),
			index,
			old_index: None,
		})
		.await?;
		Ok(())
	}

	/// Shift-tab: moves the cursor block to just after its parent.
	pub async fn outdent_block(&mut self) -> Result<()> {
		let parent = self.cursor_parent()?;
		if parent.is(&self.view_root) {
			return Ok(());
		}
		let grandparent = parent
			.parent()
			.ok_or_else(|| Error::invariant("parent of non-root path missing".to_string()))?;
		let parent_index = self
			.document
			.child_index(grandparent.row(), parent.row())
			.await?
			.ok_or_else(|| Error::invariant(format!("path {parent} is stale")))?;
		self.apply(Mutation::MoveBlock {
			row: self.cursor.path.row(),
			old_parent: parent.row(),
			new_parent: grandparent.row(),
			index: parent_index + 1,
			old_index: None,
		})
		.await?;
		Ok(())
	}

	/// Swaps the cursor block with the sibling `offset` away (`ctrl+j`,
	/// `ctrl+k` in the original keymap).
	pub async fn swap_block(&mut self, offset: isize) -> Result<()> {
		let parent = self.cursor_parent()?;
		let index = self.cursor_index().await?;
		let len = self.document.get_children(parent.row()).await?.len();
		let Some(target) = index.checked_add_signed(offset).filter(|&t| t < len) else {
			return Ok(());
		};
		self.apply(Mutation::MoveBlock {
			row: self.cursor.path.row(),
			old_parent: parent.row(),
			new_parent: parent.row(),
			index: if offset > 0 { target + 1 } else { target },
			old_index: None,
		})
		.await?;
		Ok(())
	}

	// ------------------------------------------------------------------
	// Visual selection
	// ------------------------------------------------------------------

	/// Resolves the visual-line selection to a contiguous sibling range.
	///
	/// When cursor and anchor sit at different depths, the selection walks
	/// both paths up to their deepest common ancestor and spans the two
	/// diverging children; an ancestor/descendant pair collapses to the
	/// shallower row alone.
	pub async fn visual_line_range(&mut self) -> Result<(Path, usize, usize)> {
		let anchor = self
			.anchor
			.clone()
			.ok_or_else(|| Error::invariant("no visual anchor".to_string()))?;
		let a = self.cursor.path.chain();
		let b = anchor.path.chain();
		let mut i = 0;
		while i < a.len() && i < b.len() && a[i].row() == b[i].row() {
			i += 1;
		}
		let (parent, first, second) = if i == a.len() || i == b.len() {
			// One endpoint is an ancestor of the other (or they coincide);
			// only the shallower row is selected.
			let shallow = if a.len() <= b.len() { &a } else { &b };
			let path = shallow[shallow.len() - 1].clone();
			let parent = path
				.parent()
				.ok_or_else(|| Error::invariant("selection at root".to_string()))?;
			(parent.clone(), path.row(), path.row())
		} else {
			(a[i - 1].clone(), a[i].row(), b[i].row())
		};
		let lo = self
			.document
			.child_index(parent.row(), first)
			.await?
			.ok_or_else(|| Error::invariant("selection endpoint is stale".to_string()))?;
		let hi = self
			.document
			.child_index(parent.row(), second)
			.await?
			.ok_or_else(|| Error::invariant("selection endpoint is stale".to_string()))?;
		Ok((parent, lo.min(hi), lo.max(hi)))
	}

	// ------------------------------------------------------------------
	// Zoom and jumps
	// ------------------------------------------------------------------

	fn record_jump(&mut self) {
		self.jumps.truncate(self.jump_index);
		self.jumps.push(self.view_state());
		self.jump_index = self.jumps.len();
	}

	/// Zooms the view into the cursor row. An empty subtree gets a fresh row
	/// so the view always has something visible; that filler is not undoable.
	pub async fn zoom_in(&mut self) -> Result<()> {
		self.record_jump();
		let root = self.cursor.path.clone();
		let first = match self.document.get_children(root.row()).await?.first() {
			Some(&row) => row,
			None => {
				let row = self.document.new_row().await?;
				self.document.attach(row, root.row(), 0).await?;
				row
			}
		};
		self.cursor.set_position(root.child(first)?, 0);
		self.view_root = root;
		self.document.save_view_root(&self.view_root.clone()).await?;
		Ok(())
	}

	/// Zooms out one level; the cursor stays where it is.
	pub async fn zoom_out(&mut self) -> Result<()> {
		let Some(parent) = self.view_root.parent().cloned() else {
			return Ok(());
		};
		self.record_jump();
		self.view_root = parent;
		self.document.save_view_root(&self.view_root.clone()).await?;
		Ok(())
	}

	/// Zooms all the way out to the document root.
	pub async fn zoom_root(&mut self) -> Result<()> {
		if self.view_root.is_root() {
			return Ok(());
		}
		self.record_jump();
		self.view_root = Path::root();
		self.document.save_view_root(&Path::root()).await?;
		Ok(())
	}

	/// `ctrl+o`: steps back through the jump list, skipping entries whose
	/// rows have since been detached.
	pub async fn jump_previous(&mut self) -> Result<()> {
		if self.jump_index == self.jumps.len() {
			// Entering history; remember where we are so jump_next returns.
			self.jumps.push(self.view_state());
		}
		while self.jump_index > 0 {
			self.jump_index -= 1;
			let state = self.jumps[self.jump_index].clone();
			if self.restore_view_state(&state).await? {
				return Ok(());
			}
		}
		Ok(())
	}

	/// `ctrl+i`: steps forward through the jump list.
	pub async fn jump_next(&mut self) -> Result<()> {
		while self.jump_index + 1 < self.jumps.len() {
			self.jump_index += 1;
			let state = self.jumps[self.jump_index].clone();
			if self.restore_view_state(&state).await? {
				return Ok(());
			}
		}
		Ok(())
	}

	// ------------------------------------------------------------------
	// Search
	// ------------------------------------------------------------------

	/// Results for the pending search buffer, as canonical paths.
	pub async fn search_results(&mut self, limit: usize) -> Result<Vec<Path>> {
		let query = self.search_buffer.clone();
		self.document.search_paths(&query, limit).await
	}

	/// Accepts the search: jumps to the first match, if any.
	pub async fn accept_search(&mut self) -> Result<()> {
		let results = self.search_results(1).await?;
		if let Some(path) = results.into_iter().next() {
			self.record_jump();
			self.view_root = Path::root();
			self.cursor.set_position(path, 0);
		}
		Ok(())
	}
}
