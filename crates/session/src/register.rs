//! The yank buffer.
//!
//! Paste behavior is keyed off what was yanked: loose characters splice into
//! the current line, serialized rows re-instantiate fresh rows, and cloned
//! rows attach the existing rows as additional parents.

use loft_primitives::{Line, Row, SerializedBlock};

/// Contents of the register; exactly one variant is active at a time.
#[derive(Debug, Clone, Default)]
pub enum RegisterContent {
	#[default]
	None,
	/// Characters cut or copied from within a line.
	Chars(Line),
	/// Whole rows, exported; paste re-instantiates them with fresh ids.
	SerializedRows(Vec<SerializedBlock>),
	/// Row ids; paste attaches them as clones.
	ClonedRows(Vec<Row>),
}

/// The session's single yank register.
#[derive(Debug, Default)]
pub struct Register {
	content: RegisterContent,
}

impl Register {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn content(&self) -> &RegisterContent {
		&self.content
	}

	pub fn save_chars(&mut self, chars: Line) {
		self.content = RegisterContent::Chars(chars);
	}

	pub fn save_serialized_rows(&mut self, blocks: Vec<SerializedBlock>) {
		self.content = RegisterContent::SerializedRows(blocks);
	}

	pub fn save_cloned_rows(&mut self, rows: Vec<Row>) {
		self.content = RegisterContent::ClonedRows(rows);
	}

	pub fn is_empty(&self) -> bool {
		matches!(self.content, RegisterContent::None)
	}
}
