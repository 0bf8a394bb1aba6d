//! The cursor: a (path, column) pointer with vim-style motion primitives.
//!
//! All motions are expressed purely in terms of [`Document`] queries (line
//! contents, visible-order traversal); the cursor never touches the store.
//! `move_col` remembers the intended column across vertical motion even when
//! intermediate rows are shorter; negative values count from the end of the
//! line, which is what keeps `$` tracking line ends while moving vertically.

use std::sync::LazyLock;

use loft_document::{Document, Path};
use loft_primitives::{Char, Line, Result};
use regex::Regex;

static WORD_CHAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w$").unwrap());

/// Character class for word motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordClass {
	Whitespace,
	Word,
	Other,
}

/// `big` switches to whitespace-delimited classification (`W`/`B`/`E`).
fn classify(c: Char, big: bool) -> WordClass {
	if c.ch.is_whitespace() {
		WordClass::Whitespace
	} else if big || WORD_CHAR.is_match(c.ch.encode_utf8(&mut [0u8; 4])) {
		WordClass::Word
	} else {
		WordClass::Other
	}
}

/// A (path, column) pointer into the document.
#[derive(Debug, Clone)]
pub struct Cursor {
	pub path: Path,
	pub col: usize,
	/// Intended column for vertical motion; negative counts from line end
	/// (`-1` = last column).
	move_col: isize,
}

impl Cursor {
	pub fn new(path: Path) -> Self {
		Self {
			path,
			col: 0,
			move_col: 0,
		}
	}

	/// Moves to an explicit position, remembering the column.
	pub fn set_position(&mut self, path: Path, col: usize) {
		self.path = path;
		self.set_col(col);
	}

	/// Sets the column, remembering it for vertical motion.
	pub fn set_col(&mut self, col: usize) {
		self.col = col;
		self.move_col = col as isize;
	}

	async fn line(&self, doc: &mut Document) -> Result<Line> {
		doc.get_line(self.path.row()).await
	}

	fn max_col(len: usize, past_end: bool) -> usize {
		if len == 0 {
			0
		} else {
			len - 1 + usize::from(past_end)
		}
	}

	/// Clamps the column into the current line.
	pub async fn clamp(&mut self, doc: &mut Document, past_end: bool) -> Result<()> {
		let len = doc.line_length(self.path.row()).await?;
		self.col = self.col.min(Self::max_col(len, past_end));
		Ok(())
	}

	fn apply_move_col(&mut self, len: usize, past_end: bool) {
		let max = Self::max_col(len, past_end);
		if self.move_col < 0 {
			let from_end = len as isize + self.move_col + isize::from(past_end);
			self.col = from_end.clamp(0, max as isize) as usize;
		} else {
			self.col = (self.move_col as usize).min(max);
		}
	}

	pub async fn left(&mut self, _doc: &mut Document) -> Result<()> {
		if self.col > 0 {
			self.set_col(self.col - 1);
		}
		Ok(())
	}

	pub async fn right(&mut self, doc: &mut Document, past_end: bool) -> Result<()> {
		let len = doc.line_length(self.path.row()).await?;
		if self.col < Self::max_col(len, past_end) {
			self.set_col(self.col + 1);
		}
		Ok(())
	}

	pub fn home(&mut self) {
		self.set_col(0);
	}

	pub async fn end(&mut self, doc: &mut Document, past_end: bool) -> Result<()> {
		let len = doc.line_length(self.path.row()).await?;
		self.col = Self::max_col(len, past_end);
		self.move_col = -1;
		Ok(())
	}

	pub async fn up(&mut self, doc: &mut Document, view_root: &Path, past_end: bool) -> Result<()> {
		if let Some(prev) = doc.prev_visible(&self.path, view_root).await? {
			let len = doc.line_length(prev.row()).await?;
			self.path = prev;
			self.apply_move_col(len, past_end);
		}
		Ok(())
	}

	pub async fn down(&mut self, doc: &mut Document, view_root: &Path, past_end: bool) -> Result<()> {
		if let Some(next) = doc.next_visible(&self.path, view_root).await? {
			let len = doc.line_length(next.row()).await?;
			self.path = next;
			self.apply_move_col(len, past_end);
		}
		Ok(())
	}

	/// Jumps to the first visible row under the view root.
	pub async fn visible_home(&mut self, doc: &mut Document, view_root: &Path) -> Result<()> {
		if let Some(first) = doc.first_visible(view_root).await? {
			self.path = first;
			self.set_col(0);
		}
		Ok(())
	}

	/// Jumps to the last visible row under the view root.
	pub async fn visible_end(
		&mut self,
		doc: &mut Document,
		view_root: &Path,
		past_end: bool,
	) -> Result<()> {
		if let Some(last) = doc.last_visible(view_root).await? {
			self.path = last;
			self.clamp(doc, past_end).await?;
			self.move_col = self.col as isize;
		}
		Ok(())
	}

	/// `w` / `W`: start of the next word, crossing rows.
	pub async fn next_word(
		&mut self,
		doc: &mut Document,
		view_root: &Path,
		big: bool,
	) -> Result<()> {
		let line = self.line(doc).await?;
		let mut i = self.col;
		if i < line.len() {
			let cls = classify(line[i], big);
			if cls != WordClass::Whitespace {
				while i < line.len() && classify(line[i], big) == cls {
					i += 1;
				}
			}
			while i < line.len() && classify(line[i], big) == WordClass::Whitespace {
				i += 1;
			}
			if i < line.len() {
				self.set_col(i);
				return Ok(());
			}
		}
		if let Some(next) = doc.next_visible(&self.path, view_root).await? {
			let line = doc.get_line(next.row()).await?;
			self.path = next;
			let first = line
				.iter()
				.position(|&c| classify(c, big) != WordClass::Whitespace)
				.unwrap_or(0);
			self.set_col(first);
		} else {
			self.end(doc, false).await?;
		}
		Ok(())
	}

	/// `e` / `E`: end of the next word, crossing rows.
	pub async fn end_word(&mut self, doc: &mut Document, view_root: &Path, big: bool) -> Result<()> {
		let mut line = self.line(doc).await?;
		let mut i = self.col + 1;
		loop {
			if i >= line.len() {
				let Some(next) = doc.next_visible(&self.path, view_root).await? else {
					self.end(doc, false).await?;
					return Ok(());
				};
				line = doc.get_line(next.row()).await?;
				self.path = next;
				i = 0;
				continue;
			}
			if classify(line[i], big) == WordClass::Whitespace {
				i += 1;
				continue;
			}
			let cls = classify(line[i], big);
			while i + 1 < line.len() && classify(line[i + 1], big) == cls {
				i += 1;
			}
			self.set_col(i);
			return Ok(());
		}
	}

	/// `b` / `B`: start of the previous word, crossing rows.
	pub async fn prev_word(&mut self, doc: &mut Document, view_root: &Path, big: bool) -> Result<()> {
		let mut line = self.line(doc).await?;
		let mut i = self.col as isize - 1;
		loop {
			if i < 0 {
				let Some(prev) = doc.prev_visible(&self.path, view_root).await? else {
					self.set_col(0);
					return Ok(());
				};
				line = doc.get_line(prev.row()).await?;
				self.path = prev;
				i = line.len() as isize - 1;
				continue;
			}
			if classify(line[i as usize], big) == WordClass::Whitespace {
				i -= 1;
				continue;
			}
			let cls = classify(line[i as usize], big);
			while i > 0 && classify(line[i as usize - 1], big) == cls {
				i -= 1;
			}
			self.set_col(i as usize);
			return Ok(());
		}
	}

	/// `f`/`F`/`t`/`T`: find `ch` within the current line.
	///
	/// `offset` is applied to the found column (`-1` for `t`, `1` for `T`).
	pub async fn find_char(
		&mut self,
		doc: &mut Document,
		ch: char,
		backwards: bool,
		offset: isize,
	) -> Result<()> {
		let line = self.line(doc).await?;
		let found = if backwards {
			line[..self.col.min(line.len())]
				.iter()
				.rposition(|c| c.ch == ch)
		} else {
			let start = self.col + 1;
			if start >= line.len() {
				None
			} else {
				line[start..].iter().position(|c| c.ch == ch).map(|i| i + start)
			}
		};
		if let Some(found) = found {
			let target = found as isize + offset;
			if (0..line.len() as isize).contains(&target) {
				self.set_col(target as usize);
			}
		}
		Ok(())
	}
}
