//! Path-based navigation with collapse-aware visibility.
//!
//! "Visible" is relative to a view root (the zoom target): the view root
//! itself always counts as expanded, and children of a collapsed row are
//! skipped. The cursor layer is written entirely in terms of these queries.

use loft_primitives::Result;

use crate::Document;
use crate::path::Path;

impl Document {
	/// Child paths of `path`, in order.
	pub async fn get_children_paths(&mut self, path: &Path) -> Result<Vec<Path>> {
		let children = self.get_children(path.row()).await?;
		let mut out = Vec::with_capacity(children.len());
		for row in children {
			out.push(path.child(row)?);
		}
		Ok(out)
	}

	pub async fn has_children(&mut self, path: &Path) -> Result<bool> {
		Ok(!self.get_info(path.row()).await?.child_rows.is_empty())
	}

	/// Whether `path`'s children are shown. The view root is always open.
	pub async fn is_expanded(&mut self, path: &Path, view_root: &Path) -> Result<bool> {
		if path.is(view_root) {
			return Ok(true);
		}
		Ok(!self.is_collapsed(path.row()).await?)
	}

	pub async fn first_child(&mut self, path: &Path) -> Result<Option<Path>> {
		let children = self.get_children(path.row()).await?;
		match children.first() {
			None => Ok(None),
			Some(&row) => Ok(Some(path.child(row)?)),
		}
	}

	pub async fn next_sibling(&mut self, path: &Path) -> Result<Option<Path>> {
		self.sibling_at_offset(path, 1).await
	}

	pub async fn prev_sibling(&mut self, path: &Path) -> Result<Option<Path>> {
		self.sibling_at_offset(path, -1).await
	}

	async fn sibling_at_offset(&mut self, path: &Path, offset: isize) -> Result<Option<Path>> {
		let Some(parent) = path.parent() else {
			return Ok(None);
		};
		let children = self.get_children(parent.row()).await?;
		let Some(index) = children.iter().position(|&c| c == path.row()) else {
			return Ok(None);
		};
		let Some(target) = index.checked_add_signed(offset) else {
			return Ok(None);
		};
		match children.get(target) {
			None => Ok(None),
			Some(&row) => Ok(Some(parent.child(row)?)),
		}
	}

	/// First visible row under the view root, in document order.
	pub async fn first_visible(&mut self, view_root: &Path) -> Result<Option<Path>> {
		self.first_child(view_root).await
	}

	/// Deepest last descendant of `path` that is visible.
	pub async fn last_visible_in(&mut self, path: &Path, view_root: &Path) -> Result<Path> {
		let mut cur = path.clone();
		loop {
			if !self.is_expanded(&cur, view_root).await? {
				return Ok(cur);
			}
			let children = self.get_children(cur.row()).await?;
			match children.last() {
				None => return Ok(cur),
				Some(&row) => cur = cur.child(row)?,
			}
		}
	}

	/// Last visible row under the view root.
	pub async fn last_visible(&mut self, view_root: &Path) -> Result<Option<Path>> {
		let last = self.last_visible_in(view_root, view_root).await?;
		if last.is(view_root) { Ok(None) } else { Ok(Some(last)) }
	}

	/// The row after `path` in visible document order, `None` at the end.
	pub async fn next_visible(&mut self, path: &Path, view_root: &Path) -> Result<Option<Path>> {
		if self.is_expanded(path, view_root).await?
			&& let Some(child) = self.first_child(path).await?
		{
			return Ok(Some(child));
		}
		let mut cur = path.clone();
		loop {
			if cur.is(view_root) {
				return Ok(None);
			}
			if let Some(sibling) = self.next_sibling(&cur).await? {
				return Ok(Some(sibling));
			}
			match cur.parent() {
				None => return Ok(None),
				Some(parent) => cur = parent.clone(),
			}
		}
	}

	/// The row before `path` in visible document order, `None` at the top.
	pub async fn prev_visible(&mut self, path: &Path, view_root: &Path) -> Result<Option<Path>> {
		if let Some(sibling) = self.prev_sibling(path).await? {
			return Ok(Some(self.last_visible_in(&sibling, view_root).await?));
		}
		match path.parent() {
			Some(parent) if !parent.is(view_root) => Ok(Some(parent.clone())),
			_ => Ok(None),
		}
	}
}
