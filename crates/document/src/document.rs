//! The document tree API.
//!
//! Wraps [`Store`] + [`Cache`] + [`Path`] into the only sanctioned way to
//! read and mutate the row graph. All writes are write-through: store first,
//! then the cached record is replaced, then events fire. Structural edits
//! always update the child's parent-list and the parent's child-list
//! together, and a DAG guard on [`Document::attach`] rejects any edge that
//! would make a row its own ancestor; `serialize` and `all_ancestors`
//! depend on the graph staying acyclic.

use std::collections::VecDeque;
use std::sync::Arc;

use loft_primitives::{Error, Line, Result, Row, line_to_string};
use loft_store::Store;
use rustc_hash::FxHashSet;
use serde_json::Value;
use tracing::{debug, trace};

use crate::cache::{Cache, RowInfo};
use crate::events::{DocEvent, EventRegistry};
use crate::path::Path;
use crate::search::Searcher;

/// One open document: tree structure, text, cache, search index, events.
pub struct Document {
	pub(crate) store: Store,
	pub(crate) cache: Cache,
	searcher: Searcher,
	events: EventRegistry,
}

impl Document {
	pub fn new(store: Store) -> Self {
		Self {
			store,
			cache: Cache::new(),
			searcher: Searcher::new(),
			events: EventRegistry::new(),
		}
	}

	/// Registers a change observer. Handlers run in registration order.
	pub fn subscribe(&mut self, handler: impl Fn(&DocEvent<'_>) + Send + 'static) {
		self.events.subscribe(handler);
	}

	/// Drops the whole cache, forcing reloads. Blunt invalidation for
	/// side effects that bypassed the document API.
	pub fn clear_cache(&mut self) {
		self.cache.clear();
	}

	/// Cached info for `row`, loading all fields from the store in parallel
	/// on first access.
	pub async fn get_info(&mut self, row: Row) -> Result<Arc<RowInfo>> {
		if let Some(info) = self.cache.get(row) {
			return Ok(info);
		}
		let (line, collapsed, parents, children) = tokio::join!(
			self.store.get_line(row),
			self.store.get_collapsed(row),
			self.store.get_parents(row),
			self.store.get_children(row),
		);
		let info = RowInfo {
			row,
			line: line?,
			collapsed: collapsed?,
			parent_rows: parents?.into(),
			child_rows: children?.into(),
		};
		trace!(%row, "loaded row info");
		self.searcher.update(row, &line_to_string(&info.line));
		Ok(self.cache.set(info))
	}

	/// Assigns a fresh row with an empty record.
	pub async fn new_row(&mut self) -> Result<Row> {
		let row = self.store.new_row().await?;
		self.cache.set(RowInfo::empty(row));
		self.events.emit(&DocEvent::RowCreated { row });
		Ok(row)
	}

	pub async fn get_line(&mut self, row: Row) -> Result<Line> {
		Ok(self.get_info(row).await?.line.clone())
	}

	pub async fn get_text(&mut self, row: Row) -> Result<String> {
		Ok(line_to_string(&self.get_info(row).await?.line))
	}

	pub async fn line_length(&mut self, row: Row) -> Result<usize> {
		Ok(self.get_info(row).await?.line.len())
	}

	/// Replaces `row`'s line, reindexing search and notifying observers.
	pub async fn set_line(&mut self, row: Row, line: Line) -> Result<()> {
		self.store.set_line(row, &line).await?;
		self.searcher.update(row, &line_to_string(&line));
		if self.cache.update(row, |info| info.line = line.clone()).is_none() {
			// Not loaded yet; load so the cache and index stay warm.
			self.get_info(row).await?;
		}
		self.events.emit(&DocEvent::LineChanged { row, line: &line });
		Ok(())
	}

	pub async fn get_parents(&mut self, row: Row) -> Result<Vec<Row>> {
		Ok(self.get_info(row).await?.parent_rows.to_vec())
	}

	pub async fn get_children(&mut self, row: Row) -> Result<Vec<Row>> {
		Ok(self.get_info(row).await?.child_rows.to_vec())
	}

	pub async fn is_collapsed(&mut self, row: Row) -> Result<bool> {
		Ok(self.get_info(row).await?.collapsed)
	}

	pub async fn set_collapsed(&mut self, row: Row, collapsed: bool) -> Result<()> {
		self.store.set_collapsed(row, collapsed).await?;
		if self.cache.update(row, |info| info.collapsed = collapsed).is_none() {
			self.get_info(row).await?;
		}
		self.events.emit(&DocEvent::CollapsedChanged { row, collapsed });
		Ok(())
	}

	/// Position of `child` within `parent`'s child list.
	pub async fn child_index(&mut self, parent: Row, child: Row) -> Result<Option<usize>> {
		Ok(self
			.get_info(parent)
			.await?
			.child_rows
			.iter()
			.position(|&c| c == child))
	}

	/// Every ancestor of `row`, breadth-first, deduplicated.
	pub async fn all_ancestors(&mut self, row: Row, inclusive: bool) -> Result<Vec<Row>> {
		let mut seen = FxHashSet::default();
		let mut out = Vec::new();
		let mut queue = VecDeque::from([row]);
		seen.insert(row);
		if inclusive {
			out.push(row);
		}
		while let Some(cur) = queue.pop_front() {
			let parents = self.get_info(cur).await?.parent_rows.clone();
			for p in parents {
				if seen.insert(p) {
					out.push(p);
					queue.push_back(p);
				}
			}
		}
		Ok(out)
	}

	/// Single source of truth for reachability: the root is among the row's
	/// inclusive ancestors.
	pub async fn is_attached(&mut self, row: Row) -> Result<bool> {
		Ok(self.all_ancestors(row, true).await?.contains(&Row::ROOT))
	}

	/// A row is a clone iff at least two of its parents are independently
	/// reachable from the root.
	pub async fn is_clone(&mut self, row: Row) -> Result<bool> {
		let parents = self.get_info(row).await?.parent_rows.clone();
		let mut attached = 0usize;
		for p in parents {
			if self.is_attached(p).await? {
				attached += 1;
				if attached >= 2 {
					return Ok(true);
				}
			}
		}
		Ok(false)
	}

	/// One deterministic reachable path for `row`: a depth-first walk taking
	/// the first attached parent at each step. `None` when detached.
	pub async fn canonical_path(&mut self, row: Row) -> Result<Option<Path>> {
		if row == Row::ROOT {
			return Ok(Some(Path::root()));
		}
		// Ascend choosing the first parent that is itself reachable.
		let mut rows = vec![row];
		let mut cur = row;
		let mut seen = FxHashSet::default();
		seen.insert(row);
		'up: while cur != Row::ROOT {
			let parents = self.get_info(cur).await?.parent_rows.clone();
			for p in parents {
				if !seen.contains(&p) && self.is_attached(p).await? {
					rows.push(p);
					seen.insert(p);
					cur = p;
					continue 'up;
				}
			}
			return Ok(None);
		}
		rows.pop(); // drop the root; Path::root() supplies it
		rows.reverse();
		Ok(Some(Path::root().extend(&rows)?))
	}

	/// Attaches `child` under `parent` at `index`.
	///
	/// Rejects edges that would create a cycle, and duplicate edges (the
	/// same row twice under one parent would make sibling navigation
	/// ambiguous; clone into a different parent instead).
	pub async fn attach(&mut self, child: Row, parent: Row, index: usize) -> Result<()> {
		let ancestors = self.all_ancestors(parent, true).await?;
		if ancestors.contains(&child) {
			return Err(Error::WouldCycle { child, parent });
		}
		let parent_info = self.get_info(parent).await?;
		if parent_info.child_rows.contains(&child) {
			return Err(Error::invariant(format!("row {child} is already a child of {parent}")));
		}
		if index > parent_info.child_rows.len() {
			return Err(Error::invariant(format!(
				"attach index {index} out of range for row {parent} with {} children",
				parent_info.child_rows.len()
			)));
		}

		self.events.emit(&DocEvent::BeforeAttach { child, parent, index });

		let mut children = parent_info.child_rows.to_vec();
		children.insert(index, child);
		let mut parents = self.get_info(child).await?.parent_rows.to_vec();
		parents.push(parent);

		self.store.set_children(parent, &children).await?;
		self.store.set_parents(child, &parents).await?;
		self.cache.update(parent, |info| info.child_rows = children.clone().into());
		self.cache.update(child, |info| info.parent_rows = parents.clone().into());

		debug!(%child, %parent, index, "attached");
		self.events.emit(&DocEvent::AfterAttach { child, parent, index });
		Ok(())
	}

	/// Detaches `child` from `parent`, returning the index it occupied.
	///
	/// Removes the edge only; the row's content and any other parents are
	/// untouched, which is what keeps clones and undo-of-delete possible.
	pub async fn detach(&mut self, child: Row, parent: Row) -> Result<usize> {
		let Some(index) = self.child_index(parent, child).await? else {
			return Err(Error::invariant(format!("row {child} is not a child of {parent}")));
		};

		self.events.emit(&DocEvent::BeforeDetach { child, parent });

		let mut children = self.get_info(parent).await?.child_rows.to_vec();
		children.remove(index);
		let mut parents = self.get_info(child).await?.parent_rows.to_vec();
		if let Some(pos) = parents.iter().position(|&p| p == parent) {
			parents.remove(pos);
		}

		self.store.set_children(parent, &children).await?;
		self.store.set_parents(child, &parents).await?;
		self.cache.update(parent, |info| info.child_rows = children.clone().into());
		self.cache.update(child, |info| info.parent_rows = parents.clone().into());

		let last_parent = !self.is_attached(child).await?;
		debug!(%child, %parent, index, last_parent, "detached");
		self.events.emit(&DocEvent::AfterDetach { child, parent, last_parent });
		Ok(index)
	}

	/// Moves `child` from `old_parent` to `new_parent` at `index`.
	///
	/// Detach happens before attach; the cycle guard is checked up front so
	/// a rejected move leaves the tree untouched.
	pub async fn move_row(
		&mut self,
		child: Row,
		old_parent: Row,
		new_parent: Row,
		index: usize,
	) -> Result<usize> {
		if old_parent != new_parent {
			let ancestors = self.all_ancestors(new_parent, true).await?;
			if ancestors.contains(&child) {
				return Err(Error::WouldCycle { child, parent: new_parent });
			}
		}
		let old_index = self.detach(child, old_parent).await?;
		// Same-parent moves shift the target once the row is out.
		let index = if old_parent == new_parent && index > old_index {
			index - 1
		} else {
			index
		};
		self.attach(child, new_parent, index).await?;
		Ok(old_index)
	}

	/// Token search over all indexed rows; see [`Searcher`].
	pub fn search(&self, query: &str) -> Vec<Row> {
		self.searcher.search(query)
	}

	/// Search resolved to canonical paths of attached rows only.
	pub async fn search_paths(&mut self, query: &str, limit: usize) -> Result<Vec<Path>> {
		let mut out = Vec::new();
		for row in self.search(query) {
			if let Some(path) = self.canonical_path(row).await? {
				out.push(path);
				if out.len() == limit {
					break;
				}
			}
		}
		Ok(out)
	}

	/// Persisted view root, rebuilt as a path if every link in the saved
	/// ancestry is still an edge of the graph.
	pub async fn load_view_root(&mut self) -> Result<Option<Path>> {
		let Some(ancestry) = self.store.get_last_view_root().await? else {
			return Ok(None);
		};
		let mut iter = ancestry.into_iter();
		if iter.next() != Some(Row::ROOT) {
			return Ok(None);
		}
		let mut path = Path::root();
		for row in iter {
			if self.child_index(path.row(), row).await?.is_none() {
				return Ok(None);
			}
			path = path.child(row)?;
		}
		Ok(Some(path))
	}

	pub async fn save_view_root(&mut self, path: &Path) -> Result<()> {
		self.store.set_last_view_root(&path.ancestry()).await
	}

	pub async fn get_plugin_data(&self, plugin: &str, key: &str, row: Row) -> Result<Option<Value>> {
		self.store.get_plugin_data(plugin, key, row).await
	}

	pub async fn set_plugin_data(
		&mut self,
		plugin: &str,
		key: &str,
		row: Row,
		value: &Value,
	) -> Result<()> {
		self.store.set_plugin_data(plugin, key, row, value).await
	}
}
