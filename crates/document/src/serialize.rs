//! Export to and import from the nested block format.
//!
//! A single walk over the tree, replacing any row already visited in the
//! same walk with a `{clone: id}` back-reference. That back-reference is the
//! sole mechanism keeping output finite on clone graphs, which look cyclic
//! from any one traversal even though attach keeps the underlying graph a
//! DAG. Import assigns fresh ids and rebuilds clone edges from the
//! references, so serialize → load → serialize is idempotent up to row-id
//! remapping.

use loft_primitives::{BoxFuture, Error, Result, Row, SerializedBlock, SerializedNode, line_from_str};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use tracing::debug;

use crate::Document;

impl Document {
	/// Serializes the whole document: the root's children as top-level blocks.
	pub async fn serialize(&mut self) -> Result<Vec<SerializedBlock>> {
		let children = self.get_children(Row::ROOT).await?;
		self.serialize_rows(&children).await
	}

	/// Serializes a set of subtrees sharing one visited set, so a row cloned
	/// across two of them still round-trips as a single clone edge.
	pub async fn serialize_rows(&mut self, rows: &[Row]) -> Result<Vec<SerializedBlock>> {
		let mut visited = FxHashSet::default();
		let mut out = Vec::with_capacity(rows.len());
		for &row in rows {
			out.push(self.serialize_rec(row, &mut visited).await?);
		}
		Ok(out)
	}

	fn serialize_rec<'a>(
		&'a mut self,
		row: Row,
		visited: &'a mut FxHashSet<Row>,
	) -> BoxFuture<'a, Result<SerializedBlock>> {
		Box::pin(async move {
			if !visited.insert(row) {
				return Ok(SerializedBlock::Clone { clone: row });
			}
			let info = self.get_info(row).await?;
			let text = loft_primitives::line_to_string(&info.line);
			let collapsed = info.collapsed;
			// Clone candidates get an id so later occurrences can reference it.
			let id = (info.parent_rows.len() >= 2).then_some(row);
			let child_rows = info.child_rows.to_vec();

			let mut children = Vec::with_capacity(child_rows.len());
			for child in child_rows {
				children.push(self.serialize_rec(child, visited).await?);
			}

			Ok(SerializedBlock::Node(SerializedNode {
				text,
				collapsed,
				id,
				plugins: Default::default(),
				children,
			})
			.simplified())
		})
	}

	/// Builds fresh rows for `blocks` without attaching the top level anywhere.
	/// Internal structure (children, nested clone edges) is attached eagerly;
	/// the returned rows are detached and ready for a single attach step, which
	/// is what lets paste run the attach through the undo log.
	pub async fn instantiate(&mut self, blocks: &[SerializedBlock]) -> Result<Vec<Row>> {
		let mut id_map = FxHashMap::default();
		let mut rows = Vec::with_capacity(blocks.len());
		for block in blocks {
			rows.push(self.instantiate_rec(block, &mut id_map).await?);
		}
		Ok(rows)
	}

	/// Loads blocks as new children of `parent`, starting at `index`.
	/// Returns the created top-level rows in order.
	pub async fn load(
		&mut self,
		blocks: &[SerializedBlock],
		parent: Row,
		index: usize,
	) -> Result<Vec<Row>> {
		let rows = self.instantiate(blocks).await?;
		for (offset, &row) in rows.iter().enumerate() {
			self.attach(row, parent, index + offset).await?;
		}
		debug!(count = rows.len(), %parent, "loaded serialized blocks");
		Ok(rows)
	}

	fn instantiate_rec<'a>(
		&'a mut self,
		block: &'a SerializedBlock,
		id_map: &'a mut FxHashMap<Row, Row>,
	) -> BoxFuture<'a, Result<Row>> {
		Box::pin(async move {
			match block {
				SerializedBlock::Clone { clone } => match id_map.get(clone) {
					Some(&row) => Ok(row),
					None => Err(Error::invariant(format!(
						"clone reference to unknown id {clone}"
					))),
				},
				SerializedBlock::Text(text) => {
					let row = self.new_row().await?;
					self.set_line(row, line_from_str(text)).await?;
					Ok(row)
				}
				SerializedBlock::Node(node) => {
					let row = self.new_row().await?;
					self.set_line(row, line_from_str(&node.text)).await?;
					if node.collapsed {
						self.set_collapsed(row, true).await?;
					}
					if let Some(id) = node.id {
						id_map.insert(id, row);
					}
					for (name, data) in &node.plugins {
						match data {
							Value::Object(entries) => {
								for (key, value) in entries {
									self.set_plugin_data(name, key, row, value).await?;
								}
							}
							other => self.set_plugin_data(name, "value", row, other).await?,
						}
					}
					for (offset, child) in node.children.iter().enumerate() {
						let child_row = self.instantiate_rec(child, id_map).await?;
						self.attach(child_row, row, offset).await?;
					}
					Ok(row)
				}
			}
		})
	}
}
