//! Typed document fields on top of an async key-value [`Backend`].
//!
//! The store owns the key layout and the encode/decode of each field:
//!
//! ```text
//! <prefix>:<row>:line                    JSON array of styled chars
//! <prefix>:<row>:parent                  JSON array of row ids
//! <prefix>:<row>:children                JSON array of row ids
//! <prefix>:<row>:collapsed               JSON bool
//! <prefix>:<row>:plugin:<name>:data:<k>  arbitrary JSON value
//! <prefix>:lastID                        highest assigned row id
//! <prefix>:lastviewroot                  JSON array of row ids (root-first)
//! ```
//!
//! It also assigns monotonically increasing row identifiers via
//! [`Store::new_row`]. Ids are never reused.

mod backend;

pub use backend::{Backend, InMemoryBackend};

use loft_primitives::{Error, Line, Result, Row};
use serde_json::Value;
use tracing::trace;

/// Typed field accessors for one document.
pub struct Store {
	backend: Box<dyn Backend>,
	prefix: String,
	/// Cached `lastID`; loaded lazily, kept in sync with every assignment.
	last_id: Option<u64>,
}

impl Store {
	/// Creates a store over `backend`, namespacing all keys with `prefix`.
	pub fn new(backend: Box<dyn Backend>, prefix: impl Into<String>) -> Self {
		Self {
			backend,
			prefix: prefix.into(),
			last_id: None,
		}
	}

	fn row_key(&self, row: Row, field: &str) -> String {
		format!("{}:{}:{}", self.prefix, row, field)
	}

	fn doc_key(&self, field: &str) -> String {
		format!("{}:{}", self.prefix, field)
	}

	async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
		match self.backend.get(key).await? {
			None => Ok(None),
			Some(raw) => serde_json::from_str(&raw)
				.map(Some)
				.map_err(|source| Error::Decode {
					key: key.to_owned(),
					source,
				}),
		}
	}

	async fn set_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
		let raw = serde_json::to_string(value).map_err(|source| Error::Decode {
			key: key.to_owned(),
			source,
		})?;
		self.backend.set(key, raw).await
	}

	/// The row's line, empty if never written.
	pub async fn get_line(&self, row: Row) -> Result<Line> {
		Ok(self.get_json(&self.row_key(row, "line")).await?.unwrap_or_default())
	}

	pub async fn set_line(&self, row: Row, line: &Line) -> Result<()> {
		self.set_json(&self.row_key(row, "line"), line).await
	}

	/// The row's parent list, empty if detached and never attached.
	pub async fn get_parents(&self, row: Row) -> Result<Vec<Row>> {
		Ok(self.get_json(&self.row_key(row, "parent")).await?.unwrap_or_default())
	}

	pub async fn set_parents(&self, row: Row, parents: &[Row]) -> Result<()> {
		self.set_json(&self.row_key(row, "parent"), &parents).await
	}

	pub async fn get_children(&self, row: Row) -> Result<Vec<Row>> {
		Ok(self
			.get_json(&self.row_key(row, "children"))
			.await?
			.unwrap_or_default())
	}

	pub async fn set_children(&self, row: Row, children: &[Row]) -> Result<()> {
		self.set_json(&self.row_key(row, "children"), &children).await
	}

	pub async fn get_collapsed(&self, row: Row) -> Result<bool> {
		Ok(self
			.get_json(&self.row_key(row, "collapsed"))
			.await?
			.unwrap_or(false))
	}

	pub async fn set_collapsed(&self, row: Row, collapsed: bool) -> Result<()> {
		self.set_json(&self.row_key(row, "collapsed"), &collapsed).await
	}

	pub async fn get_plugin_data(&self, plugin: &str, key: &str, row: Row) -> Result<Option<Value>> {
		self.get_json(&self.row_key(row, &format!("plugin:{plugin}:data:{key}")))
			.await
	}

	pub async fn set_plugin_data(
		&self,
		plugin: &str,
		key: &str,
		row: Row,
		value: &Value,
	) -> Result<()> {
		self.set_json(&self.row_key(row, &format!("plugin:{plugin}:data:{key}")), value)
			.await
	}

	/// Assigns the next row id. Monotonic, persisted, never reused.
	pub async fn new_row(&mut self) -> Result<Row> {
		let last = match self.last_id {
			Some(id) => id,
			None => self
				.get_json::<u64>(&self.doc_key("lastID"))
				.await?
				.unwrap_or(Row::ROOT.0),
		};
		let id = last + 1;
		self.set_json(&self.doc_key("lastID"), &id).await?;
		self.last_id = Some(id);
		trace!(row = id, "assigned new row id");
		Ok(Row(id))
	}

	/// The persisted view-root ancestry (root-first), if any.
	pub async fn get_last_view_root(&self) -> Result<Option<Vec<Row>>> {
		self.get_json(&self.doc_key("lastviewroot")).await
	}

	pub async fn set_last_view_root(&self, ancestry: &[Row]) -> Result<()> {
		self.set_json(&self.doc_key("lastviewroot"), &ancestry).await
	}
}

#[cfg(test)]
mod tests {
	use loft_primitives::line_from_str;
	use pretty_assertions::assert_eq;

	use super::*;

	fn store() -> Store {
		Store::new(Box::new(InMemoryBackend::new()), "doc")
	}

	#[tokio::test]
	async fn unwritten_fields_have_defaults() {
		let s = store();
		assert_eq!(s.get_line(Row(5)).await.unwrap(), vec![]);
		assert_eq!(s.get_parents(Row(5)).await.unwrap(), vec![]);
		assert_eq!(s.get_children(Row(5)).await.unwrap(), vec![]);
		assert!(!s.get_collapsed(Row(5)).await.unwrap());
	}

	#[tokio::test]
	async fn fields_round_trip() {
		let s = store();
		let line = line_from_str("text");
		s.set_line(Row(1), &line).await.unwrap();
		s.set_parents(Row(1), &[Row::ROOT]).await.unwrap();
		s.set_children(Row::ROOT, &[Row(1)]).await.unwrap();
		s.set_collapsed(Row(1), true).await.unwrap();

		assert_eq!(s.get_line(Row(1)).await.unwrap(), line);
		assert_eq!(s.get_parents(Row(1)).await.unwrap(), vec![Row::ROOT]);
		assert_eq!(s.get_children(Row::ROOT).await.unwrap(), vec![Row(1)]);
		assert!(s.get_collapsed(Row(1)).await.unwrap());
	}

	#[tokio::test]
	async fn row_ids_are_monotonic() {
		let mut s = store();
		assert_eq!(s.new_row().await.unwrap(), Row(1));
		assert_eq!(s.new_row().await.unwrap(), Row(2));
		assert_eq!(s.new_row().await.unwrap(), Row(3));
	}

	#[tokio::test]
	async fn plugin_data_is_namespaced() {
		let s = store();
		let value = serde_json::json!({"done": true});
		s.set_plugin_data("todo", "state", Row(2), &value).await.unwrap();
		assert_eq!(
			s.get_plugin_data("todo", "state", Row(2)).await.unwrap(),
			Some(value)
		);
		assert_eq!(s.get_plugin_data("todo", "state", Row(3)).await.unwrap(), None);
	}
}
