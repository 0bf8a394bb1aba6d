//! The nested block format used for import, export and the yank register.
//!
//! A node is one of:
//!
//! * a plain string, meaning bare text with no children,
//! * `{"text": …, "collapsed"?, "id"?, "plugins"?, "children"?}`,
//! * `{"clone": <id>}`, a reference to a previously-emitted `id`.
//!
//! Clone references are what keep export finite on documents whose clone
//! graph looks cyclic from any single traversal. Round-trip guarantee:
//! serialize → load → serialize reproduces an isomorphic tree, including
//! clone edges, up to row-id remapping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Row;

/// A serialized subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SerializedBlock {
	/// Bare text, no children, no flags.
	Text(String),
	/// Reference to a row already emitted earlier in the same document.
	Clone { clone: Row },
	/// Full node.
	Node(SerializedNode),
}

/// The full node shape of the block format.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SerializedNode {
	pub text: String,
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub collapsed: bool,
	/// Present iff the row is a clone target; later `{clone}` refs point here.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<Row>,
	#[serde(default, skip_serializing_if = "Map::is_empty")]
	pub plugins: Map<String, Value>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<SerializedBlock>,
}

impl SerializedBlock {
	/// Wraps bare text.
	pub fn text(text: impl Into<String>) -> Self {
		SerializedBlock::Text(text.into())
	}

	/// The node's own text; clone references have none.
	pub fn node_text(&self) -> Option<&str> {
		match self {
			SerializedBlock::Text(t) => Some(t),
			SerializedBlock::Node(n) => Some(&n.text),
			SerializedBlock::Clone { .. } => None,
		}
	}

	/// Collapses a [`SerializedNode`] with no extra fields back to bare text.
	pub fn simplified(self) -> Self {
		match self {
			SerializedBlock::Node(n)
				if !n.collapsed && n.id.is_none() && n.plugins.is_empty() && n.children.is_empty() =>
			{
				SerializedBlock::Text(n.text)
			}
			other => other,
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn bare_text_round_trips() {
		let block = SerializedBlock::text("hello");
		let json = serde_json::to_string(&block).unwrap();
		assert_eq!(json, r#""hello""#);
		assert_eq!(serde_json::from_str::<SerializedBlock>(&json).unwrap(), block);
	}

	#[test]
	fn clone_refs_round_trip() {
		let block = SerializedBlock::Clone { clone: Row(7) };
		let json = serde_json::to_string(&block).unwrap();
		assert_eq!(json, r#"{"clone":7}"#);
		assert_eq!(serde_json::from_str::<SerializedBlock>(&json).unwrap(), block);
	}

	#[test]
	fn full_node_round_trips() {
		let block = SerializedBlock::Node(SerializedNode {
			text: "parent".into(),
			collapsed: true,
			id: Some(Row(3)),
			children: vec![SerializedBlock::text("child")],
			..Default::default()
		});
		let json = serde_json::to_string(&block).unwrap();
		let back: SerializedBlock = serde_json::from_str(&json).unwrap();
		assert_eq!(back, block);
	}

	#[test]
	fn simplified_flattens_trivial_nodes() {
		let block = SerializedBlock::Node(SerializedNode {
			text: "plain".into(),
			..Default::default()
		});
		assert_eq!(block.simplified(), SerializedBlock::text("plain"));
	}
}
