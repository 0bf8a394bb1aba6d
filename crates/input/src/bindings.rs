//! Per-mode key binding tries.
//!
//! A trie node is an internal node, a leaf action, or a leaf motion; a
//! sequence is bound by walking key tokens (whitespace-separated in the
//! textual form, e.g. `"d <motion>"`). Registering a sequence that collides
//! with an existing binding, either exactly or as a prefix in either
//! direction, is a hard error at build time: silent overwrites in a keymap
//! are close to impossible to debug from the outside.

use loft_primitives::{Error, Key, ModeId, Result};
use rustc_hash::FxHashMap;

use crate::actions::Action;
use crate::motions::Motion;

/// What a complete key sequence resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingTarget {
	Action(Action),
	Motion(Motion),
}

/// One trie node.
#[derive(Debug, Default)]
pub struct BindingNode {
	children: FxHashMap<Key, BindingNode>,
	target: Option<BindingTarget>,
	/// Any motion leaf at or below this node.
	has_motion: bool,
	/// Any action leaf at or below this node.
	has_action: bool,
}

impl BindingNode {
	pub fn child(&self, key: &Key) -> Option<&BindingNode> {
		self.children.get(key)
	}

	pub fn target(&self) -> Option<BindingTarget> {
		self.target
	}

	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	pub fn has_motion(&self) -> bool {
		self.has_motion
	}

	pub fn has_action(&self) -> bool {
		self.has_action
	}
}

/// Result of matching a key sequence against a trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
	/// The sequence is a complete binding.
	Match(BindingTarget),
	/// The sequence is a proper prefix of at least one binding.
	Pending,
	/// No binding starts with this sequence.
	None,
}

/// The binding trie for one mode.
#[derive(Debug)]
pub struct KeyBindingsTree {
	mode: ModeId,
	root: BindingNode,
}

impl KeyBindingsTree {
	pub fn new(mode: ModeId) -> Self {
		Self {
			mode,
			root: BindingNode::default(),
		}
	}

	pub fn root(&self) -> &BindingNode {
		&self.root
	}

	/// Binds `sequence` (whitespace-separated key tokens) to `target`.
	pub fn bind(&mut self, sequence: &str, target: BindingTarget) -> Result<()> {
		let keys: Vec<Key> = sequence.split_whitespace().map(Key::new).collect();
		if keys.is_empty() {
			return Err(Error::invariant("cannot bind an empty key sequence".to_string()));
		}
		let duplicate = || Error::DuplicateBinding {
			mode: self.mode.name(),
			sequence: sequence.to_string(),
		};
		let mut node = &mut self.root;
		for (i, key) in keys.iter().enumerate() {
			node.has_motion |= matches!(target, BindingTarget::Motion(_));
			node.has_action |= matches!(target, BindingTarget::Action(_));
			let child = node.children.entry(key.clone()).or_default();
			if i + 1 == keys.len() {
				if child.target.is_some() || !child.children.is_empty() {
					return Err(duplicate());
				}
				child.target = Some(target);
				child.has_motion = matches!(target, BindingTarget::Motion(_));
				child.has_action = matches!(target, BindingTarget::Action(_));
				node = child;
			} else {
				if child.target.is_some() {
					// The prefix is already a complete binding.
					return Err(duplicate());
				}
				node = child;
			}
		}
		Ok(())
	}

	/// Matches a full sequence; used by tests and completion surfaces. The
	/// handler walks nodes incrementally instead, via [`BindingNode::child`].
	pub fn lookup(&self, keys: &[Key]) -> LookupOutcome {
		let mut node = &self.root;
		for key in keys {
			match node.child(key) {
				Some(child) => node = child,
				None => return LookupOutcome::None,
			}
		}
		match node.target {
			Some(target) if node.is_leaf() => LookupOutcome::Match(target),
			_ => LookupOutcome::Pending,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn tree() -> KeyBindingsTree {
		KeyBindingsTree::new(ModeId::Normal)
	}

	#[test]
	fn lookup_distinguishes_match_pending_none() {
		let mut t = tree();
		t.bind("g g", BindingTarget::Motion(Motion::FirstVisible)).unwrap();
		assert_eq!(
			t.lookup(&[Key::from("g"), Key::from("g")]),
			LookupOutcome::Match(BindingTarget::Motion(Motion::FirstVisible)),
		);
		assert_eq!(t.lookup(&[Key::from("g")]), LookupOutcome::Pending);
		assert_eq!(t.lookup(&[Key::from("x")]), LookupOutcome::None);
	}

	#[test]
	fn rebinding_a_sequence_is_an_error() {
		let mut t = tree();
		t.bind("d d", BindingTarget::Action(Action::DeleteBlocks)).unwrap();
		let err = t.bind("d d", BindingTarget::Action(Action::DeleteToEol)).unwrap_err();
		assert!(matches!(err, Error::DuplicateBinding { .. }));
	}

	#[test]
	fn prefix_conflicts_are_errors_both_ways() {
		let mut t = tree();
		t.bind("d d", BindingTarget::Action(Action::DeleteBlocks)).unwrap();
		// A shorter leaf would shadow the longer binding.
		assert!(t.bind("d", BindingTarget::Action(Action::DeleteToEol)).is_err());

		t.bind("x", BindingTarget::Action(Action::DeleteCharAfter)).unwrap();
		// A longer binding would be unreachable behind the leaf.
		assert!(t.bind("x y", BindingTarget::Action(Action::DeleteToEol)).is_err());
	}

	#[test]
	fn downstream_flags_track_leaf_kinds() {
		let mut t = tree();
		t.bind("g g", BindingTarget::Motion(Motion::FirstVisible)).unwrap();
		t.bind("d d", BindingTarget::Action(Action::DeleteBlocks)).unwrap();
		let g = t.root().child(&Key::from("g")).unwrap();
		assert!(g.has_motion() && !g.has_action());
		let d = t.root().child(&Key::from("d")).unwrap();
		assert!(d.has_action() && !d.has_motion());
	}
}
