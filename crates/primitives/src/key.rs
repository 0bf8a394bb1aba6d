//! Normalized input key tokens.
//!
//! The core receives keys as discrete, already-normalized string tokens
//! (`"a"`, `"ctrl+c"`, `"shift+tab"`, `"esc"`) and makes no assumption about
//! the physical input device. [`Key`] is a cheap-to-clone interned token used
//! as the edge label in binding tries, in macro recordings, and in the
//! repeat-last sequence buffer.

use std::fmt;
use std::sync::Arc;

/// One normalized key token.
///
/// Equality and hashing are on the token text, so `Key::from("j")` pressed
/// live and `Key::from("j")` replayed from a macro are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Arc<str>);

/// Sentinel token marking the "accepts a motion here" slot in a binding trie.
pub const MOTION_SENTINEL: &str = "<motion>";

impl Key {
	/// Builds a key from its normalized token text.
	pub fn new(token: &str) -> Self {
		Self(Arc::from(token))
	}

	/// Single-character key.
	pub fn char(ch: char) -> Self {
		Self(Arc::from(ch.to_string().as_str()))
	}

	/// The `<motion>` trie sentinel.
	pub fn motion_sentinel() -> Self {
		Self::new(MOTION_SENTINEL)
	}

	/// The token text.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns the character for a bare single-printable-character token.
	///
	/// Modifier combinations (`ctrl+c`) and named keys (`esc`) return `None`.
	pub fn as_char(&self) -> Option<char> {
		let mut chars = self.0.chars();
		match (chars.next(), chars.next()) {
			(Some(ch), None) if !ch.is_control() => Some(ch),
			_ => None,
		}
	}

	/// Returns the decimal value for a bare digit key.
	pub fn as_digit(&self) -> Option<u32> {
		self.as_char().and_then(|c| c.to_digit(10))
	}

	/// Returns `true` for the motion sentinel.
	pub fn is_motion_sentinel(&self) -> bool {
		&*self.0 == MOTION_SENTINEL
	}
}

impl From<&str> for Key {
	fn from(token: &str) -> Self {
		Self::new(token)
	}
}

impl From<char> for Key {
	fn from(ch: char) -> Self {
		Self::char(ch)
	}
}

impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
