//! Line text as a sequence of styled characters.
//!
//! A row's text is not a flat string: each character carries render metadata
//! (bold, italic, …) that must survive editing. Lines are short, so a plain
//! `Vec<Char>` with 0-based column indices is the representation everywhere;
//! conversion helpers exist for the common unstyled case.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
	/// Per-character render style flags.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct StyleFlags: u8 {
		const BOLD = 1 << 0;
		const ITALIC = 1 << 1;
		const UNDERLINE = 1 << 2;
		const STRIKETHROUGH = 1 << 3;
	}
}

impl Serialize for StyleFlags {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u8(self.bits())
	}
}

impl<'de> Deserialize<'de> for StyleFlags {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let bits = u8::deserialize(deserializer)?;
		Ok(StyleFlags::from_bits_truncate(bits))
	}
}

/// One character of a line, with its style flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Char {
	pub ch: char,
	#[serde(default, skip_serializing_if = "StyleFlags::is_empty")]
	pub style: StyleFlags,
}

impl Char {
	/// An unstyled character.
	pub fn plain(ch: char) -> Self {
		Self {
			ch,
			style: StyleFlags::empty(),
		}
	}
}

impl From<char> for Char {
	fn from(ch: char) -> Self {
		Self::plain(ch)
	}
}

/// Ordered sequence of characters; may be empty.
pub type Line = Vec<Char>;

/// Builds an unstyled [`Line`] from a string.
pub fn line_from_str(text: &str) -> Line {
	text.chars().map(Char::plain).collect()
}

/// Flattens a line (or slice of one) back to its text, dropping styles.
pub fn line_to_string(chars: &[Char]) -> String {
	chars.iter().map(|c| c.ch).collect()
}
