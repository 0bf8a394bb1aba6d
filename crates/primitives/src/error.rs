//! Shared error taxonomy.
//!
//! Four families, with different propagation policies:
//!
//! * **Invariant violations** ([`Error::Invariant`], [`Error::MissingRow`],
//!   [`Error::WouldCycle`], [`Error::StaleMutation`]): programmer errors.
//!   Thrown synchronously, never caught by the modal loop; they surface to
//!   the top-level caller.
//! * **Expected errors** ([`Error::EditConflict`], [`Error::Backend`]): UI
//!   layers catch and present these without treating them as a crash.
//! * **Flow signals** ([`Error::QueueStopped`]): expected during macro
//!   playback truncation; the key handler swallows it at a clean boundary.
//! * **Decode errors** ([`Error::Decode`]): a stored value that no longer
//!   parses. Fatal; the store is trusted to be consistent.

use thiserror::Error;

use crate::Row;

/// Errors produced by the document, store, session and input layers.
#[derive(Debug, Error)]
pub enum Error {
	/// A stated invariant of the engine was violated.
	#[error("invariant violated: {0}")]
	Invariant(String),

	/// An operation referenced a row the store has never assigned.
	#[error("row {0} does not exist")]
	MissingRow(Row),

	/// Attaching would make a row its own ancestor.
	#[error("attaching {child} under {parent} would create a cycle")]
	WouldCycle { child: Row, parent: Row },

	/// A logged mutation no longer validates; history is inconsistent.
	#[error("mutation can no longer be applied: {0}")]
	StaleMutation(String),

	/// Another writer changed the backend underneath us.
	#[error("concurrent edit detected on key {0}")]
	EditConflict(String),

	/// The backend itself failed.
	#[error("backend error: {0}")]
	Backend(String),

	/// A stored value failed to decode.
	#[error("malformed stored value at {key}: {source}")]
	Decode {
		key: String,
		#[source]
		source: serde_json::Error,
	},

	/// The key queue was stopped while a dequeue was outstanding.
	#[error("key queue stopped")]
	QueueStopped,

	/// Two bindings were registered for the identical key sequence.
	#[error("duplicate key binding for {sequence:?} in {mode} mode")]
	DuplicateBinding { mode: &'static str, sequence: String },
}

impl Error {
	/// Shorthand for an [`Error::Invariant`].
	pub fn invariant(msg: impl Into<String>) -> Self {
		Error::Invariant(msg.into())
	}

	/// Returns `true` for the queue-stopped flow signal.
	pub fn is_queue_stopped(&self) -> bool {
		matches!(self, Error::QueueStopped)
	}
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;
