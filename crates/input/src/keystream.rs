//! The asynchronous key queue.
//!
//! A [`KeyStream`] is a strictly single-consumer queue of normalized key
//! tokens. Consumption happens through `&mut self`, so at most one
//! `dequeue()` can ever be pending; producers hold a cloned sender and may
//! feed keys from anywhere. Once stopped (or once a recorded stream runs
//! dry), `dequeue()` returns [`Error::QueueStopped`], which macro playback
//! treats as normal termination rather than a failure.
//!
//! The stream also keeps the bookkeeping behind "repeat last command":
//! every dequeued key lands in a consumed buffer, and each completed command
//! either commits that buffer as the replayable `last_sequence` (`save`) or
//! discards it (`drop_all`) when the command is not meaningfully repeatable.

use loft_primitives::{Error, Key, Result};
use tokio::sync::mpsc;
use tracing::trace;

pub struct KeyStream {
	sender: Option<mpsc::UnboundedSender<Key>>,
	receiver: mpsc::UnboundedReceiver<Key>,
	consumed: Vec<Key>,
	last_sequence: Vec<Key>,
}

impl KeyStream {
	pub fn new() -> Self {
		let (sender, receiver) = mpsc::unbounded_channel();
		Self {
			sender: Some(sender),
			receiver,
			consumed: Vec::new(),
			last_sequence: Vec::new(),
		}
	}

	/// A pre-filled, already-stopped stream. Dequeuing past the end yields
	/// [`Error::QueueStopped`]; macro playback is built on this.
	pub fn from_recorded(keys: impl IntoIterator<Item = Key>) -> Self {
		let (sender, receiver) = mpsc::unbounded_channel();
		for key in keys {
			// Receiver outlives this loop, so send cannot fail.
			let _ = sender.send(key);
		}
		Self {
			sender: None,
			receiver,
			consumed: Vec::new(),
			last_sequence: Vec::new(),
		}
	}

	/// Feeds one key. Fails once the stream is stopped.
	pub fn enqueue(&self, key: Key) -> Result<()> {
		let sender = self.sender.as_ref().ok_or(Error::QueueStopped)?;
		sender.send(key).map_err(|_| Error::QueueStopped)
	}

	/// A producer handle for feeding keys from outside the handler.
	pub fn sender(&self) -> Result<mpsc::UnboundedSender<Key>> {
		self.sender.clone().ok_or(Error::QueueStopped)
	}

	/// No further keys will be accepted; dequeue drains what is queued and
	/// then reports [`Error::QueueStopped`].
	pub fn stop(&mut self) {
		self.sender = None;
	}

	/// Takes the next key, recording it in the consumed buffer.
	pub async fn dequeue(&mut self) -> Result<Key> {
		let key = self.receiver.recv().await.ok_or(Error::QueueStopped)?;
		trace!(key = %key, "dequeued");
		self.consumed.push(key.clone());
		Ok(key)
	}

	/// Commits the keys consumed since the last boundary as the sequence
	/// `.` will replay.
	pub fn save(&mut self) {
		if !self.consumed.is_empty() {
			self.last_sequence = std::mem::take(&mut self.consumed);
		}
	}

	/// Discards the keys consumed since the last boundary; they were part
	/// of a command that must not feed into `.`.
	pub fn drop_all(&mut self) {
		self.consumed.clear();
	}

	pub fn last_sequence(&self) -> &[Key] {
		&self.last_sequence
	}
}

impl Default for KeyStream {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn dequeue_yields_keys_in_order() {
		let mut stream = KeyStream::new();
		stream.enqueue(Key::from("a")).unwrap();
		stream.enqueue(Key::from("b")).unwrap();
		assert_eq!(stream.dequeue().await.unwrap().as_str(), "a");
		assert_eq!(stream.dequeue().await.unwrap().as_str(), "b");
	}

	#[tokio::test]
	async fn stopped_stream_drains_then_errors() {
		let mut stream = KeyStream::from_recorded([Key::from("x")]);
		assert!(stream.enqueue(Key::from("y")).is_err());
		assert_eq!(stream.dequeue().await.unwrap().as_str(), "x");
		assert!(stream.dequeue().await.unwrap_err().is_queue_stopped());
	}

	#[tokio::test]
	async fn save_and_drop_shape_the_replay_sequence() {
		let mut stream = KeyStream::new();
		for k in ["d", "d", "u"] {
			stream.enqueue(Key::from(k)).unwrap();
		}
		stream.dequeue().await.unwrap();
		stream.dequeue().await.unwrap();
		stream.save();
		assert_eq!(stream.last_sequence().len(), 2);

		// A non-repeatable command leaves last_sequence untouched.
		stream.dequeue().await.unwrap();
		stream.drop_all();
		stream.save();
		assert_eq!(stream.last_sequence().len(), 2);
	}
}
