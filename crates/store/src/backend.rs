//! The async key-value backend seam.
//!
//! Real deployments put a socket or database server behind this trait; the
//! core only ever sees `get`/`set` on store-prefixed string keys and trusts
//! the backend to be a consistent key-value store. No multi-key transaction
//! is assumed; multi-key writes are sequenced best-effort by the document
//! layer.

use std::collections::HashMap;

use async_trait::async_trait;
use loft_primitives::Result;
use tokio::sync::Mutex;

/// Async key → string store.
///
/// Both methods may suspend; they are the only I/O suspension points in the
/// document layer.
#[async_trait]
pub trait Backend: Send + Sync {
	/// Reads a key, `None` if it was never written.
	async fn get(&self, key: &str) -> Result<Option<String>>;

	/// Writes a key.
	async fn set(&self, key: &str, value: String) -> Result<()>;
}

/// Backend for tests and in-process documents.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
	entries: Mutex<HashMap<String, String>>,
}

impl InMemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl Backend for InMemoryBackend {
	async fn get(&self, key: &str) -> Result<Option<String>> {
		Ok(self.entries.lock().await.get(key).cloned())
	}

	async fn set(&self, key: &str, value: String) -> Result<()> {
		self.entries.lock().await.insert(key.to_owned(), value);
		Ok(())
	}
}
