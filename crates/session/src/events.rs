//! Session change notifications.
//!
//! Same shape as the document's event registry: an explicit ordered list of
//! handler closures, no ambient global emitter. Structural and textual
//! changes are observed through `Document::subscribe`; this registry covers
//! what only the session knows, the active mode and the cursor.

use loft_document::Path;
use loft_primitives::ModeId;

/// One session-level change.
#[derive(Debug)]
pub enum SessionEvent<'a> {
	ModeChanged { from: ModeId, to: ModeId },
	/// The cursor landed on a different row.
	CursorRowChanged { path: &'a Path },
	/// The cursor column changed within its row.
	CursorColChanged { col: usize },
}

/// Ordered list of event handler closures.
#[derive(Default)]
pub struct SessionEventRegistry {
	handlers: Vec<Box<dyn Fn(&SessionEvent<'_>) + Send>>,
}

impl SessionEventRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a handler; handlers run in registration order.
	pub fn subscribe(&mut self, handler: impl Fn(&SessionEvent<'_>) + Send + 'static) {
		self.handlers.push(Box::new(handler));
	}

	/// Invokes every handler with `event`.
	pub fn emit(&self, event: &SessionEvent<'_>) {
		for handler in &self.handlers {
			handler(event);
		}
	}
}

impl std::fmt::Debug for SessionEventRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionEventRegistry")
			.field("handlers", &self.handlers.len())
			.finish()
	}
}
