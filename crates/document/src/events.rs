//! Structural and textual change notifications.
//!
//! Collaborators (plugins, search, rendering) observe the document through
//! an explicit registry of handler closures owned by the [`Document`] and
//! invoked in registration order. There is no ambient global emitter; a
//! collaborator that wants events holds a reference to the document and
//! subscribes on it.
//!
//! [`Document`]: crate::Document

use loft_primitives::{Char, Row};

/// One document change, emitted after (and for structural changes, also
/// before) the store and cache have been updated.
#[derive(Debug)]
pub enum DocEvent<'a> {
	BeforeAttach { child: Row, parent: Row, index: usize },
	AfterAttach { child: Row, parent: Row, index: usize },
	BeforeDetach { child: Row, parent: Row },
	/// `last_parent` is `true` when this detach removed the row's final
	/// attached parent.
	AfterDetach {
		child: Row,
		parent: Row,
		last_parent: bool,
	},
	LineChanged { row: Row, line: &'a [Char] },
	CollapsedChanged { row: Row, collapsed: bool },
	RowCreated { row: Row },
}

/// Ordered list of event handler closures.
#[derive(Default)]
pub struct EventRegistry {
	handlers: Vec<Box<dyn Fn(&DocEvent<'_>) + Send>>,
}

impl EventRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a handler; handlers run in registration order.
	pub fn subscribe(&mut self, handler: impl Fn(&DocEvent<'_>) + Send + 'static) {
		self.handlers.push(Box::new(handler));
	}

	/// Invokes every handler with `event`.
	pub fn emit(&self, event: &DocEvent<'_>) {
		for handler in &self.handlers {
			handler(event);
		}
	}
}

impl std::fmt::Debug for EventRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventRegistry")
			.field("handlers", &self.handlers.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	#[test]
	fn handlers_run_in_registration_order() {
		let order = Arc::new(AtomicUsize::new(0));
		let mut registry = EventRegistry::new();

		let o1 = order.clone();
		registry.subscribe(move |_| {
			o1.compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst).unwrap();
		});
		let o2 = order.clone();
		registry.subscribe(move |_| {
			o2.compare_exchange(1, 2, Ordering::SeqCst, Ordering::SeqCst).unwrap();
		});

		registry.emit(&DocEvent::RowCreated { row: Row(1) });
		assert_eq!(order.load(Ordering::SeqCst), 2);
	}
}
