//! Per-session publish/subscribe channels.
//!
//! Delivery is synchronous and in subscription order on the thread that
//! fires the event. Each session owns its emitters; disposing the session
//! clears them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Handle returned by [`Emitter::subscribe`]. Unique across all emitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
	fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}
}

type Listener<T> = Box<dyn FnMut(&T) + Send>;

/// Ordered list of listeners for one event kind.
pub struct Emitter<T> {
	listeners: Vec<(ListenerId, Listener<T>)>,
}

impl<T> Default for Emitter<T> {
	fn default() -> Self {
		Self { listeners: Vec::new() }
	}
}

impl<T> std::fmt::Debug for Emitter<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Emitter").field("listeners", &self.listeners.len()).finish()
	}
}

impl<T> Emitter<T> {
	pub fn subscribe(&mut self, listener: impl FnMut(&T) + Send + 'static) -> ListenerId {
		let id = ListenerId::next();
		self.listeners.push((id, Box::new(listener)));
		id
	}

	/// Removes a listener. Returns false if it was already gone.
	pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
		let before = self.listeners.len();
		self.listeners.retain(|(lid, _)| *lid != id);
		self.listeners.len() != before
	}

	pub fn fire(&mut self, event: &T) {
		for (_, listener) in &mut self.listeners {
			listener(event);
		}
	}

	pub fn clear(&mut self) {
		self.listeners.clear();
	}

	pub fn len(&self) -> usize {
		self.listeners.len()
	}

	pub fn is_empty(&self) -> bool {
		self.listeners.is_empty()
	}
}
