//! Ordered stack of active sessions.
//!
//! Only the top entry is interactive. Entries beneath it are suspended and
//! resume, with their state intact, once everything above them is gone.
//! The controller is the only writer.

use crate::session::SessionId;

#[derive(Debug, Default, Clone)]
pub struct SessionStack {
	entries: Vec<SessionId>,
}

impl SessionStack {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn top(&self) -> Option<SessionId> {
		self.entries.last().copied()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn contains(&self, id: SessionId) -> bool {
		self.entries.contains(&id)
	}

	/// Bottom-to-top iteration.
	pub fn iter(&self) -> impl DoubleEndedIterator<Item = SessionId> + '_ {
		self.entries.iter().copied()
	}

	/// Pushes `id` and returns the entry it covers, if any.
	///
	/// An id already on the stack is moved to the top.
	pub(crate) fn push(&mut self, id: SessionId) -> Option<SessionId> {
		self.entries.retain(|entry| *entry != id);
		let covered = self.top();
		self.entries.push(id);
		covered
	}

	/// Removes `id` wherever it sits. Returns whether it was the top, or
	/// `None` if it was not on the stack.
	///
	/// Used when a suspended session is cancelled from outside, e.g. by its
	/// request token.
	pub(crate) fn remove(&mut self, id: SessionId) -> Option<bool> {
		let pos = self.entries.iter().position(|entry| *entry == id)?;
		let was_top = pos + 1 == self.entries.len();
		self.entries.remove(pos);
		Some(was_top)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn id(n: u64) -> SessionId {
		SessionId(n)
	}

	#[test]
	fn push_reports_covered_entry() {
		let mut stack = SessionStack::new();
		assert_eq!(stack.push(id(1)), None);
		assert_eq!(stack.push(id(2)), Some(id(1)));
		assert_eq!(stack.top(), Some(id(2)));
		assert_eq!(stack.len(), 2);
	}

	#[test]
	fn repush_moves_to_top() {
		let mut stack = SessionStack::new();
		stack.push(id(1));
		stack.push(id(2));
		assert_eq!(stack.push(id(1)), Some(id(2)));
		assert_eq!(stack.iter().collect::<Vec<_>>(), vec![id(2), id(1)]);
	}

	#[test]
	fn remove_reports_whether_top() {
		let mut stack = SessionStack::new();
		stack.push(id(1));
		stack.push(id(2));
		stack.push(id(3));
		assert_eq!(stack.remove(id(2)), Some(false));
		assert_eq!(stack.remove(id(3)), Some(true));
		assert_eq!(stack.remove(id(9)), None);
		assert_eq!(stack.remove(id(1)), Some(true));
		assert!(stack.is_empty());
	}
}
