//! Session state machines.
//!
//! A session is one on-screen interaction: a [`PickSession`] or an
//! [`InputSession`]. Both share a [`SessionCore`] holding the lifecycle
//! state, flags, commands, and the event channels common to both shapes.
//!
//! Lifecycle: `Created -> Shown <-> Hidden -> Disposed`. Transitions that do
//! not apply to the current state are no-ops; `Disposed` is terminal.
//! Sessions never touch the stack themselves; the controller drives every
//! transition.

use tokio_util::sync::CancellationToken;

use crate::event::{Emitter, ListenerId};
use crate::item::{Command, PickItem};

mod input;
mod pick;

pub(crate) use input::ValidationJob;
pub use input::InputSession;
pub use pick::PickSession;

#[cfg(test)]
mod tests;

/// Controller-assigned session identifier. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl SessionId {
	pub const fn get(self) -> u64 {
		self.0
	}
}

impl std::fmt::Display for SessionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "#{}", self.0)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Created,
	Shown,
	Hidden,
	Disposed,
}

/// Why a shown session stopped being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideReason {
	/// `hide()` or `cancel()` was called, or the user dismissed it.
	Explicit,
	/// The UI lost focus.
	FocusLost,
	/// A newer session was pushed over it.
	Superseded,
	/// The request's cancellation token fired.
	Cancelled,
}

/// State shared by both session shapes.
#[derive(Debug)]
pub struct SessionCore {
	id: SessionId,
	state: SessionState,
	enabled: bool,
	busy: bool,
	ignore_focus_lost: bool,
	title: Option<String>,
	step: Option<usize>,
	total_steps: Option<usize>,
	commands: Vec<Command>,
	lifetime: CancellationToken,
	on_did_hide: Emitter<HideReason>,
	on_did_accept: Emitter<()>,
	on_did_trigger_command: Emitter<Command>,
	on_did_change_value: Emitter<String>,
}

impl SessionCore {
	pub(crate) fn new(id: SessionId, ignore_focus_lost: bool) -> Self {
		Self {
			id,
			state: SessionState::Created,
			enabled: true,
			busy: false,
			ignore_focus_lost,
			title: None,
			step: None,
			total_steps: None,
			commands: Vec::new(),
			lifetime: CancellationToken::new(),
			on_did_hide: Emitter::default(),
			on_did_accept: Emitter::default(),
			on_did_trigger_command: Emitter::default(),
			on_did_change_value: Emitter::default(),
		}
	}

	pub fn id(&self) -> SessionId {
		self.id
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	pub fn is_disposed(&self) -> bool {
		self.state == SessionState::Disposed
	}

	pub fn enabled(&self) -> bool {
		self.enabled
	}

	pub fn set_enabled(&mut self, enabled: bool) {
		self.enabled = enabled;
	}

	pub fn busy(&self) -> bool {
		self.busy
	}

	/// Marks in-flight work. Does not change lifecycle state.
	pub fn set_busy(&mut self, busy: bool) {
		self.busy = busy;
	}

	pub fn ignore_focus_lost(&self) -> bool {
		self.ignore_focus_lost
	}

	pub fn set_ignore_focus_lost(&mut self, ignore: bool) {
		self.ignore_focus_lost = ignore;
	}

	pub fn title(&self) -> Option<&str> {
		self.title.as_deref()
	}

	pub fn set_title(&mut self, title: Option<String>) {
		self.title = title;
	}

	/// Position in a multi-step flow, as `(step, total_steps)`.
	pub fn step(&self) -> (Option<usize>, Option<usize>) {
		(self.step, self.total_steps)
	}

	pub fn set_step(&mut self, step: Option<usize>, total_steps: Option<usize>) {
		self.step = step;
		self.total_steps = total_steps;
	}

	pub fn commands(&self) -> &[Command] {
		&self.commands
	}

	pub fn set_commands(&mut self, commands: Vec<Command>) {
		self.commands = commands;
	}

	pub fn on_did_hide(&mut self, listener: impl FnMut(&HideReason) + Send + 'static) -> ListenerId {
		self.on_did_hide.subscribe(listener)
	}

	pub fn on_did_accept(&mut self, mut listener: impl FnMut() + Send + 'static) -> ListenerId {
		self.on_did_accept.subscribe(move |_| listener())
	}

	pub fn on_did_trigger_command(&mut self, listener: impl FnMut(&Command) + Send + 'static) -> ListenerId {
		self.on_did_trigger_command.subscribe(listener)
	}

	pub fn on_did_change_value(&mut self, listener: impl FnMut(&String) + Send + 'static) -> ListenerId {
		self.on_did_change_value.subscribe(listener)
	}

	/// Removes a listener from whichever core channel holds it.
	pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
		self.on_did_hide.unsubscribe(id)
			|| self.on_did_accept.unsubscribe(id)
			|| self.on_did_trigger_command.unsubscribe(id)
			|| self.on_did_change_value.unsubscribe(id)
	}

	/// Token cancelled when the session is disposed; async work spawned for
	/// the session selects on it.
	pub(crate) fn lifetime(&self) -> &CancellationToken {
		&self.lifetime
	}

	pub(crate) fn mark_shown(&mut self) -> bool {
		match self.state {
			SessionState::Created | SessionState::Hidden => {
				self.state = SessionState::Shown;
				true
			}
			SessionState::Shown | SessionState::Disposed => false,
		}
	}

	pub(crate) fn mark_hidden(&mut self, reason: HideReason) -> bool {
		if self.state != SessionState::Shown {
			return false;
		}
		self.state = SessionState::Hidden;
		self.on_did_hide.fire(&reason);
		true
	}

	pub(crate) fn fire_accept(&mut self) {
		self.on_did_accept.fire(&());
	}

	pub(crate) fn fire_value_changed(&mut self, value: &str) {
		if self.on_did_change_value.is_empty() {
			return;
		}
		self.on_did_change_value.fire(&value.to_string());
	}

	pub(crate) fn trigger_command(&mut self, index: usize) -> bool {
		let Some(command) = self.commands.get(index).cloned() else {
			return false;
		};
		self.on_did_trigger_command.fire(&command);
		true
	}

	/// Moves to `Disposed`, stops spawned work, and drops every listener.
	/// Idempotent.
	pub(crate) fn dispose(&mut self) -> bool {
		if self.state == SessionState::Disposed {
			return false;
		}
		self.state = SessionState::Disposed;
		self.lifetime.cancel();
		self.on_did_hide.clear();
		self.on_did_accept.clear();
		self.on_did_trigger_command.clear();
		self.on_did_change_value.clear();
		true
	}
}

/// Render-ready copy of a session's last known state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSnapshot {
	Pick {
		query: String,
		placeholder: Option<String>,
		visible_items: Vec<PickItem>,
		focused_items: Vec<PickItem>,
		selected_items: Vec<PickItem>,
		can_select_many: bool,
		busy: bool,
	},
	Input {
		value: String,
		value_selection: Option<(usize, usize)>,
		prompt: Option<String>,
		placeholder: Option<String>,
		password: bool,
		validation_message: String,
		busy: bool,
	},
}

/// One session of either shape.
#[derive(Debug)]
pub enum Session {
	Pick(PickSession),
	Input(InputSession),
}

impl Session {
	pub fn core(&self) -> &SessionCore {
		match self {
			Self::Pick(pick) => pick.core(),
			Self::Input(input) => input.core(),
		}
	}

	pub fn core_mut(&mut self) -> &mut SessionCore {
		match self {
			Self::Pick(pick) => pick.core_mut(),
			Self::Input(input) => input.core_mut(),
		}
	}

	pub fn id(&self) -> SessionId {
		self.core().id()
	}

	pub fn state(&self) -> SessionState {
		self.core().state()
	}

	/// Routes typed text: the query of a pick, the value of an input.
	pub fn set_value(&mut self, value: &str) -> bool {
		match self {
			Self::Pick(pick) => pick.set_value(value),
			Self::Input(input) => input.set_value(value),
		}
	}

	pub fn snapshot(&self) -> SessionSnapshot {
		match self {
			Self::Pick(pick) => pick.snapshot(),
			Self::Input(input) => input.snapshot(),
		}
	}

	pub(crate) fn dispose(&mut self) -> bool {
		match self {
			Self::Pick(pick) => pick.dispose(),
			Self::Input(input) => input.dispose(),
		}
	}

	pub fn as_pick(&self) -> Option<&PickSession> {
		match self {
			Self::Pick(pick) => Some(pick),
			Self::Input(_) => None,
		}
	}

	pub fn as_pick_mut(&mut self) -> Option<&mut PickSession> {
		match self {
			Self::Pick(pick) => Some(pick),
			Self::Input(_) => None,
		}
	}

	pub fn as_input(&self) -> Option<&InputSession> {
		match self {
			Self::Input(input) => Some(input),
			Self::Pick(_) => None,
		}
	}

	pub fn as_input_mut(&mut self) -> Option<&mut InputSession> {
		match self {
			Self::Input(input) => Some(input),
			Self::Pick(_) => None,
		}
	}
}
