//! Session orchestration.
//!
//! [`QuickInputController`] owns every live session and the stack that
//! orders them. Callers open requests ([`pick`](QuickInputController::pick),
//! [`input`](QuickInputController::input), [`show`](QuickInputController::show))
//! and get a [`Pending`] future back; UI input is routed to the top session
//! through the interaction methods; the UI learns what to draw from
//! [`take_events`](QuickInputController::take_events).
//!
//! All state lives on one task. Item loading, validation, and token watching
//! run as spawned tasks that post messages back, applied by
//! [`pump`](QuickInputController::pump) or
//! [`process_next`](QuickInputController::process_next).

use rustc_hash::FxHashMap;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::config::QuickInputConfig;
use crate::error::QuickInputError;
use crate::keybinding::{Modifiers, QuickNavigateConfig};
use crate::request::{
	InputOptions, InputResult, ItemsSource, Pending, PickOptions, Picked, QuickInputParameters, RequestKind, Settlement,
	ShowParameters, TextInputRequest, extract_picked,
};
use crate::session::{HideReason, InputSession, PickSession, Session, SessionId, SessionSnapshot, SessionState};
use crate::stack::SessionStack;

mod msg;
mod tasks;

use msg::QuickInputMsg;


/// Notifications for the UI layer, drained with
/// [`take_events`](QuickInputController::take_events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickInputEvent {
	/// A session became the visible one. Also sent when a suspended session
	/// resumes.
	Shown { session: SessionId, snapshot: SessionSnapshot },
	Hidden { session: SessionId, reason: HideReason },
	/// Asynchronous work changed a session's items, busy flag, or validation
	/// message.
	Updated { session: SessionId },
	Disposed { session: SessionId },
	FocusRequested { session: SessionId },
}

/// Why [`accept`](QuickInputController::accept) did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptBlock {
	Disabled,
	/// Validation is still running.
	Busy,
	/// The current value has a validation message.
	ValidationFailed,
	/// A single pick with nothing focused or selected.
	NothingSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
	/// The request settled and its session was disposed.
	Settled,
	/// A caller-owned session fired `on_did_accept` and stays open.
	Emitted,
	Blocked(AcceptBlock),
}

struct PendingRequest {
	kind: RequestKind,
	reply: oneshot::Sender<Settlement>,
	token: Option<CancellationToken>,
}

/// Single-owner orchestrator for quick input sessions.
///
/// Dropping the controller settles every outstanding request with
/// [`QuickInputError::Cancelled`] and disposes every session.
pub struct QuickInputController {
	config: QuickInputConfig,
	sessions: FxHashMap<SessionId, Session>,
	stack: SessionStack,
	requests: FxHashMap<SessionId, PendingRequest>,
	next_id: u64,
	msg_tx: mpsc::UnboundedSender<QuickInputMsg>,
	msg_rx: mpsc::UnboundedReceiver<QuickInputMsg>,
	events: Vec<QuickInputEvent>,
	has_focus: bool,
}

impl Default for QuickInputController {
	fn default() -> Self {
		Self::new(QuickInputConfig::default())
	}
}

impl std::fmt::Debug for QuickInputController {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("QuickInputController")
			.field("sessions", &self.sessions.len())
			.field("stack", &self.stack)
			.field("pending", &self.requests.len())
			.finish_non_exhaustive()
	}
}

impl QuickInputController {
	pub fn new(config: QuickInputConfig) -> Self {
		let (msg_tx, msg_rx) = mpsc::unbounded_channel();
		Self {
			config,
			sessions: FxHashMap::default(),
			stack: SessionStack::new(),
			requests: FxHashMap::default(),
			next_id: 0,
			msg_tx,
			msg_rx,
			events: Vec::new(),
			has_focus: false,
		}
	}

	pub fn config(&self) -> &QuickInputConfig {
		&self.config
	}

	/// The interactive session, if any.
	pub fn active(&self) -> Option<SessionId> {
		self.stack.top()
	}

	pub fn active_session(&self) -> Option<&Session> {
		self.sessions.get(&self.stack.top()?)
	}

	pub fn stack(&self) -> &SessionStack {
		&self.stack
	}

	pub fn session(&self, id: SessionId) -> Option<&Session> {
		self.sessions.get(&id)
	}

	pub fn session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
		self.sessions.get_mut(&id)
	}

	pub fn quick_pick(&self, id: SessionId) -> Option<&PickSession> {
		self.sessions.get(&id)?.as_pick()
	}

	pub fn quick_pick_mut(&mut self, id: SessionId) -> Option<&mut PickSession> {
		self.pick_mut(id)
	}

	pub fn input_box(&self, id: SessionId) -> Option<&InputSession> {
		self.sessions.get(&id)?.as_input()
	}

	pub fn input_box_mut(&mut self, id: SessionId) -> Option<&mut InputSession> {
		self.sessions.get_mut(&id)?.as_input_mut()
	}

	/// Whether `id` serves a request that has not settled yet.
	pub fn is_pending(&self, id: SessionId) -> bool {
		self.requests.contains_key(&id)
	}

	pub fn pending_count(&self) -> usize {
		self.requests.len()
	}

	pub fn has_focus(&self) -> bool {
		self.has_focus
	}

	/// Opens a pick session over `items`.
	///
	/// Resolves to [`Picked::Many`] when `options.can_pick_many` is set and
	/// to [`Picked::One`] otherwise.
	pub fn pick(
		&mut self,
		items: impl Into<ItemsSource>,
		options: PickOptions,
		token: Option<CancellationToken>,
	) -> Pending<Picked> {
		let items = items.into();
		let params = if options.can_pick_many {
			ShowParameters::PickMany { items, options }
		} else {
			ShowParameters::PickOne { items, options }
		};
		self.open(params, token, extract_picked)
	}

	/// Opens a text input session.
	pub fn input(&mut self, options: InputOptions, token: Option<CancellationToken>) -> Pending<String> {
		self.open(ShowParameters::TextInput { options }, token, TextInputRequest::extract)
	}

	/// Opens a session for any request shape.
	///
	/// Parameters whose options contradict their kind are rejected here,
	/// before any session exists.
	pub fn show<P>(&mut self, params: P, token: Option<CancellationToken>) -> Result<Pending<P::Output>, QuickInputError>
	where
		P: QuickInputParameters,
	{
		let params = params.into_parameters().validate()?;
		Ok(self.open(params, token, P::extract))
	}

	/// Creates a caller-owned pick session. It is not shown until
	/// [`show_session`](Self::show_session) is called and never settles a
	/// request; accepting it only fires `on_did_accept`.
	pub fn create_quick_pick(&mut self) -> SessionId {
		let id = self.alloc_id();
		self.sessions.insert(id, Session::Pick(PickSession::new(id, &self.config)));
		tracing::debug!(session = id.get(), "quick_input.create_quick_pick");
		id
	}

	/// Creates a caller-owned input session. See
	/// [`create_quick_pick`](Self::create_quick_pick).
	pub fn create_input_box(&mut self) -> SessionId {
		let id = self.alloc_id();
		self.sessions.insert(id, Session::Input(InputSession::new(id, &self.config)));
		tracing::debug!(session = id.get(), "quick_input.create_input_box");
		id
	}

	/// Pushes a session onto the stack, or brings it back to the top.
	pub fn show_session(&mut self, id: SessionId) -> Result<(), QuickInputError> {
		if !self.sessions.contains_key(&id) {
			return Err(QuickInputError::invalid(format!("unknown or disposed session {id}")));
		}
		if self.stack.top() == Some(id) {
			return Ok(());
		}
		self.push(id);
		Ok(())
	}

	/// Hides a session. A request-backed session is cancelled; a caller-owned
	/// one stays alive and can be shown again.
	pub fn hide_session(&mut self, id: SessionId) -> bool {
		self.dismiss(id, HideReason::Explicit)
	}

	/// Disposes a session from any state, settling its request as cancelled.
	pub fn dispose_session(&mut self, id: SessionId) -> bool {
		if self.requests.contains_key(&id) {
			return self.cancel_session(id, HideReason::Explicit);
		}
		let Some(session) = self.sessions.get_mut(&id) else {
			return false;
		};
		if session.core_mut().mark_hidden(HideReason::Explicit) {
			self.events.push(QuickInputEvent::Hidden {
				session: id,
				reason: HideReason::Explicit,
			});
		}
		self.retire(id);
		true
	}

	/// Asks the UI to focus the active session.
	pub fn focus(&mut self) -> bool {
		let Some(id) = self.stack.top() else {
			return false;
		};
		self.has_focus = true;
		self.events.push(QuickInputEvent::FocusRequested { session: id });
		true
	}

	/// The UI lost focus. Dismisses the active session unless it ignores
	/// focus loss.
	pub fn focus_lost(&mut self) -> bool {
		self.has_focus = false;
		let Some(id) = self.stack.top() else {
			return false;
		};
		if self.sessions.get(&id).is_some_and(|session| session.core().ignore_focus_lost()) {
			tracing::trace!(session = id.get(), "quick_input.focus_lost_ignored");
			return false;
		}
		self.dismiss(id, HideReason::FocusLost)
	}

	/// Advances focus in the active pick, as repeated presses of a
	/// quick-navigate chord do.
	pub fn toggle(&mut self) -> bool {
		let Some(pick) = self.active_pick_mut() else {
			return false;
		};
		if pick.quick_navigate().is_none() {
			return false;
		}
		pick.move_focus(1)
	}

	/// Moves focus in the active pick one item forward or back, wrapping.
	///
	/// With a quick-navigate config, releasing every modifier of its
	/// keybindings later accepts; see [`release_modifiers`](Self::release_modifiers).
	pub fn navigate(&mut self, next: bool, quick_navigate: Option<QuickNavigateConfig>) -> bool {
		let Some(pick) = self.active_pick_mut() else {
			return false;
		};
		if let Some(config) = quick_navigate {
			pick.set_quick_navigate(Some(config));
		}
		pick.move_focus(if next { 1 } else { -1 })
	}

	/// Reports the modifiers still held. Accepts the active pick once its
	/// quick-navigate chord is released, returning the outcome.
	pub fn release_modifiers(&mut self, held: Modifiers) -> Option<AcceptOutcome> {
		let pick = self.active_pick_mut()?;
		if !pick.quick_navigate()?.is_released(held) {
			return None;
		}
		pick.set_quick_navigate(None);
		tracing::trace!(session = pick.core().id().get(), "quick_input.quick_navigate_release");
		self.accept().ok()
	}

	/// Accepts the active session.
	///
	/// Fails with [`QuickInputError::InvalidRequest`] when nothing is active.
	pub fn accept(&mut self) -> Result<AcceptOutcome, QuickInputError> {
		let Some(id) = self.stack.top() else {
			return Err(QuickInputError::invalid("accept with no active quick input"));
		};
		let kind = self.requests.get(&id).map(|request| request.kind);
		let Some(session) = self.sessions.get_mut(&id) else {
			return Err(QuickInputError::invalid(format!("active session {id} is missing")));
		};
		if !session.core().enabled() {
			return Ok(AcceptOutcome::Blocked(AcceptBlock::Disabled));
		}

		let Some(kind) = kind else {
			session.core_mut().fire_accept();
			return Ok(AcceptOutcome::Emitted);
		};

		let result = match (kind, &mut *session) {
			(RequestKind::TextInput, Session::Input(input)) => {
				if input.core().busy() {
					return Ok(AcceptOutcome::Blocked(AcceptBlock::Busy));
				}
				if !input.is_valid() {
					return Ok(AcceptOutcome::Blocked(AcceptBlock::ValidationFailed));
				}
				InputResult::Text(input.value().to_string())
			}
			(RequestKind::PickOne, Session::Pick(pick)) => match pick.resolve_accept().into_iter().next() {
				Some(item) => InputResult::Item(item),
				None => return Ok(AcceptOutcome::Blocked(AcceptBlock::NothingSelected)),
			},
			(RequestKind::PickMany, Session::Pick(pick)) => InputResult::Items(pick.resolve_accept()),
			(kind, _) => {
				return Err(QuickInputError::invalid(format!(
					"{} request bound to a session of the wrong shape",
					kind.as_str()
				)));
			}
		};

		session.core_mut().fire_accept();
		tracing::debug!(session = id.get(), kind = kind.as_str(), "quick_input.accept");
		self.settle(id, Ok(result));
		self.retire(id);
		Ok(AcceptOutcome::Settled)
	}

	/// Dismisses the active session without a value.
	pub fn cancel(&mut self) -> bool {
		match self.stack.top() {
			Some(id) => self.dismiss(id, HideReason::Explicit),
			None => false,
		}
	}

	/// Hides the active session. Same as [`cancel`](Self::cancel) for
	/// request-backed sessions.
	pub fn hide(&mut self) -> bool {
		self.cancel()
	}

	/// Routes typed text to the active session: the query of a pick, the
	/// value of an input. Input values are revalidated.
	pub fn set_value(&mut self, value: &str) -> bool {
		let Some(id) = self.stack.top() else {
			return false;
		};
		let Some(session) = self.sessions.get_mut(&id) else {
			return false;
		};
		if !session.core().enabled() || !session.set_value(value) {
			return false;
		}
		self.schedule_validation(id);
		true
	}

	/// Toggles the visible item at `index` in the active pick.
	pub fn toggle_item(&mut self, index: usize) -> bool {
		self.active_pick_mut().is_some_and(|pick| pick.toggle_visible(index))
	}

	/// Fires the command at `index` on the active session.
	pub fn trigger_command(&mut self, index: usize) -> bool {
		let Some(id) = self.stack.top() else {
			return false;
		};
		self.sessions.get_mut(&id).is_some_and(|session| session.core_mut().trigger_command(index))
	}

	/// Drains pending UI notifications, oldest first.
	pub fn take_events(&mut self) -> Vec<QuickInputEvent> {
		std::mem::take(&mut self.events)
	}

	/// Applies every message already posted by background work and cancels
	/// requests whose tokens have fired. Never waits.
	///
	/// Returns the number of messages and cancellations handled.
	pub fn pump(&mut self) -> usize {
		let mut handled = self.sweep_tokens();
		while let Ok(msg) = self.msg_rx.try_recv() {
			self.handle_message(msg);
			handled += 1;
		}
		handled
	}

	/// Waits for the next message, applies it, then pumps.
	pub async fn process_next(&mut self) {
		// The controller holds a sender, so the channel never closes.
		if let Some(msg) = self.msg_rx.recv().await {
			self.handle_message(msg);
		}
		self.pump();
	}

	fn alloc_id(&mut self) -> SessionId {
		self.next_id += 1;
		SessionId(self.next_id)
	}

	fn pick_mut(&mut self, id: SessionId) -> Option<&mut PickSession> {
		self.sessions.get_mut(&id)?.as_pick_mut()
	}

	fn active_pick_mut(&mut self) -> Option<&mut PickSession> {
		let id = self.stack.top()?;
		self.pick_mut(id)
	}

	fn open<T>(
		&mut self,
		params: ShowParameters,
		token: Option<CancellationToken>,
		extract: fn(InputResult) -> Result<T, QuickInputError>,
	) -> Pending<T> {
		let id = self.alloc_id();
		let kind = params.kind();
		let (reply, rx) = oneshot::channel();
		let pending = Pending::new(id, rx, extract);

		if token.as_ref().is_some_and(CancellationToken::is_cancelled) {
			tracing::debug!(session = id.get(), kind = kind.as_str(), "quick_input.cancelled_before_show");
			let _ = reply.send(Err(QuickInputError::Cancelled));
			return pending;
		}

		let (session, items) = self.build_session(id, params);
		self.sessions.insert(id, session);
		self.requests.insert(
			id,
			PendingRequest {
				kind,
				reply,
				token: token.clone(),
			},
		);
		tracing::debug!(session = id.get(), kind = kind.as_str(), "quick_input.request");

		// Ready items land before the first snapshot is taken.
		if let Some(items) = items {
			self.load_items(id, items);
			if !self.sessions.contains_key(&id) {
				return pending;
			}
		}
		self.push(id);
		if let Some(token) = token {
			self.watch_token(id, token);
		}
		self.schedule_validation(id);
		pending
	}

	fn build_session(&self, id: SessionId, params: ShowParameters) -> (Session, Option<ItemsSource>) {
		match params {
			ShowParameters::PickOne { items, options } | ShowParameters::PickMany { items, options } => {
				let mut pick = PickSession::new(id, &self.config);
				pick.set_can_select_many(options.can_pick_many);
				pick.set_placeholder(options.placeholder);
				pick.set_match_on_description(options.match_on_description);
				pick.set_match_on_detail(options.match_on_detail);
				let core = pick.core_mut();
				core.set_title(options.title);
				core.set_commands(options.commands);
				if let Some(ignore) = options.ignore_focus_lost {
					core.set_ignore_focus_lost(ignore);
				}
				(Session::Pick(pick), Some(items))
			}
			ShowParameters::TextInput { options } => {
				let mut input = InputSession::new(id, &self.config);
				if let Some(value) = options.value {
					input.set_value(&value);
				}
				input.set_value_selection(options.value_selection);
				input.set_prompt(options.prompt);
				input.set_placeholder(options.placeholder);
				input.set_password(options.password);
				input.set_validator(options.validate_input);
				let core = input.core_mut();
				core.set_title(options.title);
				core.set_commands(options.commands);
				if let Some(ignore) = options.ignore_focus_lost {
					core.set_ignore_focus_lost(ignore);
				}
				(Session::Input(input), None)
			}
		}
	}

	fn load_items(&mut self, id: SessionId, items: ItemsSource) {
		let tx = self.msg_tx.clone();
		let Some(pick) = self.pick_mut(id) else {
			return;
		};
		let lifetime = pick.core().lifetime().clone();
		let spawned = match items {
			ItemsSource::Ready(items) => {
				pick.set_items(items);
				return;
			}
			ItemsSource::Future(items) => {
				pick.core_mut().set_busy(true);
				tasks::spawn(tasks::resolve_items(id, items, lifetime, tx))
			}
			ItemsSource::Stream(batches) => {
				pick.core_mut().set_busy(true);
				tasks::spawn(tasks::stream_items(id, batches, lifetime, tx))
			}
		};
		if !spawned {
			self.fail(id, QuickInputError::invalid("asynchronous items need a tokio runtime"));
		}
	}

	fn watch_token(&mut self, id: SessionId, token: CancellationToken) {
		let Some(session) = self.sessions.get(&id) else {
			return;
		};
		let lifetime = session.core().lifetime().clone();
		// Without a runtime, `pump` still sees the token through its sweep.
		tasks::spawn(tasks::watch_token(id, token, lifetime, self.msg_tx.clone()));
	}

	fn schedule_validation(&mut self, id: SessionId) {
		let Some(Session::Input(input)) = self.sessions.get_mut(&id) else {
			return;
		};
		let Some(job) = input.begin_validation() else {
			return;
		};
		let generation = job.generation;
		tracing::trace!(session = id.get(), generation, "quick_input.validate");
		if !tasks::spawn(tasks::validate(id, job, self.config.validation_delay(), self.msg_tx.clone())) {
			input.abandon_validation(generation);
		}
	}

	fn sweep_tokens(&mut self) -> usize {
		let mut fired: Vec<SessionId> = self
			.requests
			.iter()
			.filter(|(_, request)| request.token.as_ref().is_some_and(CancellationToken::is_cancelled))
			.map(|(id, _)| *id)
			.collect();
		fired.sort_unstable();
		for &id in &fired {
			self.cancel_session(id, HideReason::Cancelled);
		}
		fired.len()
	}

	/// Makes `id` the top session, suspending whatever it covers.
	fn push(&mut self, id: SessionId) {
		if let Some(covered) = self.stack.push(id)
			&& let Some(session) = self.sessions.get_mut(&covered)
			&& session.core_mut().mark_hidden(HideReason::Superseded)
		{
			self.events.push(QuickInputEvent::Hidden {
				session: covered,
				reason: HideReason::Superseded,
			});
		}
		if let Some(session) = self.sessions.get_mut(&id) {
			session.core_mut().mark_shown();
			self.events.push(QuickInputEvent::Shown {
				session: id,
				snapshot: session.snapshot(),
			});
		}
		tracing::debug!(session = id.get(), depth = self.stack.len(), "quick_input.push");
	}

	fn resume_top(&mut self) {
		let Some(top) = self.stack.top() else {
			return;
		};
		let Some(session) = self.sessions.get_mut(&top) else {
			return;
		};
		if session.core_mut().mark_shown() {
			tracing::debug!(session = top.get(), depth = self.stack.len(), "quick_input.resume");
			self.events.push(QuickInputEvent::Shown {
				session: top,
				snapshot: session.snapshot(),
			});
		}
	}

	/// Removes and disposes `id`, resuming the session beneath it. Sessions
	/// that were never shown are dropped without a `Disposed` event.
	fn retire(&mut self, id: SessionId) {
		let was_top = self.stack.remove(id).unwrap_or(false);
		let mut was_shown = was_top;
		if let Some(mut session) = self.sessions.remove(&id) {
			was_shown |= session.state() != SessionState::Created;
			session.dispose();
		}
		if was_shown {
			self.events.push(QuickInputEvent::Disposed { session: id });
		}
		tracing::debug!(session = id.get(), depth = self.stack.len(), "quick_input.dispose");
		if was_top {
			self.resume_top();
		}
	}

	/// Settles the request served by `id`. Returns false if it has no
	/// outstanding request.
	fn settle(&mut self, id: SessionId, outcome: Settlement) -> bool {
		let Some(request) = self.requests.remove(&id) else {
			return false;
		};
		match &outcome {
			Ok(_) => tracing::debug!(session = id.get(), kind = request.kind.as_str(), "quick_input.settle"),
			Err(error) => {
				tracing::debug!(session = id.get(), kind = request.kind.as_str(), %error, "quick_input.settle")
			}
		}
		if request.reply.send(outcome).is_err() {
			tracing::trace!(session = id.get(), "quick_input.settle_unobserved");
		}
		true
	}

	/// Hides, settles as cancelled, and disposes a request-backed session.
	fn cancel_session(&mut self, id: SessionId, reason: HideReason) -> bool {
		let Some(session) = self.sessions.get_mut(&id) else {
			return false;
		};
		if session.core_mut().mark_hidden(reason) {
			self.events.push(QuickInputEvent::Hidden { session: id, reason });
		}
		self.settle(id, Err(QuickInputError::Cancelled));
		self.retire(id);
		true
	}

	/// Settles with `error` and disposes.
	fn fail(&mut self, id: SessionId, error: QuickInputError) {
		if let Some(session) = self.sessions.get_mut(&id)
			&& session.core_mut().mark_hidden(HideReason::Cancelled)
		{
			self.events.push(QuickInputEvent::Hidden {
				session: id,
				reason: HideReason::Cancelled,
			});
		}
		self.settle(id, Err(error));
		self.retire(id);
	}

	/// Takes `id` off screen. Request-backed sessions are cancelled;
	/// caller-owned ones are only hidden.
	fn dismiss(&mut self, id: SessionId, reason: HideReason) -> bool {
		if self.requests.contains_key(&id) {
			return self.cancel_session(id, reason);
		}
		let Some(session) = self.sessions.get_mut(&id) else {
			return false;
		};
		let hidden = session.core_mut().mark_hidden(reason);
		if hidden {
			self.events.push(QuickInputEvent::Hidden { session: id, reason });
		}
		if let Some(pick) = session.as_pick_mut() {
			pick.set_quick_navigate(None);
		}
		let removed = self.stack.remove(id);
		if removed == Some(true) {
			self.resume_top();
		}
		hidden || removed.is_some()
	}
}

impl Drop for QuickInputController {
	fn drop(&mut self) {
		let mut pending: Vec<SessionId> = self.requests.keys().copied().collect();
		pending.sort_unstable();
		for id in pending {
			self.settle(id, Err(QuickInputError::Cancelled));
		}
		for session in self.sessions.values_mut() {
			session.dispose();
		}
	}
}
