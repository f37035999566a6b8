use tokio_util::sync::CancellationToken;

use super::{SessionCore, SessionId, SessionSnapshot};
use crate::config::QuickInputConfig;
use crate::event::ListenerId;
use crate::request::ValidateFn;

/// Free-text prompt with optional asynchronous validation.
pub struct InputSession {
	core: SessionCore,
	value: String,
	value_selection: Option<(usize, usize)>,
	placeholder: Option<String>,
	prompt: Option<String>,
	password: bool,
	validation_message: String,
	validator: Option<ValidateFn>,
	validation: ValidationState,
}

/// Bookkeeping for the latest-value-wins validation debounce.
#[derive(Debug, Default)]
struct ValidationState {
	generation: u64,
	in_flight: Option<CancellationToken>,
}

/// A validation run handed to the controller for spawning.
pub(crate) struct ValidationJob {
	pub generation: u64,
	pub value: String,
	pub validator: ValidateFn,
	pub cancel: CancellationToken,
}

impl std::fmt::Debug for InputSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InputSession")
			.field("id", &self.core.id())
			.field("state", &self.core.state())
			.field("value", &if self.password { "<hidden>" } else { self.value.as_str() })
			.field("validation_message", &self.validation_message)
			.field("validator", &self.validator.is_some())
			.finish_non_exhaustive()
	}
}

impl InputSession {
	pub(crate) fn new(id: SessionId, config: &QuickInputConfig) -> Self {
		Self {
			core: SessionCore::new(id, config.ignore_focus_lost),
			value: String::new(),
			value_selection: None,
			placeholder: None,
			prompt: None,
			password: false,
			validation_message: String::new(),
			validator: None,
			validation: ValidationState::default(),
		}
	}

	pub fn core(&self) -> &SessionCore {
		&self.core
	}

	pub fn core_mut(&mut self) -> &mut SessionCore {
		&mut self.core
	}

	pub fn value(&self) -> &str {
		&self.value
	}

	/// Replaces the value. Returns false when unchanged.
	///
	/// The value selection is clamped to the new value's length.
	pub fn set_value(&mut self, value: &str) -> bool {
		if self.core.is_disposed() || self.value == value {
			return false;
		}
		self.value.clear();
		self.value.push_str(value);
		self.value_selection = self.value_selection.map(|range| self.clamp_selection(range));
		self.core.fire_value_changed(value);
		true
	}

	/// Selected char range within the value, as `(start, end)`.
	pub fn value_selection(&self) -> Option<(usize, usize)> {
		self.value_selection
	}

	pub fn set_value_selection(&mut self, selection: Option<(usize, usize)>) {
		self.value_selection = selection.map(|range| self.clamp_selection(range));
	}

	fn clamp_selection(&self, (start, end): (usize, usize)) -> (usize, usize) {
		let len = self.value.chars().count();
		let start = start.min(len);
		(start, end.min(len).max(start))
	}

	pub fn placeholder(&self) -> Option<&str> {
		self.placeholder.as_deref()
	}

	pub fn set_placeholder(&mut self, placeholder: Option<String>) {
		self.placeholder = placeholder;
	}

	pub fn prompt(&self) -> Option<&str> {
		self.prompt.as_deref()
	}

	pub fn set_prompt(&mut self, prompt: Option<String>) {
		self.prompt = prompt;
	}

	pub fn password(&self) -> bool {
		self.password
	}

	pub fn set_password(&mut self, password: bool) {
		self.password = password;
	}

	/// Empty when the value is acceptable.
	pub fn validation_message(&self) -> &str {
		&self.validation_message
	}

	pub fn set_validation_message(&mut self, message: impl Into<String>) {
		self.validation_message = message.into();
	}

	pub fn is_valid(&self) -> bool {
		self.validation_message.is_empty()
	}

	pub fn has_validator(&self) -> bool {
		self.validator.is_some()
	}

	pub fn on_did_change_value(&mut self, listener: impl FnMut(&String) + Send + 'static) -> ListenerId {
		self.core.on_did_change_value(listener)
	}

	pub(crate) fn set_validator(&mut self, validator: Option<ValidateFn>) {
		self.validator = validator;
	}

	/// Starts a validation run for the current value, superseding any run
	/// still in flight. Marks the session busy until the run is applied.
	pub(crate) fn begin_validation(&mut self) -> Option<ValidationJob> {
		if self.core.is_disposed() {
			return None;
		}
		let validator = self.validator.clone()?;
		if let Some(previous) = self.validation.in_flight.take() {
			previous.cancel();
		}
		self.validation.generation += 1;
		let cancel = self.core.lifetime().child_token();
		self.validation.in_flight = Some(cancel.clone());
		self.core.set_busy(true);

		Some(ValidationJob {
			generation: self.validation.generation,
			value: self.value.clone(),
			validator,
			cancel,
		})
	}

	/// Applies a validation result if it belongs to the latest run.
	pub(crate) fn finish_validation(&mut self, generation: u64, message: String) -> bool {
		if !self.is_current_validation(generation) {
			return false;
		}
		self.validation.in_flight = None;
		self.core.set_busy(false);
		self.validation_message = message;
		true
	}

	/// Abandons the latest run without applying a result.
	pub(crate) fn abandon_validation(&mut self, generation: u64) {
		if self.is_current_validation(generation) {
			self.validation.in_flight = None;
			self.core.set_busy(false);
		}
	}

	pub(crate) fn is_current_validation(&self, generation: u64) -> bool {
		!self.core.is_disposed() && self.validation.generation == generation
	}

	pub(crate) fn dispose(&mut self) -> bool {
		if !self.core.dispose() {
			return false;
		}
		self.validation.in_flight = None;
		self.validator = None;
		true
	}

	pub fn snapshot(&self) -> SessionSnapshot {
		SessionSnapshot::Input {
			value: self.value.clone(),
			value_selection: self.value_selection,
			prompt: self.prompt.clone(),
			placeholder: self.placeholder.clone(),
			password: self.password,
			validation_message: self.validation_message.clone(),
			busy: self.core.busy(),
		}
	}
}
