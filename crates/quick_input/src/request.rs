//! Request parameters and typed result futures.
//!
//! Three request kinds share one runtime path. [`ShowParameters`] is the
//! tagged union the controller works with; [`PickOneRequest`],
//! [`PickManyRequest`] and [`TextInputRequest`] wrap it to give `show` a
//! static result type through [`QuickInputParameters`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, Stream, StreamExt};
use tokio::sync::oneshot;

use crate::error::QuickInputError;
use crate::item::{Command, PickItem};
use crate::session::SessionId;

/// Asynchronous input validator. Resolves to an empty string for valid input
/// and to a user-facing message otherwise.
pub type ValidateFn = Arc<dyn Fn(String) -> BoxFuture<'static, anyhow::Result<String>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
	PickOne,
	PickMany,
	TextInput,
}

impl RequestKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::PickOne => "pick_one",
			Self::PickMany => "pick_many",
			Self::TextInput => "text_input",
		}
	}
}

/// Settled value of a request, shaped by its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
	Item(PickItem),
	Items(Vec<PickItem>),
	Text(String),
}

impl InputResult {
	pub fn kind(&self) -> RequestKind {
		match self {
			Self::Item(_) => RequestKind::PickOne,
			Self::Items(_) => RequestKind::PickMany,
			Self::Text(_) => RequestKind::TextInput,
		}
	}
}

/// Result of [`pick`](crate::QuickInputController::pick), shaped by
/// `can_pick_many`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Picked {
	One(PickItem),
	Many(Vec<PickItem>),
}

/// Where a pick session's items come from.
pub enum ItemsSource {
	/// Items available up front.
	Ready(Vec<PickItem>),
	/// A single pending list; the session is busy until it resolves.
	Future(BoxFuture<'static, anyhow::Result<Vec<PickItem>>>),
	/// Batches appended as they arrive; the session is busy until the stream
	/// ends.
	Stream(BoxStream<'static, anyhow::Result<Vec<PickItem>>>),
}

impl ItemsSource {
	pub fn future<F>(fut: F) -> Self
	where
		F: Future<Output = anyhow::Result<Vec<PickItem>>> + Send + 'static,
	{
		Self::Future(fut.boxed())
	}

	pub fn stream<S>(stream: S) -> Self
	where
		S: Stream<Item = anyhow::Result<Vec<PickItem>>> + Send + 'static,
	{
		Self::Stream(stream.boxed())
	}
}

impl From<Vec<PickItem>> for ItemsSource {
	fn from(items: Vec<PickItem>) -> Self {
		Self::Ready(items)
	}
}

impl std::fmt::Debug for ItemsSource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Ready(items) => f.debug_tuple("Ready").field(&items.len()).finish(),
			Self::Future(_) => f.write_str("Future"),
			Self::Stream(_) => f.write_str("Stream"),
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct PickOptions {
	pub title: Option<String>,
	pub placeholder: Option<String>,
	pub match_on_description: bool,
	pub match_on_detail: bool,
	/// Falls back to the controller config when unset.
	pub ignore_focus_lost: Option<bool>,
	pub can_pick_many: bool,
	pub commands: Vec<Command>,
}

#[derive(Clone, Default)]
pub struct InputOptions {
	pub title: Option<String>,
	pub value: Option<String>,
	pub value_selection: Option<(usize, usize)>,
	pub prompt: Option<String>,
	pub placeholder: Option<String>,
	pub password: bool,
	/// Falls back to the controller config when unset.
	pub ignore_focus_lost: Option<bool>,
	pub commands: Vec<Command>,
	pub validate_input: Option<ValidateFn>,
}

impl InputOptions {
	/// Sets an async validator from a closure.
	pub fn validate_with<F, Fut>(mut self, validate: F) -> Self
	where
		F: Fn(String) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
	{
		self.validate_input = Some(Arc::new(move |value| validate(value).boxed()));
		self
	}
}

impl std::fmt::Debug for InputOptions {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InputOptions")
			.field("title", &self.title)
			.field("value", &self.value)
			.field("prompt", &self.prompt)
			.field("placeholder", &self.placeholder)
			.field("password", &self.password)
			.field("validate_input", &self.validate_input.is_some())
			.finish_non_exhaustive()
	}
}

/// Low-level request description, discriminated by kind.
#[derive(Debug)]
pub enum ShowParameters {
	PickOne { items: ItemsSource, options: PickOptions },
	PickMany { items: ItemsSource, options: PickOptions },
	TextInput { options: InputOptions },
}

impl ShowParameters {
	pub fn kind(&self) -> RequestKind {
		match self {
			Self::PickOne { .. } => RequestKind::PickOne,
			Self::PickMany { .. } => RequestKind::PickMany,
			Self::TextInput { .. } => RequestKind::TextInput,
		}
	}

	/// Rejects parameters whose options contradict their kind.
	pub(crate) fn validate(self) -> Result<Self, QuickInputError> {
		match self {
			Self::PickOne { ref options, .. } if options.can_pick_many => Err(QuickInputError::invalid(
				"pick_one request with can_pick_many set; use a pick_many request",
			)),
			Self::PickMany { items, mut options } => {
				options.can_pick_many = true;
				Ok(Self::PickMany { items, options })
			}
			other => Ok(other),
		}
	}
}

/// Request parameters with a statically known result type.
pub trait QuickInputParameters {
	type Output: Send + 'static;

	fn into_parameters(self) -> ShowParameters;

	fn extract(result: InputResult) -> Result<Self::Output, QuickInputError>;
}

fn shape_mismatch(expected: RequestKind, got: &InputResult) -> QuickInputError {
	QuickInputError::invalid(format!(
		"expected {} result, got {}",
		expected.as_str(),
		got.kind().as_str()
	))
}

impl QuickInputParameters for ShowParameters {
	type Output = InputResult;

	fn into_parameters(self) -> ShowParameters {
		self
	}

	fn extract(result: InputResult) -> Result<InputResult, QuickInputError> {
		Ok(result)
	}
}

#[derive(Debug)]
pub struct PickOneRequest {
	pub items: ItemsSource,
	pub options: PickOptions,
}

impl PickOneRequest {
	pub fn new(items: impl Into<ItemsSource>, options: PickOptions) -> Self {
		Self {
			items: items.into(),
			options,
		}
	}
}

impl QuickInputParameters for PickOneRequest {
	type Output = PickItem;

	fn into_parameters(self) -> ShowParameters {
		ShowParameters::PickOne {
			items: self.items,
			options: self.options,
		}
	}

	fn extract(result: InputResult) -> Result<PickItem, QuickInputError> {
		match result {
			InputResult::Item(item) => Ok(item),
			other => Err(shape_mismatch(RequestKind::PickOne, &other)),
		}
	}
}

#[derive(Debug)]
pub struct PickManyRequest {
	pub items: ItemsSource,
	pub options: PickOptions,
}

impl PickManyRequest {
	pub fn new(items: impl Into<ItemsSource>, options: PickOptions) -> Self {
		Self {
			items: items.into(),
			options,
		}
	}
}

impl QuickInputParameters for PickManyRequest {
	type Output = Vec<PickItem>;

	fn into_parameters(self) -> ShowParameters {
		ShowParameters::PickMany {
			items: self.items,
			options: self.options,
		}
	}

	fn extract(result: InputResult) -> Result<Vec<PickItem>, QuickInputError> {
		match result {
			InputResult::Items(items) => Ok(items),
			other => Err(shape_mismatch(RequestKind::PickMany, &other)),
		}
	}
}

#[derive(Debug)]
pub struct TextInputRequest {
	pub options: InputOptions,
}

impl TextInputRequest {
	pub fn new(options: InputOptions) -> Self {
		Self { options }
	}
}

impl QuickInputParameters for TextInputRequest {
	type Output = String;

	fn into_parameters(self) -> ShowParameters {
		ShowParameters::TextInput { options: self.options }
	}

	fn extract(result: InputResult) -> Result<String, QuickInputError> {
		match result {
			InputResult::Text(text) => Ok(text),
			other => Err(shape_mismatch(RequestKind::TextInput, &other)),
		}
	}
}

pub(crate) fn extract_picked(result: InputResult) -> Result<Picked, QuickInputError> {
	match result {
		InputResult::Item(item) => Ok(Picked::One(item)),
		InputResult::Items(items) => Ok(Picked::Many(items)),
		other @ InputResult::Text(_) => Err(shape_mismatch(RequestKind::PickOne, &other)),
	}
}

pub(crate) type Settlement = Result<InputResult, QuickInputError>;

/// Future resolving to the outcome of one request.
///
/// Resolves exactly once: with the value, with
/// [`QuickInputError::Cancelled`], or with a propagated error. Dropping it
/// does not cancel the session; use a cancellation token for that.
#[must_use = "a pending quick input does nothing unless awaited"]
pub struct Pending<T> {
	session: SessionId,
	rx: oneshot::Receiver<Settlement>,
	extract: fn(InputResult) -> Result<T, QuickInputError>,
}

impl<T> Pending<T> {
	pub(crate) fn new(
		session: SessionId,
		rx: oneshot::Receiver<Settlement>,
		extract: fn(InputResult) -> Result<T, QuickInputError>,
	) -> Self {
		Self { session, rx, extract }
	}

	/// The session serving this request.
	pub fn session(&self) -> SessionId {
		self.session
	}

	/// Takes the outcome if the request has settled, without waiting.
	///
	/// Returns `None` while pending. After it returns `Some`, the future
	/// must not be polled again.
	pub fn try_take(&mut self) -> Option<Result<T, QuickInputError>> {
		match self.rx.try_recv() {
			Ok(settlement) => Some(settlement.and_then(self.extract)),
			Err(oneshot::error::TryRecvError::Empty) => None,
			Err(oneshot::error::TryRecvError::Closed) => Some(Err(QuickInputError::Cancelled)),
		}
	}
}

impl<T> Future for Pending<T> {
	type Output = Result<T, QuickInputError>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		let settlement = ready!(Pin::new(&mut this.rx).poll(cx));
		Poll::Ready(match settlement {
			Ok(settlement) => settlement.and_then(this.extract),
			// Sender dropped without settling.
			Err(_) => Err(QuickInputError::Cancelled),
		})
	}
}

impl<T> std::fmt::Debug for Pending<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Pending").field("session", &self.session).finish_non_exhaustive()
	}
}
