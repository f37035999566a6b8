//! Modal quick input sessions.
//!
//! A [`QuickInputController`] turns requests for user input into on-screen
//! sessions: a filterable item picker ([`PickSession`]) or a free-text prompt
//! ([`InputSession`]). Sessions stack, so a nested request suspends the
//! current one and resumes it when it settles. Every request settles exactly
//! once, with a value, [`QuickInputError::Cancelled`], or a propagated error.
//!
//! The controller runs on a single event-processing task. Asynchronous work
//! supplied by callers (item lists, input validation, cancellation tokens)
//! reports back as messages applied by [`QuickInputController::pump`] or
//! [`QuickInputController::process_next`]; results that arrive for disposed
//! sessions or superseded input are discarded.

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod item;
pub mod keybinding;
pub mod request;
pub mod session;
pub mod stack;

pub use config::QuickInputConfig;
pub use controller::{AcceptBlock, AcceptOutcome, QuickInputController, QuickInputEvent};
pub use error::{ConfigError, KeybindingParseError, QuickInputError};
pub use event::{Emitter, ListenerId};
pub use item::{Command, IconRef, ItemKey, PickItem};
pub use keybinding::{Keybinding, Modifiers, QuickNavigateConfig};
pub use quick_input_filter::MatchMode;
pub use request::{
	InputOptions, InputResult, ItemsSource, Pending, PickManyRequest, PickOneRequest, PickOptions, Picked,
	QuickInputParameters, RequestKind, ShowParameters, TextInputRequest, ValidateFn,
};
pub use session::{HideReason, InputSession, PickSession, Session, SessionId, SessionSnapshot, SessionState};
pub use stack::SessionStack;
pub use tokio_util::sync::CancellationToken;
