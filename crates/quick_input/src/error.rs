//! Error types for quick input requests and configuration.

use thiserror::Error;

/// Failure outcomes of a quick input request.
#[derive(Debug, Error)]
pub enum QuickInputError {
	/// The user dismissed the session, `cancel()` was called, or the request
	/// token fired.
	#[error("quick input cancelled")]
	Cancelled,

	/// A caller bug detected at the call site.
	#[error("invalid quick input request: {0}")]
	InvalidRequest(String),

	/// The caller-supplied item list failed to resolve.
	#[error("quick pick items failed to load: {0}")]
	Items(#[source] anyhow::Error),

	/// The caller-supplied input validator failed.
	#[error("input validation failed: {0}")]
	Validation(#[source] anyhow::Error),
}

impl QuickInputError {
	/// Returns true when the request ended because the user declined.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}

	pub(crate) fn invalid(msg: impl Into<String>) -> Self {
		Self::InvalidRequest(msg.into())
	}
}

/// Errors that can occur when parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or fields.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),
}

/// Errors from parsing a keybinding string such as `ctrl+tab`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeybindingParseError {
	#[error("empty keybinding")]
	Empty,

	#[error("unknown modifier '{0}'")]
	UnknownModifier(String),

	#[error("keybinding '{0}' has no key")]
	MissingKey(String),
}
