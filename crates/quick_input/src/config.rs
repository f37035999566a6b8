//! Controller-wide defaults.

use std::time::Duration;

use quick_input_filter::MatchMode;
use serde::Deserialize;

use crate::error::ConfigError;

/// Defaults applied to every session the controller creates.
///
/// Per-request options override the fields they name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuickInputConfig {
	/// Matching strategy for the built-in item filter.
	pub match_mode: MatchMode,
	/// Delay before invoking an input validator after a value change.
	pub validation_delay_ms: u64,
	/// Default for sessions that do not set `ignore_focus_lost`.
	pub ignore_focus_lost: bool,
	/// Move focus to the first visible item when the focused one is filtered out.
	pub focus_first_on_filter: bool,
}

impl Default for QuickInputConfig {
	fn default() -> Self {
		Self {
			match_mode: MatchMode::Fuzzy,
			validation_delay_ms: 0,
			ignore_focus_lost: false,
			focus_first_on_filter: true,
		}
	}
}

impl QuickInputConfig {
	/// Parses a config from TOML. Missing fields take their defaults.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	pub fn validation_delay(&self) -> Duration {
		Duration::from_millis(self.validation_delay_ms)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_toml_yields_defaults() {
		let config = QuickInputConfig::from_toml_str("").unwrap();
		assert_eq!(config, QuickInputConfig::default());
	}

	#[test]
	fn toml_overrides_named_fields() {
		let config = QuickInputConfig::from_toml_str(
			r#"
match_mode = "substring"
validation_delay_ms = 150
ignore_focus_lost = true
"#,
		)
		.unwrap();
		assert_eq!(config.match_mode, MatchMode::Substring);
		assert_eq!(config.validation_delay(), Duration::from_millis(150));
		assert!(config.ignore_focus_lost);
		assert!(config.focus_first_on_filter);
	}

	#[test]
	fn unknown_fields_are_rejected() {
		let err = QuickInputConfig::from_toml_str("bogus = 1").unwrap_err();
		assert!(err.to_string().contains("bogus"));
	}
}
