//! Keybinding descriptions for quick-navigate mode.
//!
//! Quick-navigate is the alt-tab style interaction: a chord opens a picker
//! and moves focus, repeated presses keep moving it, and releasing the
//! chord's modifiers accepts the focused item.

use std::str::FromStr;

use bitflags::bitflags;

use crate::error::KeybindingParseError;

bitflags! {
	/// Modifier keys held during a key event.
	#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
	pub struct Modifiers: u8 {
		const CTRL = 1;
		const ALT = 1 << 1;
		const SHIFT = 1 << 2;
		const SUPER = 1 << 3;
	}
}

/// A modifier set plus a key name, e.g. `ctrl+shift+tab`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keybinding {
	pub modifiers: Modifiers,
	pub key: String,
}

impl FromStr for Keybinding {
	type Err = KeybindingParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		if s.is_empty() {
			return Err(KeybindingParseError::Empty);
		}

		let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
		let key = parts.pop().filter(|key| !key.is_empty()).ok_or_else(|| KeybindingParseError::MissingKey(s.to_string()))?;

		let mut modifiers = Modifiers::empty();
		for part in parts {
			modifiers |= match part.to_ascii_lowercase().as_str() {
				"ctrl" | "control" => Modifiers::CTRL,
				"alt" | "option" => Modifiers::ALT,
				"shift" => Modifiers::SHIFT,
				"super" | "cmd" | "meta" | "win" => Modifiers::SUPER,
				_ => return Err(KeybindingParseError::UnknownModifier(part.to_string())),
			};
		}

		Ok(Self {
			modifiers,
			key: key.to_ascii_lowercase(),
		})
	}
}

/// Keybindings that opened a quick-navigate session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuickNavigateConfig {
	pub keybindings: Vec<Keybinding>,
}

impl QuickNavigateConfig {
	pub fn new(keybindings: Vec<Keybinding>) -> Self {
		Self { keybindings }
	}

	/// Parses each binding string with [`Keybinding::from_str`].
	pub fn parse<'a>(bindings: impl IntoIterator<Item = &'a str>) -> Result<Self, KeybindingParseError> {
		let keybindings = bindings.into_iter().map(str::parse::<Keybinding>).collect::<Result<_, _>>()?;
		Ok(Self { keybindings })
	}

	/// Returns true once none of the bound modifiers remain held.
	///
	/// Bindings without modifiers cannot be "released" and are ignored; a
	/// config made only of such bindings never reports release.
	pub fn is_released(&self, held: Modifiers) -> bool {
		let mut bound = self.keybindings.iter().filter(|kb| !kb.modifiers.is_empty()).peekable();
		if bound.peek().is_none() {
			return false;
		}
		bound.all(|kb| !held.intersects(kb.modifiers))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_modifier_chords() {
		let kb: Keybinding = "Ctrl+Shift+Tab".parse().unwrap();
		assert_eq!(kb.modifiers, Modifiers::CTRL | Modifiers::SHIFT);
		assert_eq!(kb.key, "tab");
	}

	#[test]
	fn rejects_malformed_bindings() {
		assert_eq!("".parse::<Keybinding>(), Err(KeybindingParseError::Empty));
		assert_eq!(
			"hyper+p".parse::<Keybinding>(),
			Err(KeybindingParseError::UnknownModifier("hyper".into()))
		);
		assert_eq!("ctrl+".parse::<Keybinding>(), Err(KeybindingParseError::MissingKey("ctrl+".into())));
	}

	#[test]
	fn release_requires_all_bound_modifiers_up() {
		let config = QuickNavigateConfig::parse(["ctrl+tab", "ctrl+shift+tab"]).unwrap();
		assert!(!config.is_released(Modifiers::CTRL));
		assert!(!config.is_released(Modifiers::SHIFT));
		assert!(config.is_released(Modifiers::ALT));
		assert!(config.is_released(Modifiers::empty()));
	}

	#[test]
	fn modifierless_bindings_never_release() {
		let config = QuickNavigateConfig::parse(["f5"]).unwrap();
		assert!(!config.is_released(Modifiers::empty()));
	}
}
