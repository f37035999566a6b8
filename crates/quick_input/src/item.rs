//! Pick items and session commands.

use quick_input_filter::Filterable;

/// Stable identity of a pick item across list refreshes.
///
/// Items with an `id` are keyed by it; other items are keyed by their text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
	Id(String),
	Text {
		label: String,
		description: Option<String>,
		detail: Option<String>,
	},
}

/// A single row in a pick session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickItem {
	/// Stable identity across refreshes, if the caller has one.
	pub id: Option<String>,
	pub label: String,
	pub description: Option<String>,
	pub detail: Option<String>,
	/// Initially selected in multi-select sessions.
	pub picked: bool,
	/// Visible whatever the query.
	pub always_show: bool,
}

impl PickItem {
	pub fn new(label: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			..Self::default()
		}
	}

	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
		self.detail = Some(detail.into());
		self
	}

	pub fn with_picked(mut self, picked: bool) -> Self {
		self.picked = picked;
		self
	}

	pub fn with_always_show(mut self, always_show: bool) -> Self {
		self.always_show = always_show;
		self
	}

	/// Returns the identity used for selection and focus bookkeeping.
	pub fn key(&self) -> ItemKey {
		match &self.id {
			Some(id) => ItemKey::Id(id.clone()),
			None => ItemKey::Text {
				label: self.label.clone(),
				description: self.description.clone(),
				detail: self.detail.clone(),
			},
		}
	}
}

impl Filterable for PickItem {
	fn label(&self) -> &str {
		&self.label
	}

	fn description(&self) -> Option<&str> {
		self.description.as_deref()
	}

	fn detail(&self) -> Option<&str> {
		self.detail.as_deref()
	}

	fn always_show(&self) -> bool {
		self.always_show
	}
}

/// Opaque icon reference resolved by the theming layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IconRef(String);

impl IconRef {
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// A button shown alongside a session; reported back when triggered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
	pub icon: IconRef,
	pub tooltip: Option<String>,
}

impl Command {
	pub fn new(icon: impl Into<String>) -> Self {
		Self {
			icon: IconRef::new(icon),
			tooltip: None,
		}
	}

	pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
		self.tooltip = Some(tooltip.into());
		self
	}

	/// Navigation command for multi-step flows; callers react to it by
	/// re-opening the previous step.
	pub fn back() -> Self {
		Self::new("arrow-left").with_tooltip("Back")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn key_prefers_id_over_text() {
		let a = PickItem::new("Alpha").with_id("a");
		let renamed = PickItem::new("Alpha (renamed)").with_id("a");
		assert_eq!(a.key(), renamed.key());

		let b = PickItem::new("Beta").with_description("second");
		let b_other = PickItem::new("Beta").with_description("other");
		assert_ne!(b.key(), b_other.key());
		assert_eq!(b.key(), b.clone().with_picked(true).key());
	}

	#[test]
	fn back_command_is_stable() {
		assert_eq!(Command::back(), Command::back());
		assert_eq!(Command::back().icon.as_str(), "arrow-left");
	}
}
