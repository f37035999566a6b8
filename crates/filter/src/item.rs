/// Text fields an item exposes to the filter.
pub trait Filterable {
	/// Primary text, always matched against.
	fn label(&self) -> &str;

	/// Secondary text, matched when description matching is enabled.
	fn description(&self) -> Option<&str> {
		None
	}

	/// Tertiary text, matched when detail matching is enabled.
	fn detail(&self) -> Option<&str> {
		None
	}

	/// Items that stay visible whatever the query.
	fn always_show(&self) -> bool {
		false
	}
}

impl<T: Filterable + ?Sized> Filterable for &T {
	fn label(&self) -> &str {
		(**self).label()
	}

	fn description(&self) -> Option<&str> {
		(**self).description()
	}

	fn detail(&self) -> Option<&str> {
		(**self).detail()
	}

	fn always_show(&self) -> bool {
		(**self).always_show()
	}
}
