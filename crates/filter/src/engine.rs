use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

use crate::Filterable;

/// How query atoms are matched against item text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MatchMode {
	/// Characters must appear in order, gaps allowed.
	#[default]
	Fuzzy,
	/// Each whitespace-separated atom must appear contiguously.
	Substring,
}

impl MatchMode {
	const fn atom_kind(self) -> AtomKind {
		match self {
			Self::Fuzzy => AtomKind::Fuzzy,
			Self::Substring => AtomKind::Substring,
		}
	}
}

/// Which item fields participate in matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FilterOptions {
	pub match_on_description: bool,
	pub match_on_detail: bool,
	pub mode: MatchMode,
}

/// Case-insensitive item filter holding the compiled query.
///
/// An item matches when its label matches, or its description/detail match
/// and the corresponding [`FilterOptions`] flag is set. A blank query matches
/// everything.
pub struct ItemFilter {
	matcher: Matcher,
	pattern: Option<Pattern>,
	query: String,
	options: FilterOptions,
	buf: Vec<char>,
}

impl Default for ItemFilter {
	fn default() -> Self {
		Self::new(FilterOptions::default())
	}
}

impl std::fmt::Debug for ItemFilter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ItemFilter")
			.field("query", &self.query)
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}

impl ItemFilter {
	pub fn new(options: FilterOptions) -> Self {
		Self {
			matcher: Matcher::new(Config::DEFAULT),
			pattern: None,
			query: String::new(),
			options,
			buf: Vec::new(),
		}
	}

	pub fn query(&self) -> &str {
		&self.query
	}

	pub fn options(&self) -> FilterOptions {
		self.options
	}

	/// Returns true when the query has no atoms and every item matches.
	pub fn is_empty(&self) -> bool {
		self.pattern.is_none()
	}

	/// Replaces the query. Returns false when the query is unchanged.
	pub fn set_query(&mut self, query: &str) -> bool {
		if self.query == query {
			return false;
		}
		self.query.clear();
		self.query.push_str(query);
		self.compile();
		true
	}

	/// Replaces the options. Returns false when the options are unchanged.
	pub fn set_options(&mut self, options: FilterOptions) -> bool {
		if self.options == options {
			return false;
		}
		let recompile = self.options.mode != options.mode;
		self.options = options;
		if recompile {
			self.compile();
		}
		true
	}

	fn compile(&mut self) {
		self.pattern = (!self.query.trim().is_empty()).then(|| {
			Pattern::new(
				&self.query,
				CaseMatching::Ignore,
				Normalization::Smart,
				self.options.mode.atom_kind(),
			)
		});
	}

	pub fn matches<T: Filterable + ?Sized>(&mut self, item: &T) -> bool {
		let Self {
			matcher,
			pattern,
			options,
			buf,
			..
		} = self;
		let Some(pattern) = pattern else {
			return true;
		};
		if item.always_show() {
			return true;
		}

		let mut hit = |text: &str| pattern.score(Utf32Str::new(text, buf), matcher).is_some();

		if hit(item.label()) {
			return true;
		}
		if options.match_on_description && item.description().is_some_and(&mut hit) {
			return true;
		}
		options.match_on_detail && item.detail().is_some_and(&mut hit)
	}

	/// Indices of matching items, in list order.
	pub fn filter_indices<T: Filterable>(&mut self, items: &[T]) -> Vec<usize> {
		let mut out = Vec::with_capacity(items.len());
		self.extend_indices(items, 0, &mut out);
		out
	}

	/// Appends indices of matches found in `items[offset..]` to `out`.
	///
	/// Used when a list grows while a query is active: previously matched
	/// indices stay in place and new matches land after them.
	pub fn extend_indices<T: Filterable>(&mut self, items: &[T], offset: usize, out: &mut Vec<usize>) {
		let offset = offset.min(items.len());
		for (idx, item) in items.iter().enumerate().skip(offset) {
			if self.matches(item) {
				out.push(idx);
			}
		}
	}

	/// Clones matching items, in list order.
	pub fn filter<T: Filterable + Clone>(&mut self, items: &[T]) -> Vec<T> {
		self.filter_indices(items).into_iter().map(|idx| items[idx].clone()).collect()
	}
}
