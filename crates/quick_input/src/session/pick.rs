use quick_input_filter::{FilterOptions, ItemFilter, MatchMode};
use rustc_hash::FxHashMap;

use super::{SessionCore, SessionId, SessionSnapshot};
use crate::config::QuickInputConfig;
use crate::event::{Emitter, ListenerId};
use crate::item::{ItemKey, PickItem};
use crate::keybinding::QuickNavigateConfig;

/// Filterable item picker, single- or multi-select.
///
/// Selection and focus are tracked by position in the item list, so
/// identical rows stay distinct. Across [`set_items`](Self::set_items) they
/// follow the item's [`ItemKey`] and its occurrence among equal keys, and are
/// dropped for items that disappear. Focus is a cursor over the visible
/// items; selection is the set the user committed to. They change
/// independently.
pub struct PickSession {
	core: SessionCore,
	filter: ItemFilter,
	builtin_filter: bool,
	focus_first_on_filter: bool,
	placeholder: Option<String>,
	raw_items: Vec<PickItem>,
	/// Ascending indices of each key in `raw_items`.
	key_index: FxHashMap<ItemKey, Vec<usize>>,
	/// Ascending indices into `raw_items`.
	visible: Vec<usize>,
	can_select_many: bool,
	/// Indices into `raw_items`, in selection order.
	selected: Vec<usize>,
	focused: Vec<usize>,
	/// Set once the user toggles or replaces the selection.
	selection_touched: bool,
	focus_stamps: FxHashMap<usize, u64>,
	focus_clock: u64,
	quick_navigate: Option<QuickNavigateConfig>,
	on_did_change_focus: Emitter<Vec<PickItem>>,
	on_did_change_selection: Emitter<Vec<PickItem>>,
}

impl std::fmt::Debug for PickSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PickSession")
			.field("id", &self.core.id())
			.field("state", &self.core.state())
			.field("query", &self.filter.query())
			.field("items", &self.raw_items.len())
			.field("visible", &self.visible.len())
			.field("selected", &self.selected)
			.field("focused", &self.focused)
			.finish_non_exhaustive()
	}
}

/// An item's key plus its occurrence among items sharing that key.
type Occurrence = (ItemKey, usize);

impl PickSession {
	pub(crate) fn new(id: SessionId, config: &QuickInputConfig) -> Self {
		Self {
			core: SessionCore::new(id, config.ignore_focus_lost),
			filter: ItemFilter::new(FilterOptions {
				mode: config.match_mode,
				..FilterOptions::default()
			}),
			builtin_filter: true,
			focus_first_on_filter: config.focus_first_on_filter,
			placeholder: None,
			raw_items: Vec::new(),
			key_index: FxHashMap::default(),
			visible: Vec::new(),
			can_select_many: false,
			selected: Vec::new(),
			focused: Vec::new(),
			selection_touched: false,
			focus_stamps: FxHashMap::default(),
			focus_clock: 0,
			quick_navigate: None,
			on_did_change_focus: Emitter::default(),
			on_did_change_selection: Emitter::default(),
		}
	}

	pub fn core(&self) -> &SessionCore {
		&self.core
	}

	pub fn core_mut(&mut self) -> &mut SessionCore {
		&mut self.core
	}

	pub fn query(&self) -> &str {
		self.filter.query()
	}

	pub fn placeholder(&self) -> Option<&str> {
		self.placeholder.as_deref()
	}

	pub fn set_placeholder(&mut self, placeholder: Option<String>) {
		self.placeholder = placeholder;
	}

	pub fn raw_items(&self) -> &[PickItem] {
		&self.raw_items
	}

	pub fn visible_items(&self) -> impl ExactSizeIterator<Item = &PickItem> + '_ {
		self.visible.iter().map(|&idx| &self.raw_items[idx])
	}

	pub fn visible_len(&self) -> usize {
		self.visible.len()
	}

	pub fn selected_items(&self) -> Vec<PickItem> {
		self.resolve(&self.selected)
	}

	pub fn focused_items(&self) -> Vec<PickItem> {
		self.resolve(&self.focused)
	}

	pub fn can_select_many(&self) -> bool {
		self.can_select_many
	}

	pub fn builtin_filter(&self) -> bool {
		self.builtin_filter
	}

	pub fn match_on_description(&self) -> bool {
		self.filter.options().match_on_description
	}

	pub fn match_on_detail(&self) -> bool {
		self.filter.options().match_on_detail
	}

	pub fn match_mode(&self) -> MatchMode {
		self.filter.options().mode
	}

	pub fn quick_navigate(&self) -> Option<&QuickNavigateConfig> {
		self.quick_navigate.as_ref()
	}

	pub(crate) fn set_quick_navigate(&mut self, config: Option<QuickNavigateConfig>) {
		self.quick_navigate = config;
	}

	pub fn on_did_change_focus(&mut self, mut listener: impl FnMut(&[PickItem]) + Send + 'static) -> ListenerId {
		self.on_did_change_focus.subscribe(move |items: &Vec<PickItem>| listener(items))
	}

	pub fn on_did_change_selection(&mut self, mut listener: impl FnMut(&[PickItem]) + Send + 'static) -> ListenerId {
		self.on_did_change_selection.subscribe(move |items: &Vec<PickItem>| listener(items))
	}

	pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
		self.on_did_change_focus.unsubscribe(id) || self.on_did_change_selection.unsubscribe(id) || self.core.unsubscribe(id)
	}

	/// Sets the query and re-filters. Returns false when unchanged.
	pub fn set_value(&mut self, query: &str) -> bool {
		if self.core.is_disposed() || !self.filter.set_query(query) {
			return false;
		}
		self.refilter();
		self.core.fire_value_changed(query);
		true
	}

	/// Replaces the item list.
	///
	/// Selection and focus follow items whose key survives, matching the
	/// nth item with a key to the nth again, and are dropped for the rest.
	/// In multi-select sessions, items with `picked` set join the selection.
	pub fn set_items(&mut self, items: Vec<PickItem>) {
		if self.core.is_disposed() {
			return;
		}
		let before = self.selected_items();
		let selected = self.occurrences(&self.selected);
		let focused = self.occurrences(&self.focused);
		let stamps: Vec<(Occurrence, u64)> = self
			.focus_stamps
			.iter()
			.map(|(&idx, &stamp)| (self.occurrence(idx), stamp))
			.collect();

		self.raw_items = items;
		self.key_index.clear();
		self.index_from(0);

		self.selected = self.relocate(&selected);
		self.focused = self.relocate(&focused);
		self.focus_stamps = stamps
			.into_iter()
			.filter_map(|(occurrence, stamp)| Some((self.locate(&occurrence)?, stamp)))
			.collect();
		self.adopt_picked(0);
		self.refilter();

		if self.selected_items() != before {
			self.emit_selection();
		}
	}

	/// Appends a batch to the item list.
	///
	/// Existing matches keep their positions; new matches are appended
	/// after them, even if they would score higher.
	pub fn append_items(&mut self, batch: Vec<PickItem>) {
		if self.core.is_disposed() || batch.is_empty() {
			return;
		}
		let before = self.selected.len();
		let offset = self.raw_items.len();

		self.raw_items.extend(batch);
		self.index_from(offset);
		self.adopt_picked(offset);

		if self.builtin_filter {
			self.filter.extend_indices(&self.raw_items, offset, &mut self.visible);
		} else {
			self.visible.extend(offset..self.raw_items.len());
		}
		self.reconcile_focus();

		if self.selected.len() != before {
			self.emit_selection();
		}
	}

	pub fn set_match_on_description(&mut self, enabled: bool) {
		let options = FilterOptions {
			match_on_description: enabled,
			..self.filter.options()
		};
		if self.filter.set_options(options) {
			self.refilter();
		}
	}

	pub fn set_match_on_detail(&mut self, enabled: bool) {
		let options = FilterOptions {
			match_on_detail: enabled,
			..self.filter.options()
		};
		if self.filter.set_options(options) {
			self.refilter();
		}
	}

	pub fn set_match_mode(&mut self, mode: MatchMode) {
		let options = FilterOptions {
			mode,
			..self.filter.options()
		};
		if self.filter.set_options(options) {
			self.refilter();
		}
	}

	/// Toggles the built-in filter. When off, every item is visible and the
	/// caller filters upstream.
	pub fn set_builtin_filter(&mut self, enabled: bool) {
		if self.builtin_filter != enabled {
			self.builtin_filter = enabled;
			self.refilter();
		}
	}

	/// Switches between single- and multi-select.
	///
	/// Leaving multi-select keeps only the most recently focused selected
	/// item, or the last selected one if none was ever focused.
	pub fn set_can_select_many(&mut self, many: bool) {
		if self.can_select_many == many {
			return;
		}
		self.can_select_many = many;
		if many {
			return;
		}

		if self.focused.len() > 1 {
			self.focused.truncate(1);
			self.emit_focus();
		}
		if self.selected.len() > 1 {
			let stamps = &self.focus_stamps;
			let keep = self
				.selected
				.iter()
				.copied()
				.max_by_key(|idx| stamps.get(idx).copied().unwrap_or(0));
			self.selected = keep.into_iter().collect();
			self.emit_selection();
		}
	}

	/// Focuses the given items, ignoring any that are not visible.
	pub fn set_focused_items(&mut self, items: &[PickItem]) {
		let mut focused: Vec<usize> = Vec::with_capacity(items.len());
		for item in items {
			if let Some(idx) = self.claim(item, &focused, true) {
				focused.push(idx);
			}
		}
		if !self.can_select_many {
			focused.truncate(1);
		}
		self.replace_focus(focused);
	}

	/// Focuses the item at `index` within the visible items.
	pub fn focus_visible(&mut self, index: usize) -> bool {
		let Some(&raw) = self.visible.get(index) else {
			return false;
		};
		self.replace_focus(vec![raw]);
		true
	}

	/// Moves focus by `delta` visible items, wrapping at either end.
	pub fn move_focus(&mut self, delta: isize) -> bool {
		if self.visible.is_empty() {
			return false;
		}
		let total = self.visible.len() as isize;
		let next = match self.focused_position() {
			Some(current) => (current as isize + delta).rem_euclid(total),
			None if delta >= 0 => 0,
			None => total - 1,
		};
		self.focus_visible(next as usize)
	}

	/// Position of the first focused item within the visible items.
	pub fn focused_position(&self) -> Option<usize> {
		let raw = *self.focused.first()?;
		self.visible.binary_search(&raw).ok()
	}

	/// Replaces the selection with the given items.
	///
	/// Items not in the list are ignored; single-select keeps the last one.
	/// An item given twice claims the next row with the same key.
	pub fn set_selected_items(&mut self, items: &[PickItem]) {
		let mut selected: Vec<usize> = Vec::with_capacity(items.len());
		for item in items {
			if let Some(idx) = self.claim(item, &selected, false) {
				selected.push(idx);
			}
		}
		if !self.can_select_many && selected.len() > 1 {
			selected = selected.pop().into_iter().collect();
		}
		self.selection_touched = true;
		if selected != self.selected {
			self.selected = selected;
			self.emit_selection();
		}
	}

	/// Toggles the visible item at `index`. Single-select replaces the
	/// selection instead.
	pub fn toggle_visible(&mut self, index: usize) -> bool {
		let Some(&raw) = self.visible.get(index) else {
			return false;
		};
		self.selection_touched = true;
		if !self.can_select_many {
			self.selected = vec![raw];
		} else if let Some(pos) = self.selected.iter().position(|&idx| idx == raw) {
			self.selected.remove(pos);
		} else {
			self.selected.push(raw);
		}
		self.emit_selection();
		true
	}

	/// Computes the accepted items and commits them as the selection.
	///
	/// Only visible selected items count. With none, the focused items are
	/// taken instead, unless this is a multi-select whose selection the user
	/// already toggled. Single-select yields at most one item.
	pub(crate) fn resolve_accept(&mut self) -> Vec<PickItem> {
		let mut picked: Vec<usize> = self.selected.iter().copied().filter(|&idx| self.is_visible(idx)).collect();
		if picked.is_empty() && (!self.can_select_many || !self.selection_touched) {
			picked = self.focused.iter().copied().filter(|&idx| self.is_visible(idx)).collect();
		}
		if !self.can_select_many {
			picked.truncate(1);
		}
		if picked != self.selected {
			self.selected = picked;
			self.emit_selection();
		}
		self.selected_items()
	}

	pub(crate) fn dispose(&mut self) -> bool {
		if !self.core.dispose() {
			return false;
		}
		self.on_did_change_focus.clear();
		self.on_did_change_selection.clear();
		self.quick_navigate = None;
		true
	}

	pub fn snapshot(&self) -> SessionSnapshot {
		SessionSnapshot::Pick {
			query: self.query().to_string(),
			placeholder: self.placeholder.clone(),
			visible_items: self.visible_items().cloned().collect(),
			focused_items: self.focused_items(),
			selected_items: self.selected_items(),
			can_select_many: self.can_select_many,
			busy: self.core.busy(),
		}
	}

	fn resolve(&self, indices: &[usize]) -> Vec<PickItem> {
		indices.iter().filter_map(|&idx| self.raw_items.get(idx)).cloned().collect()
	}

	fn is_visible(&self, idx: usize) -> bool {
		self.visible.binary_search(&idx).is_ok()
	}

	fn index_from(&mut self, offset: usize) {
		for (idx, item) in self.raw_items.iter().enumerate().skip(offset) {
			self.key_index.entry(item.key()).or_default().push(idx);
		}
	}

	fn occurrence(&self, idx: usize) -> Occurrence {
		let key = self.raw_items[idx].key();
		let nth = self
			.key_index
			.get(&key)
			.and_then(|all| all.iter().position(|&other| other == idx))
			.unwrap_or(0);
		(key, nth)
	}

	fn occurrences(&self, indices: &[usize]) -> Vec<Occurrence> {
		indices.iter().map(|&idx| self.occurrence(idx)).collect()
	}

	fn locate(&self, (key, nth): &Occurrence) -> Option<usize> {
		self.key_index.get(key)?.get(*nth).copied()
	}

	fn relocate(&self, occurrences: &[Occurrence]) -> Vec<usize> {
		occurrences.iter().filter_map(|occurrence| self.locate(occurrence)).collect()
	}

	/// First row with `item`'s key that is not in `taken`.
	fn claim(&self, item: &PickItem, taken: &[usize], visible_only: bool) -> Option<usize> {
		self.key_index
			.get(&item.key())?
			.iter()
			.copied()
			.find(|&idx| !taken.contains(&idx) && (!visible_only || self.is_visible(idx)))
	}

	fn adopt_picked(&mut self, offset: usize) {
		if !self.can_select_many {
			return;
		}
		for idx in offset..self.raw_items.len() {
			if self.raw_items[idx].picked && !self.selected.contains(&idx) {
				self.selected.push(idx);
			}
		}
	}

	fn refilter(&mut self) {
		self.visible = if self.builtin_filter {
			self.filter.filter_indices(&self.raw_items)
		} else {
			(0..self.raw_items.len()).collect()
		};
		self.reconcile_focus();
	}

	/// Drops focus from items that are no longer visible, falling back to
	/// the first visible item when configured to.
	fn reconcile_focus(&mut self) {
		let mut focused: Vec<usize> = self.focused.iter().copied().filter(|&idx| self.is_visible(idx)).collect();
		if focused.is_empty() && self.focus_first_on_filter {
			focused.extend(self.visible.first().copied());
		}
		self.replace_focus(focused);
	}

	fn replace_focus(&mut self, focused: Vec<usize>) {
		if focused == self.focused {
			return;
		}
		self.focused = focused;
		self.focus_clock += 1;
		for &idx in &self.focused {
			self.focus_stamps.insert(idx, self.focus_clock);
		}
		self.emit_focus();
	}

	fn emit_focus(&mut self) {
		if self.on_did_change_focus.is_empty() {
			return;
		}
		let items = self.focused_items();
		self.on_did_change_focus.fire(&items);
	}

	fn emit_selection(&mut self) {
		if self.on_did_change_selection.is_empty() {
			return;
		}
		let items = self.selected_items();
		self.on_did_change_selection.fire(&items);
	}
}
