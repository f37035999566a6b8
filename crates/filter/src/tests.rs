use proptest::prelude::*;

use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
	label: String,
	description: Option<String>,
	detail: Option<String>,
	pinned: bool,
}

fn row(label: &str) -> Row {
	Row {
		label: label.to_string(),
		description: None,
		detail: None,
		pinned: false,
	}
}

impl Filterable for Row {
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
		self.pinned
	}
}

fn fruit() -> Vec<Row> {
	vec![row("Apple"), row("Banana"), row("Cherry")]
}

#[test]
fn blank_query_matches_everything() {
	let mut filter = ItemFilter::default();
	assert!(filter.is_empty());
	assert_eq!(filter.filter_indices(&fruit()), vec![0, 1, 2]);

	filter.set_query("   ");
	assert!(filter.is_empty());
	assert_eq!(filter.filter_indices(&fruit()), vec![0, 1, 2]);
}

#[test]
fn label_match_is_case_insensitive() {
	let mut filter = ItemFilter::default();
	filter.set_query("b");
	assert_eq!(filter.filter(&fruit()), vec![row("Banana")]);

	filter.set_query("CHER");
	assert_eq!(filter.filter_indices(&fruit()), vec![2]);
}

#[test]
fn fuzzy_mode_allows_gaps_and_substring_mode_does_not() {
	let mut filter = ItemFilter::default();
	filter.set_query("bnn");
	assert_eq!(filter.filter_indices(&fruit()), vec![1]);

	filter.set_options(FilterOptions {
		mode: MatchMode::Substring,
		..FilterOptions::default()
	});
	assert!(filter.filter_indices(&fruit()).is_empty());

	filter.set_query("nan");
	assert_eq!(filter.filter_indices(&fruit()), vec![1]);
}

#[test]
fn description_and_detail_only_match_when_enabled() {
	let mut items = fruit();
	items[0].description = Some("red fruit".into());
	items[2].detail = Some("stone fruit".into());

	let mut filter = ItemFilter::default();
	filter.set_query("fruit");
	assert!(filter.filter_indices(&items).is_empty());

	filter.set_options(FilterOptions {
		match_on_description: true,
		..FilterOptions::default()
	});
	assert_eq!(filter.filter_indices(&items), vec![0]);

	filter.set_options(FilterOptions {
		match_on_description: true,
		match_on_detail: true,
		..FilterOptions::default()
	});
	assert_eq!(filter.filter_indices(&items), vec![0, 2]);
}

#[test]
fn always_show_items_survive_any_query() {
	let mut items = fruit();
	items[2].pinned = true;

	let mut filter = ItemFilter::default();
	filter.set_query("zzz");
	assert_eq!(filter.filter_indices(&items), vec![2]);
}

#[test]
fn matches_keep_list_order_instead_of_score_order() {
	let items = vec![row("xaxxbxxc"), row("abc"), row("cba")];
	let mut filter = ItemFilter::default();
	filter.set_query("abc");
	assert_eq!(filter.filter_indices(&items), vec![0, 1]);
}

#[test]
fn extend_indices_appends_new_matches_after_existing_ones() {
	let mut items = vec![row("alpha"), row("beta")];
	let mut filter = ItemFilter::default();
	filter.set_query("a");

	let mut visible = filter.filter_indices(&items);
	assert_eq!(visible, vec![0, 1]);

	items.push(row("gamma"));
	items.push(row("xyz"));
	filter.extend_indices(&items, 2, &mut visible);
	assert_eq!(visible, vec![0, 1, 2]);
}

#[test]
fn setters_report_changes() {
	let mut filter = ItemFilter::default();
	assert!(filter.set_query("a"));
	assert!(!filter.set_query("a"));
	assert_eq!(filter.query(), "a");
	assert!(!filter.set_options(FilterOptions::default()));
	assert!(filter.set_options(FilterOptions {
		match_on_detail: true,
		..FilterOptions::default()
	}));
}

fn arb_rows() -> impl Strategy<Value = Vec<Row>> {
	prop::collection::vec(("[a-dA-D ]{0,8}", prop::option::of("[a-d]{0,6}")), 0..24).prop_map(|rows| {
		rows.into_iter()
			.map(|(label, description)| Row {
				label,
				description,
				detail: None,
				pinned: false,
			})
			.collect()
	})
}

proptest! {
	/// Filtered output is an order-preserving sub-sequence of the input.
	#[test]
	fn prop_filter_is_subsequence(items in arb_rows(), query in "[a-d]{0,3}", on_desc in any::<bool>()) {
		let mut filter = ItemFilter::new(FilterOptions {
			match_on_description: on_desc,
			..FilterOptions::default()
		});
		filter.set_query(&query);
		let indices = filter.filter_indices(&items);
		prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
		prop_assert!(indices.iter().all(|&idx| idx < items.len()));
	}

	/// Filtering an already filtered list changes nothing.
	#[test]
	fn prop_filter_is_idempotent(items in arb_rows(), query in "[a-d ]{0,4}") {
		let mut filter = ItemFilter::default();
		filter.set_query(&query);
		let once = filter.filter(&items);
		let twice = filter.filter(&once);
		prop_assert_eq!(once, twice);
	}

	/// Incremental extension agrees with filtering the whole list at once.
	#[test]
	fn prop_extend_matches_full_filter(items in arb_rows(), split in 0usize..24, query in "[a-d]{0,3}") {
		let mut filter = ItemFilter::default();
		filter.set_query(&query);
		let split = split.min(items.len());
		let mut visible = filter.filter_indices(&items[..split]);
		filter.extend_indices(&items, split, &mut visible);
		prop_assert_eq!(visible, filter.filter_indices(&items));
	}
}
