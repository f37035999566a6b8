use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use super::*;
use crate::config::QuickInputConfig;
use crate::request::{InputOptions, ValidateFn};

fn pick(labels: &[&str]) -> PickSession {
	let mut session = PickSession::new(SessionId(1), &QuickInputConfig::default());
	session.set_items(labels.iter().map(|label| PickItem::new(*label)).collect());
	session
}

fn visible(session: &PickSession) -> Vec<&str> {
	session.visible_items().map(|item| item.label.as_str()).collect()
}

fn accept_all() -> ValidateFn {
	InputOptions::default()
		.validate_with(|_value: String| async { Ok::<_, anyhow::Error>(String::new()) })
		.validate_input
		.expect("validator set")
}

fn names(items: &[PickItem]) -> Vec<&str> {
	items.iter().map(|item| item.label.as_str()).collect()
}

#[test]
fn lifecycle_transitions() {
	let mut core = SessionCore::new(SessionId(7), false);
	let hides = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&hides);
	core.on_did_hide(move |reason| sink.lock().push(*reason));

	assert_eq!(core.state(), SessionState::Created);
	assert!(!core.mark_hidden(HideReason::Explicit));
	assert!(core.mark_shown());
	assert!(!core.mark_shown());
	assert!(core.mark_hidden(HideReason::Superseded));
	assert!(core.mark_shown());

	let lifetime = core.lifetime().clone();
	assert!(core.dispose());
	assert!(!core.dispose());
	assert!(lifetime.is_cancelled());
	assert!(!core.mark_shown());
	assert_eq!(core.state(), SessionState::Disposed);
	assert_eq!(*hides.lock(), vec![HideReason::Superseded]);
}

#[test]
fn unsubscribed_listener_stops_firing() {
	let mut core = SessionCore::new(SessionId(1), false);
	let count = Arc::new(Mutex::new(0));
	let sink = Arc::clone(&count);
	let id = core.on_did_accept(move || *sink.lock() += 1);

	core.fire_accept();
	assert!(core.unsubscribe(id));
	core.fire_accept();
	assert_eq!(*count.lock(), 1);
}

#[test]
fn step_and_title() {
	let mut core = SessionCore::new(SessionId(1), false);
	core.set_title(Some("Clone".into()));
	core.set_step(Some(2), Some(3));
	assert_eq!(core.title(), Some("Clone"));
	assert_eq!(core.step(), (Some(2), Some(3)));
	assert_eq!(SessionId(4).to_string(), "#4");
}

#[test]
fn query_filters_visible_items() {
	let mut session = pick(&["open file", "save file", "close"]);
	assert!(session.set_value("fi"));
	assert_eq!(visible(&session), vec!["open file", "save file"]);
	assert!(!session.set_value("fi"));
	assert_eq!(session.query(), "fi");
}

#[test]
fn always_show_items_survive_any_query() {
	let mut session = PickSession::new(SessionId(1), &QuickInputConfig::default());
	session.set_items(vec![
		PickItem::new("alpha"),
		PickItem::new("Configure...").with_always_show(true),
	]);
	session.set_value("zzz");
	assert_eq!(visible(&session), vec!["Configure..."]);
}

#[test]
fn description_matching_is_opt_in() {
	let mut session = PickSession::new(SessionId(1), &QuickInputConfig::default());
	session.set_items(vec![PickItem::new("main.rs").with_description("src/bin")]);
	session.set_value("bin");
	assert_eq!(session.visible_len(), 0);
	session.set_match_on_description(true);
	assert_eq!(visible(&session), vec!["main.rs"]);
}

#[test]
fn disabling_builtin_filter_shows_everything() {
	let mut session = pick(&["a", "b"]);
	session.set_value("a");
	assert_eq!(session.visible_len(), 1);
	session.set_builtin_filter(false);
	assert_eq!(visible(&session), vec!["a", "b"]);
}

#[test]
fn focus_follows_first_visible_item() {
	let mut session = pick(&["apple", "banana", "cherry"]);
	assert_eq!(names(&session.focused_items()), vec!["apple"]);
	session.set_value("ch");
	assert_eq!(names(&session.focused_items()), vec!["cherry"]);
	session.set_value("");
	assert_eq!(names(&session.focused_items()), vec!["cherry"]);
	assert_eq!(session.focused_position(), Some(2));
}

#[test]
fn focus_movement_wraps() {
	let mut session = pick(&["a", "b", "c"]);
	assert!(session.move_focus(-1));
	assert_eq!(names(&session.focused_items()), vec!["c"]);
	assert!(session.move_focus(1));
	assert_eq!(names(&session.focused_items()), vec!["a"]);

	let mut empty = pick(&[]);
	assert!(!empty.move_focus(1));
}

#[test]
fn focus_stays_unset_when_not_configured() {
	let config = QuickInputConfig {
		focus_first_on_filter: false,
		..QuickInputConfig::default()
	};
	let mut session = PickSession::new(SessionId(1), &config);
	session.set_items(vec![PickItem::new("a"), PickItem::new("b")]);
	assert!(session.focused_items().is_empty());
	assert!(session.move_focus(-1));
	assert_eq!(names(&session.focused_items()), vec!["b"]);
}

#[test]
fn selection_survives_refresh_by_key() {
	let mut session = PickSession::new(SessionId(1), &QuickInputConfig::default());
	session.set_can_select_many(true);
	session.set_items(vec![
		PickItem::new("one").with_id("1"),
		PickItem::new("two").with_id("2"),
		PickItem::new("three").with_id("3"),
	]);
	session.toggle_visible(0);
	session.toggle_visible(2);

	session.set_items(vec![PickItem::new("uno").with_id("1"), PickItem::new("two").with_id("2")]);
	assert_eq!(names(&session.selected_items()), vec!["uno"]);
}

#[test]
fn picked_items_join_multi_selection() {
	let mut session = PickSession::new(SessionId(1), &QuickInputConfig::default());
	session.set_can_select_many(true);
	session.set_items(vec![PickItem::new("a"), PickItem::new("b").with_picked(true)]);
	assert_eq!(names(&session.selected_items()), vec!["b"]);

	let mut single = pick(&[]);
	single.set_items(vec![PickItem::new("a").with_picked(true)]);
	assert!(single.selected_items().is_empty());
}

#[test]
fn appended_matches_keep_existing_order() {
	let mut session = pick(&["config.toml", "cargo.lock"]);
	session.set_value("co");
	let before = visible(&session).into_iter().map(str::to_string).collect::<Vec<_>>();

	session.append_items(vec![PickItem::new("co"), PickItem::new("readme")]);
	let mut expected = before;
	expected.push("co".to_string());
	assert_eq!(visible(&session), expected);
	assert_eq!(session.raw_items().len(), 4);
}

#[test]
fn single_select_keeps_last_of_many() {
	let mut session = pick(&["a", "b", "c"]);
	session.set_selected_items(&[PickItem::new("a"), PickItem::new("c"), PickItem::new("zzz")]);
	assert_eq!(names(&session.selected_items()), vec!["c"]);
	session.toggle_visible(1);
	assert_eq!(names(&session.selected_items()), vec!["b"]);
}

#[test]
fn set_focused_items_ignores_hidden_items() {
	let mut session = pick(&["red", "green", "blue"]);
	session.set_value("re");
	session.set_focused_items(&[PickItem::new("blue"), PickItem::new("green")]);
	assert_eq!(names(&session.focused_items()), vec!["green"]);
}

#[test]
fn selection_and_focus_emit_changes() {
	let mut session = pick(&["a", "b"]);
	let log = Arc::new(Mutex::new(Vec::new()));
	let focus_log = Arc::clone(&log);
	let selection_log = Arc::clone(&log);
	session.on_did_change_focus(move |items| focus_log.lock().push(format!("focus {}", names(items).join(","))));
	session.on_did_change_selection(move |items| {
		selection_log.lock().push(format!("select {}", names(items).join(",")))
	});

	session.move_focus(1);
	session.toggle_visible(1);
	assert_eq!(*log.lock(), vec!["focus b".to_string(), "select b".to_string()]);
}

#[test]
fn resolve_accept_prefers_visible_selection() {
	let mut session = pick(&["a", "b", "c"]);
	session.set_can_select_many(true);
	session.toggle_visible(1);
	session.toggle_visible(2);
	assert_eq!(names(&session.resolve_accept()), vec!["b", "c"]);

	session.set_can_select_many(false);
	assert_eq!(session.resolve_accept().len(), 1);
}

#[test]
fn duplicate_rows_are_distinct() {
	let mut session = pick(&["foo", "foo", "bar"]);
	assert!(session.move_focus(1));
	assert_eq!(session.focused_position(), Some(1));
	assert!(session.move_focus(1));
	assert_eq!(session.focused_position(), Some(2));
	assert_eq!(names(&session.focused_items()), vec!["bar"]);

	assert!(session.focus_visible(1));
	assert_eq!(session.focused_position(), Some(1));

	session.set_can_select_many(true);
	session.toggle_visible(1);
	assert_eq!(names(&session.selected_items()), vec!["foo"]);
	session.toggle_visible(0);
	assert_eq!(names(&session.selected_items()), vec!["foo", "foo"]);
	session.toggle_visible(1);
	assert_eq!(names(&session.selected_items()), vec!["foo"]);
	assert_eq!(names(&session.resolve_accept()), vec!["foo"]);
}

#[test]
fn duplicate_selection_follows_occurrence_across_refresh() {
	let mut session = pick(&["foo", "foo", "bar"]);
	session.set_can_select_many(true);
	session.toggle_visible(1);
	session.focus_visible(1);

	session.set_items(vec![PickItem::new("bar"), PickItem::new("foo"), PickItem::new("foo")]);
	assert_eq!(session.selected_items().len(), 1);
	assert_eq!(session.focused_position(), Some(2));
	session.toggle_visible(2);
	assert!(session.selected_items().is_empty());
}

#[test]
fn set_selected_items_claims_each_duplicate_once() {
	let mut session = pick(&["foo", "foo", "bar"]);
	session.set_can_select_many(true);
	session.set_selected_items(&[PickItem::new("foo"), PickItem::new("foo"), PickItem::new("foo")]);
	assert_eq!(names(&session.selected_items()), vec!["foo", "foo"]);
}

#[test]
fn cleared_selection_does_not_fall_back_to_focus() {
	let mut session = pick(&["a", "b", "c"]);
	session.set_can_select_many(true);
	session.toggle_visible(1);
	session.toggle_visible(1);
	assert!(session.resolve_accept().is_empty());

	let mut untouched = pick(&["a", "b", "c"]);
	untouched.set_can_select_many(true);
	untouched.move_focus(1);
	assert_eq!(names(&untouched.resolve_accept()), vec!["b"]);
}

#[test]
fn value_change_fires_after_refilter() {
	let mut session = pick(&["apple", "banana"]);
	let log = Arc::new(Mutex::new(Vec::new()));
	let focus_log = Arc::clone(&log);
	let value_log = Arc::clone(&log);
	session.on_did_change_focus(move |items| focus_log.lock().push(format!("focus {}", names(items).join(","))));
	session.core_mut().on_did_change_value(move |value| value_log.lock().push(format!("value {value}")));

	session.set_value("ban");
	assert_eq!(*log.lock(), vec!["focus banana".to_string(), "value ban".to_string()]);
}

#[test]
fn disposed_pick_ignores_updates() {
	let mut session = pick(&["a"]);
	assert!(session.dispose());
	assert!(!session.set_value("a"));
	session.set_items(vec![PickItem::new("b")]);
	assert_eq!(names(session.raw_items()), vec!["a"]);
}

#[test]
fn input_selection_is_clamped() {
	let mut input = InputSession::new(SessionId(1), &QuickInputConfig::default());
	input.set_value("hello");
	input.set_value_selection(Some((2, 40)));
	assert_eq!(input.value_selection(), Some((2, 5)));
	input.set_value("hi");
	assert_eq!(input.value_selection(), Some((2, 2)));
}

#[test]
fn password_value_is_not_debug_printed() {
	let mut input = InputSession::new(SessionId(1), &QuickInputConfig::default());
	input.set_password(true);
	input.set_value("hunter2");
	assert!(!format!("{input:?}").contains("hunter2"));
}

#[test]
fn newer_validation_supersedes_older() {
	let mut input = InputSession::new(SessionId(1), &QuickInputConfig::default());
	assert!(input.begin_validation().is_none());

	input.set_validator(Some(accept_all()));
	let first = input.begin_validation().unwrap();
	input.set_value("x");
	let second = input.begin_validation().unwrap();

	assert!(first.cancel.is_cancelled());
	assert!(!second.cancel.is_cancelled());
	assert_eq!(second.value, "x");
	assert!(input.core().busy());

	assert!(!input.finish_validation(first.generation, "stale".into()));
	assert!(input.finish_validation(second.generation, "bad".into()));
	assert!(!input.core().busy());
	assert!(!input.is_valid());
	assert_eq!(input.validation_message(), "bad");
}

#[test]
fn disposing_input_cancels_validation() {
	let mut input = InputSession::new(SessionId(1), &QuickInputConfig::default());
	input.set_validator(Some(accept_all()));
	let job = input.begin_validation().unwrap();

	assert!(input.dispose());
	assert!(job.cancel.is_cancelled());
	assert!(!input.is_current_validation(job.generation));
	assert!(!input.has_validator());
}

#[test]
fn session_routes_value_by_shape() {
	let mut session = Session::Input(InputSession::new(SessionId(3), &QuickInputConfig::default()));
	assert!(session.set_value("text"));
	assert!(session.as_pick().is_none());
	assert!(matches!(session.snapshot(), SessionSnapshot::Input { ref value, .. } if value == "text"));
	assert_eq!(session.id(), SessionId(3));
}
