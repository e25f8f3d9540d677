mod common;

use std::time::Duration;

use common::{at, nudge, Harness};
use rum_scopes::kernel::command::{ActionType, Command, ErrorSource, HttpMethod};
use rum_scopes::kernel::identity::ViewIdentity;

const HOME: &str = "app/home";

fn home() -> ViewIdentity {
    ViewIdentity::value("home")
}

fn harness_on_home() -> Harness {
    let mut harness = Harness::new();
    harness.send(Command::start_view(at(0), home(), Some("Home"), Some(HOME)));
    harness
}

fn user_actions(harness: &Harness) -> Vec<rum_scopes::events::ActionEvent> {
    harness
        .actions()
        .into_iter()
        .filter(|a| a.action_type != ActionType::ApplicationStart)
        .collect()
}

#[test]
fn test_discrete_action_completes_at_timeout() {
    let mut harness = harness_on_home();

    // 1. Tap, then unrelated commands every 11ms up to 99ms
    harness.send(Command::add_action(at(1_000), ActionType::Tap, "buy"));
    harness.advance(1_011, 1_099, Duration::from_millis(11));
    assert!(user_actions(&harness).is_empty(), "Tap must still be open at 99ms");

    // 2. Next command arrives late; loading time is pinned to the timeout
    harness.send(nudge(1_180));
    let actions = user_actions(&harness);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].name, "buy");
    assert_eq!(actions[0].loading_time_ns, Some(100_000_000));

    // 3. View counted it and dropped the finished scope
    let view = harness.view(HOME).expect("home");
    assert_eq!(view.action_count(), 1);
    assert!(view.actions().is_empty());
    let last = harness.view_updates(HOME).last().cloned().expect("update");
    assert_eq!(last.action_count, 1);
}

#[test]
fn test_discrete_action_waits_for_its_resources() {
    let mut harness = harness_on_home();

    harness.send(Command::add_action(at(1_000), ActionType::Tap, "refresh"));
    harness.send(Command::start_resource(at(1_020), "feed", "https://api.example.com/feed", HttpMethod::Get));
    harness.send(nudge(1_400));
    assert!(user_actions(&harness).is_empty(), "Tap with a loading resource stays open");

    harness.send(Command::stop_resource(at(1_600), "feed", Some(200), None));
    harness.send(nudge(1_650));

    let actions = user_actions(&harness);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].resource_count, 1);
    assert_eq!(actions[0].loading_time_ns, Some(100_000_000));
}

#[test]
fn test_continuous_action_waits_for_resources_then_caps_at_ten_seconds() {
    let mut harness = harness_on_home();

    // 1. Scroll with a resource still loading past the 10s mark
    harness.send(Command::start_action(at(1_000), ActionType::Scroll, "feed-scroll"));
    harness.send(Command::start_resource(at(1_500), "img", "https://cdn.example.com/i.png", HttpMethod::Get));
    harness.send(nudge(12_000));
    assert!(user_actions(&harness).is_empty(), "Scroll waits for in-flight resources");

    // 2. Resource drains; next command closes the action at start + 10s
    harness.send(Command::stop_resource(at(13_000), "img", Some(200), Some(1_024)));
    harness.send(nudge(13_500));

    let actions = user_actions(&harness);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].loading_time_ns, Some(10_000_000_000));
    assert_eq!(actions[0].resource_count, 1);
}

#[test]
fn test_stop_action_renames_and_closes() {
    let mut harness = harness_on_home();

    harness.send(Command::start_action(at(100), ActionType::Swipe, "swipe"));
    harness.send(Command::stop_action(at(600), ActionType::Swipe, Some("gallery-swipe")));

    let actions = user_actions(&harness);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].name, "gallery-swipe");
    assert_eq!(actions[0].action_type, ActionType::Swipe);
    assert_eq!(actions[0].loading_time_ns, Some(500_000_000));
}

#[test]
fn test_only_one_action_open_per_view() {
    let mut harness = harness_on_home();

    harness.send(Command::add_action(at(100), ActionType::Tap, "first"));
    harness.send(Command::add_action(at(120), ActionType::Tap, "second"));

    let view = harness.view(HOME).expect("home");
    assert_eq!(view.actions().len(), 1);
    assert_eq!(view.open_action().map(|a| a.name()), Some("first"));

    harness.send(nudge(300));
    let actions = user_actions(&harness);
    assert_eq!(actions.len(), 1, "The second tap was ignored");
    assert_eq!(actions[0].name, "first");
}

#[test]
fn test_stopping_view_closes_open_action() {
    let mut harness = harness_on_home();

    harness.send(Command::start_action(at(100), ActionType::Scroll, "scroll"));
    harness.send(Command::stop_view(at(400), home()));

    let actions = user_actions(&harness);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].loading_time_ns, Some(300_000_000));

    let last = harness.view_updates(HOME).last().cloned().expect("update");
    assert!(!last.is_active);
    assert_eq!(last.action_count, 1, "Final update includes the closed action");
}

#[test]
fn test_events_during_action_are_attributed_to_it() {
    let mut harness = harness_on_home();

    harness.send(Command::add_action(at(100), ActionType::Tap, "login"));
    let action_id = harness
        .monitor
        .application
        .current_context()
        .action_id
        .expect("open action in context");

    harness.send(Command::start_resource(at(110), "auth", "https://api.example.com/auth", HttpMethod::Post));
    harness.send(Command::add_view_error(at(150), "bad credentials", ErrorSource::Custom));
    harness.send(Command::stop_resource(at(180), "auth", Some(401), None));

    let events = harness.events();
    let resource = events.iter().find_map(|e| e.as_resource()).expect("resource");
    let error = events.iter().find_map(|e| e.as_error()).expect("error");
    assert_eq!(resource.action_id, Some(action_id));
    assert_eq!(error.action_id, Some(action_id));

    harness.send(nudge(400));
    let actions = user_actions(&harness);
    assert_eq!(actions[0].resource_count, 1);
    assert_eq!(actions[0].error_count, 1);
}

#[test]
fn test_action_without_view_is_not_tracked() {
    let mut harness = Harness::in_background();

    // Background start: no launch view, so the tap has nowhere to go
    harness.send(Command::add_action(at(0), ActionType::Tap, "orphan"));
    harness.send(nudge(500));

    assert!(harness.actions().is_empty());
    assert_eq!(harness.monitor.telemetry.snapshot().commands_without_view, 1);
}

#[test]
fn test_stops_for_unknown_resources_are_not_counted() {
    let mut harness = harness_on_home();

    // 1. Stops for keys nobody started, during a tap
    harness.send(Command::add_action(at(100), ActionType::Tap, "open"));
    harness.send(Command::stop_resource(at(150), "ghost", Some(200), None));
    harness.send(Command::stop_resource_with_error(at(160), "ghost-2", "reset", None));
    harness.send(nudge(400));

    // 2. Action and view agree: nothing happened
    let actions = user_actions(&harness);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].resource_count, 0);
    assert_eq!(actions[0].error_count, 0);

    let view = harness.view(HOME).expect("home");
    assert_eq!(view.resource_count(), 0);
    assert_eq!(view.error_count(), 0);
    assert!(harness.events().iter().all(|e| e.as_resource().is_none() && e.as_error().is_none()));
}
