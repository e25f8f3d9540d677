mod common;

use std::sync::{Arc, Mutex};

use common::{at, minutes, nudge, Harness, APP_ID};
use rum_scopes::kernel::command::{ActionType, Command, ErrorSource, HttpMethod};
use rum_scopes::kernel::context::RumUuid;
use rum_scopes::kernel::identity::{ViewHandle, ViewIdentity};
use rum_scopes::kernel::scopes::SessionEndReason;
use rum_scopes::pipeline::RecordingWriter;
use rum_scopes::{Dependencies, Monitor, RumConfig};

const HOME: &str = "app/home";

fn home() -> ViewIdentity {
    ViewIdentity::value("home")
}

fn start_home(ms: u64) -> Command {
    Command::start_view(at(ms), home(), Some("Home"), Some(HOME))
}

type SeenSessions = Arc<Mutex<Vec<(RumUuid, bool)>>>;

fn monitor_with_listener(rate: f32) -> (Monitor, RecordingWriter, SeenSessions) {
    let writer = RecordingWriter::new();
    let seen: SeenSessions = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let deps = Dependencies::new(&RumConfig::new(APP_ID).with_sample_rate(rate), Arc::new(writer.clone()))
        .with_session_listener(Arc::new(move |id: RumUuid, sampled_out: bool| {
            sink.lock().unwrap().push((id, sampled_out));
        }));
    let (monitor, _tx) = Monitor::channel(deps, 8);
    (monitor, writer, seen)
}

#[test]
fn test_fully_sampled_session_emits_under_one_id() {
    let mut harness = Harness::with_sample_rate(100.0);

    harness.send(start_home(0));
    harness.send(Command::add_action(at(100), ActionType::Tap, "tap"));
    harness.send(Command::add_view_error(at(150), "boom", ErrorSource::Console));
    harness.send(nudge(400));

    let events = harness.events();
    assert!(!events.is_empty());
    let session_id = harness.session().id;
    assert!(!session_id.is_null());
    assert!(events.iter().all(|e| e.session.id == session_id), "Every event belongs to the session");
    assert!(events.iter().all(|e| e.application_id == APP_ID));
}

#[test]
fn test_sampled_out_session_emits_nothing() {
    let (mut monitor, writer, seen) = monitor_with_listener(0.0);

    // 1. Full script against a 0% sample rate
    monitor.process(start_home(0));
    monitor.process(Command::add_action(at(100), ActionType::Tap, "tap"));
    monitor.process(Command::add_view_error(at(150), "boom", ErrorSource::Console));
    monitor.process(Command::stop_view(at(400), home()));

    // 2. Nothing reached the writer, the session kept no views
    assert!(writer.events().is_empty(), "Sampled-out session must not emit");
    let session = &monitor.application.sessions()[0];
    assert!(session.is_sampled_out());
    assert!(session.id.is_null());
    assert!(session.views().is_empty());

    // 3. The listener still heard about it
    assert_eq!(seen.lock().unwrap().as_slice(), &[(RumUuid::NULL, true)]);
}

#[test]
fn test_sampled_out_session_still_expires() {
    let (mut monitor, _writer, seen) = monitor_with_listener(0.0);

    monitor.process(start_home(0));
    monitor.process(Command::add_action(at(minutes(16)), ActionType::Tap, "tap"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2, "Expiry starts a successor");
    assert!(seen.iter().all(|(_, sampled_out)| *sampled_out));
    assert_eq!(monitor.application.sessions().len(), 1);
    assert_eq!(monitor.application.sessions()[0].sample_rate(), 0.0, "Successor keeps the sample rate");
    assert_eq!(monitor.telemetry.snapshot().session_stats.timed_out, 1);
}

#[test]
fn test_listener_sees_sampled_session() {
    let (mut monitor, _writer, seen) = monitor_with_listener(100.0);

    monitor.process(start_home(0));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, monitor.application.sessions()[0].id);
    assert!(!seen[0].1);
}

#[test]
fn test_session_alive_just_before_timeout() {
    let mut harness = Harness::new();

    harness.send(start_home(0));
    let first = harness.session().id;

    harness.send(nudge(minutes(15) - 1));
    assert_eq!(harness.session().id, first);
    assert_eq!(harness.monitor.telemetry.snapshot().session_stats.timed_out, 0);
}

#[test]
fn test_inactivity_timeout_renews_session_and_transplants_view() {
    let mut harness = Harness::new();

    // 1. Home in the first session
    harness.send(start_home(0));
    let first_session = harness.session().id;
    let first_view = harness.view(HOME).map(|v| v.id).expect("home");

    // 2. Sixteen minutes of silence, then a tap
    harness.send(Command::add_action(at(minutes(16)), ActionType::Tap, "wake"));

    // 3. One successor session owning a fresh copy of Home
    let sessions = harness.monitor.application.sessions();
    assert_eq!(sessions.len(), 1, "Expired session must be dropped");
    let session = &sessions[0];
    assert_ne!(session.id, first_session);
    assert!(!session.is_initial());

    assert_eq!(session.views().len(), 1);
    let view = &session.views()[0];
    assert!(view.identity.equals(&home()));
    assert_eq!(view.url, HOME);
    assert_eq!(view.start_time(), at(minutes(16)));
    assert_ne!(view.id, first_view);
    assert!(view.is_active());

    // 4. The tap landed in the transplanted view
    assert_eq!(view.open_action().map(|a| a.name()), Some("wake"));

    let stats = harness.monitor.telemetry.snapshot().session_stats;
    assert_eq!(stats.timed_out, 1);
    assert_eq!(stats.renewed, 1);
    assert_eq!(stats.transplanted_views, 1);
}

#[test]
fn test_dropped_screen_is_not_transplanted() {
    let mut harness = Harness::new();
    let screen: ViewHandle = Arc::new(String::from("Detail"));

    harness.send(Command::start_view(at(0), ViewIdentity::reference(&screen), None, None));
    drop(screen);
    harness.send(Command::add_action(at(minutes(16)), ActionType::Tap, "wake"));

    let session = harness.session();
    assert!(session.views().is_empty(), "Unidentifiable view is left behind");
    assert_eq!(harness.monitor.telemetry.snapshot().commands_without_view, 1);
}

#[test]
fn test_max_duration_renews_session() {
    let mut harness = Harness::new();

    // 1. Activity every 10 minutes keeps the session from timing out
    harness.send(start_home(0));
    let first = harness.session().id;
    for step in 1..24 {
        harness.send(nudge(minutes(step * 10)));
    }
    assert_eq!(harness.session().id, first, "Still within four hours");

    // 2. Four hours in
    harness.send(nudge(minutes(240)));

    assert_ne!(harness.session().id, first);
    assert_eq!(harness.view(HOME).map(|v| v.start_time()), Some(at(minutes(240))));
    let stats = harness.monitor.telemetry.snapshot().session_stats;
    assert_eq!(stats.max_duration, 1);
    assert_eq!(stats.timed_out, 0);
}

#[test]
fn test_stop_session_ends_views_and_later_events_use_new_session() {
    let mut harness = Harness::new();

    // 1. Stop the session while Home is showing
    harness.send(start_home(0));
    let first = harness.session().id;
    harness.send(Command::stop_session(at(100)));

    let last = harness.view_updates(HOME).last().cloned().expect("home update");
    assert!(!last.is_active, "Stopping the session ends its views");
    assert_eq!(last.time_spent_ns, 100_000_000);
    assert!(harness.monitor.application.sessions().is_empty(), "Drained stopped session is dropped");
    assert_eq!(harness.monitor.telemetry.snapshot().session_stats.stopped, 1);

    // 2. Later navigation and tap belong to a fresh session only
    let emitted_before = harness.events().len();
    harness.send(Command::start_view(at(200), ViewIdentity::value("settings"), Some("Settings"), Some("app/settings")));
    harness.send(Command::add_action(at(300), ActionType::Tap, "toggle"));
    harness.send(nudge(500));

    let second = harness.session().id;
    assert_ne!(second, first);
    assert!(!harness.session().is_initial());

    let later = &harness.events()[emitted_before..];
    assert!(later.iter().all(|e| e.session.id == second), "Nothing is emitted under the stopped session");
    let tap = later.iter().find_map(|e| e.as_action()).expect("tap action");
    assert_eq!(tap.name, "toggle");
    assert_eq!(harness.monitor.telemetry.snapshot().commands_without_view, 0);
}

#[test]
fn test_stopped_session_drains_with_pending_resource() {
    let mut harness = Harness::new();

    // 1. Stop the session while a resource is loading
    harness.send(start_home(0));
    let first = harness.session().id;
    harness.send(Command::start_resource(at(50), "feed", "https://api.example.com/feed", HttpMethod::Get));
    harness.send(Command::stop_session(at(100)));

    assert!(harness.monitor.application.active_session().is_none());
    assert_eq!(harness.session().end_reason(), Some(SessionEndReason::Stopped));
    let home = harness.view(HOME).expect("home waits for its resource");
    assert!(!home.is_active());

    // 2. A view error after the stop is not tracked
    harness.send(Command::add_view_error(at(120), "late error", ErrorSource::Source));
    assert!(harness.events().iter().all(|e| e.as_error().is_none()));

    // 3. Resource completes under the stopped session, then everything drains
    harness.send(Command::stop_resource(at(150), "feed", Some(200), None));

    let resource = harness
        .events()
        .into_iter()
        .find(|e| e.as_resource().is_some())
        .expect("resource event");
    assert_eq!(resource.session.id, first);
    assert!(harness.monitor.application.sessions().is_empty());
    assert_eq!(harness.monitor.telemetry.snapshot().session_stats.stopped, 1);
}

#[test]
fn test_stop_session_closes_open_action() {
    let mut harness = Harness::new();

    harness.send(start_home(0));
    harness.send(Command::start_action(at(100), ActionType::Scroll, "scroll"));
    harness.send(Command::stop_session(at(250)));

    let scroll = harness
        .actions()
        .into_iter()
        .find(|a| a.name == "scroll")
        .expect("scroll action");
    assert_eq!(scroll.loading_time_ns, Some(150_000_000));

    let last = harness.view_updates(HOME).last().cloned().expect("home update");
    assert!(!last.is_active);
    assert_eq!(last.action_count, 1);
}

#[test]
fn test_interaction_after_stop_without_view_starts_session() {
    let mut harness = Harness::new();

    harness.send(start_home(0));
    harness.send(Command::stop_view(at(50), home()));
    harness.send(Command::stop_session(at(100)));
    assert!(harness.monitor.application.sessions().is_empty(), "Stopped session without views is dropped");

    harness.send(Command::add_view_error(at(200), "ignored", ErrorSource::Source));
    assert!(harness.monitor.application.sessions().is_empty());

    harness.send(Command::add_action(at(300), ActionType::Tap, "tap"));
    assert_eq!(harness.monitor.application.sessions().len(), 1);
    assert!(harness.monitor.application.active_session().is_some());

    let snapshot = harness.monitor.telemetry.snapshot();
    assert_eq!(snapshot.session_stats.started, 2);
    assert_eq!(snapshot.commands_without_view, 1);
}

#[test]
fn test_never_more_than_one_active_session() {
    let mut harness = Harness::new();

    harness.send(start_home(0));
    harness.send(Command::stop_session(at(10)));
    harness.send(start_home(20));
    harness.send(Command::add_action(at(minutes(20)), ActionType::Tap, "tap"));
    harness.send(Command::stop_session(at(minutes(21))));
    harness.send(Command::add_action(at(minutes(22)), ActionType::Tap, "tap"));

    assert!(harness.monitor.application.active_session_count() <= 1);
    assert_eq!(harness.monitor.telemetry.snapshot().anomalies.multiple_active_sessions, 0);
}
