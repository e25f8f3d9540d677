#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use rum_scopes::events::{ActionEvent, EventMapper, RumEvent, ViewEvent};
use rum_scopes::kernel::command::{Command, MetricSpan, ResourceMetrics};
use rum_scopes::kernel::context::{AppState, DeviceContext};
use rum_scopes::kernel::scopes::{SessionScope, ViewScope};
use rum_scopes::kernel::time::Timestamp;
use rum_scopes::pipeline::RecordingWriter;
use rum_scopes::{Dependencies, Monitor, RumConfig};

pub const APP_ID: &str = "app-under-test";
const BASE_MS: u64 = 1_700_000_000_000;

/// Test clock: milliseconds after a fixed epoch.
pub fn at(ms: u64) -> Timestamp {
    Timestamp::from_millis(BASE_MS + ms)
}

pub fn minutes(m: u64) -> u64 {
    m * 60 * 1_000
}

/// A command no scope reacts to (metrics for a resource nobody started).
pub fn nudge(ms: u64) -> Command {
    Command::add_resource_metrics(at(ms), "no-such-resource", ResourceMetrics::fetch_only(MetricSpan::new(at(ms), at(ms))))
}

pub struct Harness {
    pub monitor: Monitor,
    pub writer: RecordingWriter,
    _device: watch::Sender<DeviceContext>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(RumConfig::new(APP_ID), None, AppState::Foreground)
    }

    pub fn with_sample_rate(rate: f32) -> Self {
        Self::build(RumConfig::new(APP_ID).with_sample_rate(rate), None, AppState::Foreground)
    }

    pub fn with_mapper(mapper: Arc<dyn EventMapper>) -> Self {
        Self::build(RumConfig::new(APP_ID), Some(mapper), AppState::Foreground)
    }

    pub fn in_background() -> Self {
        Self::build(RumConfig::new(APP_ID), None, AppState::Background)
    }

    pub fn build(config: RumConfig, mapper: Option<Arc<dyn EventMapper>>, app_state: AppState) -> Self {
        let writer = RecordingWriter::new();
        let deps = Self::deps(&config, &writer, mapper);
        let (device, device_rx) = watch::channel(DeviceContext {
            app_state,
            ..DeviceContext::default()
        });
        let deps = deps.with_device_context(device_rx);
        let (monitor, _tx) = Monitor::channel(deps, 8);
        Self {
            monitor,
            writer,
            _device: device,
        }
    }

    pub fn deps(config: &RumConfig, writer: &RecordingWriter, mapper: Option<Arc<dyn EventMapper>>) -> Dependencies {
        let deps = Dependencies::new(config, Arc::new(writer.clone()));
        match mapper {
            Some(mapper) => deps.with_mapper(mapper),
            None => deps,
        }
    }

    pub fn send(&mut self, command: Command) {
        self.monitor.process(command);
    }

    pub fn events(&self) -> Vec<RumEvent> {
        self.writer.events()
    }

    pub fn session(&self) -> &SessionScope {
        &self.monitor.application.sessions()[0]
    }

    pub fn view(&self, url: &str) -> Option<&ViewScope> {
        self.monitor
            .application
            .sessions()
            .iter()
            .flat_map(|s| s.views())
            .find(|v| v.url == url)
    }

    /// View updates of the view at `url`, in emission order.
    pub fn view_updates(&self, url: &str) -> Vec<ViewEvent> {
        self.events()
            .iter()
            .filter(|e| e.view.as_ref().map(|v| v.url.as_str()) == Some(url))
            .filter_map(|e| e.as_view().cloned())
            .collect()
    }

    pub fn actions(&self) -> Vec<ActionEvent> {
        self.events().iter().filter_map(|e| e.as_action().cloned()).collect()
    }

    pub fn advance(&mut self, from_ms: u64, to_ms: u64, step: Duration) {
        let mut now = from_ms;
        while now <= to_ms {
            self.send(nudge(now));
            now += step.as_millis() as u64;
        }
    }
}
