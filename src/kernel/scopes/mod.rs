//! The command-processing tree: Application → Session → View → {Action, Resource}.
//!
//! Every command enters at the application scope and is pushed down synchronously.
//! A scope's `process` returns `true` while it wants to be kept by its parent.

pub mod action;
pub mod application;
pub mod resource;
pub mod session;
pub mod view;

pub use action::{ActionScope, ActionState};
pub use application::ApplicationScope;
pub use resource::ResourceScope;
pub use session::{SessionEndReason, SessionScope};
pub use view::ViewScope;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::config::RumConfig;
use crate::events::{EventBuilder, EventMapper, RumEvent};
use crate::kernel::command::{Attributes, EventKind, MappingNotice};
use crate::kernel::context::{DeviceContext, RumUuid};
use crate::kernel::telemetry::event::TelemetryEvent;
use crate::kernel::telemetry::recorder::TelemetryRecorder;
use crate::pipeline::EventWriter;
use crate::sampling::Sampler;

/// Invoked once per new session with its id and whether it was sampled out.
pub type SessionStartListener = Arc<dyn Fn(RumUuid, bool) + Send + Sync>;

/// Immutable collaborators shared by every scope.
pub struct Dependencies {
    pub application_id: String,
    pub sampler: Sampler,
    pub builder: EventBuilder,
    pub writer: Arc<dyn EventWriter>,
    pub mapping_grace_period: Duration,
    device: Option<watch::Receiver<DeviceContext>>,
    on_session_start: Option<SessionStartListener>,
}

impl Dependencies {
    pub fn new(config: &RumConfig, writer: Arc<dyn EventWriter>) -> Self {
        Self {
            application_id: config.application_id.clone(),
            sampler: Sampler::new(config.session_sample_rate),
            builder: EventBuilder::new(),
            writer,
            mapping_grace_period: config.mapping_grace_period(),
            device: None,
            on_session_start: None,
        }
    }

    pub fn with_mapper(mut self, mapper: Arc<dyn EventMapper>) -> Self {
        self.builder = EventBuilder::with_mapper(mapper);
        self
    }

    pub fn with_device_context(mut self, device: watch::Receiver<DeviceContext>) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_session_listener(mut self, listener: SessionStartListener) -> Self {
        self.on_session_start = Some(listener);
        self
    }

    /// Current value of the process-wide context. Defaults when no publisher is attached.
    pub fn device_context(&self) -> DeviceContext {
        self.device
            .as_ref()
            .map(|rx| rx.borrow().clone())
            .unwrap_or_default()
    }

    pub(crate) fn notify_session_start(&self, session_id: RumUuid, sampled_out: bool) {
        if let Some(listener) = &self.on_session_start {
            listener(session_id, sampled_out);
        }
    }
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies")
            .field("application_id", &self.application_id)
            .field("sampler", &self.sampler)
            .field("builder", &self.builder)
            .field("mapping_grace_period", &self.mapping_grace_period)
            .finish()
    }
}

/// Per-command side-effect sink handed down the tree.
///
/// Built events go to the writer immediately (fire-and-forget); mapping notices are
/// collected and re-enter the tree as commands once the current command is done.
pub struct Effects<'a> {
    deps: &'a Dependencies,
    device: DeviceContext,
    telemetry: &'a mut TelemetryRecorder,
    notices: Vec<MappingNotice>,
}

impl<'a> Effects<'a> {
    pub fn new(deps: &'a Dependencies, telemetry: &'a mut TelemetryRecorder) -> Self {
        Self {
            device: deps.device_context(),
            deps,
            telemetry,
            notices: Vec::new(),
        }
    }

    pub fn deps(&self) -> &'a Dependencies {
        self.deps
    }

    pub fn device(&self) -> &DeviceContext {
        &self.device
    }

    /// Builds `event`, writes it if the mapper kept it and queues the mapping notice.
    /// Returns whether the event was kept.
    pub fn emit(&mut self, event: RumEvent, attributes: &Attributes) -> bool {
        let kind = event.kind();
        let event_id = event.payload.event_id();
        let view_id = event.view.as_ref().map(|v| v.id);
        let action_id = event.payload.action_id();

        let kept = match self.deps.builder.build(event, attributes, &self.device) {
            Some(built) => {
                self.deps.writer.write(built);
                true
            }
            None => false,
        };

        if kind != EventKind::View {
            if let Some(event_id) = event_id {
                self.notices.push(MappingNotice {
                    kind,
                    event_id,
                    view_id,
                    action_id,
                    kept,
                });
            }
            if !kept {
                self.telemetry.record(TelemetryEvent::EventDiscarded { kind });
            }
        }
        kept
    }

    pub fn record(&mut self, event: TelemetryEvent) {
        self.telemetry.record(event);
    }

    pub fn take_notices(&mut self) -> Vec<MappingNotice> {
        std::mem::take(&mut self.notices)
    }
}
