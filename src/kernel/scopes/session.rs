use std::time::Duration;
use tracing::{debug, warn};

use super::view::ViewScope;
use super::Effects;
use crate::kernel::command::{Command, CommandKind};
use crate::kernel::context::{RumContext, RumUuid};
use crate::kernel::telemetry::event::{SessionEndKind, TelemetryEvent};
use crate::kernel::time::Timestamp;
use crate::sampling::Sampler;

/// No activity within this period ends the session.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(15 * 60);
/// Hard cap on a session's length.
pub const SESSION_MAX_DURATION: Duration = Duration::from_secs(4 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    TimedOut,
    MaxDuration,
    Stopped,
}

impl From<SessionEndReason> for SessionEndKind {
    fn from(reason: SessionEndReason) -> Self {
        match reason {
            SessionEndReason::TimedOut => SessionEndKind::TimedOut,
            SessionEndReason::MaxDuration => SessionEndKind::MaxDuration,
            SessionEndReason::Stopped => SessionEndKind::Stopped,
        }
    }
}

/// One bounded period of activity.
#[derive(Debug)]
pub struct SessionScope {
    /// `RumUuid::NULL` when sampled out.
    pub id: RumUuid,
    sampler: Sampler,
    is_sampled_out: bool,
    is_initial: bool,
    /// Cleared by an explicit stop. Expiry leaves it set.
    is_active: bool,
    start_time: Timestamp,
    last_activity: Timestamp,
    has_tracked_any_view: bool,
    end_reason: Option<SessionEndReason>,
    views: Vec<ViewScope>,
}

impl SessionScope {
    /// Draws the sampling decision once; it never changes for this session.
    pub fn new(is_initial: bool, start_time: Timestamp, sampler: Sampler) -> Self {
        let is_sampled_out = sampler.sample_out();
        Self {
            id: if is_sampled_out {
                RumUuid::NULL
            } else {
                RumUuid::generate()
            },
            sampler,
            is_sampled_out,
            is_initial,
            is_active: true,
            start_time,
            last_activity: start_time,
            has_tracked_any_view: false,
            end_reason: None,
            views: Vec::new(),
        }
    }

    /// Successor of an expired session: same sample rate (fresh draw), active views transplanted.
    /// Views whose screen object is gone are left behind.
    pub fn renewed(&self, start_time: Timestamp) -> Self {
        let mut successor = SessionScope::new(false, start_time, self.sampler);
        successor.views = self
            .views
            .iter()
            .filter(|view| view.is_active() && view.identity.is_identifiable())
            .map(|view| view.transplant(start_time))
            .collect();
        successor.has_tracked_any_view = !successor.views.is_empty();
        successor
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_sampled_out(&self) -> bool {
        self.is_sampled_out
    }

    pub fn is_initial(&self) -> bool {
        self.is_initial
    }

    pub fn sample_rate(&self) -> f32 {
        self.sampler.rate
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn last_activity(&self) -> Timestamp {
        self.last_activity
    }

    pub fn end_reason(&self) -> Option<SessionEndReason> {
        self.end_reason
    }

    pub fn views(&self) -> &[ViewScope] {
        &self.views
    }

    pub fn has_active_view(&self) -> bool {
        self.views.iter().any(|v| v.is_active())
    }

    pub fn context(&self, parent: &RumContext) -> RumContext {
        let mut context = parent.clone();
        context.session_id = self.id;
        context.is_session_sampled = !self.is_sampled_out;
        context.is_session_active = self.is_active;
        context
    }

    fn expiration(&self, now: Timestamp) -> Option<SessionEndReason> {
        if now.since(self.last_activity) >= SESSION_TIMEOUT {
            Some(SessionEndReason::TimedOut)
        } else if now.since(self.start_time) >= SESSION_MAX_DURATION {
            Some(SessionEndReason::MaxDuration)
        } else {
            None
        }
    }

    /// Returns `false` when the session expired (without touching the command) or when it
    /// was stopped and all its views are gone.
    pub fn process(&mut self, command: &Command, parent: &RumContext, effects: &mut Effects<'_>) -> bool {
        if let Some(reason) = self.expiration(command.time) {
            debug!("Session {} ended: {:?}", self.id, reason);
            self.end_reason = Some(reason);
            return false;
        }
        self.last_activity = command.time;

        if matches!(command.kind, CommandKind::StopSession) && self.is_active {
            self.is_active = false;
            self.end_reason = Some(SessionEndReason::Stopped);
        }

        if self.is_sampled_out {
            return self.is_active;
        }

        let context = self.context(parent);

        if self.is_active {
            if let CommandKind::StartView { identity, name, path } = &command.kind {
                let is_initial_view = self.is_initial && !self.has_tracked_any_view;
                self.views.push(ViewScope::new(
                    identity.clone(),
                    name,
                    path,
                    command.attributes.clone(),
                    command.time,
                    is_initial_view,
                ));
                self.has_tracked_any_view = true;
            } else if command.expects_active_view() && !self.has_active_view() {
                warn!(
                    "{} was detected, but no view is active. Start a view before tracking actions, resources or errors",
                    command.name()
                );
                effects.record(TelemetryEvent::CommandWithoutView {
                    command: command.name().to_string(),
                });
            }
        }

        self.views.retain_mut(|view| view.process(command, &context, effects));

        self.is_active || !self.views.is_empty()
    }
}
