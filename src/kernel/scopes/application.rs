use tracing::{error, info};

use super::session::SessionScope;
use super::view::{APPLICATION_LAUNCH_VIEW_NAME, APPLICATION_LAUNCH_VIEW_URL};
use super::Effects;
use crate::kernel::command::Command;
use crate::kernel::context::{AppState, RumContext};
use crate::kernel::identity::ViewIdentity;
use crate::kernel::telemetry::event::{SessionEndKind, TelemetryEvent};
use crate::kernel::time::Timestamp;

/// Root of the scope tree. Owns the sessions, normally exactly one of them active.
#[derive(Debug)]
pub struct ApplicationScope {
    context: RumContext,
    sessions: Vec<SessionScope>,
    /// Set by the first command ever received.
    is_application_active: bool,
    initial_sessions_created: u32,
}

impl ApplicationScope {
    pub fn new(application_id: &str) -> Self {
        Self {
            context: RumContext::root(application_id),
            sessions: Vec::new(),
            is_application_active: false,
            initial_sessions_created: 0,
        }
    }

    pub fn context(&self) -> &RumContext {
        &self.context
    }

    pub fn sessions(&self) -> &[SessionScope] {
        &self.sessions
    }

    pub fn active_session(&self) -> Option<&SessionScope> {
        self.sessions.iter().find(|s| s.is_active())
    }

    /// Computed from the owned sessions, never cached.
    pub fn active_session_count(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_active()).count()
    }

    /// Context of the active view in the active session, if any.
    pub fn current_context(&self) -> RumContext {
        let Some(session) = self.active_session() else {
            return self.context.clone();
        };
        let session_context = session.context(&self.context);
        match session.views().iter().rev().find(|v| v.is_active()) {
            Some(view) => view.context(&session_context),
            None => session_context,
        }
    }

    /// The application scope is never finished.
    pub fn process(&mut self, command: &Command, effects: &mut Effects<'_>) -> bool {
        if !self.is_application_active {
            self.is_application_active = true;
            self.create_initial_session(command.time, effects);

            if effects.device().app_state != AppState::Background {
                // The launch view stands in for the first command, so it carries that command's attributes.
                let launch = Command::start_view(
                    command.time,
                    ViewIdentity::value(APPLICATION_LAUNCH_VIEW_URL),
                    Some(APPLICATION_LAUNCH_VIEW_NAME),
                    Some(APPLICATION_LAUNCH_VIEW_URL),
                )
                .with_attributes(command.attributes.clone());
                self.propagate(&launch, effects);
            }
        }

        if self.active_session().is_none() && command.is_user_interaction() {
            self.start_new_session(command.time, effects);
        }

        self.propagate(command, effects);

        let active = self.active_session_count();
        if active > 1 {
            error!("An application has {} active sessions", active);
            effects.record(TelemetryEvent::MultipleActiveSessions { count: active });
        }

        true
    }

    fn propagate(&mut self, command: &Command, effects: &mut Effects<'_>) {
        let sessions = std::mem::take(&mut self.sessions);
        for mut session in sessions {
            if session.process(command, &self.context, effects) {
                self.sessions.push(session);
                continue;
            }

            let reason = session.end_reason();
            if let Some(reason) = reason {
                effects.record(TelemetryEvent::SessionEnded {
                    session_id: session.id,
                    reason: SessionEndKind::from(reason),
                    at: command.time,
                });
            }

            if !session.is_active() {
                info!("Session {} stopped, dropping it", session.id);
                continue;
            }

            // Expired while still active: hand its open views to a successor.
            let mut successor = session.renewed(command.time);
            info!(
                "Session {} expired ({:?}), continuing in {}",
                session.id, reason, successor.id
            );
            self.announce(&successor, command.time, effects);
            effects.record(TelemetryEvent::SessionRenewed {
                expired_id: session.id,
                successor_id: successor.id,
                transplanted_views: successor.views().len(),
            });
            successor.process(command, &self.context, effects);
            self.sessions.push(successor);
        }
    }

    fn create_initial_session(&mut self, time: Timestamp, effects: &mut Effects<'_>) {
        self.initial_sessions_created += 1;
        if self.initial_sessions_created > 1 {
            effects.record(TelemetryEvent::InitialSessionRecreated {
                count: self.initial_sessions_created,
            });
        }
        let session = SessionScope::new(true, time, effects.deps().sampler);
        info!("Initial session {} started", session.id);
        self.announce(&session, time, effects);
        self.sessions.push(session);
    }

    fn start_new_session(&mut self, time: Timestamp, effects: &mut Effects<'_>) {
        let session = SessionScope::new(false, time, effects.deps().sampler);
        info!("New session {} started", session.id);
        self.announce(&session, time, effects);
        self.sessions.push(session);
    }

    fn announce(&self, session: &SessionScope, time: Timestamp, effects: &mut Effects<'_>) {
        effects
            .deps()
            .notify_session_start(session.id, session.is_sampled_out());
        effects.record(TelemetryEvent::SessionStarted {
            session_id: session.id,
            sampled_out: session.is_sampled_out(),
            initial: session.is_initial(),
            at: time,
        });
    }
}
