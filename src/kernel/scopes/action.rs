use std::time::Duration;
use tracing::debug;

use super::Effects;
use crate::events::{ActionEvent, EventPayload, RumEvent};
use crate::kernel::command::{ActionType, Attributes, Command, CommandKind, EventKind, MappingNotice};
use crate::kernel::context::{RumContext, RumUuid};
use crate::kernel::time::{duration_nanos, Timestamp};

/// A discrete action (tap) ends if nothing keeps it busy within this window.
pub const DISCRETE_ACTION_TIMEOUT: Duration = Duration::from_millis(100);
/// Upper bound of a continuous action (scroll), measured from its start.
pub const CONTINUOUS_ACTION_MAX_DURATION: Duration = Duration::from_secs(10);

/// `Open -> Closing -> Closed | Discarded`. Never goes back to `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Open,
    /// Event sent, waiting for the mapper's verdict.
    Closing,
    Closed,
    Discarded,
}

#[derive(Debug)]
pub struct ActionScope {
    pub id: RumUuid,
    pub action_type: ActionType,
    name: String,
    attributes: Attributes,
    start_time: Timestamp,
    is_continuous: bool,
    state: ActionState,
    /// Command time at which the event was sent.
    closed_at: Option<Timestamp>,
    resource_count: u64,
    error_count: u64,
    /// Resources started but not yet finished during this action.
    active_resources: u64,
}

impl ActionScope {
    pub fn new(action_type: ActionType, name: &str, attributes: Attributes, start_time: Timestamp, is_continuous: bool) -> Self {
        Self {
            id: RumUuid::generate(),
            action_type,
            name: name.to_string(),
            attributes,
            start_time,
            is_continuous,
            state: ActionState::Open,
            closed_at: None,
            resource_count: 0,
            error_count: 0,
            active_resources: 0,
        }
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ActionState::Open
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource_count(&self) -> u64 {
        self.resource_count
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn active_resources(&self) -> u64 {
        self.active_resources
    }

    fn timeout(&self) -> Duration {
        if self.is_continuous {
            CONTINUOUS_ACTION_MAX_DURATION
        } else {
            DISCRETE_ACTION_TIMEOUT
        }
    }

    /// Deadline is fixed from the start, it does not slide with activity.
    fn expiration_time(&self, now: Timestamp) -> Option<Timestamp> {
        let timeout = self.timeout();
        if now.since(self.start_time) >= timeout {
            Some(self.start_time.plus(timeout))
        } else {
            None
        }
    }

    /// `context` is the owning view's context. `owns_resource` is `false` for a resource stop
    /// whose key the view is not tracking; such stops leave the counters alone.
    /// Returns `false` once the scope can be dropped.
    pub fn process(
        &mut self,
        command: &Command,
        context: &RumContext,
        owns_resource: bool,
        effects: &mut Effects<'_>,
    ) -> bool {
        if let CommandKind::EventMapped(notice) = &command.kind {
            self.apply_notice(notice);
            return self.keep_alive(command.time, effects.deps().mapping_grace_period);
        }

        if self.state != ActionState::Open {
            return self.keep_alive(command.time, effects.deps().mapping_grace_period);
        }

        if let Some(expiration) = self.expiration_time(command.time) {
            if self.active_resources == 0 {
                self.send_action_event(expiration, command.time, None, context, effects);
                return self.keep_alive(command.time, effects.deps().mapping_grace_period);
            }
        }

        match &command.kind {
            CommandKind::StartView { .. } | CommandKind::StopView { .. } | CommandKind::StopSession => {
                self.send_action_event(command.time, command.time, Some(&command.attributes), context, effects);
            }
            CommandKind::StopUserAction { name, .. } => {
                if let Some(name) = name {
                    self.name = name.clone();
                }
                self.send_action_event(command.time, command.time, Some(&command.attributes), context, effects);
            }
            CommandKind::StartResource { .. } => {
                self.active_resources += 1;
            }
            CommandKind::StopResource { .. } if owns_resource => {
                self.active_resources = self.active_resources.saturating_sub(1);
                self.resource_count += 1;
            }
            CommandKind::StopResourceWithError { .. } if owns_resource => {
                self.active_resources = self.active_resources.saturating_sub(1);
                self.error_count += 1;
            }
            CommandKind::AddViewError { .. } => {
                self.error_count += 1;
            }
            _ => {}
        }

        self.keep_alive(command.time, effects.deps().mapping_grace_period)
    }

    /// Corrects optimistic counters once the mapper's decision is known.
    fn apply_notice(&mut self, notice: &MappingNotice) {
        if notice.kind == EventKind::Action && notice.event_id == self.id {
            if self.state == ActionState::Closing {
                self.state = if notice.kept {
                    ActionState::Closed
                } else {
                    ActionState::Discarded
                };
            }
            return;
        }

        if notice.kept || notice.action_id != Some(self.id) {
            return;
        }
        match notice.kind {
            EventKind::Resource => self.resource_count = self.resource_count.saturating_sub(1),
            EventKind::Error => self.error_count = self.error_count.saturating_sub(1),
            EventKind::View | EventKind::Action => {}
        }
    }

    fn keep_alive(&self, now: Timestamp, grace: Duration) -> bool {
        match self.state {
            ActionState::Open => true,
            ActionState::Closing => {
                let closed_at = self.closed_at.unwrap_or(now);
                if now.since(closed_at) >= grace && now > closed_at {
                    debug!("Action {} gave up waiting for its mapping notice", self.id);
                    false
                } else {
                    true
                }
            }
            ActionState::Closed | ActionState::Discarded => false,
        }
    }

    fn send_action_event(
        &mut self,
        completion_time: Timestamp,
        now: Timestamp,
        attributes: Option<&Attributes>,
        context: &RumContext,
        effects: &mut Effects<'_>,
    ) {
        if let Some(attributes) = attributes {
            self.attributes
                .extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let action = ActionEvent {
            id: self.id,
            action_type: self.action_type,
            name: self.name.clone(),
            loading_time_ns: Some(duration_nanos(completion_time.since(self.start_time))),
            resource_count: self.resource_count,
            error_count: self.error_count,
        };
        let event = RumEvent::envelope(context, self.start_time.as_millis(), EventPayload::Action(action));

        self.state = ActionState::Closing;
        self.closed_at = Some(now);
        effects.emit(event, &self.attributes);
    }
}
