use std::collections::HashMap;
use tracing::debug;

use super::action::ActionScope;
use super::resource::ResourceScope;
use super::Effects;
use crate::events::{ActionEvent, ErrorEvent, EventPayload, RumEvent, ViewEvent};
use crate::kernel::command::{ActionType, Attributes, Command, CommandKind, EventKind};
use crate::kernel::context::{RumContext, RumUuid};
use crate::kernel::identity::ViewIdentity;
use crate::kernel::time::{duration_nanos, Timestamp};

pub const APPLICATION_LAUNCH_VIEW_URL: &str = "com/rum/application-launch/view";
pub const APPLICATION_LAUNCH_VIEW_NAME: &str = "ApplicationLaunch";

/// One logical screen instance.
#[derive(Debug)]
pub struct ViewScope {
    pub id: RumUuid,
    pub identity: ViewIdentity,
    pub url: String,
    pub name: String,
    attributes: Attributes,
    start_time: Timestamp,

    /// `true` for every new view, `false` once stopped or replaced by another view.
    is_active: bool,
    did_receive_start: bool,
    /// Time the view became inactive.
    inactive_since: Option<Timestamp>,
    /// First view of the initial session; it reports the application start.
    is_initial_view: bool,
    did_send_application_start: bool,

    action_count: u64,
    resource_count: u64,
    error_count: u64,
    /// Document version of the last update event.
    version: u64,
    /// Mapping notices still expected for events this view accounted for.
    awaiting_notices: usize,

    resources: HashMap<String, ResourceScope>,
    /// At most one open action; closing ones linger until their notice.
    actions: Vec<ActionScope>,
}

impl ViewScope {
    pub fn new(
        identity: ViewIdentity,
        name: &str,
        url: &str,
        attributes: Attributes,
        start_time: Timestamp,
        is_initial_view: bool,
    ) -> Self {
        Self {
            id: RumUuid::generate(),
            identity,
            url: url.to_string(),
            name: name.to_string(),
            attributes,
            start_time,
            is_active: true,
            did_receive_start: false,
            inactive_since: None,
            is_initial_view,
            did_send_application_start: false,
            action_count: 0,
            resource_count: 0,
            error_count: 0,
            version: 0,
            awaiting_notices: 0,
            resources: HashMap::new(),
            actions: Vec::new(),
        }
    }

    /// Copy for a successor session: same identity, url, name and attributes, fresh id and start.
    pub fn transplant(&self, start_time: Timestamp) -> Self {
        let mut view = ViewScope::new(
            self.identity.clone(),
            &self.name,
            &self.url,
            self.attributes.clone(),
            start_time,
            false,
        );
        // The original start command was already consumed by the expired session.
        view.did_receive_start = true;
        view
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn action_count(&self) -> u64 {
        self.action_count
    }

    pub fn resource_count(&self) -> u64 {
        self.resource_count
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn pending_resources(&self) -> usize {
        self.resources.len()
    }

    pub fn resource(&self, key: &str) -> Option<&ResourceScope> {
        self.resources.get(key)
    }

    pub fn actions(&self) -> &[ActionScope] {
        &self.actions
    }

    pub fn open_action(&self) -> Option<&ActionScope> {
        self.actions.iter().find(|a| a.is_open())
    }

    pub fn context(&self, parent: &RumContext) -> RumContext {
        let mut context = parent.clone();
        context.view_id = Some(self.id);
        context.view_url = Some(self.url.clone());
        context.view_name = Some(self.name.clone());
        context.action_id = self.open_action().map(|a| a.id);
        context
    }

    /// Returns `false` once the view is inactive, drained of resources and no longer
    /// waiting for mapping notices (or the grace period ran out).
    pub fn process(&mut self, command: &Command, parent: &RumContext, effects: &mut Effects<'_>) -> bool {
        let mut needs_update = false;

        // === 1. Propagate to actions ===
        let context = self.context(parent);
        let open_before: Vec<RumUuid> = self.actions.iter().filter(|a| a.is_open()).map(|a| a.id).collect();
        // Stops for keys this view never started are not counted by its actions.
        let owns_resource = match &command.kind {
            CommandKind::StopResource { key, .. } | CommandKind::StopResourceWithError { key, .. } => {
                self.resources.contains_key(key)
            }
            _ => true,
        };
        self.actions
            .retain_mut(|action| action.process(command, &context, owns_resource, effects));
        let closed_now = open_before
            .iter()
            .filter(|id| !self.actions.iter().any(|a| a.id == **id && a.is_open()))
            .count();
        if closed_now > 0 {
            self.action_count += closed_now as u64;
            self.awaiting_notices += closed_now;
            needs_update = true;
        }

        // === 2. Side effects ===
        match &command.kind {
            CommandKind::StartView { identity, .. } if identity.equals(&self.identity) => {
                if self.did_receive_start && self.is_active {
                    // Duplicated start: the session already created a new scope for this view.
                    self.deactivate(command.time);
                }
                if self.is_initial_view && !self.did_send_application_start {
                    self.send_application_start(command, parent, effects);
                }
                self.did_receive_start = true;
                needs_update = true;
            }
            CommandKind::StartView { .. } => {
                if self.is_active {
                    // Sanity update in case this view was never stopped.
                    self.deactivate(command.time);
                    needs_update = true;
                }
            }
            CommandKind::StopView { identity } if identity.equals(&self.identity) => {
                if self.is_active {
                    self.deactivate(command.time);
                    needs_update = true;
                }
            }
            CommandKind::StopSession => {
                if self.is_active {
                    self.deactivate(command.time);
                    needs_update = true;
                }
            }
            CommandKind::StartResource { key, url, method, kind } if self.is_active => {
                let context = self.context(parent);
                let scope = ResourceScope::new(context, key, url, *method, *kind, command.time, command.attributes.clone());
                if self.resources.insert(key.clone(), scope).is_some() {
                    debug!("Resource {} restarted before it finished", key);
                }
            }
            CommandKind::StartUserAction { action_type, name } if self.is_active => {
                self.start_action(*action_type, name, command, true);
            }
            CommandKind::AddUserAction { action_type, name } if self.is_active => {
                self.start_action(*action_type, name, command, false);
            }
            CommandKind::AddViewError {
                message,
                error_type,
                stack,
                source,
            } if self.is_active => {
                self.error_count += 1;
                self.awaiting_notices += 1;
                let context = self.context(parent);
                let error = ErrorEvent {
                    id: RumUuid::generate(),
                    action_id: context.action_id,
                    message: message.clone(),
                    source: *source,
                    error_type: error_type.clone(),
                    stack: stack.clone(),
                    resource: None,
                };
                self.merge_attributes(&command.attributes);
                let event = RumEvent::envelope(&context, command.time.as_millis(), EventPayload::Error(error));
                effects.emit(event, &self.attributes);
                needs_update = true;
            }
            CommandKind::EventMapped(notice) if notice.view_id == Some(self.id) && notice.kind != EventKind::View => {
                self.awaiting_notices = self.awaiting_notices.saturating_sub(1);
                if !notice.kept {
                    match notice.kind {
                        EventKind::Action => self.action_count = self.action_count.saturating_sub(1),
                        EventKind::Resource => self.resource_count = self.resource_count.saturating_sub(1),
                        EventKind::Error => self.error_count = self.error_count.saturating_sub(1),
                        EventKind::View => {}
                    }
                    needs_update = true;
                }
            }
            _ => {}
        }

        // === 3. Propagate to the resource the command targets ===
        if let Some(key) = command.resource_key() {
            let finished = match self.resources.get_mut(key) {
                Some(scope) => !scope.process(command, effects),
                None => false,
            };
            if finished {
                self.resources.remove(key);
                if matches!(command.kind, CommandKind::StopResourceWithError { .. }) {
                    self.error_count += 1;
                } else {
                    self.resource_count += 1;
                }
                self.awaiting_notices += 1;
                needs_update = true;
            }
        }

        // === 4. Emit ===
        if needs_update {
            self.send_view_update(command, parent, effects);
        }

        self.keep_alive(command.time, effects)
    }

    fn keep_alive(&self, now: Timestamp, effects: &Effects<'_>) -> bool {
        if self.is_active || !self.resources.is_empty() {
            return true;
        }
        if self.awaiting_notices == 0 {
            return false;
        }
        let inactive_since = self.inactive_since.unwrap_or(now);
        now.since(inactive_since) < effects.deps().mapping_grace_period || now == inactive_since
    }

    fn deactivate(&mut self, time: Timestamp) {
        self.is_active = false;
        self.inactive_since = Some(time);
    }

    fn merge_attributes(&mut self, attributes: &Attributes) {
        self.attributes
            .extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    fn start_action(&mut self, action_type: ActionType, name: &str, command: &Command, is_continuous: bool) {
        if self.open_action().is_some() {
            debug!("Ignoring action '{}' while another action is open", name);
            return;
        }
        // Collapse to the still-open actions; closing ones stop being tracked.
        self.actions.retain(|a| a.is_open());
        self.actions.push(ActionScope::new(
            action_type,
            name,
            command.attributes.clone(),
            command.time,
            is_continuous,
        ));
    }

    fn send_application_start(&mut self, command: &Command, parent: &RumContext, effects: &mut Effects<'_>) {
        self.did_send_application_start = true;
        self.action_count += 1;
        self.awaiting_notices += 1;

        let context = self.context(parent);
        let action = ActionEvent {
            id: RumUuid::generate(),
            action_type: ActionType::ApplicationStart,
            name: "application_start".to_string(),
            loading_time_ns: None,
            resource_count: 0,
            error_count: 0,
        };
        let event = RumEvent::envelope(&context, self.start_time.as_millis(), EventPayload::Action(action));
        effects.emit(event, &command.attributes);
    }

    fn send_view_update(&mut self, command: &Command, parent: &RumContext, effects: &mut Effects<'_>) {
        self.version += 1;
        self.merge_attributes(&command.attributes);

        let view = ViewEvent {
            document_version: self.version,
            is_active: self.is_active,
            time_spent_ns: duration_nanos(command.time.since(self.start_time)),
            action_count: self.action_count,
            resource_count: self.resource_count,
            error_count: self.error_count,
        };
        let event = RumEvent::envelope(&self.context(parent), self.start_time.as_millis(), EventPayload::View(view));
        effects.emit(event, &self.attributes);
    }
}
