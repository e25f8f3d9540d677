use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::identity::ViewIdentity;
use super::time::Timestamp;
use super::context::RumUuid;

/// Free-form attributes attached to commands and merged into events.
pub type Attributes = HashMap<String, serde_json::Value>;

/// A timestamped instrumentation command fed into the scope tree.
#[derive(Debug, Clone)]
pub struct Command {
    pub time: Timestamp,
    pub attributes: Attributes,
    pub kind: CommandKind,
}

#[derive(Debug, Clone)]
pub enum CommandKind {
    StartView {
        identity: ViewIdentity,
        name: String,
        path: String,
    },
    StopView {
        identity: ViewIdentity,
    },
    /// Starts a continuous action (scroll, swipe).
    StartUserAction {
        action_type: ActionType,
        name: String,
    },
    StopUserAction {
        action_type: ActionType,
        /// Renames the action when present.
        name: Option<String>,
    },
    /// Adds a discrete action (tap).
    AddUserAction {
        action_type: ActionType,
        name: String,
    },
    StartResource {
        key: String,
        url: String,
        method: HttpMethod,
        kind: Option<ResourceKind>,
    },
    StopResource {
        key: String,
        status_code: Option<u16>,
        kind: ResourceKind,
        size: Option<u64>,
    },
    StopResourceWithError {
        key: String,
        message: String,
        error_type: Option<String>,
        source: ErrorSource,
        status_code: Option<u16>,
    },
    AddResourceMetrics {
        key: String,
        metrics: ResourceMetrics,
    },
    AddViewError {
        message: String,
        error_type: Option<String>,
        stack: Option<String>,
        source: ErrorSource,
    },
    StopSession,
    /// Re-enters the tree once the mapper decided to keep or discard a built event.
    EventMapped(MappingNotice),
}

impl Command {
    pub fn new(time: Timestamp, kind: CommandKind) -> Self {
        Self {
            time,
            attributes: Attributes::new(),
            kind,
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn start_view(time: Timestamp, identity: ViewIdentity, name: Option<&str>, path: Option<&str>) -> Self {
        let default_path = identity.default_path();
        let name = name.map(str::to_string).unwrap_or_else(|| default_path.clone());
        let path = path.map(str::to_string).unwrap_or(default_path);
        Self::new(time, CommandKind::StartView { identity, name, path })
    }

    pub fn stop_view(time: Timestamp, identity: ViewIdentity) -> Self {
        Self::new(time, CommandKind::StopView { identity })
    }

    pub fn start_action(time: Timestamp, action_type: ActionType, name: &str) -> Self {
        Self::new(time, CommandKind::StartUserAction { action_type, name: name.to_string() })
    }

    pub fn stop_action(time: Timestamp, action_type: ActionType, name: Option<&str>) -> Self {
        Self::new(time, CommandKind::StopUserAction { action_type, name: name.map(str::to_string) })
    }

    pub fn add_action(time: Timestamp, action_type: ActionType, name: &str) -> Self {
        Self::new(time, CommandKind::AddUserAction { action_type, name: name.to_string() })
    }

    pub fn start_resource(time: Timestamp, key: &str, url: &str, method: HttpMethod) -> Self {
        Self::new(
            time,
            CommandKind::StartResource {
                key: key.to_string(),
                url: url.to_string(),
                method,
                kind: None,
            },
        )
    }

    pub fn stop_resource(time: Timestamp, key: &str, status_code: Option<u16>, size: Option<u64>) -> Self {
        Self::new(
            time,
            CommandKind::StopResource {
                key: key.to_string(),
                status_code,
                kind: ResourceKind::Native,
                size,
            },
        )
    }

    pub fn stop_resource_with_error(time: Timestamp, key: &str, message: &str, status_code: Option<u16>) -> Self {
        Self::new(
            time,
            CommandKind::StopResourceWithError {
                key: key.to_string(),
                message: message.to_string(),
                error_type: None,
                source: ErrorSource::Network,
                status_code,
            },
        )
    }

    pub fn add_resource_metrics(time: Timestamp, key: &str, metrics: ResourceMetrics) -> Self {
        Self::new(time, CommandKind::AddResourceMetrics { key: key.to_string(), metrics })
    }

    pub fn add_view_error(time: Timestamp, message: &str, source: ErrorSource) -> Self {
        Self::new(
            time,
            CommandKind::AddViewError {
                message: message.to_string(),
                error_type: None,
                stack: None,
                source,
            },
        )
    }

    pub fn stop_session(time: Timestamp) -> Self {
        Self::new(time, CommandKind::StopSession)
    }

    pub fn event_mapped(time: Timestamp, notice: MappingNotice) -> Self {
        Self::new(time, CommandKind::EventMapped(notice))
    }

    /// Navigation and user actions keep a session alive and may start a new one.
    pub fn is_user_interaction(&self) -> bool {
        matches!(
            self.kind,
            CommandKind::StartView { .. }
                | CommandKind::StartUserAction { .. }
                | CommandKind::StopUserAction { .. }
                | CommandKind::AddUserAction { .. }
        )
    }

    /// Key correlating this command with a resource scope, if it targets one.
    pub fn resource_key(&self) -> Option<&str> {
        match &self.kind {
            CommandKind::StartResource { key, .. }
            | CommandKind::StopResource { key, .. }
            | CommandKind::StopResourceWithError { key, .. }
            | CommandKind::AddResourceMetrics { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Commands that a view must see to be useful; logged when no view is active.
    pub fn expects_active_view(&self) -> bool {
        matches!(
            self.kind,
            CommandKind::StartUserAction { .. }
                | CommandKind::AddUserAction { .. }
                | CommandKind::StartResource { .. }
                | CommandKind::AddViewError { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            CommandKind::StartView { .. } => "start_view",
            CommandKind::StopView { .. } => "stop_view",
            CommandKind::StartUserAction { .. } => "start_user_action",
            CommandKind::StopUserAction { .. } => "stop_user_action",
            CommandKind::AddUserAction { .. } => "add_user_action",
            CommandKind::StartResource { .. } => "start_resource",
            CommandKind::StopResource { .. } => "stop_resource",
            CommandKind::StopResourceWithError { .. } => "stop_resource_with_error",
            CommandKind::AddResourceMetrics { .. } => "add_resource_metrics",
            CommandKind::AddViewError { .. } => "add_view_error",
            CommandKind::StopSession => "stop_session",
            CommandKind::EventMapped(_) => "event_mapped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Tap,
    Click,
    Scroll,
    Swipe,
    Custom,
    ApplicationStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Xhr,
    Fetch,
    Image,
    Js,
    Css,
    Font,
    Media,
    Native,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSource {
    Source,
    Network,
    Console,
    Custom,
}

/// A time window reported by the network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpan {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl MetricSpan {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }
}

/// Detailed timings of a resource load. Takes precedence over the stop command's own values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    pub fetch: MetricSpan,
    pub dns: Option<MetricSpan>,
    pub connect: Option<MetricSpan>,
    pub ssl: Option<MetricSpan>,
    pub first_byte: Option<MetricSpan>,
    pub download: Option<MetricSpan>,
    pub response_size: Option<u64>,
}

impl ResourceMetrics {
    pub fn fetch_only(fetch: MetricSpan) -> Self {
        Self {
            fetch,
            dns: None,
            connect: None,
            ssl: None,
            first_byte: None,
            download: None,
            response_size: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    View,
    Action,
    Resource,
    Error,
}

/// Outcome of running the mapper over one built event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingNotice {
    pub kind: EventKind,
    /// Id of the event itself (action, resource or error id).
    pub event_id: RumUuid,
    pub view_id: Option<RumUuid>,
    /// Action the event was attributed to. `None` for action events.
    pub action_id: Option<RumUuid>,
    pub kept: bool,
}
