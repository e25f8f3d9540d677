use serde::Serialize;

use crate::kernel::command::{ActionType, Attributes, ErrorSource, EventKind, HttpMethod, ResourceKind};
use crate::kernel::context::{Connectivity, RumContext, RumUuid, UserInfo};

/// A finished telemetry event, ready for the storage/upload collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RumEvent {
    /// Epoch milliseconds of the event start.
    pub date: u64,
    pub application_id: String,
    pub session: SessionRef,
    pub view: Option<ViewRef>,
    pub connectivity: Connectivity,
    pub usr: Option<UserInfo>,
    #[serde(flatten)]
    pub payload: EventPayload,
    pub context: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRef {
    pub id: RumUuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRef {
    pub id: RumUuid,
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    View(ViewEvent),
    Action(ActionEvent),
    Resource(ResourceEvent),
    Error(ErrorEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewEvent {
    pub document_version: u64,
    pub is_active: bool,
    pub time_spent_ns: i64,
    pub action_count: u64,
    pub resource_count: u64,
    pub error_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionEvent {
    pub id: RumUuid,
    pub action_type: ActionType,
    pub name: String,
    pub loading_time_ns: Option<i64>,
    pub resource_count: u64,
    pub error_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceEvent {
    pub id: RumUuid,
    pub action_id: Option<RumUuid>,
    pub url: String,
    pub method: HttpMethod,
    pub kind: ResourceKind,
    pub status_code: Option<u16>,
    pub size: Option<u64>,
    pub duration_ns: i64,
    pub dns: Option<TimingRef>,
    pub connect: Option<TimingRef>,
    pub ssl: Option<TimingRef>,
    pub first_byte: Option<TimingRef>,
    pub download: Option<TimingRef>,
}

/// A sub-phase of a resource load, relative to the resource start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimingRef {
    pub start_ns: i64,
    pub duration_ns: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEvent {
    pub id: RumUuid,
    pub action_id: Option<RumUuid>,
    pub message: String,
    pub source: ErrorSource,
    pub error_type: Option<String>,
    pub stack: Option<String>,
    pub resource: Option<ErrorResource>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResource {
    pub url: String,
    pub method: HttpMethod,
    pub status_code: Option<u16>,
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::View(_) => EventKind::View,
            EventPayload::Action(_) => EventKind::Action,
            EventPayload::Resource(_) => EventKind::Resource,
            EventPayload::Error(_) => EventKind::Error,
        }
    }

    /// Id of the event itself. View updates share the view's id.
    pub fn event_id(&self) -> Option<RumUuid> {
        match self {
            EventPayload::View(_) => None,
            EventPayload::Action(a) => Some(a.id),
            EventPayload::Resource(r) => Some(r.id),
            EventPayload::Error(e) => Some(e.id),
        }
    }

    pub fn action_id(&self) -> Option<RumUuid> {
        match self {
            EventPayload::Resource(r) => r.action_id,
            EventPayload::Error(e) => e.action_id,
            EventPayload::View(_) | EventPayload::Action(_) => None,
        }
    }
}

impl RumEvent {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Fills the envelope from a scope context. `date` is the event start in epoch ms.
    pub fn envelope(context: &RumContext, date: u64, payload: EventPayload) -> Self {
        let view = match (context.view_id, &context.view_url, &context.view_name) {
            (Some(id), url, name) => Some(ViewRef {
                id,
                url: url.clone().unwrap_or_default(),
                name: name.clone().unwrap_or_default(),
            }),
            _ => None,
        };
        Self {
            date,
            application_id: context.application_id.clone(),
            session: SessionRef { id: context.session_id },
            view,
            connectivity: Connectivity::default(),
            usr: None,
            payload,
            context: Attributes::new(),
        }
    }

    pub fn as_view(&self) -> Option<&ViewEvent> {
        match &self.payload {
            EventPayload::View(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_action(&self) -> Option<&ActionEvent> {
        match &self.payload {
            EventPayload::Action(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&ResourceEvent> {
        match &self.payload {
            EventPayload::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorEvent> {
        match &self.payload {
            EventPayload::Error(e) => Some(e),
            _ => None,
        }
    }
}
