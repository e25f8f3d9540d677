use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque 128-bit identifier of a session, view, action or resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RumUuid(pub Uuid);

impl RumUuid {
    /// Denotes "absent", e.g. the id of a sampled-out session.
    pub const NULL: RumUuid = RumUuid(Uuid::nil());

    pub fn generate() -> Self {
        RumUuid(Uuid::new_v4())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for RumUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Context of the scope tree as seen by one scope.
///
/// Never stored between commands: every scope derives it from its parent's
/// context on demand, overlaying only the fields it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RumContext {
    pub application_id: String,
    pub session_id: RumUuid,
    pub is_session_sampled: bool,
    pub is_session_active: bool,
    pub view_id: Option<RumUuid>,
    pub view_url: Option<String>,
    pub view_name: Option<String>,
    pub action_id: Option<RumUuid>,
}

impl RumContext {
    pub fn root(application_id: &str) -> Self {
        Self {
            application_id: application_id.to_string(),
            session_id: RumUuid::NULL,
            is_session_sampled: false,
            is_session_active: false,
            view_id: None,
            view_url: None,
            view_name: None,
            action_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppState {
    #[default]
    Foreground,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityStatus {
    Connected,
    NotConnected,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Connectivity {
    pub status: ConnectivityStatus,
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Process-wide mutable context, published by the host through a `watch` channel.
/// The scope tree only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceContext {
    pub connectivity: Connectivity,
    pub user: Option<UserInfo>,
    pub app_state: AppState,
}
