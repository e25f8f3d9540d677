use serde::{Deserialize, Serialize};

use crate::kernel::context::RumUuid;
use crate::kernel::command::EventKind;
use crate::kernel::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    SessionStarted {
        session_id: RumUuid,
        sampled_out: bool,
        initial: bool,
        at: Timestamp,
    },

    SessionEnded {
        session_id: RumUuid,
        reason: SessionEndKind,
        at: Timestamp,
    },

    /// An expired session was replaced by a successor owning its transplanted views.
    SessionRenewed {
        expired_id: RumUuid,
        successor_id: RumUuid,
        transplanted_views: usize,
    },

    EventDiscarded {
        kind: EventKind,
    },

    CommandWithoutView {
        command: String,
    },

    InitialSessionRecreated {
        count: u32,
    },

    /// Sanity anomaly; the tree keeps serving commands.
    MultipleActiveSessions {
        count: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEndKind {
    TimedOut,
    MaxDuration,
    Stopped,
}

impl TelemetryEvent {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            TelemetryEvent::MultipleActiveSessions { .. } | TelemetryEvent::InitialSessionRecreated { .. }
        )
    }
}
