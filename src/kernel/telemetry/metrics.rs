use std::collections::VecDeque;

use super::event::{SessionEndKind, TelemetryEvent};
use crate::kernel::command::EventKind;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub session_stats: SessionStats,
    pub mapper_stats: MapperStats,
    pub anomalies: AnomalyStats,
    pub commands_without_view: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub started: u64,
    pub sampled_out: u64,
    pub timed_out: u64,
    pub max_duration: u64,
    pub stopped: u64,
    pub renewed: u64,
    pub transplanted_views: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapperStats {
    pub discarded_actions: u64,
    pub discarded_resources: u64,
    pub discarded_errors: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnomalyStats {
    pub multiple_active_sessions: u64,
    pub max_active_sessions: usize,
    pub initial_session_recreated: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::SessionStarted { sampled_out, .. } => {
                snap.session_stats.started += 1;
                if *sampled_out {
                    snap.session_stats.sampled_out += 1;
                }
            }
            TelemetryEvent::SessionEnded { reason, .. } => match reason {
                SessionEndKind::TimedOut => snap.session_stats.timed_out += 1,
                SessionEndKind::MaxDuration => snap.session_stats.max_duration += 1,
                SessionEndKind::Stopped => snap.session_stats.stopped += 1,
            },
            TelemetryEvent::SessionRenewed { transplanted_views, .. } => {
                snap.session_stats.renewed += 1;
                snap.session_stats.transplanted_views += *transplanted_views as u64;
            }
            TelemetryEvent::EventDiscarded { kind } => match kind {
                EventKind::Action => snap.mapper_stats.discarded_actions += 1,
                EventKind::Resource => snap.mapper_stats.discarded_resources += 1,
                EventKind::Error => snap.mapper_stats.discarded_errors += 1,
                EventKind::View => {} // views are never discarded
            },
            TelemetryEvent::CommandWithoutView { .. } => snap.commands_without_view += 1,
            TelemetryEvent::InitialSessionRecreated { .. } => snap.anomalies.initial_session_recreated += 1,
            TelemetryEvent::MultipleActiveSessions { count } => {
                snap.anomalies.multiple_active_sessions += 1;
                snap.anomalies.max_active_sessions = snap.anomalies.max_active_sessions.max(*count);
            }
        }
    }

    snap
}
