use tracing::debug;

use super::Effects;
use crate::events::{ErrorEvent, ErrorResource, EventPayload, ResourceEvent, RumEvent, TimingRef};
use crate::kernel::command::{Attributes, Command, CommandKind, HttpMethod, MetricSpan, ResourceKind, ResourceMetrics};
use crate::kernel::context::{RumContext, RumUuid};
use crate::kernel::time::{duration_nanos, Timestamp};

/// One in-flight resource load. Emits exactly one terminal event.
#[derive(Debug)]
pub struct ResourceScope {
    /// Context captured when the load started (view and active action at that time).
    context: RumContext,
    pub id: RumUuid,
    pub key: String,
    pub url: String,
    pub method: HttpMethod,
    kind_based_on_request: Option<ResourceKind>,
    start_time: Timestamp,
    /// When present, values here take precedence over the stop command.
    metrics: Option<ResourceMetrics>,
    attributes: Attributes,
}

impl ResourceScope {
    pub fn new(
        context: RumContext,
        key: &str,
        url: &str,
        method: HttpMethod,
        kind: Option<ResourceKind>,
        start_time: Timestamp,
        attributes: Attributes,
    ) -> Self {
        Self {
            context,
            id: RumUuid::generate(),
            key: key.to_string(),
            url: url.to_string(),
            method,
            kind_based_on_request: kind,
            start_time,
            metrics: None,
            attributes,
        }
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn metrics(&self) -> Option<&ResourceMetrics> {
        self.metrics.as_ref()
    }

    /// Returns `false` once the resource finished (caller removes the scope).
    pub fn process(&mut self, command: &Command, effects: &mut Effects<'_>) -> bool {
        self.attributes
            .extend(command.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));

        match &command.kind {
            CommandKind::StopResource { key, status_code, kind, size } if *key == self.key => {
                self.send_resource_event(command.time, *status_code, *kind, *size, effects);
                false
            }
            CommandKind::StopResourceWithError {
                key,
                message,
                error_type,
                source,
                status_code,
            } if *key == self.key => {
                let error = ErrorEvent {
                    id: RumUuid::generate(),
                    action_id: self.context.action_id,
                    message: message.clone(),
                    source: *source,
                    error_type: error_type.clone(),
                    stack: None,
                    resource: Some(ErrorResource {
                        url: self.url.clone(),
                        method: self.method,
                        status_code: *status_code,
                    }),
                };
                let event = RumEvent::envelope(&self.context, command.time.as_millis(), EventPayload::Error(error));
                effects.emit(event, &self.attributes);
                false
            }
            CommandKind::AddResourceMetrics { key, metrics } if *key == self.key => {
                debug!("Metrics received for resource {}", self.key);
                self.metrics = Some(metrics.clone());
                true
            }
            _ => true,
        }
    }

    fn send_resource_event(
        &self,
        stop_time: Timestamp,
        status_code: Option<u16>,
        kind: ResourceKind,
        size: Option<u64>,
        effects: &mut Effects<'_>,
    ) {
        let (start, duration, size) = match &self.metrics {
            Some(metrics) => (
                metrics.fetch.start,
                metrics.fetch.end.since(metrics.fetch.start),
                metrics.response_size.or(size),
            ),
            None => (self.start_time, stop_time.since(self.start_time), size),
        };

        let timing = |span: &Option<MetricSpan>| {
            span.map(|s| TimingRef {
                start_ns: duration_nanos(s.start.since(start)),
                duration_ns: duration_nanos(s.end.since(s.start)),
            })
        };
        let metrics = self.metrics.as_ref();

        let resource = ResourceEvent {
            id: self.id,
            action_id: self.context.action_id,
            url: self.url.clone(),
            method: self.method,
            kind: self.kind_based_on_request.unwrap_or(kind),
            status_code,
            size,
            duration_ns: duration_nanos(duration),
            dns: metrics.and_then(|m| timing(&m.dns)),
            connect: metrics.and_then(|m| timing(&m.connect)),
            ssl: metrics.and_then(|m| timing(&m.ssl)),
            first_byte: metrics.and_then(|m| timing(&m.first_byte)),
            download: metrics.and_then(|m| timing(&m.download)),
        };

        let event = RumEvent::envelope(&self.context, start.as_millis(), EventPayload::Resource(resource));
        effects.emit(event, &self.attributes);
    }
}
