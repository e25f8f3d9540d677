use std::sync::Arc;
use tracing::warn;

use super::model::{EventPayload, RumEvent};
use crate::kernel::command::Attributes;
use crate::kernel::context::DeviceContext;

/// User-supplied hook allowed to rewrite or discard a finished event.
/// Returning `None` discards the event.
pub trait EventMapper: Send + Sync {
    fn map(&self, event: RumEvent) -> Option<RumEvent>;
}

impl<F> EventMapper for F
where
    F: Fn(RumEvent) -> Option<RumEvent> + Send + Sync,
{
    fn map(&self, event: RumEvent) -> Option<RumEvent> {
        self(event)
    }
}

/// Turns a raw per-kind payload plus attributes into the final event.
#[derive(Clone, Default)]
pub struct EventBuilder {
    mapper: Option<Arc<dyn EventMapper>>,
}

impl EventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapper(mapper: Arc<dyn EventMapper>) -> Self {
        Self { mapper: Some(mapper) }
    }

    /// Merges attributes and the device context into `event`, then runs the mapper.
    /// `None` means the mapper discarded the event.
    pub fn build(&self, mut event: RumEvent, attributes: &Attributes, device: &DeviceContext) -> Option<RumEvent> {
        event.context.extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        event.connectivity = device.connectivity.clone();
        event.usr = device.user.clone();

        let Some(mapper) = &self.mapper else {
            return Some(event);
        };

        if let EventPayload::View(_) = event.payload {
            // View updates carry cumulative counters and cannot be dropped.
            let fallback = event.clone();
            return match mapper.map(event) {
                Some(mapped) => Some(mapped),
                None => {
                    warn!("Event mapper returned None for a view event; view events cannot be dropped, keeping the original");
                    Some(fallback)
                }
            };
        }

        mapper.map(event)
    }
}

impl std::fmt::Debug for EventBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBuilder")
            .field("has_mapper", &self.mapper.is_some())
            .finish()
    }
}
