//! Finished RUM events and the builder that applies the user mapper.

pub mod builder;
pub mod model;

pub use builder::{EventBuilder, EventMapper};
pub use model::{
    ActionEvent, ErrorEvent, ErrorResource, EventPayload, ResourceEvent, RumEvent, SessionRef, TimingRef, ViewEvent,
    ViewRef,
};
