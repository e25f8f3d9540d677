pub mod writer;

pub use writer::{drain_to_store, ChannelWriter, EventStore, EventWriter, RecordingWriter};
