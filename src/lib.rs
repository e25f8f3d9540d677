pub mod config;
pub mod error;
pub mod events;
pub mod kernel;
pub mod pipeline;
pub mod sampling;

// Re-export specific items for convenient access
pub use config::RumConfig;
pub use error::RumError;
pub use kernel::command::{Command, CommandKind};
pub use kernel::reactor::Monitor;
pub use kernel::scopes::Dependencies;
