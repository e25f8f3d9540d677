pub mod command;
pub mod context;
pub mod identity;
pub mod reactor;
pub mod scopes;
pub mod telemetry;
pub mod time;
