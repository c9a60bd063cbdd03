//! Blog service: command/query facades over an authoritative post table and
//! an event-synchronized in-memory read model.

pub mod app;
pub mod config;
pub mod demo;
pub mod errors;
pub mod services;

pub use app::{BlogSync, SharedTable};
pub use config::{AppConfig, Storage};
pub use errors::{CommandError, CommandResult, QueryError, QueryResult};
pub use services::{CommandService, QueryService};
