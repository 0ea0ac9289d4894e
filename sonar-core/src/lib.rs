pub mod api;
pub mod command;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod plugin;
pub mod render;
pub mod select;

pub use api::{HttpSonarApi, SonarApi};
pub use command::SonarCommand;
pub use crate::config::{ApiConfig, ConfigOverrides, SonarConfig};
pub use error::SonarError;
pub use models::{Episode, EventId, RenderJob, RenderStatus, RenderType, SearchResult};
pub use plugin::{ReplySink, SonarPlugin};
pub use render::{Clock, Orchestrator, Outcome, PollBackoff, TokioClock};
