//! Entry point for a chat host.
//!
//! The host hands over the raw argument text of a `sonar` command together
//! with a [`ReplySink`]; exactly one reply is sent per invocation. Failures
//! are logged here and turned into a short apology so the host never sees
//! an error.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

use crate::api::HttpSonarApi;
use crate::command::{SonarCommand, USAGE};
use crate::config::SonarConfig;
use crate::error::Result;
use crate::render::Orchestrator;

/// Where replies go. Invocations may run concurrently, so sinks are shared
/// across tasks.
pub trait ReplySink: Send + Sync {
    fn reply(&self, message: &str);
}

#[derive(Clone)]
pub struct SonarPlugin {
    orchestrator: Orchestrator,
}

impl SonarPlugin {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn from_config(config: &SonarConfig) -> Result<Self> {
        let api = HttpSonarApi::new(&config.api)?;
        Ok(Self::new(Orchestrator::new(Arc::new(api), &config.api)))
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Run one command and deliver its reply.
    pub async fn dispatch(&self, args: &str, sink: &dyn ReplySink) {
        let reply = self.handle(args).await;
        sink.reply(&reply);
    }

    /// Run one command and return its reply text.
    pub async fn handle(&self, args: &str) -> String {
        let mut rng = StdRng::from_entropy();
        self.handle_with_rng(args, &mut rng).await
    }

    pub async fn handle_with_rng(&self, args: &str, rng: &mut StdRng) -> String {
        let command = match SonarCommand::parse(args) {
            Ok(c) => c,
            Err(_) => return USAGE.to_string(),
        };

        match self.orchestrator.run(&command, rng).await {
            Ok(outcome) => outcome.reply(),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    details = ?e,
                    query = %command.query,
                    "Sonar command failed"
                );
                format!("Something went very wrong: {e}")
            }
        }
    }
}
