//! sonar-cli: command-line host for the `sonar` chat command
//!
//! Stands in for a chat framework: it loads configuration, sets up logging
//! and hands commands to [`SonarPlugin`]. Replies go to stdout, logs to
//! stderr.
//!
//! # Subcommands
//! - `run <words...>`            run one command, e.g. `run hello there -webm`
//! - `chat [--trigger .sonar]`   read chat lines from stdin, answer triggered ones
//! - `search <query> [--json]`   dump raw search hits
//! - `status <task_id>`          show one render status snapshot

use clap::{Parser, Subcommand};
use sonar_core::command::strip_trigger;
use sonar_core::format::format_event;
use sonar_core::{
    ConfigOverrides, HttpSonarApi, ReplySink, SonarApi, SonarConfig, SonarPlugin,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_CONFIG: &str = "sonar.toml";
const DEFAULT_TRIGGER: &str = ".sonar";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "sonar-cli", version, about = "Search events and render them")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: String,

    /// Sonar service URL (overrides the config file)
    #[arg(long, env = "SONAR_BASE_URL")]
    base_url: Option<String>,

    /// Render polling budget in seconds (overrides the config file)
    #[arg(long)]
    max_wait: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a single sonar command and print the reply
    Run {
        /// Query words, optionally mixed with -webm / -text
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },

    /// Answer triggered lines read from stdin until EOF
    Chat {
        /// Prefix that marks a line as a sonar command
        #[arg(long, default_value = DEFAULT_TRIGGER)]
        trigger: String,
    },

    /// Print raw search results
    Search {
        /// Query text to search for
        query: String,

        /// Output results as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Print the status of a render task
    Status {
        task_id: String,
    },
}

// ============================================================================
// Reply sink
// ============================================================================

struct StdoutSink;

impl ReplySink for StdoutSink {
    fn reply(&self, message: &str) {
        println!("{}", message);
    }
}

// ============================================================================
// Subcommands
// ============================================================================

async fn do_run(config: &SonarConfig, words: &[String]) -> anyhow::Result<()> {
    let plugin = SonarPlugin::from_config(config)?;
    plugin.dispatch(&words.join(" "), &StdoutSink).await;
    Ok(())
}

async fn do_chat(config: &SonarConfig, trigger: &str) -> anyhow::Result<()> {
    let plugin = SonarPlugin::from_config(config)?;
    let sink: Arc<dyn ReplySink> = Arc::new(StdoutSink);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let Some(args) = strip_trigger(&line, trigger) else {
            continue;
        };
        let args = args.to_string();
        let plugin = plugin.clone();
        let sink = sink.clone();
        tracing::debug!(args = %args, "Dispatching command");
        pending.push(tokio::spawn(async move {
            plugin.dispatch(&args, sink.as_ref()).await;
        }));
    }

    for result in futures::future::join_all(pending).await {
        if let Err(e) = result {
            tracing::error!(error = %e, "Command task panicked");
        }
    }
    Ok(())
}

async fn do_search(config: &SonarConfig, query: &str, json: bool) -> anyhow::Result<()> {
    let api = HttpSonarApi::new(&config.api)?;
    let results = api.search(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        eprintln!("No results found for: {}", query);
        return Ok(());
    }
    for r in &results {
        println!("[{:.3}] {} ({})", r.score, format_event(r), r.event_id);
    }
    Ok(())
}

async fn do_status(config: &SonarConfig, task_id: &str) -> anyhow::Result<()> {
    let api = HttpSonarApi::new(&config.api)?;
    let status = api.render_status(task_id).await?;

    println!("Task:     {}", task_id);
    println!("Finished: {}", status.finished);
    println!("Failed:   {}", status.failed);
    if status.is_success() {
        println!("Viewer:   {}/v/{}", api.base_url(), task_id);
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        base_url: cli.base_url.clone(),
        max_wait: cli.max_wait,
    };
    let config = match SonarConfig::load_with_overrides(&cli.config, &overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("sonar-cli: failed to load config from {}: {}", cli.config, e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        base_url = %config.api.base_url(),
        max_wait = config.api.max_wait,
        "Config loaded"
    );

    let result = match &cli.command {
        Commands::Run { words } => do_run(&config, words).await,
        Commands::Chat { trigger } => do_chat(&config, trigger).await,
        Commands::Search { query, json } => do_search(&config, query, *json).await,
        Commands::Status { task_id } => do_status(&config, task_id).await,
    };

    if let Err(e) = result {
        eprintln!("sonar-cli: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
