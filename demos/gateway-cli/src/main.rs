//! Command-line front end for the gateway: list tools, call one, run a batch
//! or log in.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use apigate::Gateway;
use apigate::config::GatewayConfig;
use apigate::primitives::ToolCallRequest;
use apigate::telemetry::{TelemetryConfig, TelemetryError, init_tracing};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Exposes API specification operations as callable tools")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the specification documents
    #[arg(long, global = true)]
    spec_dir: Option<PathBuf>,

    /// TOML configuration file, overlaid by the environment
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum number of tool calls in flight
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tool descriptors as JSON
    Tools,

    /// Call a single tool
    Call {
        /// Qualified tool name
        tool: String,

        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Run a JSON array of requests concurrently
    Batch {
        /// File containing the requests
        file: PathBuf,
    },

    /// Log in to every configured login domain
    Login {
        /// Discard held sessions first
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match init_tracing(&TelemetryConfig::default().with_directive(cli.log.clone())) {
        Ok(()) | Err(TelemetryError::AlreadyInitialized) => {}
        Err(err) => return Err(err).context("failed to initialise logging"),
    }

    let config = load_config(&cli)?;
    let (gateway, report) = Gateway::from_config(config).await.context("failed to start gateway")?;
    for (path, err) in &report.failed {
        warn!(path = %path.display(), %err, "spec skipped");
    }
    info!(tools = report.tool_count(), "tools registered");

    match cli.command {
        Commands::Tools => print(&serde_json::to_value(gateway.descriptors())?)?,
        Commands::Call { tool, args } => {
            let arguments: Value = serde_json::from_str(&args).context("--args is not valid JSON")?;
            let result = gateway.execute(ToolCallRequest::new(tool, arguments)).await;
            print(&result.envelope())?;
        }
        Commands::Batch { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let requests: Vec<ToolCallRequest> =
                serde_json::from_str(&text).context("batch file must be a JSON array of requests")?;
            let results = gateway.execute_batch(requests).await?;
            let envelopes: Vec<Value> = results.iter().map(|result| result.envelope()).collect();
            print(&json!({
                "results": envelopes,
                "summary": gateway.history_summary(),
            }))?;
        }
        Commands::Login { force } => {
            let outcomes = gateway.perform_login(force).await?;
            let rendered: Vec<Value> = outcomes
                .iter()
                .map(|outcome| match &outcome.result {
                    Ok(()) => json!({"domain": outcome.domain, "success": true}),
                    Err(err) => json!({"domain": outcome.domain, "success": false, "error": err.to_string()}),
                })
                .collect();
            print(&json!({"logins": rendered, "status": gateway.auth_status()}))?;
            if outcomes.iter().any(|outcome| outcome.result.is_err()) {
                bail!("one or more logins failed");
            }
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<GatewayConfig> {
    let base = match &cli.config {
        Some(path) => GatewayConfig::from_toml_file(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => GatewayConfig::default(),
    };
    let mut config = base.apply_env()?;
    if let Some(dir) = &cli.spec_dir {
        config = config.with_spec_dir(dir);
    }
    if let Some(limit) = cli.concurrency {
        config = config.with_max_concurrency(limit);
    }
    Ok(config)
}

fn print(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
