//! toolrunner - CLI entry point
//!
//! One process runs one tool: read a JSON request from stdin, write one
//! envelope to stdout, exit explicitly.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::str::FromStr;
use std::time::Duration;
use toolrunner::{
    cli::{Args, Commands},
    client::ToolInvoker,
    config::{Config, Credentials, DEFAULT_WRITE_CHUNK_SIZE},
    errors::{self, ToolError},
    runner::{self, InvocationOutcome, ToolRunner},
    telemetry,
    tools::implementations::{
        ResizeOperation, ScrapeOperation, SentimentOperation, SummarizeOperation, TranslateOperation,
    },
    tools::{ToolKind, ToolRegistry},
};

fn main() {
    let args = Args::parse();
    telemetry::init_tracing(args.verbosity());

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(kind) = args.command.tool_kind() {
        match runtime.block_on(run_tool(kind, &args)) {
            Ok(outcome) => runner::terminate(&outcome),
            Err(e) => {
                tracing::error!(error = %e, "failed to write envelope");
                std::process::exit(1);
            }
        }
    }

    let code = match runtime.block_on(run_command(&args)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    std::process::exit(code)
}

/// Load configuration: file, environment, then CLI flags
fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    config.validate().context("Invalid command-line override")?;
    Ok(config)
}

async fn run_tool(kind: ToolKind, args: &Args) -> errors::Result<InvocationOutcome> {
    let config = match load_config(args) {
        Ok(config) => config,
        Err(e) => {
            let error = ToolError::unexpected(format!("{:#}", e));
            return runner::write_failure(&mut tokio::io::stdout(), error, DEFAULT_WRITE_CHUNK_SIZE)
                .await;
        }
    };
    let credentials = Credentials::from_env();

    match kind {
        ToolKind::Scrape => run_operation(ScrapeOperation, config, credentials).await,
        ToolKind::Summarize => run_operation(SummarizeOperation, config, credentials).await,
        ToolKind::Translate => run_operation(TranslateOperation, config, credentials).await,
        ToolKind::Sentiment => run_operation(SentimentOperation, config, credentials).await,
        ToolKind::Resize => run_operation(ResizeOperation, config, credentials).await,
    }
}

async fn run_operation<O: toolrunner::tools::Operation>(
    op: O,
    config: Config,
    credentials: Credentials,
) -> errors::Result<InvocationOutcome> {
    ToolRunner::new(op, config)
        .with_credentials(credentials)
        .run_stdio()
        .await
}

async fn run_command(args: &Args) -> Result<i32> {
    match &args.command {
        Commands::Schema { tool } => show_schema(tool.as_deref()),
        Commands::Invoke {
            tool,
            request,
            timeout_secs,
        } => invoke_tool(args, tool, request, *timeout_secs).await,
        _ => bail!("not a tool subcommand"),
    }
}

fn show_schema(tool: Option<&str>) -> Result<i32> {
    let registry = ToolRegistry::new();
    let json = match tool {
        Some(name) => {
            let schema = registry
                .get(name)
                .with_context(|| format!("Unknown tool: {} (available: {})", name, registry.tool_names().join(", ")))?;
            serde_json::to_string_pretty(schema)?
        }
        None => serde_json::to_string_pretty(&registry.schemas())?,
    };
    println!("{}", json);
    Ok(0)
}

async fn invoke_tool(args: &Args, tool: &str, request: &str, timeout_secs: u64) -> Result<i32> {
    let kind = ToolKind::from_str(tool).map_err(anyhow::Error::msg)?;
    let request: serde_json::Value =
        serde_json::from_str(request).context("--request must be valid JSON")?;

    let exe = std::env::current_exe().context("Failed to locate toolrunner executable")?;
    let mut invoker = ToolInvoker::new(exe).timeout(Duration::from_secs(timeout_secs));
    if let Some(path) = &args.config {
        invoker = invoker.arg("--config").arg(path);
    }
    if let Some(ms) = args.read_timeout_ms {
        invoker = invoker.arg("--read-timeout-ms").arg(ms.to_string());
    }
    if let Some(ms) = args.exec_timeout_ms {
        invoker = invoker.arg("--exec-timeout-ms").arg(ms.to_string());
    }
    let invoker = invoker.arg(kind.name());

    let invocation = invoker.invoke(&request).await?;
    if !invocation.stderr.trim().is_empty() {
        eprint!("{}", invocation.stderr);
    }
    println!("{}", serde_json::to_string(&invocation.envelope)?);
    Ok(invocation.exit_code.unwrap_or(1))
}
