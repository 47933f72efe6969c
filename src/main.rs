//! Parley CLI binary entry point.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;

use parley::cli::{console_event_sink, CheckArgs, Cli, Commands, RunArgs};
use parley::driver::ConversationDriver;
use parley::error::{ParleyError, RecoverySuggestion, Result};
use parley::mcp::{discover_tools, McpConnector};
use parley::telemetry;
use parley::types::AgentId;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => handle_run(args).await,
        Commands::Check(args) => handle_check(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        let suggestion = e.recovery_suggestion();
        if suggestion != RecoverySuggestion::None {
            eprintln!("Hint: {suggestion}");
        }
        std::process::exit(1);
    }
}

async fn handle_run(args: RunArgs) -> Result<()> {
    let config = args.load_config()?;
    let dispatch = telemetry::file_dispatch(&config.log_path, args.common.verbose)?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let report = ConversationDriver::mcp(config)
        .with_event_sink(console_event_sink())
        .with_cancellation(cancel)
        .run()
        .with_subscriber(dispatch)
        .await;

    match report.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

async fn handle_check(args: CheckArgs) -> Result<()> {
    let config = args.common.load_config()?;
    let dispatch = telemetry::file_dispatch(&config.log_path, args.common.verbose)?;

    async {
        let mut missing = Vec::new();
        for agent in [AgentId::A, AgentId::B] {
            let found =
                discover_tools(&McpConnector, config.agent(agent), &config.tool_name).await?;
            println!("{} ({})", found.label, found.endpoint);
            for tool in &found.tools {
                match &tool.description {
                    Some(description) => println!("  - {}: {description}", tool.name),
                    None => println!("  - {}", tool.name),
                }
            }
            if !found.has_chat_tool {
                missing.push(found.label);
            }
        }

        if missing.is_empty() {
            println!("Both agents advertise '{}'.", config.tool_name);
            Ok(())
        } else {
            Err(ParleyError::Configuration(format!(
                "tool '{}' not advertised by {}",
                config.tool_name,
                missing.join(", ")
            )))
        }
    }
    .with_subscriber(dispatch)
    .await
}
