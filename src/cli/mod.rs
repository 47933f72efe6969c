//! CLI entry point for Parley.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{AgentEndpoint, ConversationConfig};
use crate::driver::{ConversationEvent, ConversationEventSink, ConversationStatus};
use crate::error::Result;
use crate::types::AgentId;

const COLOR_BLUE: &str = "\x1b[94m";
const COLOR_GREEN: &str = "\x1b[92m";
const COLOR_RESET: &str = "\x1b[0m";

/// Parley CLI
#[derive(Parser, Debug)]
#[command(
    name = "parley",
    version,
    about = "Drive a conversation between two MCP chat agents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a conversation between the two agents
    Run(RunArgs),
    /// Connect to both agents and list their tools
    Check(CheckArgs),
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// MCP endpoint URL of agent A
    #[arg(long, value_name = "URL")]
    pub agent_a: Option<String>,

    /// MCP endpoint URL of agent B
    #[arg(long, value_name = "URL")]
    pub agent_b: Option<String>,

    /// Tool invoked on each agent
    #[arg(long)]
    pub tool_name: Option<String>,

    /// Per-call timeout in seconds (0 waits indefinitely)
    #[arg(long, value_name = "SECS", value_parser = parse_seconds)]
    pub call_timeout: Option<Duration>,

    /// Diagnostic log file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ConfigArgs {
    /// Layer these flags over the file and environment configuration.
    pub fn apply_overrides(&self, config: &mut ConversationConfig) {
        if let Some(url) = &self.agent_a {
            config.agent_a.endpoint = AgentEndpoint::http(url.clone());
        }
        if let Some(url) = &self.agent_b {
            config.agent_b.endpoint = AgentEndpoint::http(url.clone());
        }
        if let Some(tool) = &self.tool_name {
            config.tool_name = tool.clone();
        }
        if let Some(timeout) = self.call_timeout {
            config.call_timeout = timeout;
        }
        if let Some(path) = &self.log_file {
            config.log_path = path.clone();
        }
    }

    pub fn load_config(&self) -> Result<ConversationConfig> {
        let mut config = ConversationConfig::load(self.config.as_deref())?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }
}

/// Arguments for `parley run`.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: ConfigArgs,

    /// Seed message delivered to agent B
    #[arg(short, long)]
    pub message: Option<String>,

    /// Maximum number of turns
    #[arg(short = 'n', long)]
    pub max_turns: Option<u32>,

    /// Pause between turns in seconds
    #[arg(long, value_name = "SECS", value_parser = parse_seconds)]
    pub turn_delay: Option<Duration>,

    /// Transcript file (appended to)
    #[arg(short, long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,
}

impl RunArgs {
    pub fn apply_overrides(&self, config: &mut ConversationConfig) {
        self.common.apply_overrides(config);
        if let Some(message) = &self.message {
            config.initial_message = message.clone();
        }
        if let Some(max_turns) = self.max_turns {
            config.max_turns = max_turns;
        }
        if let Some(delay) = self.turn_delay {
            config.turn_delay = delay;
        }
        if let Some(path) = &self.transcript {
            config.transcript_path = path.clone();
        }
    }

    pub fn load_config(&self) -> Result<ConversationConfig> {
        let mut config = ConversationConfig::load(self.common.config.as_deref())?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }
}

/// Arguments for `parley check`.
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    #[command(flatten)]
    pub common: ConfigArgs,
}

fn parse_seconds(raw: &str) -> std::result::Result<Duration, String> {
    let secs: f64 = raw
        .parse()
        .map_err(|_| format!("expected a number of seconds, got '{raw}'"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid duration '{raw}': {e}"))
}

/// Console progress sink: agent B's replies in blue, agent A's in green.
pub fn console_event_sink() -> ConversationEventSink {
    std::sync::Arc::new(|event: &ConversationEvent| {
        if let Some(line) = format_event(event) {
            println!("{line}");
        }
    })
}

fn format_event(event: &ConversationEvent) -> Option<String> {
    match event {
        ConversationEvent::SessionsReady { .. } => Some(format!(
            "{COLOR_GREEN}--- Starting Conversation ---{COLOR_RESET}"
        )),
        ConversationEvent::ReplyReceived { agent, label, text } => {
            let color = match agent {
                AgentId::A => COLOR_GREEN,
                AgentId::B => COLOR_BLUE,
            };
            Some(format!("{color}{label} ➔{COLOR_RESET} {text}"))
        }
        ConversationEvent::Finished { status, .. } => match status {
            ConversationStatus::Ended => Some(format!(
                "{COLOR_GREEN}--- Conversation Ended ---{COLOR_RESET}"
            )),
            ConversationStatus::Cancelled => Some("--- Conversation Cancelled ---".to_string()),
            ConversationStatus::Failed => None,
        },
        ConversationEvent::TurnStarted { .. } | ConversationEvent::MessageSent { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_run_with_defaults() {
        let cli = Cli::try_parse_from(["parley", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert!(args.common.config.is_none());
                assert!(args.common.agent_a.is_none());
                assert!(args.message.is_none());
                assert!(args.max_turns.is_none());
                assert!(!args.common.verbose);
            }
            other => panic!("expected Run, got {other:?}"),
        }
    }

    #[test]
    fn parse_run_with_all_options() {
        let cli = Cli::try_parse_from([
            "parley",
            "run",
            "--config",
            "parley.toml",
            "--agent-a",
            "http://127.0.0.1:9001/mcp",
            "--agent-b",
            "http://127.0.0.1:9002/mcp",
            "-m",
            "Let's talk about compilers",
            "-n",
            "4",
            "--turn-delay",
            "0.5",
            "--call-timeout",
            "30",
            "-t",
            "out/log.txt",
            "--log-file",
            "out/app.log",
            "-v",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected Run");
        };

        let mut config = ConversationConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.agent_a.endpoint, AgentEndpoint::http("http://127.0.0.1:9001/mcp"));
        assert_eq!(config.agent_b.endpoint, AgentEndpoint::http("http://127.0.0.1:9002/mcp"));
        assert_eq!(config.initial_message, "Let's talk about compilers");
        assert_eq!(config.max_turns, 4);
        assert_eq!(config.turn_delay, Duration::from_millis(500));
        assert_eq!(config.call_timeout, Duration::from_secs(30));
        assert_eq!(config.transcript_path, PathBuf::from("out/log.txt"));
        assert_eq!(config.log_path, PathBuf::from("out/app.log"));
        assert!(args.common.verbose);
    }

    #[test]
    fn parse_check_with_endpoints() {
        let cli = Cli::try_parse_from([
            "parley",
            "check",
            "--agent-b",
            "http://10.0.0.2:8002/mcp",
            "--tool-name",
            "converse",
        ])
        .unwrap();
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.common.agent_b.as_deref(), Some("http://10.0.0.2:8002/mcp"));
                assert_eq!(args.common.tool_name.as_deref(), Some("converse"));
            }
            other => panic!("expected Check, got {other:?}"),
        }
    }

    #[test]
    fn negative_delay_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["parley", "run", "--turn-delay=-1"]).is_err());
        assert!(Cli::try_parse_from(["parley", "run", "--call-timeout", "soon"]).is_err());
    }

    #[test]
    fn replies_are_colored_per_agent() {
        let b = format_event(&ConversationEvent::ReplyReceived {
            agent: AgentId::B,
            label: "BotB".into(),
            text: "hi".into(),
        })
        .unwrap();
        assert_eq!(b, "\x1b[94mBotB ➔\x1b[0m hi");

        let a = format_event(&ConversationEvent::ReplyReceived {
            agent: AgentId::A,
            label: "BotA".into(),
            text: "hello".into(),
        })
        .unwrap();
        assert!(a.starts_with(COLOR_GREEN));
        assert!(format_event(&ConversationEvent::TurnStarted { turn: 1 }).is_none());
    }
}
