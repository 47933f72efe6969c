//! Parley: drive a turn-based conversation between two MCP chat agents.
//!
//! Each agent is a remote MCP server exposing a `chat` tool that takes
//! `{message, history}` and returns text. The driver delivers a seed
//! message to agent B, feeds B's reply to agent A, A's reply back to B,
//! and so on for a bounded number of turns, appending every exchange to
//! a transcript file.
//!
//! # Quick Start
//!
//! ```no_run
//! use parley::prelude::*;
//!
//! # async fn example() -> parley::error::Result<()> {
//! let config = ConversationConfig::builder()
//!     .initial_message("Hello, BotB! let's discuss on llm and ai")
//!     .max_turns(10)
//!     .build();
//! let report = ConversationDriver::mcp(config).run().await;
//! if let Some(error) = report.error {
//!     return Err(error);
//! }
//! println!("{} turns completed", report.turns_completed);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod mcp;
pub mod prelude;
pub mod reply;
pub mod telemetry;
pub mod transcript;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
