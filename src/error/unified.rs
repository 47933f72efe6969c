//! Error classification and recovery hints.

use std::fmt;

/// Broad error category for routing top-level reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Connection,
    Transport,
    Timeout,
    ToolExecution,
    ReplyFormat,
    Configuration,
    Io,
    Serialization,
    Cancelled,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    StartAgentServers,
    RestartConversation,
    IncreaseTimeout,
    InspectAgentLogs,
    CheckConfiguration,
    CheckFilePermissions,
    ReportBug,
    None,
}

impl fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hint = match self {
            Self::StartAgentServers => "ensure both agent servers are running and reachable",
            Self::RestartConversation => "the agent connection dropped; restart the conversation",
            Self::IncreaseTimeout => "raise --call-timeout or check whether the agent is stuck",
            Self::InspectAgentLogs => "inspect the agent's own log for the failing reply",
            Self::CheckConfiguration => "check the parley configuration file and PARLEY_* variables",
            Self::CheckFilePermissions => "check that the transcript and log paths are writable",
            Self::ReportBug => "unexpected failure; please report it",
            Self::None => "no action needed",
        };
        f.write_str(hint)
    }
}
