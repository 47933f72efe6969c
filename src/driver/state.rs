//! Conversation state and run outcome types.

use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::error::ParleyError;
use crate::types::{AgentId, History};

pub type RunId = Uuid;

/// Where the driver is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverPhase {
    Init,
    SessionsReady,
    TurnB,
    TurnA,
    Ended,
    Failed,
    Cancelled,
}

impl DriverPhase {
    pub fn turn_of(agent: AgentId) -> Self {
        match agent {
            AgentId::A => Self::TurnA,
            AgentId::B => Self::TurnB,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Failed | Self::Cancelled)
    }
}

/// Mutable state threaded through the turn loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationState {
    /// Completed turns.
    pub turn: u32,
    pub history_a: History,
    pub history_b: History,
    /// Next message to deliver; the seed before turn 1.
    pub pending_message: String,
}

impl ConversationState {
    pub fn new(initial_message: impl Into<String>) -> Self {
        Self {
            pending_message: initial_message.into(),
            ..Default::default()
        }
    }

    pub fn history(&self, agent: AgentId) -> &History {
        match agent {
            AgentId::A => &self.history_a,
            AgentId::B => &self.history_b,
        }
    }

    pub fn history_mut(&mut self, agent: AgentId) -> &mut History {
        match agent {
            AgentId::A => &mut self.history_a,
            AgentId::B => &mut self.history_b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConversationStatus {
    Ended,
    Failed,
    Cancelled,
}

/// Outcome of one [`ConversationDriver::run`](super::ConversationDriver::run).
#[derive(Debug)]
pub struct ConversationReport {
    pub run_id: RunId,
    pub status: ConversationStatus,
    pub turns_completed: u32,
    /// Every phase entered, in order.
    pub phases: Vec<DriverPhase>,
    /// Agent whose connection or exchange failed, if any.
    pub failed_agent: Option<AgentId>,
    pub error: Option<ParleyError>,
    pub state: ConversationState,
}

impl ConversationReport {
    pub fn is_success(&self) -> bool {
        self.status == ConversationStatus::Ended
    }

    pub fn final_phase(&self) -> Option<DriverPhase> {
        self.phases.last().copied()
    }
}
