//! Identity of the two conversation participants.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Which of the two agents a value belongs to.
///
/// Each turn delivers the pending message to `B` first, then feeds B's
/// reply to `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum AgentId {
    A,
    B,
}

impl AgentId {
    /// Agents in the order they speak within a turn.
    pub const TURN_ORDER: [AgentId; 2] = [AgentId::B, AgentId::A];

    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}
