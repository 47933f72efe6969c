//! Progress events emitted while a conversation runs.

use std::sync::Arc;

use crate::types::AgentId;

use super::state::{ConversationStatus, RunId};

/// Observer for conversation progress (console output, UIs, tests).
pub type ConversationEventSink = Arc<dyn Fn(&ConversationEvent) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    /// Both sessions are open; the transcript is about to start.
    SessionsReady { run_id: RunId },
    TurnStarted { turn: u32 },
    /// A message is about to be delivered to `agent`.
    MessageSent {
        agent: AgentId,
        label: String,
        text: String,
    },
    ReplyReceived {
        agent: AgentId,
        label: String,
        text: String,
    },
    Finished {
        status: ConversationStatus,
        turns_completed: u32,
        /// Display form of the error that ended the run, if any.
        error: Option<String>,
    },
}

#[derive(Clone, Default)]
pub(crate) struct EventEmitter {
    sink: Option<ConversationEventSink>,
}

impl EventEmitter {
    pub(crate) fn new(sink: Option<ConversationEventSink>) -> Self {
        Self { sink }
    }

    pub(crate) fn emit(&self, event: ConversationEvent) {
        if let Some(sink) = self.sink.as_ref() {
            sink(&event);
        }
    }
}
