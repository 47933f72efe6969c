//! Turn-based conversation between two agents.
//!
//! Each turn delivers the pending message to agent B, then feeds B's reply
//! to agent A; A's reply becomes the next turn's message. Any failure ends
//! the run. Sessions are released on every exit path.

pub mod events;
mod sessions;
pub mod state;

pub use events::{ConversationEvent, ConversationEventSink};
pub use state::{ConversationReport, ConversationState, ConversationStatus, DriverPhase, RunId};

use std::sync::Arc;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ConversationConfig;
use crate::error::{ParleyError, Result};
use crate::mcp::{AgentConnector, AgentSession, McpConnector};
use crate::reply::extract_reply;
use crate::transcript::{Direction, TranscriptLogger};
use crate::types::{AgentId, Message, ToolCallResult};
use crate::util::text::preview;
use crate::util::timeout::with_timeout;

use events::EventEmitter;
use sessions::ReleaseStack;

/// Characters of each message shown in log lines.
const PREVIEW_CHARS: usize = 50;

/// Drives one conversation from session setup to teardown.
///
/// # Example
/// ```no_run
/// use parley::config::ConversationConfig;
/// use parley::driver::ConversationDriver;
///
/// # async fn demo() {
/// let config = ConversationConfig::builder().max_turns(3).build();
/// let report = ConversationDriver::mcp(config).run().await;
/// println!("{} after {} turns", report.status, report.turns_completed);
/// # }
/// ```
pub struct ConversationDriver {
    config: ConversationConfig,
    connector: Arc<dyn AgentConnector>,
    events: EventEmitter,
    cancel: CancellationToken,
    run_id: RunId,
}

impl ConversationDriver {
    pub fn new(config: ConversationConfig, connector: Arc<dyn AgentConnector>) -> Self {
        Self {
            config,
            connector,
            events: EventEmitter::default(),
            cancel: CancellationToken::new(),
            run_id: Uuid::new_v4(),
        }
    }

    /// Driver connecting to both agents over MCP.
    pub fn mcp(config: ConversationConfig) -> Self {
        Self::new(config, Arc::new(McpConnector))
    }

    pub fn with_event_sink(mut self, sink: ConversationEventSink) -> Self {
        self.events = EventEmitter::new(Some(sink));
        self
    }

    /// Stop the run when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// Run the conversation to completion, failure, or cancellation.
    ///
    /// Never returns early with an error: the outcome, including the error
    /// that ended the run, is carried by the report.
    pub async fn run(self) -> ConversationReport {
        let span = tracing::info_span!("conversation", run_id = %self.run_id);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(self) -> ConversationReport {
        let mut progress = Progress {
            state: ConversationState::new(self.config.initial_message.clone()),
            phases: vec![DriverPhase::Init],
            failed_agent: None,
        };
        let mut sessions = ReleaseStack::default();

        let outcome = self.drive(&mut progress, &mut sessions).await;

        for (agent, error) in sessions.release_all().await {
            tracing::warn!(agent = %agent, error = %error, "session close failed after run");
        }

        let turns_completed = progress.state.turn;
        let (status, error) = match outcome {
            Ok(()) => {
                tracing::info!(turns = turns_completed, "conversation ended");
                (ConversationStatus::Ended, None)
            }
            Err(ParleyError::Cancelled) => {
                progress.enter(DriverPhase::Cancelled);
                tracing::warn!(turns = turns_completed, "conversation cancelled");
                (ConversationStatus::Cancelled, Some(ParleyError::Cancelled))
            }
            Err(error) => {
                progress.enter(DriverPhase::Failed);
                tracing::error!(
                    turns = turns_completed,
                    agent = ?progress.failed_agent,
                    category = ?error.category(),
                    suggestion = %error.recovery_suggestion(),
                    error = %error,
                    "conversation failed"
                );
                (ConversationStatus::Failed, Some(error))
            }
        };

        self.events.emit(ConversationEvent::Finished {
            status,
            turns_completed,
            error: error.as_ref().map(ToString::to_string),
        });

        ConversationReport {
            run_id: self.run_id,
            status,
            turns_completed,
            phases: progress.phases,
            failed_agent: progress.failed_agent,
            error,
            state: progress.state,
        }
    }

    async fn drive(&self, progress: &mut Progress, sessions: &mut ReleaseStack) -> Result<()> {
        self.config.validate()?;

        tracing::info!(
            agent_a = %self.config.agent_a.label,
            endpoint_a = %self.config.agent_a.endpoint,
            agent_b = %self.config.agent_b.label,
            endpoint_b = %self.config.agent_b.endpoint,
            "connecting to agents"
        );
        if let Err((agent, error)) = self.open_sessions(sessions).await {
            progress.failed_agent = agent;
            return Err(error);
        }
        progress.enter(DriverPhase::SessionsReady);
        self.events.emit(ConversationEvent::SessionsReady {
            run_id: self.run_id,
        });

        tracing::info!(path = %self.config.transcript_path.display(), "starting conversation log");
        let mut transcript = TranscriptLogger::open(&self.config.transcript_path)?;
        transcript.write_run_marker(Local::now())?;

        while progress.state.turn < self.config.max_turns {
            if self.cancel.is_cancelled() {
                return Err(ParleyError::Cancelled);
            }

            let turn = progress.state.turn + 1;
            tracing::info!(turn, "starting turn");
            self.events.emit(ConversationEvent::TurnStarted { turn });
            transcript.write_turn_header(turn, Local::now())?;

            for agent in AgentId::TURN_ORDER {
                progress.enter(DriverPhase::turn_of(agent));
                let reply = match self
                    .exchange(agent, &mut progress.state, sessions, &mut transcript)
                    .await
                {
                    Ok(reply) => reply,
                    Err(error) => {
                        if !matches!(error, ParleyError::Cancelled) {
                            progress.failed_agent = Some(agent);
                        }
                        return Err(error);
                    }
                };
                progress.state.pending_message = reply;
            }

            progress.state.turn = turn;
            if turn < self.config.max_turns {
                self.pause_between_turns().await?;
            }
        }

        progress.enter(DriverPhase::Ended);
        Ok(())
    }

    /// Open both sessions concurrently; whichever succeeded is kept on the
    /// release stack even if the other failed.
    async fn open_sessions(
        &self,
        sessions: &mut ReleaseStack,
    ) -> std::result::Result<(), (Option<AgentId>, ParleyError)> {
        let opens = async {
            tokio::join!(
                self.connector.open(&self.config.agent_a),
                self.connector.open(&self.config.agent_b),
            )
        };
        let (opened_a, opened_b) = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err((None, ParleyError::Cancelled)),
            opened = opens => opened,
        };

        let mut failure = None;
        for (agent, opened) in [(AgentId::A, opened_a), (AgentId::B, opened_b)] {
            match opened {
                Ok(session) => sessions.push(agent, session),
                Err(error) => {
                    tracing::error!(
                        agent = %self.config.agent(agent).label,
                        endpoint = %self.config.agent(agent).endpoint,
                        error = %error,
                        "failed to open agent session"
                    );
                    if failure.is_none() {
                        failure = Some((Some(agent), error));
                    }
                }
            }
        }

        match failure {
            Some(failure) => Err(failure),
            None => {
                tracing::info!("agent sessions initialized");
                Ok(())
            }
        }
    }

    /// Deliver the pending message to `agent` and return its extracted reply.
    async fn exchange(
        &self,
        agent: AgentId,
        state: &mut ConversationState,
        sessions: &mut ReleaseStack,
        transcript: &mut TranscriptLogger,
    ) -> Result<String> {
        let label = self.config.agent(agent).label.as_str();
        let message = state.pending_message.clone();

        tracing::debug!(agent = %label, message = %preview(&message, PREVIEW_CHARS), "sending message");
        transcript.write_exchange(Direction::ToAgent(label), &message)?;
        self.events.emit(ConversationEvent::MessageSent {
            agent,
            label: label.to_string(),
            text: message.clone(),
        });

        let history = state.history_mut(agent);
        history.push_inbound(message.as_str())?;
        let session = sessions.session_mut(agent)?;
        let result = self
            .invoke(&mut **session, &message, history.prior_to_inbound())
            .await?;

        let reply = extract_reply(result)?;
        history.push_reply(reply.as_str())?;
        transcript.write_exchange(Direction::FromAgent(label), &reply)?;

        tracing::info!(agent = %label, reply = %preview(&reply, PREVIEW_CHARS), "received reply");
        self.events.emit(ConversationEvent::ReplyReceived {
            agent,
            label: label.to_string(),
            text: reply.clone(),
        });
        Ok(reply)
    }

    async fn invoke(
        &self,
        session: &mut dyn AgentSession,
        message: &str,
        history: &[Message],
    ) -> Result<ToolCallResult> {
        let call = with_timeout(
            self.config.call_deadline(),
            session.call_tool(&self.config.tool_name, message, history),
        );
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ParleyError::Cancelled),
            result = call => result,
        }
    }

    async fn pause_between_turns(&self) -> Result<()> {
        if self.config.turn_delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ParleyError::Cancelled),
            _ = tokio::time::sleep(self.config.turn_delay) => Ok(()),
        }
    }
}

struct Progress {
    state: ConversationState,
    phases: Vec<DriverPhase>,
    failed_agent: Option<AgentId>,
}

impl Progress {
    fn enter(&mut self, phase: DriverPhase) {
        tracing::debug!(phase = %phase, "driver phase");
        self.phases.push(phase);
    }
}
