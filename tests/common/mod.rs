//! Shared test helpers: a scripted in-memory agent connector.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use parley::config::{AgentConfig, ConversationConfig};
use parley::error::{ParleyError, Result};
use parley::mcp::{AgentConnector, AgentSession, AgentToolInfo};
use parley::types::{Message, ToolCallResult};

/// What a scripted agent does when called.
pub enum Step {
    Reply(ToolCallResult),
    Fail(ParleyError),
    /// Never answer.
    Hang,
}

impl Step {
    pub fn text(text: &str) -> Self {
        Self::Reply(ToolCallResult::text(text))
    }

    pub fn tool_error(text: &str) -> Self {
        Self::Reply(ToolCallResult::error(text))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub label: String,
    pub tool_name: String,
    pub message: String,
    pub history: Vec<Message>,
}

/// Everything the scripted agents observed, in global order.
#[derive(Debug, Default)]
pub struct Journal {
    pub opened: Vec<String>,
    pub calls: Vec<RecordedCall>,
    pub closed: Vec<String>,
}

impl Journal {
    pub fn calls_to(&self, label: &str) -> Vec<&RecordedCall> {
        self.calls.iter().filter(|call| call.label == label).collect()
    }

    pub fn call_order(&self) -> Vec<(&str, &str)> {
        self.calls
            .iter()
            .map(|call| (call.label.as_str(), call.message.as_str()))
            .collect()
    }
}

/// Connector handing out sessions that follow per-label scripts.
///
/// An agent whose script runs out echoes `"{label} re: {message}"`.
#[derive(Default)]
pub struct ScriptedConnector {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    open_failures: Mutex<HashMap<String, ParleyError>>,
    journal: Arc<Mutex<Journal>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, label: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(label.to_string(), steps.into());
        self
    }

    pub fn fail_open(self, label: &str, error: ParleyError) -> Self {
        self.open_failures
            .lock()
            .unwrap()
            .insert(label.to_string(), error);
        self
    }

    pub fn journal(&self) -> Arc<Mutex<Journal>> {
        Arc::clone(&self.journal)
    }
}

#[async_trait]
impl AgentConnector for ScriptedConnector {
    async fn open(&self, agent: &AgentConfig) -> Result<Box<dyn AgentSession>> {
        if let Some(error) = self.open_failures.lock().unwrap().remove(&agent.label) {
            return Err(error);
        }
        self.journal.lock().unwrap().opened.push(agent.label.clone());
        let steps = self
            .scripts
            .lock()
            .unwrap()
            .remove(&agent.label)
            .unwrap_or_default();
        Ok(Box::new(ScriptedSession {
            label: agent.label.clone(),
            steps,
            journal: Arc::clone(&self.journal),
            closed: false,
        }))
    }
}

struct ScriptedSession {
    label: String,
    steps: VecDeque<Step>,
    journal: Arc<Mutex<Journal>>,
    closed: bool,
}

#[async_trait]
impl AgentSession for ScriptedSession {
    fn endpoint(&self) -> &str {
        "scripted://agent"
    }

    async fn call_tool(
        &mut self,
        tool_name: &str,
        message: &str,
        history: &[Message],
    ) -> Result<ToolCallResult> {
        self.journal.lock().unwrap().calls.push(RecordedCall {
            label: self.label.clone(),
            tool_name: tool_name.to_string(),
            message: message.to_string(),
            history: history.to_vec(),
        });
        match self.steps.pop_front() {
            Some(Step::Reply(result)) => Ok(result),
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Hang) => std::future::pending().await,
            None => Ok(ToolCallResult::text(format!("{} re: {message}", self.label))),
        }
    }

    async fn list_tools(&mut self) -> Result<Vec<AgentToolInfo>> {
        Ok(vec![AgentToolInfo {
            name: "chat".into(),
            description: Some(format!("chat with {}", self.label)),
        }])
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.journal.lock().unwrap().closed.push(self.label.clone());
        }
        Ok(())
    }
}

/// Config writing its transcript under `dir`, seeded with `"seed"`.
pub fn test_config(dir: &Path, max_turns: u32) -> ConversationConfig {
    ConversationConfig::builder()
        .initial_message("seed")
        .max_turns(max_turns)
        .transcript_path(dir.join("conversation_log.txt"))
        .log_path(dir.join("app.log"))
        .build()
}

pub fn read_transcript(dir: &Path) -> String {
    std::fs::read_to_string(dir.join("conversation_log.txt")).unwrap_or_default()
}

/// Transcript lines recording an exchange (`Driver -> X` or `X -> Driver`).
pub fn exchange_lines(transcript: &str) -> Vec<&str> {
    transcript
        .lines()
        .filter(|line| line.starts_with("Driver -> ") || line.contains(" -> Driver: "))
        .collect()
}
