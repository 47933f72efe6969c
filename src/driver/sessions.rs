//! Ownership of the two agent sessions for the lifetime of a run.

use crate::error::{ParleyError, Result};
use crate::mcp::AgentSession;
use crate::types::AgentId;

/// Sessions acquired so far, closed in reverse acquisition order.
///
/// Every session pushed here is closed by [`release_all`](Self::release_all),
/// including when a later acquisition fails.
#[derive(Default)]
pub(crate) struct ReleaseStack {
    entries: Vec<(AgentId, Box<dyn AgentSession>)>,
}

impl ReleaseStack {
    pub(crate) fn push(&mut self, agent: AgentId, session: Box<dyn AgentSession>) {
        self.entries.push((agent, session));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn session_mut(&mut self, agent: AgentId) -> Result<&mut Box<dyn AgentSession>> {
        self.entries
            .iter_mut()
            .find(|(id, _)| *id == agent)
            .map(|(_, session)| session)
            .ok_or_else(|| ParleyError::InvalidState(format!("no open session for agent {agent}")))
    }

    /// Close every held session, newest first.
    ///
    /// Close failures are logged and collected; they never stop the remaining
    /// sessions from being released.
    pub(crate) async fn release_all(&mut self) -> Vec<(AgentId, ParleyError)> {
        let mut failures = Vec::new();
        while let Some((agent, mut session)) = self.entries.pop() {
            match session.close().await {
                Ok(()) => {
                    tracing::debug!(agent = %agent, endpoint = %session.endpoint(), "session released")
                }
                Err(error) => {
                    tracing::warn!(agent = %agent, endpoint = %session.endpoint(), error = %error, "failed to release session");
                    failures.push((agent, error));
                }
            }
        }
        failures
    }
}

impl Drop for ReleaseStack {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            // The rmcp drop guard still cancels the service; this only flags the missed close.
            tracing::warn!(open = self.entries.len(), "release stack dropped with open sessions");
        }
    }
}
