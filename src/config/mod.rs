//! Configuration system (layered: defaults < config file < env < CLI flags).

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bon::Builder;
use serde::Deserialize;

use crate::error::{ParleyError, Result};
use crate::types::AgentId;

pub const DEFAULT_AGENT_A_URL: &str = "http://127.0.0.1:8001/mcp";
pub const DEFAULT_AGENT_B_URL: &str = "http://127.0.0.1:8002/mcp";
pub const DEFAULT_INITIAL_MESSAGE: &str = "Hello, BotB! let's discuss on llm and ai";
pub const DEFAULT_MAX_TURNS: u32 = 500;
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_TOOL_NAME: &str = "chat";
pub const DEFAULT_TRANSCRIPT_PATH: &str = "conversation_log.txt";
pub const DEFAULT_LOG_PATH: &str = "app.log";
pub const CONFIG_FILE_NAME: &str = "parley.toml";

/// Where an agent's MCP server lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEndpoint {
    /// Streamable-HTTP MCP endpoint.
    Http { url: String },
    /// MCP server spawned as a child process speaking over stdio.
    Stdio { command: String, args: Vec<String> },
}

impl AgentEndpoint {
    pub fn http(url: impl Into<String>) -> Self {
        Self::Http { url: url.into() }
    }

    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self::Stdio {
            command: command.into(),
            args,
        }
    }

    fn validate(&self, label: &str) -> Result<()> {
        match self {
            Self::Http { url } => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ParleyError::Configuration(format!(
                        "{label}: endpoint URL must start with http:// or https://, got '{url}'"
                    )));
                }
            }
            Self::Stdio { command, .. } => {
                if command.trim().is_empty() {
                    return Err(ParleyError::Configuration(format!(
                        "{label}: stdio command is empty"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for AgentEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { url } => f.write_str(url),
            Self::Stdio { command, args } if args.is_empty() => write!(f, "stdio:{command}"),
            Self::Stdio { command, args } => write!(f, "stdio:{command} {}", args.join(" ")),
        }
    }
}

/// One conversation participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Name used in the transcript and console (`BotA`, `BotB`).
    pub label: String,
    pub endpoint: AgentEndpoint,
    /// Extra HTTP headers sent with every request (ignored for stdio).
    pub headers: BTreeMap<String, String>,
}

impl AgentConfig {
    pub fn new(label: impl Into<String>, endpoint: AgentEndpoint) -> Self {
        Self {
            label: label.into(),
            endpoint,
            headers: BTreeMap::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn default_a() -> Self {
        Self::new("BotA", AgentEndpoint::http(DEFAULT_AGENT_A_URL))
    }

    pub fn default_b() -> Self {
        Self::new("BotB", AgentEndpoint::http(DEFAULT_AGENT_B_URL))
    }
}

/// Everything the conversation driver needs to run.
///
/// # Example
/// ```
/// use parley::config::{AgentConfig, AgentEndpoint, ConversationConfig};
///
/// let config = ConversationConfig::builder()
///     .agent_b(AgentConfig::new("Critic", AgentEndpoint::http("http://127.0.0.1:9002/mcp")))
///     .initial_message("Review this plan.")
///     .max_turns(3)
///     .build();
/// assert_eq!(config.agent_a.label, "BotA");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ConversationConfig {
    #[builder(default = AgentConfig::default_a())]
    pub agent_a: AgentConfig,
    #[builder(default = AgentConfig::default_b())]
    pub agent_b: AgentConfig,
    /// Seed delivered to agent B on the first turn.
    #[builder(into, default = DEFAULT_INITIAL_MESSAGE.to_string())]
    pub initial_message: String,
    /// Hard upper bound on completed turns.
    #[builder(default = DEFAULT_MAX_TURNS)]
    pub max_turns: u32,
    /// Pause between turns; zero disables it.
    #[builder(default)]
    pub turn_delay: Duration,
    /// Per-invocation deadline; zero waits indefinitely.
    #[builder(default = DEFAULT_CALL_TIMEOUT)]
    pub call_timeout: Duration,
    #[builder(into, default = DEFAULT_TOOL_NAME.to_string())]
    pub tool_name: String,
    #[builder(into, default = PathBuf::from(DEFAULT_TRANSCRIPT_PATH))]
    pub transcript_path: PathBuf,
    #[builder(into, default = PathBuf::from(DEFAULT_LOG_PATH))]
    pub log_path: PathBuf,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConversationConfig {
    /// Load defaults, then the config file, then `PARLEY_*` environment variables.
    ///
    /// `explicit` must exist when given; otherwise `./parley.toml` and the
    /// platform config directory are tried and silently skipped when absent.
    /// Call [`validate`](Self::validate) after applying any further overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();
        if let Some(path) = resolve_config_file(explicit)? {
            tracing::debug!(path = %path.display(), "loading config file");
            config.apply_file(ConfigFile::read(&path)?)?;
        }
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML document and layer it over the defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config = Self::default();
        config.apply_file(ConfigFile::parse(raw)?)?;
        Ok(config)
    }

    /// Apply environment overrides from `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("PARLEY_AGENT_A_URL") {
            self.agent_a.endpoint = AgentEndpoint::http(url);
        }
        if let Some(url) = lookup("PARLEY_AGENT_B_URL") {
            self.agent_b.endpoint = AgentEndpoint::http(url);
        }
        if let Some(label) = lookup("PARLEY_AGENT_A_LABEL") {
            self.agent_a.label = label;
        }
        if let Some(label) = lookup("PARLEY_AGENT_B_LABEL") {
            self.agent_b.label = label;
        }
        if let Some(message) = lookup("PARLEY_INITIAL_MESSAGE") {
            self.initial_message = message;
        }
        if let Some(raw) = lookup("PARLEY_MAX_TURNS") {
            self.max_turns = raw.trim().parse().map_err(|_| {
                ParleyError::Configuration(format!("PARLEY_MAX_TURNS must be an integer, got '{raw}'"))
            })?;
        }
        if let Some(raw) = lookup("PARLEY_TURN_DELAY_SECS") {
            self.turn_delay = parse_seconds("PARLEY_TURN_DELAY_SECS", &raw)?;
        }
        if let Some(raw) = lookup("PARLEY_CALL_TIMEOUT_SECS") {
            self.call_timeout = parse_seconds("PARLEY_CALL_TIMEOUT_SECS", &raw)?;
        }
        if let Some(tool) = lookup("PARLEY_TOOL_NAME") {
            self.tool_name = tool;
        }
        if let Some(path) = lookup("PARLEY_TRANSCRIPT_PATH") {
            self.transcript_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("PARLEY_LOG_PATH") {
            self.log_path = PathBuf::from(path);
        }
        Ok(())
    }

    pub fn agent(&self, id: AgentId) -> &AgentConfig {
        match id {
            AgentId::A => &self.agent_a,
            AgentId::B => &self.agent_b,
        }
    }

    /// Per-call deadline, `None` when disabled.
    pub fn call_deadline(&self) -> Option<Duration> {
        (!self.call_timeout.is_zero()).then_some(self.call_timeout)
    }

    pub fn validate(&self) -> Result<()> {
        for agent in [&self.agent_a, &self.agent_b] {
            if agent.label.trim().is_empty() {
                return Err(ParleyError::Configuration("agent label is empty".into()));
            }
            agent.endpoint.validate(&agent.label)?;
        }
        if self.agent_a.label == self.agent_b.label {
            return Err(ParleyError::Configuration(format!(
                "agent labels must differ, both are '{}'",
                self.agent_a.label
            )));
        }
        if self.max_turns == 0 {
            return Err(ParleyError::Configuration(
                "max_turns must be at least 1".into(),
            ));
        }
        if self.tool_name.trim().is_empty() {
            return Err(ParleyError::Configuration("tool_name is empty".into()));
        }
        Ok(())
    }

    fn apply_file(&mut self, file: ConfigFile) -> Result<()> {
        if let Some(section) = file.agent_a {
            section.apply_to(&mut self.agent_a, "agent_a")?;
        }
        if let Some(section) = file.agent_b {
            section.apply_to(&mut self.agent_b, "agent_b")?;
        }
        if let Some(message) = file.initial_message {
            self.initial_message = message;
        }
        if let Some(max_turns) = file.max_turns {
            self.max_turns = max_turns;
        }
        if let Some(secs) = file.turn_delay_secs {
            self.turn_delay = seconds("turn_delay_secs", secs)?;
        }
        if let Some(secs) = file.call_timeout_secs {
            self.call_timeout = seconds("call_timeout_secs", secs)?;
        }
        if let Some(tool) = file.tool_name {
            self.tool_name = tool;
        }
        if let Some(path) = file.transcript_path {
            self.transcript_path = path;
        }
        if let Some(path) = file.log_path {
            self.log_path = path;
        }
        Ok(())
    }
}

fn resolve_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ParleyError::Configuration(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Ok(Some(local));
    }

    Ok(directories::ProjectDirs::from("", "", "parley")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .filter(|path| path.is_file()))
}

fn parse_seconds(key: &str, raw: &str) -> Result<Duration> {
    let secs: f64 = raw.trim().parse().map_err(|_| {
        ParleyError::Configuration(format!("{key} must be a number of seconds, got '{raw}'"))
    })?;
    seconds(key, secs)
}

fn seconds(key: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        ParleyError::Configuration(format!(
            "{key} must be a non-negative number of seconds, got {secs}"
        ))
    })
}

/// On-disk TOML layout.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    agent_a: Option<AgentSection>,
    agent_b: Option<AgentSection>,
    initial_message: Option<String>,
    max_turns: Option<u32>,
    turn_delay_secs: Option<f64>,
    call_timeout_secs: Option<f64>,
    tool_name: Option<String>,
    transcript_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
}

impl ConfigFile {
    fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw).map_err(|e| match e {
            ParleyError::Configuration(message) => {
                ParleyError::Configuration(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw)
            .map_err(|e| ParleyError::Configuration(format!("invalid config file: {e}")))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AgentSection {
    label: Option<String>,
    url: Option<String>,
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

impl AgentSection {
    fn apply_to(self, agent: &mut AgentConfig, section: &str) -> Result<()> {
        match (self.url, self.command) {
            (Some(_), Some(_)) => {
                return Err(ParleyError::Configuration(format!(
                    "[{section}] sets both url and command; pick one"
                )))
            }
            (Some(url), None) => agent.endpoint = AgentEndpoint::http(url),
            (None, Some(command)) => agent.endpoint = AgentEndpoint::stdio(command, self.args),
            (None, None) => {}
        }
        if let Some(label) = self.label {
            agent.label = label;
        }
        agent.headers.extend(self.headers);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_reference_setup() {
        let config = ConversationConfig::default();
        assert_eq!(config.agent_a.label, "BotA");
        assert_eq!(config.agent_b.endpoint, AgentEndpoint::http(DEFAULT_AGENT_B_URL));
        assert_eq!(config.initial_message, DEFAULT_INITIAL_MESSAGE);
        assert_eq!(config.max_turns, 500);
        assert!(config.turn_delay.is_zero());
        assert_eq!(config.call_deadline(), Some(Duration::from_secs(300)));
        assert_eq!(config.tool_name, "chat");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_fields() {
        let mut config = ConversationConfig::default();
        config
            .apply_env(env(&[
                ("PARLEY_AGENT_A_URL", "http://10.0.0.1:9001/mcp"),
                ("PARLEY_MAX_TURNS", "3"),
                ("PARLEY_TURN_DELAY_SECS", "1.5"),
                ("PARLEY_CALL_TIMEOUT_SECS", "0"),
                ("PARLEY_INITIAL_MESSAGE", "hi"),
            ]))
            .unwrap();

        assert_eq!(
            config.agent_a.endpoint,
            AgentEndpoint::http("http://10.0.0.1:9001/mcp")
        );
        assert_eq!(config.max_turns, 3);
        assert_eq!(config.turn_delay, Duration::from_millis(1500));
        assert_eq!(config.call_deadline(), None);
        assert_eq!(config.initial_message, "hi");
    }

    #[test]
    fn env_rejects_malformed_numbers() {
        let mut config = ConversationConfig::default();
        let err = config
            .apply_env(env(&[("PARLEY_MAX_TURNS", "many")]))
            .unwrap_err();
        assert!(matches!(err, ParleyError::Configuration(m) if m.contains("PARLEY_MAX_TURNS")));

        let err = config
            .apply_env(env(&[("PARLEY_TURN_DELAY_SECS", "-2")]))
            .unwrap_err();
        assert!(matches!(err, ParleyError::Configuration(m) if m.contains("non-negative")));
    }

    #[test]
    fn validate_rejects_zero_turns_and_duplicate_labels() {
        let zero = ConversationConfig::builder().max_turns(0).build();
        assert!(matches!(zero.validate(), Err(ParleyError::Configuration(_))));

        let same = ConversationConfig::builder()
            .agent_b(AgentConfig::new("BotA", AgentEndpoint::http(DEFAULT_AGENT_B_URL)))
            .build();
        assert!(matches!(same.validate(), Err(ParleyError::Configuration(m)) if m.contains("differ")));
    }

    #[test]
    fn validate_rejects_non_http_url_and_empty_command() {
        let ftp = ConversationConfig::builder()
            .agent_a(AgentConfig::new("BotA", AgentEndpoint::http("ftp://host")))
            .build();
        assert!(ftp.validate().is_err());

        let blank = ConversationConfig::builder()
            .agent_b(AgentConfig::new("BotB", AgentEndpoint::stdio(" ", Vec::new())))
            .build();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn endpoint_display_is_readable() {
        assert_eq!(
            AgentEndpoint::stdio("python", vec!["bot_b.py".into()]).to_string(),
            "stdio:python bot_b.py"
        );
        assert_eq!(AgentEndpoint::http("http://x/mcp").to_string(), "http://x/mcp");
    }
}
