//! Tests for configuration loading and layering.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use parley::config::{AgentEndpoint, ConversationConfig};
use parley::error::ParleyError;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 11] = [
    "PARLEY_AGENT_A_URL",
    "PARLEY_AGENT_B_URL",
    "PARLEY_AGENT_A_LABEL",
    "PARLEY_AGENT_B_LABEL",
    "PARLEY_INITIAL_MESSAGE",
    "PARLEY_MAX_TURNS",
    "PARLEY_TURN_DELAY_SECS",
    "PARLEY_CALL_TIMEOUT_SECS",
    "PARLEY_TOOL_NAME",
    "PARLEY_TRANSCRIPT_PATH",
    "PARLEY_LOG_PATH",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    /// Snapshot and clear every `PARLEY_*` variable.
    fn clean() -> Self {
        let saved = CONFIG_ENV_VARS
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        for key in CONFIG_ENV_VARS {
            std::env::remove_var(key);
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn with_clean_env<T>(f: impl FnOnce() -> T) -> T {
    let _lock = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = EnvGuard::clean();
    f()
}

fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parley.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn load_reads_an_explicit_file() {
    let (_dir, path) = write_config(
        r#"
initial_message = "Debate tabs versus spaces."
max_turns = 12
turn_delay_secs = 2
call_timeout_secs = 45.5
transcript_path = "logs/debate.txt"

[agent_a]
label = "Optimist"
url = "http://10.1.0.5:8001/mcp"
headers = { "x-api-key" = "secret" }

[agent_b]
label = "Skeptic"
command = "python"
args = ["bot_b.py", "--stdio"]
"#,
    );

    let config = with_clean_env(|| ConversationConfig::load(Some(path.as_path()))).unwrap();

    assert_eq!(config.agent_a.label, "Optimist");
    assert_eq!(
        config.agent_a.endpoint,
        AgentEndpoint::http("http://10.1.0.5:8001/mcp")
    );
    assert_eq!(config.agent_a.headers.get("x-api-key").map(String::as_str), Some("secret"));
    assert_eq!(config.agent_b.label, "Skeptic");
    assert_eq!(
        config.agent_b.endpoint,
        AgentEndpoint::stdio("python", vec!["bot_b.py".into(), "--stdio".into()])
    );
    assert_eq!(config.initial_message, "Debate tabs versus spaces.");
    assert_eq!(config.max_turns, 12);
    assert_eq!(config.turn_delay, Duration::from_secs(2));
    assert_eq!(config.call_timeout, Duration::from_millis(45_500));
    assert_eq!(config.transcript_path, PathBuf::from("logs/debate.txt"));
    assert_eq!(config.tool_name, "chat");
    assert!(config.validate().is_ok());
}

#[test]
fn environment_overrides_the_file() {
    let (_dir, path) = write_config("max_turns = 3\ntool_name = \"talk\"\n");

    let config = with_clean_env(|| {
        std::env::set_var("PARLEY_MAX_TURNS", "7");
        std::env::set_var("PARLEY_AGENT_B_URL", "http://127.0.0.1:9102/mcp");
        ConversationConfig::load(Some(path.as_path()))
    })
    .unwrap();

    assert_eq!(config.max_turns, 7);
    assert_eq!(config.tool_name, "talk");
    assert_eq!(
        config.agent_b.endpoint,
        AgentEndpoint::http("http://127.0.0.1:9102/mcp")
    );
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.toml");

    let err = with_clean_env(|| ConversationConfig::load(Some(path.as_path()))).unwrap_err();
    assert!(matches!(err, ParleyError::Configuration(m) if m.contains("not found")));
}

#[test]
fn agent_section_cannot_set_both_url_and_command() {
    let err = ConversationConfig::from_toml_str(
        "[agent_a]\nurl = \"http://127.0.0.1:8001/mcp\"\ncommand = \"python\"\n",
    )
    .unwrap_err();
    assert!(matches!(err, ParleyError::Configuration(m) if m.contains("both url and command")));
}

#[test]
fn unknown_keys_are_rejected() {
    let err = ConversationConfig::from_toml_str("max_turn = 3\n").unwrap_err();
    assert!(matches!(err, ParleyError::Configuration(m) if m.contains("max_turn")));
}

#[test]
fn file_error_names_the_file() {
    let (_dir, path) = write_config("max_turns = \"lots\"\n");

    let err = with_clean_env(|| ConversationConfig::load(Some(path.as_path()))).unwrap_err();
    assert!(
        matches!(err, ParleyError::Configuration(ref m) if m.contains("parley.toml")),
        "{err}"
    );
}

#[test]
fn negative_seconds_are_rejected() {
    let err = ConversationConfig::from_toml_str("turn_delay_secs = -1\n").unwrap_err();
    assert!(matches!(err, ParleyError::Configuration(m) if m.contains("turn_delay_secs")));
}
