//! Loads client configuration files from disk and checks credentials.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use toolchat_core::AppConfig;
use toolchat_core::config::ConfigError;

fn write_config(content: &str) -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("client.toml");
    fs::write(&path, content).expect("write config");
    (dir, path)
}

const FULL: &str = r#"
default_provider = "gemini"
model = "gemini-2.0-flash"
system_prompt = "You are a helpful assistant."
max_tool_rounds = 4
request_timeout_secs = 60
tool_timeout_secs = 15

[server]
name = "toy"
command = "$HOME/bin/toolchat-server"
args = ["--quiet"]
env = { RUST_LOG = "warn" }

[[providers]]
id = "gemini"
type = "gemini"
endpoint = "https://generativelanguage.googleapis.com"
api_key = "TOOLCHAT_TEST_KEY_THAT_IS_NEVER_SET"
models = [{ name = "gemini-2.0-flash", display_name = "Gemini Flash" }]

[[providers]]
id = "local"
type = "ollama"
endpoint = "http://127.0.0.1:11434"
models = [{ name = "llama3.2" }]

[[providers]]
id = "path"
type = "openai"
endpoint = "https://api.example.com"
api_key = "PATH"
"#;

#[test]
fn full_config_is_read() {
    let (_dir, path) = write_config(FULL);
    let config = AppConfig::load(Some(&path)).expect("config");

    assert_eq!(config.default_provider, "gemini");
    assert_eq!(config.system_prompt.as_deref(), Some("You are a helpful assistant."));
    assert_eq!(config.max_tool_rounds, 4);
    assert_eq!(config.request_timeout, Some(Duration::from_secs(60)));
    assert_eq!(config.tool_timeout, Some(Duration::from_secs(15)));
    assert_eq!(config.server.name, "toy");
    assert_eq!(config.server.args, ["--quiet"]);
    assert_eq!(config.server.env.get("RUST_LOG").map(String::as_str), Some("warn"));
    assert_eq!(config.providers.len(), 3);
}

#[test]
fn server_command_expands_environment_variables() {
    let (_dir, path) = write_config(FULL);
    let config = AppConfig::load(Some(&path)).expect("config");
    if let Ok(home) = env::var("HOME") {
        assert_eq!(
            config.server.command,
            Path::new(&home).join("bin").join("toolchat-server")
        );
    }
}

#[test]
fn credentials_are_checked_per_provider() {
    let (_dir, path) = write_config(FULL);
    let config = AppConfig::load(Some(&path)).expect("config");

    let err = config.ensure_credentials("gemini").expect_err("unset key");
    assert!(matches!(err, ConfigError::MissingCredential { ref provider, .. } if provider == "gemini"));
    assert!(err.to_string().contains("TOOLCHAT_TEST_KEY_THAT_IS_NEVER_SET"));

    config.ensure_credentials("local").expect("ollama needs no key");
    config.ensure_credentials("path").expect("variable is set");
    assert!(matches!(
        config.ensure_credentials("missing"),
        Err(ConfigError::ProviderNotFound { .. })
    ));
}

#[test]
fn provider_without_endpoint_is_rejected() {
    let content = r#"
default_provider = "p"
model = "m"

[server]
command = "toolchat-server"

[[providers]]
id = "p"
type = "openai"
"#;
    let (_dir, path) = write_config(content);
    let err = AppConfig::load(Some(&path)).expect_err("no endpoint");
    assert!(matches!(err, ConfigError::MissingEndpoint { ref provider } if provider == "p"));
}

#[test]
fn broken_toml_reports_the_path() {
    let (_dir, path) = write_config("model = ");
    let err = AppConfig::load(Some(&path)).expect_err("parse error");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("client.toml"));
}
