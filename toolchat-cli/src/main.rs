use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use toolchat_core::agent::{Agent, AgentOptions};
use toolchat_core::config::ConfigError;
use toolchat_core::model::DynamicModelProvider;
use toolchat_core::stdio;
use toolchat_core::tooling::McpProcess;
use toolchat_core::AppConfig;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(
    name = "toolchat",
    version,
    about = "Chat with a function-calling model that uses tools from an MCP server"
)]
struct Cli {
    /// Configuration file path (defaults to config/client.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// System prompt, replacing the one from the configuration
    #[arg(long)]
    system: Option<String>,
    /// Model to use instead of the configured one
    #[arg(long)]
    model: Option<String>,
    /// Provider id to use instead of `default_provider`
    #[arg(long)]
    provider: Option<String>,
    /// Tool rounds allowed per turn; 0 removes the bound
    #[arg(long)]
    max_tool_rounds: Option<usize>,
    /// Run a single turn with this prompt and exit
    prompt: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    debug!(config = ?cli.config, provider = ?cli.provider, model = ?cli.model, "CLI arguments parsed");

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "Configuration rejected");
            eprintln!("Configuration error: {err}");
            std::process::exit(1);
        }
    };

    log_timeouts(&config);

    let provider = Arc::new(DynamicModelProvider::from_configs(
        &config.providers,
        config.request_timeout,
    )?);
    let server = Arc::new(McpProcess::with_timeout(
        config.server.clone(),
        config.tool_timeout,
    ));

    let options = AgentOptions::new(config.default_provider.clone(), config.model.clone())
        .with_system_prompt(cli.system.clone().or(config.system_prompt.clone()))
        .with_max_rounds(cli.max_tool_rounds.unwrap_or(config.max_tool_rounds));

    let mut agent = match Agent::connect(provider, server.clone(), options).await {
        Ok(agent) => agent,
        Err(err) => {
            error!(%err, server = config.server.name.as_str(), "Could not start MCP server");
            eprintln!("{}", err.user_message());
            server.shutdown().await;
            std::process::exit(1);
        }
    };

    let succeeded = if cli.prompt.is_empty() {
        info!("Entering interactive chat");
        stdio::run_stdio(&mut agent).await.map(|()| true)
    } else {
        stdio::run_once(&mut agent, cli.prompt.join(" "), &mut tokio::io::stdout()).await
    };

    server.shutdown().await;
    info!("Client execution finished");
    match succeeded {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(err) => Err(err.into()),
    }
}

/// Loads the file, applies command-line overrides and checks the active provider's key.
fn load_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    if let Some(provider) = &cli.provider {
        config.default_provider = provider.clone();
    }
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    let model = config.model.clone();
    let provider = config
        .providers
        .iter_mut()
        .find(|provider| provider.id == config.default_provider)
        .ok_or_else(|| ConfigError::ProviderNotFound {
            provider: config.default_provider.clone(),
        })?;
    provider.ensure_model(&model);

    config.ensure_credentials(&config.default_provider)?;
    info!(
        provider = config.default_provider.as_str(),
        model = config.model.as_str(),
        server = config.server.name.as_str(),
        "Loaded configuration"
    );
    Ok(config)
}

fn log_timeouts(config: &AppConfig) {
    match config.request_timeout {
        Some(timeout) => info!(secs = timeout.as_secs(), "Model request timeout"),
        None => warn!("No model request timeout configured; requests wait indefinitely"),
    }
    match config.tool_timeout {
        Some(timeout) => info!(secs = timeout.as_secs(), "Tool request timeout"),
        None => warn!("No tool timeout configured; tool calls wait indefinitely"),
    }
}

/// Diagnostics go to stderr so they never mix with the chat transcript.
fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
