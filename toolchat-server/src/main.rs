use std::process::ExitCode;
use toolchat_core::rpc::serve_stdio;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let handler = match toolchat_server::build_handler() {
        Ok(handler) => handler,
        Err(err) => {
            error!(%err, "Failed to assemble server catalogues");
            return ExitCode::FAILURE;
        }
    };

    info!(
        server = toolchat_server::SERVER_NAME,
        tools = handler.dispatcher().list_tools().len(),
        "Serving MCP over stdio"
    );
    match serve_stdio(&handler).await {
        Ok(()) => {
            info!("Input closed, shutting down");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "Stdio transport failed");
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr; stdout carries protocol messages only.
fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
