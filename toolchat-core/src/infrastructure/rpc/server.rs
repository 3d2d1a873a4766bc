use super::handler::McpHandler;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to read from client: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write to client: {0}")]
    Write(#[source] std::io::Error),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Serves newline-delimited JSON-RPC until the reader reaches end of input.
///
/// Requests are handled one at a time, in arrival order.
pub async fn serve<R, W>(handler: &McpHandler, reader: R, mut writer: W) -> Result<(), ServeError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.map_err(ServeError::Read)? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some(response) = handler.handle_line(trimmed).await else {
            continue;
        };
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        writer
            .write_all(encoded.as_bytes())
            .await
            .map_err(ServeError::Write)?;
        writer.flush().await.map_err(ServeError::Write)?;
        debug!(id = ?response.id, "Response written");
    }
    info!("Input closed, stopping MCP server");
    Ok(())
}

/// [`serve`] over the process's stdin and stdout.
pub async fn serve_stdio(handler: &McpHandler) -> Result<(), ServeError> {
    serve(handler, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}
