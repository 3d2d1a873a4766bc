//! Application constants
//!
//! Single source of truth for paths and protocol identifiers.

/// Default configuration file path
pub const CONFIG_PATH: &str = "config/client.toml";

/// Default environment file path
pub const ENV_PATH: &str = "config/.env";

/// Default Gemini API path (fallback when not specified in config)
pub const DEFAULT_GEMINI_API_PATH: &str = "v1beta/models";

/// Default OpenAI-compatible chat completions path
pub const DEFAULT_OPENAI_API_PATH: &str = "/v1/chat/completions";

/// MCP protocol revision spoken by both the server and the process client
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Upper bound on tool-result batches sent back to the model per user turn unless configured otherwise
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;
