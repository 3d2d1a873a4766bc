//! Line-oriented chat loop on a terminal.
//!
//! Plain lines are sent to the agent as user turns. Lines starting with `/` or `:` are
//! commands. The loop is generic over its reader and writer so it can run on stdin/stdout or
//! on in-memory buffers.

use crate::agent::{Agent, AgentStep};
use crate::model::ModelProvider;
use serde_json::{Map, Value, to_string_pretty};
use thiserror::Error;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
}

struct SessionState {
    session_id: Option<String>,
    last_steps: Vec<AgentStep>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            session_id: None,
            last_steps: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.session_id = None;
        self.last_steps.clear();
    }

    fn update_session(&mut self, session_id: String) -> bool {
        let changed = self
            .session_id
            .as_ref()
            .map(|current| current != &session_id)
            .unwrap_or(true);
        self.session_id = Some(session_id);
        changed
    }

    fn record_steps(&mut self, steps: Vec<AgentStep>) {
        self.last_steps = steps;
    }

    fn clear_steps(&mut self) {
        self.last_steps.clear();
    }

    fn has_steps(&self) -> bool {
        !self.last_steps.is_empty()
    }

    fn steps(&self) -> &[AgentStep] {
        &self.last_steps
    }
}

enum LoopControl {
    Continue,
    Exit,
}

/// Runs the interactive loop on the process's stdin and stdout.
pub async fn run_stdio<P: ModelProvider>(agent: &mut Agent<P>) -> Result<(), StdioError> {
    let stdin = BufReader::new(io::stdin());
    let mut stdout = io::stdout();
    run(agent, stdin, &mut stdout).await
}

/// Runs the interactive loop until `/exit` or end of input.
pub async fn run<P, R, W>(agent: &mut Agent<P>, input: R, output: &mut W) -> Result<(), StdioError>
where
    P: ModelProvider,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut state = SessionState::new();

    print_banner(output, agent).await?;

    loop {
        prompt(output).await?;
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => {
                write_line(output, "\nInput closed. Leaving chat.").await?;
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if matches!(input.chars().next(), Some('/') | Some(':')) {
            match handle_command(input, &mut state, agent, output).await? {
                LoopControl::Continue => continue,
                LoopControl::Exit => break,
            }
        } else {
            handle_prompt(agent, &mut state, input.to_string(), output).await?;
        }
    }

    output.flush().await?;
    Ok(())
}

/// Runs exactly one turn and prints the answer, for prompts given on the command line.
///
/// Returns `false` when the turn failed; the failure has already been printed.
pub async fn run_once<P, W>(
    agent: &mut Agent<P>,
    prompt: String,
    output: &mut W,
) -> Result<bool, StdioError>
where
    P: ModelProvider,
    W: AsyncWrite + Unpin,
{
    info!("Processing one-shot prompt");
    let succeeded = match agent.run_turn(prompt).await {
        Ok(outcome) => {
            write_line(output, &outcome.response).await?;
            true
        }
        Err(err) => {
            error!(%err, "One-shot turn failed");
            write_line(output, &err.user_message()).await?;
            false
        }
    };
    output.flush().await?;
    Ok(succeeded)
}

async fn handle_command<P, W>(
    input: &str,
    state: &mut SessionState,
    agent: &mut Agent<P>,
    output: &mut W,
) -> Result<LoopControl, StdioError>
where
    P: ModelProvider,
    W: AsyncWrite + Unpin,
{
    let command = input.trim_start_matches(['/', ':']);
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or("").to_ascii_lowercase();
    let args: Vec<String> = parts.map(|part| part.to_string()).collect();

    debug!(command = %name, "Processing chat command");

    match name.as_str() {
        "" => Ok(LoopControl::Continue),
        "help" | "?" => {
            print_help(output).await?;
            Ok(LoopControl::Continue)
        }
        "exit" | "quit" | "q" => {
            write_line(output, "Goodbye.").await?;
            Ok(LoopControl::Exit)
        }
        "reset" | "clear" => {
            agent.reset();
            state.reset();
            write_line(output, "Session history cleared. Starting a new session.").await?;
            Ok(LoopControl::Continue)
        }
        "tools" => {
            print_tools(output, agent).await?;
            Ok(LoopControl::Continue)
        }
        "resources" => {
            match agent.bridge().list_resources().await {
                Ok(resources) if resources.is_empty() => {
                    write_line(output, "The server offers no resources.").await?;
                }
                Ok(resources) => {
                    write_line(output, "\nResources:").await?;
                    for resource in resources {
                        let mut line = format!("  - {} ({})", resource.uri, resource.name);
                        if let Some(description) = &resource.description {
                            line.push_str(&format!(" - {description}"));
                        }
                        write_line(output, &line).await?;
                    }
                }
                Err(err) => {
                    error!(%err, "Listing resources failed");
                    write_line(output, &format!("Could not list resources: {err}")).await?;
                }
            }
            Ok(LoopControl::Continue)
        }
        "read" => {
            let Some(uri) = args.first() else {
                write_line(output, "Usage: /read <uri>").await?;
                return Ok(LoopControl::Continue);
            };
            match agent.bridge().read_resource(uri).await {
                Ok(contents) => {
                    for content in contents {
                        write_line(output, &format!("\n--- {} ---", content.uri)).await?;
                        write_line(output, &content.text).await?;
                    }
                }
                Err(err) => {
                    write_line(output, &format!("Could not read '{uri}': {}", err.server_message()))
                        .await?;
                }
            }
            Ok(LoopControl::Continue)
        }
        "prompts" => {
            match agent.bridge().list_prompts().await {
                Ok(prompts) if prompts.is_empty() => {
                    write_line(output, "The server offers no prompts.").await?;
                }
                Ok(prompts) => {
                    write_line(output, "\nPrompts:").await?;
                    for template in prompts {
                        let arguments: Vec<String> = template
                            .arguments
                            .iter()
                            .map(|argument| {
                                if argument.required {
                                    format!("{}*", argument.name)
                                } else {
                                    argument.name.clone()
                                }
                            })
                            .collect();
                        let mut line = format!("  - {} [{}]", template.name, arguments.join(", "));
                        if let Some(description) = &template.description {
                            line.push_str(&format!(" - {description}"));
                        }
                        write_line(output, &line).await?;
                    }
                    write_line(output, "  (* marks a required argument)").await?;
                }
                Err(err) => {
                    error!(%err, "Listing prompts failed");
                    write_line(output, &format!("Could not list prompts: {err}")).await?;
                }
            }
            Ok(LoopControl::Continue)
        }
        "prompt" => {
            let Some((name, rest)) = args.split_first() else {
                write_line(output, "Usage: /prompt <name> [key=value ...]").await?;
                return Ok(LoopControl::Continue);
            };
            let arguments = match parse_prompt_arguments(rest) {
                Ok(arguments) => arguments,
                Err(bad) => {
                    write_line(output, &format!("Expected key=value, got '{bad}'.")).await?;
                    return Ok(LoopControl::Continue);
                }
            };
            let fetched = agent.bridge().get_prompt(name, arguments).await;
            match fetched {
                Ok(rendered) => {
                    write_line(output, &format!("\nPrompt '{name}':")).await?;
                    write_line(output, &rendered.text).await?;
                    handle_prompt(agent, state, rendered.text, output).await?;
                }
                Err(err) => {
                    write_line(output, &format!("Could not get prompt '{name}': {}", err.server_message()))
                        .await?;
                }
            }
            Ok(LoopControl::Continue)
        }
        "steps" | "tool" => {
            if state.has_steps() {
                print_tool_steps(output, state.steps()).await?;
            } else {
                write_line(output, "No tools were run in the last turn.").await?;
            }
            Ok(LoopControl::Continue)
        }
        "history" => {
            let session = agent.session();
            write_line(
                output,
                &format!("Session {}: {} messages", session.id(), session.len()),
            )
            .await?;
            Ok(LoopControl::Continue)
        }
        other => {
            write_line(
                output,
                &format!("Unknown command '{other}'. Use /help to list commands."),
            )
            .await?;
            Ok(LoopControl::Continue)
        }
    }
}

async fn handle_prompt<P, W>(
    agent: &mut Agent<P>,
    state: &mut SessionState,
    message: String,
    output: &mut W,
) -> Result<(), StdioError>
where
    P: ModelProvider,
    W: AsyncWrite + Unpin,
{
    info!("Processing interactive chat turn");
    match agent.run_turn(message).await {
        Ok(outcome) => {
            if state.update_session(outcome.session_id.clone()) {
                write_line(output, &format!("\nSession: {}", outcome.session_id)).await?;
            } else {
                write_line(output, "").await?;
            }
            write_line(output, "Assistant:").await?;
            write_line(output, &outcome.response).await?;
            if outcome.steps.is_empty() {
                state.clear_steps();
            } else {
                write_line(
                    output,
                    &format!("({} tool call(s); /steps shows them.)", outcome.steps.len()),
                )
                .await?;
                state.record_steps(outcome.steps);
            }
        }
        Err(err) => {
            error!(%err, "Chat turn failed");
            write_line(output, "\nThe turn failed:").await?;
            write_line(output, &err.user_message()).await?;
            state.clear_steps();
        }
    }

    output.flush().await?;
    Ok(())
}

/// Parses `key=value` words. A word without `=` continues the previous value, so
/// `city=New York` yields `"New York"`.
fn parse_prompt_arguments(words: &[String]) -> Result<Map<String, Value>, String> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for word in words {
        match word.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                pairs.push((key.to_string(), value.to_string()));
            }
            Some(_) => return Err(word.clone()),
            None => match pairs.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(word);
                }
                None => return Err(word.clone()),
            },
        }
    }
    Ok(pairs
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect())
}

async fn print_tools<P: ModelProvider, W: AsyncWrite + Unpin>(
    output: &mut W,
    agent: &Agent<P>,
) -> io::Result<()> {
    if agent.tools().is_empty() {
        return write_line(output, "The server offers no tools.").await;
    }
    write_line(output, &format!("\nTools from '{}':", agent.bridge().server_name())).await?;
    for tool in agent.tools() {
        let mut parameters: Vec<String> = tool
            .parameters
            .properties
            .keys()
            .map(|name| {
                if tool.parameters.required.contains(name) {
                    format!("{name}*")
                } else {
                    name.clone()
                }
            })
            .collect();
        parameters.sort();
        write_line(
            output,
            &format!("  - {}({}) - {}", tool.name, parameters.join(", "), tool.description),
        )
        .await?;
    }
    Ok(())
}

async fn print_tool_steps<W: AsyncWrite + Unpin>(output: &mut W, steps: &[AgentStep]) -> io::Result<()> {
    write_line(output, "\nTool steps:").await?;
    for (index, step) in steps.iter().enumerate() {
        let status = if step.success { "ok" } else { "failed" };
        write_line(output, &format!("  {}. {} [{}]", index + 1, step.tool, status)).await?;

        if !step.input.is_null() {
            let input = to_string_pretty(&step.input).unwrap_or_else(|_| step.input.to_string());
            for line in input.lines() {
                write_line(output, &format!("     in : {line}")).await?;
            }
        }

        if let Some(message) = &step.message {
            for line in message.lines() {
                write_line(output, &format!("     out: {line}")).await?;
            }
        }
    }
    Ok(())
}

async fn print_banner<P: ModelProvider, W: AsyncWrite + Unpin>(
    output: &mut W,
    agent: &Agent<P>,
) -> io::Result<()> {
    let session = agent.session();
    write_line(
        output,
        &format!(
            "Chatting with {} via '{}' ({} tools from '{}').",
            session.model(),
            session.provider(),
            agent.tools().len(),
            agent.bridge().server_name()
        ),
    )
    .await?;
    write_line(output, "Type a message and press Enter. Use /help for commands.").await
}

async fn print_help<W: AsyncWrite + Unpin>(output: &mut W) -> io::Result<()> {
    write_line(output, "\nCommands:").await?;
    write_line(output, "  /help                      Show this help").await?;
    write_line(output, "  /tools                     List the server's tools").await?;
    write_line(output, "  /resources                 List the server's resources").await?;
    write_line(output, "  /read <uri>                Print a resource").await?;
    write_line(output, "  /prompts                   List the server's prompt templates").await?;
    write_line(
        output,
        "  /prompt <name> [k=v ...]   Render a prompt and send it as your message",
    )
    .await?;
    write_line(output, "  /steps                     Show tool steps of the last turn").await?;
    write_line(output, "  /history                   Show the session's message count").await?;
    write_line(output, "  /reset                     Start a new session").await?;
    write_line(output, "  /exit                      Leave the chat").await?;
    write_line(output, "Lines without a leading / are sent to the model.").await
}

async fn prompt<W: AsyncWrite + Unpin>(output: &mut W) -> io::Result<()> {
    output.write_all(b"you> ").await?;
    output.flush().await
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> io::Result<()> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentOptions;
    use crate::application::dispatcher::Dispatcher;
    use crate::application::registry::{
        DomainError, FnHandler, PromptArgument, PromptArguments, PromptCatalog, PromptTemplate,
        Resource, ResourceCatalog, ToolOutput, ToolRegistry,
    };
    use crate::application::tooling::LocalBridge;
    use crate::domain::schema::{ObjectSchema, PropertySchema, ToolDeclaration};
    use crate::domain::validation::ToolArguments;
    use crate::infrastructure::rpc::{McpHandler, ServerInfo};
    use crate::model::{ModelError, ModelRequest, ModelResponse};
    use crate::types::{MessageRole, ToolCall};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Calls `echo` once for the first message of a turn, then repeats the last user text.
    struct EchoProvider {
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ModelProvider for EchoProvider {
        async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
            let last = request.messages.last().cloned().ok_or_else(|| {
                ModelError::invalid_response("echo", "empty conversation")
            })?;
            match last.role {
                MessageRole::User if last.content.starts_with("use echo") => {
                    let mut arguments = serde_json::Map::new();
                    arguments.insert("text".into(), Value::String("ping".into()));
                    Ok(ModelResponse::with_tool_calls(
                        String::new(),
                        vec![ToolCall::new("call_1", "echo", arguments)],
                        None,
                    ))
                }
                MessageRole::User => {
                    self.seen.lock().await.push(last.content.clone());
                    Ok(ModelResponse::new(format!("you said: {}", last.content), None))
                }
                _ => {
                    let result = last
                        .tool_results
                        .first()
                        .map(|result| result.content.clone())
                        .unwrap_or_default();
                    Ok(ModelResponse::new(format!("tool said: {result}"), None))
                }
            }
        }
    }

    fn echo(arguments: ToolArguments) -> Result<ToolOutput, DomainError> {
        Ok(ToolOutput::text(arguments.str("text").unwrap_or_default()))
    }

    fn shout(arguments: &PromptArguments) -> String {
        format!(
            "Say {} loudly",
            arguments.get("word").map(String::as_str).unwrap_or("nothing")
        )
    }

    async fn agent() -> (Agent<EchoProvider>, Arc<Mutex<Vec<String>>>) {
        let schema = ObjectSchema::new([("text", PropertySchema::string("Text"))], ["text"])
            .expect("schema");
        let tools = ToolRegistry::builder()
            .tool(ToolDeclaration::new("echo", "Echoes text", schema), FnHandler(echo))
            .build()
            .expect("registry");
        let resources = ResourceCatalog::new(vec![Resource::text(
            "notes://hello",
            "Hello",
            "A greeting",
            "Hello from the notes store.",
        )])
        .expect("resources");
        let prompts = PromptCatalog::new(vec![PromptTemplate {
            name: "shout".into(),
            description: "Shouts a word".into(),
            arguments: vec![PromptArgument::required("word", "Word to shout")],
            render: shout,
        }])
        .expect("prompts");
        let handler = McpHandler::new(
            Arc::new(Dispatcher::new(tools, resources, prompts)),
            ServerInfo::new("notes", "0.1.0"),
        );
        let bridge = Arc::new(LocalBridge::new("notes", Arc::new(handler)));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let provider = Arc::new(EchoProvider { seen: seen.clone() });
        let agent = Agent::connect(provider, bridge, AgentOptions::new("echo", "echo-1"))
            .await
            .expect("agent");
        (agent, seen)
    }

    async fn transcript(agent: &mut Agent<EchoProvider>, input: &str) -> String {
        let mut output = Vec::new();
        run(agent, input.as_bytes(), &mut output).await.expect("loop");
        String::from_utf8(output).expect("utf8")
    }

    #[tokio::test]
    async fn plain_lines_become_turns_and_eof_exits() {
        let (mut agent, seen) = agent().await;
        let output = transcript(&mut agent, "hello there\n\n").await;

        assert!(output.contains("you said: hello there"));
        assert!(output.contains("Input closed"));
        assert_eq!(seen.lock().await.as_slice(), ["hello there"]);
        assert_eq!(agent.session().len(), 2);
    }

    #[tokio::test]
    async fn steps_show_the_last_tool_calls() {
        let (mut agent, _) = agent().await;
        let output = transcript(&mut agent, "use echo please\n/steps\n/exit\nnever sent\n").await;

        assert!(output.contains("tool said: ping"));
        assert!(output.contains("1. echo [ok]"));
        assert!(output.contains("Goodbye."));
        assert!(!output.contains("never sent"));
    }

    #[tokio::test]
    async fn catalogue_commands_read_from_the_server() {
        let (mut agent, _) = agent().await;
        let output = transcript(
            &mut agent,
            "/tools\n:resources\n/read notes://hello\n/read notes://missing\n/prompts\n",
        )
        .await;

        assert!(output.contains("echo(text*) - Echoes text"));
        assert!(output.contains("notes://hello (Hello) - A greeting"));
        assert!(output.contains("Hello from the notes store."));
        assert!(output.contains("Could not read 'notes://missing'"));
        assert!(output.contains("shout [word*] - Shouts a word"));
    }

    #[tokio::test]
    async fn prompt_command_sends_the_rendered_text() {
        let (mut agent, seen) = agent().await;
        let output = transcript(&mut agent, "/prompt shout word=hey there\n/prompt shout\n/prompt shout oops\n").await;

        assert!(output.contains("you said: Say hey there loudly"));
        assert!(output.contains("Could not get prompt 'shout'"));
        assert!(output.contains("Expected key=value, got 'oops'."));
        assert_eq!(seen.lock().await.len(), 1);
    }

    #[test]
    fn prompt_argument_values_may_span_words() {
        let words: Vec<String> = ["city=New", "York", "style=very", "short"]
            .into_iter()
            .map(String::from)
            .collect();
        let arguments = parse_prompt_arguments(&words).expect("parsed");
        assert_eq!(arguments["city"], "New York");
        assert_eq!(arguments["style"], "very short");

        assert_eq!(parse_prompt_arguments(&["York".to_string()]), Err("York".to_string()));
        assert_eq!(parse_prompt_arguments(&["=x".to_string()]), Err("=x".to_string()));
    }

    #[tokio::test]
    async fn reset_and_history() {
        let (mut agent, _) = agent().await;
        let output = transcript(&mut agent, "hi\n/history\n/reset\n/history\n/bogus\n").await;

        assert!(output.contains(": 2 messages"));
        assert!(output.contains(": 0 messages"));
        assert!(output.contains("Unknown command 'bogus'"));
        assert!(agent.session().is_empty());
    }

    #[tokio::test]
    async fn one_shot_prints_only_the_answer() {
        let (mut agent, _) = agent().await;
        let mut output = Vec::new();
        let ok = run_once(&mut agent, "just once".into(), &mut output)
            .await
            .expect("io");
        assert!(ok);
        assert_eq!(String::from_utf8(output).expect("utf8"), "you said: just once\n");
    }
}
