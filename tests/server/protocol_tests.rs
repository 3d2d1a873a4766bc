//! Drives the server's JSON-RPC handler line by line, as a client on stdio would.

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, duplex};
use toolchat_core::rpc::serve;

fn line(value: Value) -> String {
    format!("{value}\n")
}

async fn exchange(input: String) -> Vec<Value> {
    let handler = toolchat_server::build_handler().expect("handler");
    let (mut client, server_side) = duplex(64 * 1024);
    serve(&handler, input.as_bytes(), server_side)
        .await
        .expect("serve completes at end of input");

    let mut output = String::new();
    client.read_to_string(&mut output).await.expect("read");
    output
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}

#[tokio::test]
async fn handshake_then_calls() {
    let input = [
        line(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": {"name": "test", "version": "0"}
        }})),
        line(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
        line(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {
            "name": "calculator",
            "arguments": {"operation": "multiply", "a": 25, "b": 4}
        }})),
        line(json!({"jsonrpc": "2.0", "id": 3, "method": "resources/read", "params": {"uri": "notes://tool-calling"}})),
        line(json!({"jsonrpc": "2.0", "id": 4, "method": "prompts/get", "params": {
            "name": "summarize_note",
            "arguments": {"uri": "notes://welcome"}
        }})),
        line(json!({"jsonrpc": "2.0", "id": 5, "method": "sampling/createMessage"})),
    ]
    .concat();

    let responses = exchange(input).await;
    assert_eq!(responses.len(), 5, "the notification gets no answer");

    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["protocolVersion"], "2025-06-18");
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "toolchat-server");

    assert_eq!(responses[1]["result"]["content"][0]["text"], "100");
    assert_eq!(responses[1]["result"]["isError"], false);

    assert_eq!(responses[2]["result"]["contents"][0]["uri"], "notes://tool-calling");

    let text = responses[3]["result"]["messages"][0]["content"]["text"]
        .as_str()
        .expect("prompt text");
    assert!(text.contains("notes://welcome"));

    assert_eq!(responses[4]["error"]["code"], -32601);
}

#[tokio::test]
async fn garbage_lines_do_not_stop_the_server() {
    let input = [
        "{not json\n".to_string(),
        line(json!({"jsonrpc": "1.0", "id": 7, "method": "ping"})),
        line(json!({"jsonrpc": "2.0", "id": 8, "method": "ping"})),
    ]
    .concat();

    let responses = exchange(input).await;
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert!(responses[0]["id"].is_null());
    assert_eq!(responses[1]["error"]["code"], -32600);
    assert_eq!(responses[2]["result"], json!({}));
}
