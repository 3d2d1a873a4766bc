use crate::application::tooling::ServerToolInfo;
use crate::domain::schema::{ObjectSchema, ToolDeclaration};
use crate::model::{FunctionDeclaration, translate};
use tracing::warn;

/// Translates the tools a server advertises into model declarations.
///
/// A tool whose `inputSchema` cannot be read is still offered, with no parameters.
pub fn declarations_from_server(tools: &[ServerToolInfo]) -> Vec<FunctionDeclaration> {
    tools
        .iter()
        .map(|tool| {
            let schema = match &tool.input_schema {
                Some(raw) => ObjectSchema::from_json(raw).unwrap_or_else(|err| {
                    warn!(tool = tool.name.as_str(), %err, "Unreadable input schema, declaring no parameters");
                    ObjectSchema::empty()
                }),
                None => ObjectSchema::empty(),
            };
            let description = tool.description.clone().unwrap_or_default();
            translate(&ToolDeclaration::new(tool.name.clone(), description, schema))
        })
        .collect()
}

/// Joins the configured system prompt with the server's own instructions.
pub fn compose_system_prompt(
    configured: Option<&str>,
    server: &str,
    instructions: Option<&str>,
) -> Option<String> {
    let mut sections = Vec::new();
    if let Some(text) = configured.map(str::trim).filter(|text| !text.is_empty()) {
        sections.push(text.to_string());
    }
    if let Some(text) = instructions.map(str::trim).filter(|text| !text.is_empty()) {
        sections.push(format!("Server '{server}' guidance: {text}"));
    }
    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn broken_schema_falls_back_to_no_parameters() {
        let tools = vec![
            ServerToolInfo {
                name: "ok".into(),
                description: Some("Fine".into()),
                input_schema: Some(json!({
                    "type": "object",
                    "properties": {"x": {"type": "integer"}},
                    "required": ["x"]
                })),
            },
            ServerToolInfo {
                name: "broken".into(),
                description: None,
                input_schema: Some(json!({"type": "object", "required": ["ghost"]})),
            },
        ];
        let declarations = declarations_from_server(&tools);
        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0].parameters.required, vec!["x"]);
        assert!(declarations[1].parameters.is_empty());
        assert_eq!(declarations[1].description, "");
    }

    #[test]
    fn system_prompt_sections_are_optional() {
        assert_eq!(compose_system_prompt(None, "s", None), None);
        assert_eq!(
            compose_system_prompt(Some("Be brief."), "s", Some("Use tools.")).as_deref(),
            Some("Be brief.\n\nServer 's' guidance: Use tools.")
        );
        assert_eq!(
            compose_system_prompt(Some("  "), "s", Some("Use tools.")).as_deref(),
            Some("Server 's' guidance: Use tools.")
        );
    }
}
