//! Prompt templates that steer the model towards the server's tools and notes.

use toolchat_core::registry::{PromptArgument, PromptArguments, PromptCatalog, PromptTemplate, RegistryError};

use crate::tools::{calculator, weather};

pub fn catalog() -> Result<PromptCatalog, RegistryError> {
    PromptCatalog::new(vec![
        PromptTemplate {
            name: "explain_calculation".into(),
            description: "Work out an arithmetic expression step by step".into(),
            arguments: vec![PromptArgument::required(
                "expression",
                "Expression to evaluate, e.g. 25 * 4 + 3",
            )],
            render: explain_calculation,
        },
        PromptTemplate {
            name: "weather_report".into(),
            description: "Write a short weather report for a city".into(),
            arguments: vec![
                PromptArgument::required("city", "City to report on"),
                PromptArgument::optional("style", "Tone of the report, e.g. casual or formal"),
            ],
            render: weather_report,
        },
        PromptTemplate {
            name: "summarize_note".into(),
            description: "Summarize one of the server's notes".into(),
            arguments: vec![PromptArgument::required("uri", "Note URI, e.g. notes://welcome")],
            render: summarize_note,
        },
    ])
}

fn arg<'a>(arguments: &'a PromptArguments, name: &str) -> &'a str {
    arguments.get(name).map(String::as_str).unwrap_or_default()
}

fn explain_calculation(arguments: &PromptArguments) -> String {
    format!(
        "Evaluate the expression `{}`. Break it into single operations and use the `{}` tool \
         for each one, then explain the steps and give the final result.",
        arg(arguments, "expression"),
        calculator::NAME
    )
}

fn weather_report(arguments: &PromptArguments) -> String {
    let style = match arg(arguments, "style") {
        "" => "neutral",
        style => style,
    };
    format!(
        "Use the `{}` tool to look up the weather in {} and write a short report in a {style} \
         tone.",
        weather::NAME,
        arg(arguments, "city")
    )
}

fn summarize_note(arguments: &PromptArguments) -> String {
    format!(
        "Summarize the note at {} in two or three sentences for someone new to the topic.",
        arg(arguments, "uri")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(name: &str, pairs: &[(&str, &str)]) -> String {
        let catalog = catalog().expect("catalog");
        let template = catalog.get(name).expect("template");
        let arguments: PromptArguments = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        (template.render)(&arguments)
    }

    #[test]
    fn weather_style_defaults_to_neutral() {
        let text = render("weather_report", &[("city", "Paris")]);
        assert!(text.contains("weather in Paris"));
        assert!(text.contains("neutral tone"));
        let text = render("weather_report", &[("city", "Paris"), ("style", "pirate")]);
        assert!(text.contains("pirate tone"));
    }

    #[test]
    fn calculation_names_the_tool() {
        let text = render("explain_calculation", &[("expression", "25 * 4")]);
        assert!(text.contains("`25 * 4`"));
        assert!(text.contains("`calculator`"));
    }

    #[test]
    fn every_prompt_declares_a_required_argument() {
        let catalog = catalog().expect("catalog");
        assert!(
            catalog
                .all()
                .iter()
                .all(|template| template.arguments.iter().any(|argument| argument.required))
        );
    }
}
