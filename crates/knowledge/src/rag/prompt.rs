//! Grounded prompt rendering.

use handlebars::Handlebars;
use ragdesk_core::{AppError, AppResult};
use serde::Serialize;

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str =
    "Using this data: {{document}}. Respond to this prompt: {{query}}";

const TEMPLATE_NAME: &str = "grounded";

#[derive(Serialize)]
struct PromptVars<'a> {
    document: &'a str,
    source: &'a str,
    query: &'a str,
}

/// Renders the retrieved document and the user's query into one prompt.
///
/// Variables: `document`, `source`, `query`. Output is not HTML-escaped.
pub struct PromptBuilder {
    handlebars: Handlebars<'static>,
}

impl PromptBuilder {
    /// Compile `template`, or [`DEFAULT_TEMPLATE`] when `None`.
    pub fn new(template: Option<&str>) -> AppResult<Self> {
        let handlebars = compile(TEMPLATE_NAME, template.unwrap_or(DEFAULT_TEMPLATE))?;
        Ok(Self { handlebars })
    }

    pub fn render(&self, document: &str, source: &str, query: &str) -> AppResult<String> {
        self.handlebars
            .render(
                TEMPLATE_NAME,
                &PromptVars {
                    document,
                    source,
                    query,
                },
            )
            .map_err(|e| AppError::Other(format!("Failed to render prompt: {}", e)))
    }
}

/// Register `template` under `name` with HTML escaping turned off.
pub(crate) fn compile(name: &str, template: &str) -> AppResult<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
        .register_template_string(name, template)
        .map_err(|e| AppError::Config(format!("Invalid prompt template: {}", e)))?;
    Ok(handlebars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template() {
        let prompt = PromptBuilder::new(None)
            .unwrap()
            .render("The sky is blue.", "sky.txt", "What color is the sky?")
            .unwrap();

        assert_eq!(
            prompt,
            "Using this data: The sky is blue.. Respond to this prompt: What color is the sky?"
        );
    }

    #[test]
    fn test_no_html_escaping() {
        let prompt = PromptBuilder::new(None)
            .unwrap()
            .render("if a < b && c > d", "code.c", "what's \"this\"?")
            .unwrap();

        assert!(prompt.contains("if a < b && c > d"));
        assert!(prompt.contains("what's \"this\"?"));
    }

    #[test]
    fn test_custom_template_with_source() {
        let builder =
            PromptBuilder::new(Some("From {{source}}:\n{{document}}\n\nQ: {{query}}")).unwrap();
        let prompt = builder.render("body", "notes.md", "why?").unwrap();
        assert_eq!(prompt, "From notes.md:\nbody\n\nQ: why?");
    }

    #[test]
    fn test_invalid_template() {
        let result = PromptBuilder::new(Some("{{#if document}}unclosed"));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
