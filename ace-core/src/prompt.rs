//! Prompt template registry backed by Handlebars.
//!
//! Templates use `{{variable}}` placeholders. Rendering is strict (a missing
//! variable is an error) and never HTML-escapes, since the output is sent to a
//! language model rather than a browser.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::PromptError;

/// A named set of compiled prompt templates.
pub struct PromptRegistry {
    handlebars: Handlebars<'static>,
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRegistry {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Compile and register a template under `name`, replacing any previous one.
    pub fn register(&mut self, name: &str, source: &str) -> Result<(), PromptError> {
        self.handlebars
            .register_template_string(name, source)
            .map_err(|e| PromptError::Compile {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        tracing::debug!(template = name, bytes = source.len(), "Registered prompt template");
        Ok(())
    }

    /// Render a registered template with the given context.
    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String, PromptError> {
        self.handlebars
            .render(name, context)
            .map_err(|e| PromptError::Render {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    /// Names of all registered templates, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .handlebars
            .get_templates()
            .keys()
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_without_escaping() {
        let mut registry = PromptRegistry::new();
        registry
            .register("greet", "Claim: {{claim}}\nRespond with { \"final_answer\": \"X or A\" }")
            .unwrap();
        let rendered = registry
            .render("greet", &json!({"claim": "A <widget> & \"gear\""}))
            .unwrap();
        assert_eq!(
            rendered,
            "Claim: A <widget> & \"gear\"\nRespond with { \"final_answer\": \"X or A\" }"
        );
    }

    #[test]
    fn test_missing_variable_is_error() {
        let mut registry = PromptRegistry::new();
        registry.register("t", "{{claim}} vs {{paragraph}}").unwrap();
        let err = registry.render("t", &json!({"claim": "c"})).unwrap_err();
        assert!(matches!(err, PromptError::Render { ref name, .. } if name == "t"));
    }

    #[test]
    fn test_unknown_template_is_error() {
        let registry = PromptRegistry::new();
        assert!(registry.render("missing", &json!({})).is_err());
    }

    #[test]
    fn test_bad_template_fails_to_compile() {
        let mut registry = PromptRegistry::new();
        let err = registry.register("broken", "{{#if x}}unterminated").unwrap_err();
        assert!(matches!(err, PromptError::Compile { .. }));
        assert!(!registry.contains("broken"));
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = PromptRegistry::new();
        registry.register("reflector", "r").unwrap();
        registry.register("curator", "c").unwrap();
        assert_eq!(registry.names(), vec!["curator", "reflector"]);
    }
}
