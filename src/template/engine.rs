// ABOUTME: Template engine resolving task parameters with Handlebars
// ABOUTME: Substitutes whole-value references as JSON and renders mixed strings as text

use handlebars::Handlebars;
use serde_json::Value as JsonValue;

use super::context::TemplateContext;
use super::error::{Result, TemplateError};
use super::helpers;
use super::references::{lookup_path, single_reference};
use crate::parser::TaskParams;

#[derive(Clone)]
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine").finish()
    }
}

impl TemplateEngine {
    /// Create a new template engine with all built-in helpers
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        // Missing optional inputs render as empty strings
        handlebars.set_strict_mode(false);
        handlebars.set_dev_mode(false);

        // Parameters feed APIs and CLIs, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        helpers::register_helpers(&mut handlebars);

        Self { handlebars }
    }

    /// Render a template string against a JSON context
    pub fn render_template(&self, template: &str, context: &JsonValue) -> Result<String> {
        self.handlebars
            .render_template(template, context)
            .map_err(TemplateError::Render)
    }

    /// Resolve every parameter of a task against the snapshot.
    pub fn resolve_params(&self, params: &TaskParams, context: &TemplateContext) -> Result<TaskParams> {
        let json_context = context.to_json()?;

        params
            .iter()
            .map(|(key, value)| {
                self.resolve_value(value, &json_context)
                    .map(|resolved| (key.clone(), resolved))
            })
            .collect()
    }

    /// Recursively resolve templates in JSON values.
    ///
    /// A string consisting of exactly one `inputs.*`/`results.*` expression is
    /// replaced by the referenced value itself (null when absent), so lists and
    /// objects survive resolution intact. Any other string is rendered as text.
    pub fn resolve_value(&self, value: &JsonValue, context: &JsonValue) -> Result<JsonValue> {
        match value {
            JsonValue::String(s) => {
                if let Some(path) = single_reference(s) {
                    return Ok(lookup_path(context, path).cloned().unwrap_or(JsonValue::Null));
                }
                if !self.has_templates(s) {
                    return Ok(value.clone());
                }
                Ok(JsonValue::String(self.render_template(s, context)?))
            }
            JsonValue::Array(items) => items
                .iter()
                .map(|v| self.resolve_value(v, context))
                .collect::<Result<Vec<_>>>()
                .map(JsonValue::Array),
            JsonValue::Object(map) => {
                let mut resolved = serde_json::Map::new();
                for (key, val) in map {
                    resolved.insert(key.clone(), self.resolve_value(val, context)?);
                }
                Ok(JsonValue::Object(resolved))
            }
            other => Ok(other.clone()),
        }
    }

    /// Validate template syntax without rendering
    pub fn validate_template(&self, template: &str) -> Result<()> {
        handlebars::Template::compile(template)
            .map(|_| ())
            .map_err(|e| TemplateError::Syntax(e.to_string()))
    }

    /// Check if a string contains template expressions
    pub fn has_templates(&self, text: &str) -> bool {
        text.contains("{{") && text.contains("}}")
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}
