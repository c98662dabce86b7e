// ABOUTME: Handlebars helper functions for parameter templates
// ABOUTME: Implements fallbacks, joins, JSON embedding, truncation, timestamps and ids

use chrono::Utc;
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

fn helper_error(message: impl Into<String>) -> RenderError {
    RenderErrorReason::Other(message.into()).into()
}

fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.trim().is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn display(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Timestamp helper - formats current time with optional format string
pub fn timestamp_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let format = h
        .param(0)
        .and_then(|v| v.value().as_str())
        .unwrap_or("%Y-%m-%dT%H:%M:%SZ");

    out.write(&Utc::now().format(format).to_string())?;
    Ok(())
}

/// UUID helper - generates a new UUID v4
pub fn uuid_helper(
    _h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&Uuid::new_v4().to_string())?;
    Ok(())
}

/// Default helper - first parameter that is not null, blank, or an empty list
pub fn default_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    if h.params().is_empty() {
        return Err(helper_error("default helper requires at least one parameter"));
    }

    let chosen = h
        .params()
        .iter()
        .map(|p| p.value())
        .find(|v| !is_blank(v));

    if let Some(value) = chosen {
        out.write(&display(value))?;
    }
    Ok(())
}

/// Upper helper
pub fn upper_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let input = h
        .param(0)
        .map(|v| display(v.value()))
        .ok_or_else(|| helper_error("upper helper requires input parameter"))?;

    out.write(&input.to_uppercase())?;
    Ok(())
}

/// Lower helper
pub fn lower_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let input = h
        .param(0)
        .map(|v| display(v.value()))
        .ok_or_else(|| helper_error("lower helper requires input parameter"))?;

    out.write(&input.to_lowercase())?;
    Ok(())
}

/// Join helper - `{{join results.list_prs.labels ", "}}`
pub fn join_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let items = h
        .param(0)
        .and_then(|v| v.value().as_array())
        .ok_or_else(|| helper_error("join helper requires array parameter"))?;
    let separator = h.param(1).and_then(|v| v.value().as_str()).unwrap_or(",");

    let joined = items.iter().map(display).collect::<Vec<_>>().join(separator);
    out.write(&joined)?;
    Ok(())
}

/// JSON helper - embeds a value as compact JSON text
pub fn json_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = h
        .param(0)
        .map(|v| v.value().clone())
        .unwrap_or(JsonValue::Null);

    let rendered =
        serde_json::to_string(&value).map_err(|e| helper_error(format!("JSON error: {}", e)))?;
    out.write(&rendered)?;
    Ok(())
}

/// Truncate helper - `{{truncate results.process.output 200}}`
pub fn truncate_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let input = h.param(0).map(|v| display(v.value())).unwrap_or_default();
    let limit = h
        .param(1)
        .and_then(|v| v.value().as_u64())
        .ok_or_else(|| helper_error("truncate helper requires a length parameter"))?;

    let truncated: String = input.chars().take(limit as usize).collect();
    out.write(&truncated)?;
    Ok(())
}

/// Register all built-in helpers with a Handlebars instance
pub fn register_helpers(handlebars: &mut Handlebars) {
    handlebars.register_helper("timestamp", Box::new(timestamp_helper));
    handlebars.register_helper("uuid", Box::new(uuid_helper));
    handlebars.register_helper("default", Box::new(default_helper));
    handlebars.register_helper("upper", Box::new(upper_helper));
    handlebars.register_helper("lower", Box::new(lower_helper));
    handlebars.register_helper("join", Box::new(join_helper));
    handlebars.register_helper("json", Box::new(json_helper));
    handlebars.register_helper("truncate", Box::new(truncate_helper));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_handlebars() -> Handlebars<'static> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        register_helpers(&mut handlebars);
        handlebars
    }

    #[test]
    fn test_timestamp_helper() {
        let handlebars = create_test_handlebars();
        let result = handlebars
            .render_template("{{timestamp \"%Y\"}}", &json!({}))
            .unwrap();
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_uuid_helper() {
        let handlebars = create_test_handlebars();
        let result = handlebars.render_template("{{uuid}}", &json!({})).unwrap();
        assert_eq!(result.len(), 36);
    }

    #[test]
    fn test_default_helper() {
        let handlebars = create_test_handlebars();
        let data = json!({ "inputs": { "title": "" }, "results": { "p": { "title": "From LLM" } } });

        let result = handlebars
            .render_template("{{default inputs.title results.p.title}}", &data)
            .unwrap();
        assert_eq!(result, "From LLM");

        let result = handlebars
            .render_template("{{default inputs.missing \"fallback\"}}", &data)
            .unwrap();
        assert_eq!(result, "fallback");
    }

    #[test]
    fn test_case_helpers() {
        let handlebars = create_test_handlebars();
        let upper = handlebars
            .render_template("{{upper \"hello world\"}}", &json!({}))
            .unwrap();
        assert_eq!(upper, "HELLO WORLD");

        let lower = handlebars
            .render_template("{{lower \"HELLO\"}}", &json!({}))
            .unwrap();
        assert_eq!(lower, "hello");
    }

    #[test]
    fn test_join_and_json_helpers() {
        let handlebars = create_test_handlebars();
        let data = json!({ "labels": ["bug", "triage"] });

        let joined = handlebars
            .render_template("{{join labels \", \"}}", &data)
            .unwrap();
        assert_eq!(joined, "bug, triage");

        let embedded = handlebars.render_template("{{json labels}}", &data).unwrap();
        assert_eq!(embedded, r#"["bug","triage"]"#);
    }

    #[test]
    fn test_truncate_helper() {
        let handlebars = create_test_handlebars();
        let result = handlebars
            .render_template("{{truncate \"abcdef\" 3}}", &json!({}))
            .unwrap();
        assert_eq!(result, "abc");
    }
}
