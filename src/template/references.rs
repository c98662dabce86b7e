// ABOUTME: Template reference scanning and path lookup
// ABOUTME: Finds inputs/results references inside template strings and resolves dotted paths

use serde_json::Value as JsonValue;

pub const INPUTS_ROOT: &str = "inputs";
pub const RESULTS_ROOT: &str = "results";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateReference {
    Input { key: String },
    Result { task_id: String, field: Option<String> },
}

/// Collect every `inputs.*` and `results.*` path used inside `{{ }}` expressions,
/// including helper arguments and block helper conditions.
pub fn extract_references(template: &str) -> Vec<TemplateReference> {
    let mut references = Vec::new();

    for expression in expressions(template) {
        if expression.starts_with('!') {
            continue;
        }

        for token in expression
            .split(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == '=')
            .filter(|t| !t.is_empty())
        {
            if token.starts_with('"') || token.starts_with('\'') {
                continue;
            }
            if let Some(reference) = parse_reference(token) {
                references.push(reference);
            }
        }
    }

    references
}

/// Return the path when the whole string is exactly one `{{inputs.*}}` or
/// `{{results.*}}` expression, so the referenced value can be substituted as-is.
pub fn single_reference(template: &str) -> Option<&str> {
    let trimmed = template.trim();
    if !trimmed.starts_with("{{") || !trimmed.ends_with("}}") || trimmed.starts_with("{{{") {
        return None;
    }

    let inner = trimmed[2..trimmed.len() - 2].trim();
    if inner.is_empty()
        || inner.contains("{{")
        || inner.contains("}}")
        || inner.chars().any(char::is_whitespace)
    {
        return None;
    }

    let is_scoped = [INPUTS_ROOT, RESULTS_ROOT]
        .iter()
        .any(|root| {
            inner
                .strip_prefix(root)
                .is_some_and(|rest| rest.starts_with(['.', '/']))
        });

    is_scoped.then_some(inner)
}

/// Split a handlebars-style path into segments: `results.[mail-list].items.0`
/// becomes `["results", "mail-list", "items", "0"]`. Handlebars accepts `/`
/// as a separator too, so `results/t1/body` splits the same way.
pub fn split_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;

    for ch in path.chars() {
        match ch {
            '[' if !in_brackets => in_brackets = true,
            ']' if in_brackets => in_brackets = false,
            '.' | '/' if !in_brackets => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Walk `path` through objects and arrays.
pub fn lookup_path<'a>(root: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    split_path(path)
        .iter()
        .try_fold(root, |value, segment| match value {
            JsonValue::Object(map) => map.get(segment),
            JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn expressions(template: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            break;
        };

        let expression = after_open[..end]
            .trim_start_matches(['{', '~', '#', '/', '^', '>', '&'])
            .trim_end_matches('~')
            .trim();
        found.push(expression);
        rest = &after_open[end + 2..];
    }

    found
}

fn parse_reference(token: &str) -> Option<TemplateReference> {
    let token = token.strip_prefix("@root.").unwrap_or(token);
    let mut segments = split_path(token).into_iter();

    match segments.next()?.as_str() {
        INPUTS_ROOT => segments.next().map(|key| TemplateReference::Input { key }),
        RESULTS_ROOT => {
            let task_id = segments.next()?;
            let rest: Vec<String> = segments.collect();
            let field = (!rest.is_empty()).then(|| rest.join("."));
            Some(TemplateReference::Result { task_id, field })
        }
        _ => None,
    }
}
