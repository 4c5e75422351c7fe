//! Human-readable rendering of step names and arguments.

use serde_json::Value;

use crate::value::{MASK_TEXT, StepArg};

/// Turn a camelCase command name into space-separated words.
///
/// Inserts a space before every uppercase letter, turns underscores into
/// spaces, and lower-cases the first character and each character following a
/// space. `"fillField"` → `"fill field"`, `"click"` → `"click"`.
pub fn humanize(name: &str) -> String {
    let mut spaced = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_uppercase() {
            spaced.push(' ');
            spaced.push(ch);
        } else if ch == '_' {
            spaced.push(' ');
        } else {
            spaced.push(ch);
        }
    }

    let mut out = String::with_capacity(spaced.len());
    let mut lower_next = true;
    for ch in spaced.chars() {
        if ch == ' ' {
            out.push(ch);
            lower_next = true;
        } else if lower_next {
            out.extend(ch.to_lowercase());
            lower_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Render an argument list as a comma-joined display string.
pub fn humanize_args(args: &[StepArg]) -> String {
    args.iter()
        .map(humanize_arg)
        .collect::<Vec<_>>()
        .join(", ")
}

fn humanize_arg(arg: &StepArg) -> String {
    match arg {
        StepArg::Secret(_) => MASK_TEXT.to_string(),
        StepArg::Undefined => "undefined".to_string(),
        StepArg::Function(source) => source.clone(),
        StepArg::Rendered(text) => text.clone(),
        StepArg::Json(value) => humanize_json(value),
    }
}

fn humanize_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(false) => String::new(),
        Value::Bool(true) => "true".to_string(),
        Value::Number(number) => {
            if number.as_f64() == Some(0.0) {
                String::new()
            } else {
                number.to_string()
            }
        }
        Value::String(text) => {
            if text.is_empty() {
                String::new()
            } else {
                format!("\"{text}\"")
            }
        }
        Value::Array(items) => match serde_json::to_string(value) {
            Ok(rendered) => rendered,
            // Best-effort bracketed join when structured serialization fails.
            Err(_) => format!(
                "[{}]",
                items.iter().map(humanize_json).collect::<Vec<_>>().join(",")
            ),
        },
        Value::Object(_) => {
            serde_json::to_string(value).unwrap_or_else(|_| "[object]".to_string())
        }
    }
}
