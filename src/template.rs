//! `{{key}}` placeholder substitution for the site's HTML pages.
//!
//! A placeholder is `{{` + one or more word characters (`[A-Za-z0-9_]`) +
//! `}}`. Known keys are replaced by their value and unknown keys by the
//! empty string. Anything else that merely looks like a placeholder
//! (`{{ spaced }}`, `{{a-b}}`, a lone `{{`) is left exactly as written.

use std::collections::HashMap;

pub type TemplateData = HashMap<String, String>;

pub fn render_template(template: &str, data: &TemplateData) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let key_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if key_len > 0 && after[key_len..].starts_with("}}") {
            let key = &after[..key_len];
            out.push_str(data.get(key).map(String::as_str).unwrap_or_default());
            rest = &after[key_len + 2..];
        } else {
            out.push('{');
            rest = &rest[start + 1..];
        }
    }
    out.push_str(rest);
    out
}

/// Placeholder keys used in `template`, in order of first appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut keys = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let key_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if key_len > 0 && after[key_len..].starts_with("}}") {
            let key = &after[..key_len];
            if !keys.contains(&key) {
                keys.push(key);
            }
            rest = &after[key_len + 2..];
        } else {
            rest = &rest[start + 1..];
        }
    }
    keys
}
