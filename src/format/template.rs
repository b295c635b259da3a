use super::display_value;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(\S+?)\s*\}\}").expect("valid template regex"));

/// Substitute `{{ token }}` placeholders from `context`.
///
/// Tokens missing from the context render as an empty string.
pub fn format_simple_template(template: &str, context: &Map<String, Value>) -> String {
    TOKEN_RE
        .replace_all(template, |caps: &regex::Captures| {
            context.get(&caps[1]).map(display_value).unwrap_or_default()
        })
        .into_owned()
}

/// True when `template` references `token` (e.g. `@@x`) in any spacing variant.
pub fn template_uses(template: &str, token: &str) -> bool {
    TOKEN_RE
        .captures_iter(template)
        .any(|caps| &caps[1] == token)
}
