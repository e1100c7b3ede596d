//! `{name}` placeholder templates for paths, branch names and commit messages.

use regex::Regex;
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid regex pattern"))
}

/// Placeholder names used by a template, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    placeholder_re()
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Fail if the template uses a placeholder outside `allowed`.
pub fn check(template: &str, allowed: &[&str]) -> Result<(), String> {
    match placeholders(template)
        .into_iter()
        .find(|name| !allowed.contains(&name.as_str()))
    {
        Some(name) => Err(format!(
            "unknown placeholder {{{name}}} (allowed: {})",
            allowed
                .iter()
                .map(|a| format!("{{{a}}}"))
                .collect::<Vec<_>>()
                .join(", ")
        )),
        None => Ok(()),
    }
}

/// Substitute placeholders; unknown ones are left as written.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    placeholder_re()
        .replace_all(template, |caps: &regex::Captures| {
            let name = &caps[1];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
