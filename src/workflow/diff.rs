//! Unified diff of a planned rewrite
//!
//! Rewrites never add or remove lines, so the diff is a line-by-line
//! comparison grouped into hunks with surrounding context.

use colored::Colorize;

/// Lines of context shown around each change.
pub const CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Header(String),
    Hunk(String),
    Context(String),
    Removed(String),
    Added(String),
}

/// Diff `old` against `new` for display as `path`.
pub fn unified_diff(path: &str, old: &str, new: &str, context: usize) -> Vec<DiffLine> {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();
    let common = old_lines.len().min(new_lines.len());

    let mut changed: Vec<usize> = (0..common)
        .filter(|i| old_lines[*i] != new_lines[*i])
        .collect();
    changed.extend(common..old_lines.len().max(new_lines.len()));
    if changed.is_empty() {
        return Vec::new();
    }

    let mut out = vec![
        DiffLine::Header(format!("--- a/{path}")),
        DiffLine::Header(format!("+++ b/{path}")),
    ];

    // Group changed lines whose context windows touch
    let mut groups: Vec<(usize, usize)> = Vec::new();
    for &idx in &changed {
        match groups.last_mut() {
            Some((_, end)) if idx <= *end + 2 * context + 1 => *end = idx,
            _ => groups.push((idx, idx)),
        }
    }

    let total = old_lines.len().max(new_lines.len());
    for (first, last) in groups {
        let start = first.saturating_sub(context);
        let stop = (last + context + 1).min(total);
        let old_count = (start..stop).filter(|i| *i < old_lines.len()).count();
        let new_count = (start..stop).filter(|i| *i < new_lines.len()).count();
        out.push(DiffLine::Hunk(format!(
            "@@ -{},{old_count} +{},{new_count} @@",
            start + 1,
            start + 1
        )));

        for i in start..stop {
            let before = old_lines.get(i);
            let after = new_lines.get(i);
            match (before, after) {
                (Some(b), Some(a)) if b == a => out.push(DiffLine::Context(b.to_string())),
                _ => {
                    if let Some(b) = before {
                        out.push(DiffLine::Removed(b.to_string()));
                    }
                    if let Some(a) = after {
                        out.push(DiffLine::Added(a.to_string()));
                    }
                }
            }
        }
    }

    out
}

/// Render diff lines with terminal colors.
pub fn render(lines: &[DiffLine]) -> String {
    let mut out = String::new();
    for line in lines {
        let rendered = match line {
            DiffLine::Header(text) => text.bold().to_string(),
            DiffLine::Hunk(text) => text.cyan().to_string(),
            DiffLine::Context(text) => format!(" {text}"),
            DiffLine::Removed(text) => format!("-{text}").red().to_string(),
            DiffLine::Added(text) => format!("+{text}").green().to_string(),
        };
        out.push_str(&rendered);
        out.push('\n');
    }
    out
}
