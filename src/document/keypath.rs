//! Key-path addressing for values files
//!
//! A key path such as `spec.env[name=JOB_STAGE].value` is resolved in two
//! steps: `serde_yaml` decides which node the path names (turning selectors
//! into concrete indices), then an indentation walk over the raw text finds
//! the line that holds that node so it can be rewritten in place.

use std::fmt;

use serde_yaml::Value;

use super::scalar::parse_line;

/// One step of a key path as written by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
    /// Sequence item whose `key` field equals `value`
    Match { key: String, value: String },
}

/// One step of a resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    raw: String,
    segments: Vec<Segment>,
}

impl KeyPath {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut rest = raw.trim();
        if rest.is_empty() {
            return Err("key path cannot be empty".to_string());
        }

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let close = after
                    .find(']')
                    .ok_or_else(|| format!("unclosed '[' in key path '{raw}'"))?;
                let inner = after[..close].trim();
                let segment = match inner.split_once('=') {
                    Some((key, value)) if !key.trim().is_empty() => Segment::Match {
                        key: key.trim().to_string(),
                        value: value.trim().trim_matches(['"', '\'']).to_string(),
                    },
                    Some(_) => return Err(format!("empty selector key in '{raw}'")),
                    None => Segment::Index(
                        inner
                            .parse()
                            .map_err(|_| format!("invalid index '[{inner}]' in '{raw}'"))?,
                    ),
                };
                segments.push(segment);
                rest = &after[close + 1..];
            } else {
                let end = rest.find(['.', '[']).unwrap_or(rest.len());
                let name = &rest[..end];
                if name.is_empty() {
                    return Err(format!("empty key in key path '{raw}'"));
                }
                segments.push(Segment::Key(name.to_string()));
                rest = &rest[end..];
            }

            if let Some(after) = rest.strip_prefix('.') {
                if after.is_empty() || after.starts_with(['.', '[']) {
                    return Err(format!("empty key in key path '{raw}'"));
                }
                rest = after;
            } else if !rest.is_empty() && !rest.starts_with('[') {
                return Err(format!("unexpected '{rest}' in key path '{raw}'"));
            }
        }

        Ok(Self {
            raw: raw.trim().to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Resolve selectors against a parsed document.
    ///
    /// Returns the concrete steps and the scalar found there, or `None` when
    /// the path does not lead to a scalar.
    pub fn resolve(&self, doc: &Value) -> Option<(Vec<Step>, String)> {
        let mut node = doc;
        let mut steps = Vec::with_capacity(self.segments.len());

        for segment in &self.segments {
            match segment {
                Segment::Key(key) => {
                    node = node.as_mapping()?.get(key.as_str())?;
                    steps.push(Step::Key(key.clone()));
                }
                Segment::Index(idx) => {
                    node = node.as_sequence()?.get(*idx)?;
                    steps.push(Step::Index(*idx));
                }
                Segment::Match { key, value } => {
                    let items = node.as_sequence()?;
                    let idx = items.iter().position(|item| {
                        item.as_mapping()
                            .and_then(|m| m.get(key.as_str()))
                            .and_then(scalar_text)
                            .is_some_and(|found| &found == value)
                    })?;
                    node = &items[idx];
                    steps.push(Step::Index(idx));
                }
            }
        }

        scalar_text(node).map(|text| (steps, text))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Text form of a scalar node; collections and null have none.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

struct Frame {
    column: usize,
    step: Step,
    opens_block: bool,
    next_index: usize,
}

/// Find the 0-based index of the line holding the scalar at `steps`.
///
/// Only block-style YAML is walked; flow collections and multi-line scalars
/// are skipped over and never match.
pub fn locate_line(lines: &[&str], steps: &[Step]) -> Option<usize> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut root_index = 0;
    let mut block_scalar_column: Option<usize> = None;

    for (idx, line) in lines.iter().enumerate() {
        if let Some(column) = block_scalar_column {
            let indent = line.len() - line.trim_start().len();
            if line.trim().is_empty() || indent > column {
                continue;
            }
            block_scalar_column = None;
        }

        let Some(shape) = parse_line(line) else {
            continue;
        };

        if let Some(column) = shape.item_column {
            while let Some(top) = stack.last() {
                let parent_of_compact_seq =
                    top.column == column && matches!(top.step, Step::Key(_)) && top.opens_block;
                if top.column > column || (top.column == column && !parent_of_compact_seq) {
                    stack.pop();
                } else {
                    break;
                }
            }

            let counter = match stack.last_mut() {
                Some(parent) => &mut parent.next_index,
                None => &mut root_index,
            };
            let index = *counter;
            *counter += 1;

            stack.push(Frame {
                column,
                step: Step::Index(index),
                opens_block: shape.key.is_none() && shape.opens_block,
                next_index: 0,
            });
        }

        if let Some((key, column)) = &shape.key {
            while stack.last().is_some_and(|top| top.column >= *column) {
                stack.pop();
            }
            stack.push(Frame {
                column: *column,
                step: Step::Key(key.clone()),
                opens_block: shape.opens_block,
                next_index: 0,
            });
        }

        if shape.block_scalar {
            block_scalar_column = stack.last().map(|top| top.column);
            continue;
        }

        if shape.slot.is_some()
            && stack.len() == steps.len()
            && stack.iter().zip(steps).all(|(frame, step)| &frame.step == step)
        {
            return Some(idx);
        }
    }

    None
}
