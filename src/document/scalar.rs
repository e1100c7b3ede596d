//! Scalar slot parsing for single YAML lines
//!
//! A slot is the value part of a line such as `  name: rules-v3`,
//! `      value: "Prod"  # gate` or `    - "rules-v3"`. Parsing keeps the byte
//! range of the raw scalar so a rewrite can swap the value and leave the
//! indentation, key, quoting and trailing comment untouched.

/// How the scalar is written on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    Double,
    Single,
    Bare,
}

/// Value part of a single YAML line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarSlot {
    /// Unquoted value
    pub value: String,
    pub style: QuoteStyle,
    /// Byte offset of the raw scalar (opening quote included)
    pub start: usize,
    /// Byte offset just past the raw scalar (closing quote included)
    pub end: usize,
}

/// Structural reading of one line: where it sits and what it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineShape {
    /// Column of the `- ` marker when the line opens a sequence item
    pub item_column: Option<usize>,
    /// Mapping key and its column
    pub key: Option<(String, usize)>,
    /// Column where the scalar or key content begins
    pub content_column: usize,
    /// `None` when the value is missing or not a plain one-line scalar
    pub slot: Option<ScalarSlot>,
    /// Nothing follows the key or item marker, so the next deeper lines are its children
    pub opens_block: bool,
    /// Value is a `|` or `>` block scalar; following deeper lines belong to it
    pub block_scalar: bool,
}

/// Returns true for lines that carry no structure (blank, comment, document markers).
pub fn is_ignorable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#') || trimmed == "---" || trimmed == "..."
}

/// Parse the structure of a line.
///
/// Returns `None` only for ignorable lines. Values this parser does not
/// understand (flow collections, anchors, tags, unterminated quotes) leave
/// `slot` empty.
pub fn parse_line(line: &str) -> Option<LineShape> {
    if is_ignorable(line) {
        return None;
    }

    let mut pos = leading_spaces(line, 0);
    let mut item_column = None;

    // `- value` or `- key: value`; a bare `-` opens a nested block
    let rest = &line[pos..];
    if rest == "-" || rest.starts_with("- ") || rest.starts_with("-\t") {
        item_column = Some(pos);
        pos = leading_spaces(line, pos + 1);
    }

    let content_column = pos;
    let (key, value_pos) = match split_key(line, pos) {
        Some((key, after)) => (Some((key, content_column)), after),
        None => (None, pos),
    };

    let value_pos = leading_spaces(line, value_pos);
    let value_text = &line[value_pos..];
    let mut shape = LineShape {
        item_column,
        key,
        content_column,
        slot: None,
        opens_block: false,
        block_scalar: false,
    };

    if value_text.is_empty() || value_text.starts_with('#') {
        shape.opens_block = true;
    } else if value_text.starts_with('|') || value_text.starts_with('>') {
        shape.block_scalar = true;
    } else {
        shape.slot = parse_scalar_at(line, value_pos);
    }

    Some(shape)
}

/// Extract the scalar slot of a line, if it has one.
pub fn parse_slot(line: &str) -> Option<ScalarSlot> {
    parse_line(line).and_then(|shape| shape.slot)
}

/// Replace the slot's value, keeping everything around it.
pub fn rewrite_slot(line: &str, slot: &ScalarSlot, new_value: &str) -> String {
    let rendered = match slot.style {
        QuoteStyle::Double => {
            format!("\"{}\"", new_value.replace('\\', "\\\\").replace('"', "\\\""))
        }
        QuoteStyle::Single => format!("'{}'", new_value.replace('\'', "''")),
        QuoteStyle::Bare => new_value.to_string(),
    };

    let mut out = String::with_capacity(line.len() + rendered.len());
    out.push_str(&line[..slot.start]);
    out.push_str(&rendered);
    out.push_str(&line[slot.end..]);
    out
}

fn leading_spaces(line: &str, from: usize) -> usize {
    from + line[from..].len() - line[from..].trim_start_matches([' ', '\t']).len()
}

/// Split `key: rest` starting at `pos`, returning the key and the offset
/// just past its colon. `None` means the content is a plain scalar.
fn split_key(line: &str, pos: usize) -> Option<(String, usize)> {
    let rest = &line[pos..];

    if rest.starts_with('"') || rest.starts_with('\'') {
        let quoted = scan_scalar(line, pos)?;
        let after = leading_spaces(line, quoted.end);
        let tail = &line[after..];
        if tail == ":" || tail.starts_with(": ") || tail.starts_with(":\t") {
            return Some((quoted.value, after + 1));
        }
        return None;
    }

    if rest.starts_with(['[', '{', '&', '*', '!', '?', '|', '>']) {
        return None;
    }

    let mut search = 0;
    while let Some(idx) = rest[search..].find(':') {
        let colon = search + idx;
        let after = &rest[colon + 1..];
        let before = &rest[..colon];
        if before.contains(" #") {
            break;
        }
        if after.is_empty() || after.starts_with(' ') || after.starts_with('\t') {
            let key = before.trim_end().to_string();
            if key.is_empty() {
                return None;
            }
            return Some((key, pos + colon + 1));
        }
        search = colon + 1;
    }

    None
}

/// Parse a scalar starting at byte offset `pos` of `line`.
fn parse_scalar_at(line: &str, pos: usize) -> Option<ScalarSlot> {
    let slot = scan_scalar(line, pos)?;

    // Only whitespace or a comment may follow a quoted scalar
    let tail = line[slot.end..].trim_start_matches([' ', '\t']);
    if slot.style != QuoteStyle::Bare && !(tail.is_empty() || tail.starts_with('#')) {
        return None;
    }
    Some(slot)
}

/// Scan the scalar span at `pos` without looking at what follows it.
fn scan_scalar(line: &str, pos: usize) -> Option<ScalarSlot> {
    let rest = &line[pos..];
    let first = rest.chars().next()?;

    let (value, style, end) = match first {
        '"' => {
            let mut value = String::new();
            let mut chars = rest.char_indices().skip(1);
            let mut close = None;
            while let Some((i, c)) = chars.next() {
                match c {
                    '\\' => {
                        let (_, escaped) = chars.next()?;
                        match escaped {
                            'n' => value.push('\n'),
                            't' => value.push('\t'),
                            other => value.push(other),
                        }
                    }
                    '"' => {
                        close = Some(i);
                        break;
                    }
                    other => value.push(other),
                }
            }
            (value, QuoteStyle::Double, pos + close? + 1)
        }
        '\'' => {
            let mut value = String::new();
            let bytes = rest.as_bytes();
            let mut i = 1;
            let mut close = None;
            while i < bytes.len() {
                if bytes[i] == b'\'' {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        value.push('\'');
                        i += 2;
                        continue;
                    }
                    close = Some(i);
                    break;
                }
                let c = rest[i..].chars().next()?;
                value.push(c);
                i += c.len_utf8();
            }
            (value, QuoteStyle::Single, pos + close? + 1)
        }
        '[' | '{' | '&' | '*' | '!' | '|' | '>' | '@' | '`' => return None,
        _ => {
            let raw_end = rest.find(" #").or_else(|| rest.find("\t#")).unwrap_or(rest.len());
            let raw = rest[..raw_end].trim_end_matches([' ', '\t']);
            if raw.is_empty() {
                return None;
            }
            (raw.to_string(), QuoteStyle::Bare, pos + raw.len())
        }
    };

    Some(ScalarSlot {
        value,
        style,
        start: pos,
        end,
    })
}
