//! YAML front matter reading and tag merging.
//!
//! Front matter is the `---` delimited YAML block at the very start of a
//! note:
//! ```markdown
//! ---
//! aliases: [idea]
//! tags:
//!   - reading
//! ---
//!
//! Body content here
//! ```
//!
//! Notes without a block are valid; adding a tag to one creates the block.
//! Keys other than `tags` are carried through untouched and keep their
//! order.

use serde_yaml::{Mapping, Value};

use crate::error::FrontmatterError;

const DELIMITER: &str = "---";
const TAGS_KEY: &str = "tags";

/// Split a note into its raw front matter YAML and body.
///
/// Returns `None` when the note has no front matter block. An opening
/// `---` that is never closed is a thematic break, not front matter.
#[must_use]
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let after_open = strip_delimiter_line(content)?;

    // Find the closing --- on a line of its own
    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if strip_delimiter_line(line).is_some() {
            let yaml = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }

    None
}

/// `Some(rest)` if `text` starts with a `---` line, `rest` being everything
/// after that line's terminator.
fn strip_delimiter_line(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(DELIMITER)?;
    let line_end = rest.find('\n').unwrap_or(rest.len());
    if !rest[..line_end].trim().is_empty() {
        return None;
    }
    Some(rest.get(line_end + 1..).unwrap_or(""))
}

/// Parse a note's front matter into an ordered mapping.
///
/// A missing or empty block yields an empty mapping.
///
/// # Errors
///
/// Returns [`FrontmatterError::InvalidYaml`] for unparsable YAML and
/// [`FrontmatterError::NotAMapping`] when the block holds a list or scalar.
pub fn parse_frontmatter(content: &str) -> Result<(Mapping, &str), FrontmatterError> {
    let Some((yaml, body)) = split_frontmatter(content) else {
        return Ok((Mapping::new(), content));
    };
    if yaml.trim().is_empty() {
        return Ok((Mapping::new(), body));
    }

    let value: Value =
        serde_yaml::from_str(yaml).map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;
    let matter = match value {
        Value::Null => Mapping::new(),
        Value::Mapping(map) => map,
        Value::Sequence(_) => return Err(FrontmatterError::NotAMapping("a list")),
        _ => return Err(FrontmatterError::NotAMapping("a scalar")),
    };
    Ok((matter, body))
}

/// Render front matter and body back into note content.
///
/// # Errors
///
/// Returns [`FrontmatterError::Serialization`] if the mapping cannot be
/// written as YAML.
pub fn write_frontmatter(matter: &Mapping, body: &str) -> Result<String, FrontmatterError> {
    let yaml =
        serde_yaml::to_string(matter).map_err(|e| FrontmatterError::Serialization(e.to_string()))?;

    let mut output = String::with_capacity(yaml.len() + body.len() + 8);
    output.push_str("---\n");
    output.push_str(&yaml);
    output.push_str("---\n");
    output.push_str(body);
    Ok(output)
}

/// Tags currently listed in the front matter, in order.
#[must_use]
pub fn tags(matter: &Mapping) -> Vec<String> {
    match matter.get(TAGS_KEY) {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(tag)) => vec![tag.clone()],
        _ => Vec::new(),
    }
}

/// Merge `tag` into the `tags` list with set semantics.
///
/// Existing tags keep their order and repeated entries collapse to their
/// first occurrence. A scalar `tags` value is treated as a one-element
/// list. Returns `true` when `tag` was not already present.
pub fn merge_tag(matter: &mut Mapping, tag: &str) -> bool {
    let existing = match matter.get(TAGS_KEY) {
        Some(Value::Sequence(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    };

    let mut merged: Vec<Value> = Vec::with_capacity(existing.len() + 1);
    for item in existing {
        if !merged.contains(&item) {
            merged.push(item);
        }
    }

    let new_tag = Value::String(tag.to_string());
    let added = !merged.contains(&new_tag);
    if added {
        merged.push(new_tag);
    }

    // Replacing an existing key keeps its position
    matter.insert(Value::String(TAGS_KEY.to_string()), Value::Sequence(merged));
    added
}

/// Add `tag` to a note's front matter, returning the rewritten content.
///
/// Returns `None` when the tag is already present and the note needs no
/// rewrite.
///
/// # Errors
///
/// Returns [`FrontmatterError`] if the existing front matter is malformed.
pub fn add_tag(content: &str, tag: &str) -> Result<Option<String>, FrontmatterError> {
    let (mut matter, body) = parse_frontmatter(content)?;
    if tags(&matter).iter().any(|t| t == tag) {
        return Ok(None);
    }
    merge_tag(&mut matter, tag);
    write_frontmatter(&matter, body).map(Some)
}
