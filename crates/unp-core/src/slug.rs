//! Folder-name slugs used as note tags.

/// Turn arbitrary text into a lowercase, hyphenated, tag-safe token.
///
/// Word characters are ASCII letters, digits and `_`. Everything else
/// except whitespace and `-` is dropped, then runs of whitespace, `_` and
/// `-` collapse to a single `-`. Leading and trailing hyphens never
/// survive.
///
/// An empty result means there is nothing to tag with.
///
/// ```
/// assert_eq!(unp_core::slugify("  My Projects!  "), "my-projects");
/// assert_eq!(unp_core::slugify("???"), "");
/// ```
#[must_use]
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for c in lowered.trim_matches(is_space).chars() {
        if is_space(c) || c == '_' || c == '-' {
            pending_separator = true;
        } else if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        }
    }

    slug
}

/// Whitespace as regular expressions in the editor's runtime see it.
///
/// Differs from [`char::is_whitespace`]: U+FEFF counts, U+0085 does not.
fn is_space(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r' | ' '
            | '\u{A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}
