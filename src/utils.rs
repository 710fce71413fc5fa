//! Small text and DOM helpers reused across RHS closures (SPEC_FULL.md
//! §10), grounded in the same "plain functions, no framework" style the
//! teacher uses for its own `src/value` scalar helpers.

use crate::dom::Dom;

/// Concatenates the text of `element` and all its descendants, depth-first,
/// skipping no tags (script/style filtering is left to the caller's own
/// selector or predicate — this crate has no notion of which tags are
/// "content" per spec.md's Non-goals around rendering).
pub fn inline_text<D: Dom>(dom: &D, element: D::Element, text_of: impl Fn(D::Element) -> Option<String>) -> String {
    let mut out = String::new();
    collect_text(dom, element, &text_of, &mut out);
    out
}

fn collect_text<D: Dom>(dom: &D, element: D::Element, text_of: &impl Fn(D::Element) -> Option<String>, out: &mut String) {
    if let Some(text) = text_of(element) {
        out.push_str(&text);
    }
    for child in dom.children(element) {
        collect_text(dom, child, text_of, out);
    }
}

/// Collapses runs of ASCII whitespace to a single space and trims the ends,
/// matching the normalization most `dom()` rules want before scoring text.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// The fraction of `text`'s characters that fall within an anchor (`<a>`)
/// element, a common boilerplate-detection signal. `anchor_text_len` must
/// return the combined inline-text length of every `<a>` descendant.
pub fn link_density(total_text_len: usize, anchor_text_len: usize) -> f64 {
    if total_text_len == 0 {
        return 0.0;
    }
    anchor_text_len as f64 / total_text_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_whitespace_normalizes_runs_and_trims() {
        assert_eq!(collapse_whitespace("  hello   world  \n"), "hello world");
        assert_eq!(collapse_whitespace("one"), "one");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn link_density_of_empty_text_is_zero() {
        assert_eq!(link_density(0, 0), 0.0);
    }

    #[test]
    fn link_density_is_the_anchor_fraction() {
        assert!((link_density(100, 25) - 0.25).abs() < f64::EPSILON);
    }
}
