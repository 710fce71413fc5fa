//! A CSS subset sufficient for `Dom(selector)` LHSs: tag names, `#id`,
//! `.class`, simple `[attr=val]` equality, and descendant-combinator chains
//! of those (`div.article p`). Not a general CSS engine — rules needing more
//! expressive selection should use `.when(predicate)` instead.

use std::fmt;

use super::tree::SimpleDom;
use super::Dom;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError(pub String);

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid selector: {}", self.0)
    }
}

impl std::error::Error for SelectorError {}

#[derive(Debug, Clone, Default)]
struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
}

fn parse_simple(segment: &str) -> Result<SimpleSelector, SelectorError> {
    let mut sel = SimpleSelector::default();
    let mut rest = segment;

    // Leading tag name, if any (anything up to the first '#', '.', or '[').
    let tag_end = rest
        .find(['#', '.', '['])
        .unwrap_or(rest.len());
    if tag_end > 0 {
        sel.tag = Some(rest[..tag_end].to_ascii_lowercase());
    }
    rest = &rest[tag_end..];

    while !rest.is_empty() {
        match rest.as_bytes()[0] {
            b'#' => {
                let end = rest[1..].find(['#', '.', '[']).map_or(rest.len(), |i| i + 1);
                sel.id = Some(rest[1..end].to_string());
                rest = &rest[end..];
            }
            b'.' => {
                let end = rest[1..].find(['#', '.', '[']).map_or(rest.len(), |i| i + 1);
                sel.classes.push(rest[1..end].to_string());
                rest = &rest[end..];
            }
            b'[' => {
                let end = rest
                    .find(']')
                    .ok_or_else(|| SelectorError(format!("unterminated '[' in {segment:?}")))?;
                let inner = &rest[1..end];
                let (key, value) = inner
                    .split_once('=')
                    .ok_or_else(|| SelectorError(format!("expected attr=value in {inner:?}")))?;
                let value = value.trim_matches(['"', '\'']);
                sel.attrs.push((key.to_string(), value.to_string()));
                rest = &rest[end + 1..];
            }
            _ => return Err(SelectorError(format!("unexpected character in {segment:?}"))),
        }
    }

    Ok(sel)
}

impl SimpleSelector {
    fn matches(&self, dom: &SimpleDom, element: <SimpleDom as Dom>::Element) -> bool {
        if let Some(tag) = &self.tag {
            if dom.tag_name(element) != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if dom.id_attr(element) != Some(id.as_str()) {
                return false;
            }
        }
        for class in &self.classes {
            if !dom.classes(element).iter().any(|c| c == class) {
                return false;
            }
        }
        for (key, value) in &self.attrs {
            if dom.attr(element, key) != Some(value.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Runs `selector` (a whitespace-separated descendant-combinator chain of
/// simple selectors) against `dom`, returning matches in document order.
pub fn query_all(
    dom: &SimpleDom,
    selector: &str,
) -> Result<Vec<<SimpleDom as Dom>::Element>, SelectorError> {
    let chain = selector
        .split_whitespace()
        .map(parse_simple)
        .collect::<Result<Vec<_>, _>>()?;
    if chain.is_empty() {
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    for element in dom.all_elements() {
        if matches_chain(dom, element, &chain) {
            matches.push(element);
        }
    }
    Ok(matches)
}

/// An element satisfies a descendant chain `[s0, s1, ..., sN]` if it matches
/// `sN` and has some ancestor matching `sN-1`, which has some ancestor
/// matching `sN-2`, and so on.
fn matches_chain(dom: &SimpleDom, element: <SimpleDom as Dom>::Element, chain: &[SimpleSelector]) -> bool {
    let Some((last, rest)) = chain.split_last() else {
        return true;
    };
    if !last.matches(dom, element) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }
    let mut ancestor = dom.parent(element);
    while let Some(current) = ancestor {
        if matches_chain(dom, current, rest) {
            return true;
        }
        ancestor = dom.parent(current);
    }
    false
}
