//! A minimal, arena-backed element tree used by the crate's own tests and
//! as the reference [`Dom`] implementation for embedders getting started.

use std::collections::HashMap;

use super::selector;
use super::Dom;

/// A handle into a [`SimpleDom`]'s arena. Cheap to copy; meaningless outside
/// the `SimpleDom` that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

#[derive(Debug, Clone)]
struct Node {
    tag_name: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// A small, dependency-free element tree.
///
/// Built with [`SimpleDom::builder`]; elements are addressed by the
/// [`ElementId`] returned when they're appended.
#[derive(Debug, Clone, Default)]
pub struct SimpleDom {
    nodes: Vec<Node>,
}

/// Incrementally constructs a [`SimpleDom`].
pub struct DomBuilder {
    dom: SimpleDom,
}

impl SimpleDom {
    pub fn builder() -> DomBuilder {
        DomBuilder {
            dom: SimpleDom { nodes: Vec::new() },
        }
    }

    fn node(&self, element: ElementId) -> &Node {
        &self.nodes[element.0]
    }

    pub fn attr(&self, element: ElementId, name: &str) -> Option<&str> {
        self.node(element)
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn id_attr(&self, element: ElementId) -> Option<&str> {
        self.node(element).id.as_deref()
    }

    pub fn classes(&self, element: ElementId) -> &[String] {
        &self.node(element).classes
    }

    pub fn root(&self) -> Option<ElementId> {
        (!self.nodes.is_empty()).then_some(ElementId(0))
    }

    /// All elements in the tree, in document (pre-) order.
    pub fn all_elements(&self) -> Vec<ElementId> {
        (0..self.nodes.len()).map(ElementId).collect()
    }
}

impl Dom for SimpleDom {
    type Element = ElementId;

    fn query_selector_all(&self, selector_str: &str) -> Vec<ElementId> {
        selector::query_all(self, selector_str).unwrap_or_default()
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.node(element).parent
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.node(element).children.clone()
    }

    fn next_sibling(&self, element: ElementId) -> Option<ElementId> {
        let parent = self.parent(element)?;
        let siblings = &self.node(parent).children;
        let idx = siblings.iter().position(|&e| e == element)?;
        siblings.get(idx + 1).copied()
    }

    fn previous_sibling(&self, element: ElementId) -> Option<ElementId> {
        let parent = self.parent(element)?;
        let siblings = &self.node(parent).children;
        let idx = siblings.iter().position(|&e| e == element)?;
        idx.checked_sub(1).and_then(|i| siblings.get(i).copied())
    }

    fn tag_name(&self, element: ElementId) -> &str {
        &self.node(element).tag_name
    }
}

impl DomBuilder {
    /// Append a new element as a child of `parent` (or as the root, if
    /// `parent` is `None`) and return its id.
    pub fn element(
        &mut self,
        tag_name: &str,
        parent: Option<ElementId>,
        attrs: &[(&str, &str)],
    ) -> ElementId {
        let id = ElementId(self.dom.nodes.len());
        let mut attr_map: HashMap<&str, &str> = HashMap::new();
        for (k, v) in attrs {
            attr_map.insert(k, v);
        }
        let classes = attr_map
            .get("class")
            .map(|c| c.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default();
        let node = Node {
            tag_name: tag_name.to_ascii_lowercase(),
            id: attr_map.get("id").map(|s| (*s).to_owned()),
            classes,
            attrs: attrs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            parent,
            children: Vec::new(),
        };
        self.dom.nodes.push(node);
        if let Some(parent) = parent {
            self.dom.nodes[parent.0].children.push(id);
        }
        id
    }

    /// Convenience for adding a leaf element carrying no attributes.
    pub fn leaf(&mut self, tag_name: &str, parent: Option<ElementId>) -> ElementId {
        self.element(tag_name, parent, &[])
    }

    pub fn build(self) -> SimpleDom {
        self.dom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_small_tree_and_walks_it() {
        let mut b = SimpleDom::builder();
        let body = b.leaf("body", None);
        let div = b.leaf("div", Some(body));
        let a1 = b.leaf("a", Some(div));
        let a2 = b.leaf("a", Some(div));
        let dom = b.build();

        assert_eq!(dom.parent(a1), Some(div));
        assert_eq!(dom.children(div), vec![a1, a2]);
        assert_eq!(dom.next_sibling(a1), Some(a2));
        assert_eq!(dom.previous_sibling(a2), Some(a1));
        assert_eq!(dom.tag_name(div), "div");
        assert_eq!(dom.root(), Some(body));
    }
}
