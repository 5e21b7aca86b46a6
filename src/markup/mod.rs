//! Arena representation of a rich-text reference fragment.
//!
//! Elements live in a flat `Vec` and refer to each other by [`NodeId`].
//! Text follows the element/text/tail model: `text` is the run directly
//! inside an element before its first child, `tail` is the run directly
//! after its closing tag and belongs to the enclosing element.

use crate::error::ParseError;

mod parse;
mod write;

/// Index of an element inside its [`Fragment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub text: String,
    pub tail: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: String, attributes: Vec<Attribute>, parent: Option<NodeId>) -> Self {
        Element {
            tag,
            attributes,
            text: String::new(),
            tail: String::new(),
            parent,
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// The raw `class` attribute, if any.
    pub fn class(&self) -> Option<&str> {
        self.attr("class")
    }

    /// Set `name`, replacing an existing value in place so attribute order is kept.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value.to_string(),
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(idx).value)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A parsed fragment. Always holds exactly one root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    nodes: Vec<Element>,
}

impl Fragment {
    /// Parse a single-root markup fragment.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse::parse(input)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Ids are only handed out by this arena, so indexing cannot go out of bounds
    /// for ids obtained from the same fragment.
    pub fn get(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }

    /// `id` and everything below it, in document order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            fragment: self,
            stack: vec![id],
        }
    }

    /// Own text plus the text and tails of every descendant. The element's own
    /// tail sits outside it and is not part of the result.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let element = self.get(id);
        out.push_str(&element.text);
        for &child in &element.children {
            self.collect_text(child, out);
            out.push_str(&self.get(child).tail);
        }
    }

    pub fn to_markup(&self) -> String {
        write::to_markup(self)
    }

    fn push(&mut self, element: Element) -> NodeId {
        let id = NodeId(self.nodes.len());
        if let Some(parent) = element.parent {
            self.nodes[parent.0].children.push(id);
        }
        self.nodes.push(element);
        id
    }
}

/// Pre-order walk over a subtree.
pub struct Descendants<'a> {
    fragment: &'a Fragment,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.fragment.get(id).children.iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_tail_are_split_between_element_and_parent() {
        let f = Fragment::parse("<p>a<b>b</b>c<i>d<u>e</u>f</i>g</p>").unwrap();
        let root = f.get(f.root());
        assert_eq!(root.tag, "p");
        assert_eq!(root.text, "a");
        let b = f.get(root.children()[0]);
        assert_eq!((b.text.as_str(), b.tail.as_str()), ("b", "c"));
        let i = f.get(root.children()[1]);
        assert_eq!((i.text.as_str(), i.tail.as_str()), ("d", "g"));
        let u = f.get(i.children()[0]);
        assert_eq!((u.text.as_str(), u.tail.as_str()), ("e", "f"));
    }

    #[test]
    fn descendants_are_in_document_order() {
        let f = Fragment::parse("<a><b><c/></b><d/><e><f/></e></a>").unwrap();
        let tags: Vec<&str> = f
            .descendants(f.root())
            .map(|id| f.get(id).tag.as_str())
            .collect();
        assert_eq!(tags, ["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn text_content_excludes_own_tail_only() {
        let f = Fragment::parse("<p><span>x<i>y</i>z</span> after</p>").unwrap();
        let span = f.get(f.root()).children()[0];
        assert_eq!(f.text_content(span), "xyz");
        assert_eq!(f.text_content(f.root()), "xyz after");
    }

    #[test]
    fn set_attr_keeps_position_of_existing_attribute() {
        let mut f = Fragment::parse(r#"<p a="1" b="2"/>"#).unwrap();
        let root = f.root();
        let el = f.get_mut(root);
        el.set_attr("a", "3");
        el.set_attr("c", "4");
        assert_eq!(el.remove_attr("b").as_deref(), Some("2"));
        let names: Vec<_> = el.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
        assert_eq!(el.attr("a"), Some("3"));
    }
}
