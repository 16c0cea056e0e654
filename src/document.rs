//! Owned XML documents for the `document` response type.

use std::fmt;

/// A parsed XML document.
///
/// The tree is copied out of the parser so a `Document` owns its data and
/// can be cloned and held past the body buffer it was decoded from.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

/// An element in a `Document`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

/// A child of an `Element`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// A run of character data.
    Text(String),
}

impl Document {
    /// Parses `text` as XML.
    pub fn parse(text: &str) -> Result<Document, roxmltree::Error> {
        let doc = roxmltree::Document::parse(text)?;
        Ok(Document {
            root: Element::copy(doc.root_element()),
        })
    }

    /// The document element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// All elements with the given local name, in document order,
    /// including the root.
    pub fn elements_by_tag_name(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.root.collect(name, &mut found);
        found
    }

    /// The concatenated text of the whole document.
    pub fn text_content(&self) -> String {
        self.root.text_content()
    }
}

impl Element {
    fn copy(node: roxmltree::Node<'_, '_>) -> Element {
        let children = node
            .children()
            .filter_map(|child| {
                if child.is_element() {
                    Some(Node::Element(Element::copy(child)))
                } else if child.is_text() {
                    child.text().map(|t| Node::Text(t.to_owned()))
                } else {
                    None
                }
            })
            .collect();

        Element {
            name: node.tag_name().name().to_owned(),
            attributes: node
                .attributes()
                .map(|a| (a.name().to_owned(), a.value().to_owned()))
                .collect(),
            children,
        }
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        if self.name == name {
            found.push(self);
        }
        for child in &self.children {
            if let Node::Element(el) = child {
                el.collect(name, found);
            }
        }
    }

    /// The element's local name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value of an attribute, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The element's direct children.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// The concatenated text of this element and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(el) => el.push_text(out),
            }
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_lookup() {
        let doc = Document::parse(
            r#"<feed><entry id="1"><title>One</title></entry><entry id="2"><title>Two</title></entry></feed>"#,
        )
        .unwrap();

        assert_eq!(doc.root().name(), "feed");
        let titles: Vec<_> = doc
            .elements_by_tag_name("title")
            .into_iter()
            .map(Element::text_content)
            .collect();
        assert_eq!(titles, ["One", "Two"]);
        assert_eq!(doc.elements_by_tag_name("entry")[1].attribute("id"), Some("2"));
        assert_eq!(doc.text_content(), "OneTwo");
    }

    #[test]
    fn malformed_is_an_error() {
        assert!(Document::parse("<doc><title>oops</doc>").is_err());
        assert!(Document::parse("").is_err());
    }
}
