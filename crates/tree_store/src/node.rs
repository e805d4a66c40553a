use serde_json::Value;

/// Attribute map carried by every node. Values are arbitrary JSON (strings,
/// numbers, nested objects such as a style map).
pub type Attributes = serde_json::Map<String, Value>;

/// Label used when a creation arrives with an empty or unusable label.
pub const DEFAULT_LABEL: &str = "div";

/// One live tree element.
///
/// `label` is fixed at creation. Text and element children are mutually
/// exclusive: setting text discards element children, and text-bearing nodes
/// are not given element children by the store.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub(crate) label: String,
    pub(crate) attributes: Attributes,
    pub(crate) text: String,
    /// `None` means the node hangs off the implicit root.
    pub(crate) parent: Option<String>,
    pub(crate) children: Vec<String>,
}

impl Node {
    pub(crate) fn new(label: String, attributes: Attributes, parent: Option<String>) -> Self {
        Self {
            label,
            attributes,
            // Text starts empty (not absent) so appends are safe from the
            // first chunk.
            text: String::new(),
            parent,
            children: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }
}
