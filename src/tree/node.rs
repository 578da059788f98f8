//! Node and attribute storage.
//!
//! Attributes are owned inline by their node, so every attribute operation
//! lives on [`NodeData`]. Operations that touch the parent/child structure
//! need the arena and live on [`Document`](super::Document).

use super::value::{parse_hex, parse_int, NameValue, Value};
use super::NodeId;

/// The category of a node. Fixed when the node is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`, its root.
    Document,
    /// An element, e.g. `<item id="1">text</item>`.
    #[default]
    Element,
    /// A comment, e.g. `<!-- note -->`. The body is the value.
    Comment,
    /// A declaration, e.g. `<?xml version="1.0"?>`. The body is the value.
    Declaration,
}

/// A name/value pair attached to an element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attribute {
    /// The attribute name.
    pub name: String,
    /// The attribute value, with character references already decoded.
    pub value: String,
}

impl Attribute {
    /// Creates an attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl NameValue for Attribute {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn value_mut(&mut self) -> &mut String {
        &mut self.value
    }
}

/// Storage for a single node in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    kind: NodeKind,
    name: String,
    value: String,
    attributes: Vec<Attribute>,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
}

impl NodeData {
    pub(super) fn new(kind: NodeKind, name: String) -> Self {
        Self {
            kind,
            name,
            value: String::new(),
            attributes: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Returns the kind of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the parent, `None` for the document root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns `true` if the node has at least one child.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Returns `true` if the node has neither children nor a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.value.is_empty()
    }

    // --- Attributes ---

    /// Returns the attributes in source/insertion order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Returns the attributes for in-place edits of names and values.
    pub fn attributes_mut(&mut self) -> &mut [Attribute] {
        &mut self.attributes
    }

    /// Returns `true` if the node has at least one attribute.
    #[must_use]
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Returns the first attribute called `name`.
    #[must_use]
    pub fn find_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Returns the first attribute called `name` for editing.
    pub fn find_attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }

    /// Returns the value of the first attribute called `name`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.find_attribute(name).map(|a| a.value.as_str())
    }

    /// Appends an attribute, formatting `value` as text.
    ///
    /// Duplicate names are kept; lookups return the first one.
    ///
    /// # Examples
    ///
    /// ```
    /// use slimxml::Document;
    ///
    /// let mut doc = Document::new();
    /// let item = doc.add_element(doc.root(), "item");
    /// let node = doc.node_mut(item);
    /// node.add_attribute("count", 3);
    /// node.add_attribute("visible", true);
    /// assert_eq!(node.attribute("count"), Some("3"));
    /// assert_eq!(node.attribute("visible"), Some("true"));
    /// ```
    pub fn add_attribute(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Attribute {
        self.push_attribute(Attribute {
            name: name.into(),
            value: value.into().into_text(),
        })
    }

    /// Appends an attribute with an empty name and value.
    pub fn add_empty_attribute(&mut self) -> &mut Attribute {
        self.push_attribute(Attribute::default())
    }

    fn push_attribute(&mut self, attribute: Attribute) -> &mut Attribute {
        self.attributes.push(attribute);
        let last = self.attributes.len() - 1;
        &mut self.attributes[last]
    }

    /// Removes and returns the attribute at `index`, `None` if out of range.
    pub fn remove_attribute(&mut self, index: usize) -> Option<Attribute> {
        (index < self.attributes.len()).then(|| self.attributes.remove(index))
    }

    /// Removes every attribute.
    pub fn clear_attributes(&mut self) {
        self.attributes.clear();
    }

    /// Reads an attribute as the kind of `default`, or returns `default`.
    ///
    /// # Examples
    ///
    /// ```
    /// use slimxml::Document;
    ///
    /// let doc = Document::parse_str(r#"<w width="640" scale="0.5" on="true"/>"#).unwrap();
    /// let w = doc.node(doc.find_child(doc.root(), "w").unwrap());
    /// assert_eq!(w.read_attribute("width", 0).as_int(), 640);
    /// assert_eq!(w.read_attribute("scale", 1.0).as_float(), 0.5);
    /// assert!(w.read_attribute("on", false).as_bool());
    /// assert_eq!(w.read_attribute("height", 480).as_int(), 480);
    /// ```
    pub fn read_attribute(&self, name: &str, default: impl Into<Value>) -> Value {
        let default = default.into();
        match self.find_attribute(name) {
            Some(attribute) => attribute.value_as(default.kind()),
            None => default,
        }
    }

    /// Reads an attribute as hexadecimal, or returns `default`.
    ///
    /// See [`parse_hex`] for the two-attempt letter case rule.
    #[must_use]
    pub fn read_attribute_as_hex(&self, name: &str, default: u64) -> u64 {
        self.find_attribute(name)
            .map_or(default, |a| parse_hex(&a.value))
    }

    /// Returns the index of the attribute's value in `names`.
    ///
    /// Comparison is exact. Returns `default` if the attribute is missing or
    /// matches none of the names.
    ///
    /// # Examples
    ///
    /// ```
    /// use slimxml::Document;
    ///
    /// let doc = Document::parse_str(r#"<job mode="Slow"/>"#).unwrap();
    /// let job = doc.node(doc.find_child(doc.root(), "job").unwrap());
    /// assert_eq!(job.read_attribute_as_enum("mode", &["Fast", "Slow"], 0), 1);
    /// assert_eq!(job.read_attribute_as_enum("speed", &["Fast", "Slow"], 0), 0);
    /// ```
    #[must_use]
    pub fn read_attribute_as_enum(&self, name: &str, names: &[&str], default: usize) -> usize {
        self.find_attribute(name)
            .and_then(|a| names.iter().position(|candidate| *candidate == a.value))
            .unwrap_or(default)
    }

    /// Reads whitespace-separated integers into `out`.
    ///
    /// At most `out.len()` tokens are read; slots without a token are set to
    /// `default`. If the attribute is missing every slot is set to `default`.
    pub fn read_attribute_as_int_array(&self, name: &str, out: &mut [i32], default: i32) {
        let mut tokens = self
            .find_attribute(name)
            .map(|a| a.value.split_whitespace())
            .into_iter()
            .flatten();
        for slot in out.iter_mut() {
            *slot = tokens.next().map_or(default, |token| clamp_i32(parse_int(token)));
        }
    }
}

fn clamp_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

impl NameValue for NodeData {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn value_mut(&mut self) -> &mut String {
        &mut self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_with(attrs: &[(&str, &str)]) -> NodeData {
        let mut node = NodeData::new(NodeKind::Element, "e".to_string());
        for (name, value) in attrs {
            node.add_attribute(*name, *value);
        }
        node
    }

    #[test]
    fn test_new_node_has_empty_name_and_value() {
        let node = NodeData::new(NodeKind::Element, String::new());
        assert_eq!(node.name(), "");
        assert_eq!(node.value(), "");
        assert!(node.is_empty());
        assert!(!node.has_attributes());
    }

    #[test]
    fn test_value_makes_node_non_empty() {
        let mut node = NodeData::new(NodeKind::Element, String::new());
        node.set_value("x");
        assert!(!node.is_empty());
    }

    #[test]
    fn test_typed_node_values() {
        let mut node = NodeData::new(NodeKind::Element, "n".to_string());
        node.set_value(-5);
        assert_eq!(node.int_value(), -5);
        node.set_value(2.5);
        assert!((node.float_value() - 2.5).abs() < f64::EPSILON);
        node.set_hex(0xBEEF);
        assert_eq!(node.value(), "BEEF");
        assert_eq!(node.hex_value(), 0xBEEF);
    }

    #[test]
    fn test_duplicate_attributes_first_wins() {
        let node = element_with(&[("k", "first"), ("k", "second")]);
        assert_eq!(node.attributes().len(), 2);
        assert_eq!(node.attribute("k"), Some("first"));
    }

    #[test]
    fn test_add_typed_attributes() {
        let mut node = element_with(&[]);
        node.add_attribute("b", false);
        node.add_attribute("i", 42_i64);
        node.add_attribute("f", 0.25_f64);
        node.add_attribute("s", String::from("text"));
        let values: Vec<&str> = node.attributes().iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, vec!["false", "42", "0.25", "text"]);
    }

    #[test]
    fn test_add_empty_attribute_then_fill() {
        let mut node = element_with(&[]);
        let attr = node.add_empty_attribute();
        assert_eq!(attr.name(), "");
        attr.set_name("late");
        attr.set_value(7);
        assert_eq!(node.attribute("late"), Some("7"));
    }

    #[test]
    fn test_remove_and_clear_attributes() {
        let mut node = element_with(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let removed = node.remove_attribute(1);
        assert_eq!(removed, Some(Attribute::new("b", "2")));
        assert_eq!(node.attribute("b"), None);
        assert_eq!(node.remove_attribute(10), None);
        node.clear_attributes();
        assert!(!node.has_attributes());
    }

    #[test]
    fn test_read_attribute_defaults_and_permissive_parse() {
        let node = element_with(&[("n", "abc"), ("t", "TRUE"), ("name", "Ada")]);
        assert_eq!(node.read_attribute("n", 9), Value::Int(0));
        assert_eq!(node.read_attribute("missing", 9), Value::Int(9));
        assert_eq!(node.read_attribute("t", false), Value::Bool(true));
        assert_eq!(node.read_attribute("name", "?"), Value::Text("Ada".into()));
    }

    #[test]
    fn test_read_attribute_as_hex() {
        let node = element_with(&[("lower", "ff"), ("upper", "FF"), ("mixed", "Ff")]);
        assert_eq!(node.read_attribute_as_hex("lower", 0), 255);
        assert_eq!(node.read_attribute_as_hex("upper", 0), 255);
        assert_eq!(node.read_attribute_as_hex("mixed", 0), 15);
        assert_eq!(node.read_attribute_as_hex("missing", 7), 7);
    }

    #[test]
    fn test_read_attribute_as_enum_is_exact() {
        let node = element_with(&[("mode", "slow")]);
        assert_eq!(node.read_attribute_as_enum("mode", &["Fast", "Slow"], 5), 5);
        let node = element_with(&[("mode", "Fast")]);
        assert_eq!(node.read_attribute_as_enum("mode", &["Fast", "Slow"], 5), 0);
    }

    #[test]
    fn test_read_attribute_as_int_array() {
        let node = element_with(&[("v", " 1  -2\t3 4")]);
        let mut out = [0; 3];
        node.read_attribute_as_int_array("v", &mut out, -1);
        assert_eq!(out, [1, -2, 3]);

        let mut out = [0; 6];
        node.read_attribute_as_int_array("v", &mut out, -1);
        assert_eq!(out, [1, -2, 3, 4, -1, -1]);

        let mut out = [5; 2];
        node.read_attribute_as_int_array("missing", &mut out, 8);
        assert_eq!(out, [8, 8]);
    }

    #[test]
    fn test_read_attribute_as_int_array_clamps() {
        let node = element_with(&[("v", "99999999999 x")]);
        let mut out = [1; 2];
        node.read_attribute_as_int_array("v", &mut out, 0);
        assert_eq!(out, [i32::MAX, 0]);
    }
}
