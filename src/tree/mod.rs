//! Arena-based XML document tree.
//!
//! All nodes live in an arena of slots owned by the [`Document`] and are
//! referenced by [`NodeId`], a slot index paired with the slot's generation.
//! Each node keeps its parent id and an ordered list of child ids; attributes
//! are owned inline by their node.
//!
//! Removing a node vacates the slots of its whole subtree, dropping the
//! names, values and attribute lists immediately. A vacated slot is reused by
//! the next insertion under a new generation, so the arena stays as large as
//! the peak number of live nodes. An id kept past removal never matches the
//! new occupant: [`Document::contains`] returns `false` and
//! [`Document::get`] returns `None` for it.

mod node;
pub mod value;

pub use node::{Attribute, NodeData, NodeKind};
pub use value::{
    format_float, parse_bool, parse_float, parse_hex, parse_int, NameValue, Value, ValueKind,
};

use std::fs;
use std::io::{Read, Write};
use std::num::NonZeroU32;
use std::path::Path;

use crate::encoding::Encode;
use crate::error::{Error, ParseDiagnostic, ParseError};
use crate::parser::{self, ParseOptions};
use crate::serial::{self, SerializeOptions};

/// A typed index into the document's node arena.
///
/// The generation tells a live node apart from an earlier occupant of the
/// same slot. `Option<NodeId>` has the same size as `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: NonZeroU32,
    generation: u32,
}

impl NodeId {
    /// Creates a `NodeId` from an arena index and slot generation.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0 or does not fit in a `u32`.
    #[allow(clippy::expect_used)]
    fn new(index: usize, generation: u32) -> Self {
        let raw = u32::try_from(index).expect("node arena exceeds u32::MAX entries");
        Self {
            index: NonZeroU32::new(raw).expect("NodeId index must be non-zero"),
            generation,
        }
    }

    fn as_index(self) -> usize {
        self.index.get() as usize
    }

    /// Packs the id into a `u64`: generation in the high half, index in the
    /// low half.
    #[must_use]
    pub fn into_raw(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index.get())
    }

    /// Unpacks an id made by [`into_raw`](Self::into_raw), `None` if the
    /// index half is 0.
    #[must_use]
    pub fn from_raw(raw: u64) -> Option<Self> {
        #[allow(clippy::cast_possible_truncation)]
        let (index, generation) = (raw as u32, (raw >> 32) as u32);
        NonZeroU32::new(index).map(|index| Self { index, generation })
    }
}

/// One arena slot. `generation` grows each time the slot is vacated.
#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// An XML document.
///
/// The `Document` owns every node. Navigation goes through `&Document`,
/// structural mutation through `&mut Document`, and name/value/attribute
/// edits through [`Document::node_mut`].
///
/// # Examples
///
/// ```
/// use slimxml::{Document, NameValue};
///
/// let mut doc = Document::new();
/// let config = doc.add_element(doc.root(), "config");
/// let window = doc.add_element(config, "window");
/// doc.node_mut(window).add_attribute("width", 800);
///
/// let xml = slimxml::serial::serialize(&doc);
/// assert_eq!(xml, "<config>\n\t<window width=\"800\"/>\n</config>\n");
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    /// Index 0 is a permanent placeholder so ids can be non-zero.
    nodes: Vec<Slot>,
    /// Vacated slots, reused last-in first-out.
    free: Vec<usize>,
    root: NodeId,
    live: usize,
    /// The encoding the document was last loaded from, if it came from bytes.
    pub source_encode: Option<Encode>,
    /// Problems the parser recovered from during the last load.
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl Document {
    /// Creates an empty document holding only its root node.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(Slot::default());
        nodes.push(Slot {
            generation: 0,
            data: Some(NodeData::new(NodeKind::Document, String::new())),
        });
        Self {
            nodes,
            free: Vec::new(),
            root: NodeId::new(1, 0),
            live: 1,
            source_encode: None,
            diagnostics: Vec::new(),
        }
    }

    /// Parses XML text into a new document.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the text is empty or contains no markup.
    ///
    /// # Examples
    ///
    /// ```
    /// use slimxml::Document;
    ///
    /// let doc = Document::parse_str("<root><child/></root>").unwrap();
    /// assert!(doc.find_child(doc.root(), "root").is_some());
    /// ```
    pub fn parse_str(input: &str) -> Result<Self, ParseError> {
        parser::parse_str(input)
    }

    /// Parses raw bytes into a new document, detecting the encoding.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the decoded text is empty or contains no markup.
    pub fn parse_bytes(input: &[u8]) -> Result<Self, ParseError> {
        parser::parse_bytes_with_options(input, None, &ParseOptions::default())
    }

    /// Replaces the contents of this document with the parsed buffer.
    ///
    /// The encoding is detected from the buffer. On failure the document is
    /// left empty.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the buffer could not be parsed at all.
    pub fn load_from_memory(&mut self, buffer: &[u8]) -> Result<(), ParseError> {
        self.load_with(buffer, None)
    }

    /// Like [`load_from_memory`](Self::load_from_memory) with an explicit
    /// source encoding instead of detection.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the buffer could not be parsed at all.
    pub fn load_from_memory_with_encoding(
        &mut self,
        buffer: &[u8],
        encode: Encode,
    ) -> Result<(), ParseError> {
        self.load_with(buffer, Some(encode))
    }

    fn load_with(&mut self, buffer: &[u8], encode: Option<Encode>) -> Result<(), ParseError> {
        self.clear();
        *self = parser::parse_bytes_with_options(buffer, encode, &ParseOptions::default())?;
        Ok(())
    }

    /// Reads the whole stream and loads it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails and `Error::Parse` if the data
    /// could not be parsed.
    pub fn load_from_reader(&mut self, mut reader: impl Read) -> Result<(), Error> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        self.load_from_memory(&buffer)?;
        Ok(())
    }

    /// Reads a file and loads it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Parse` if
    /// its contents could not be parsed.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let buffer = fs::read(path.as_ref())?;
        log::debug!("read {} bytes from {}", buffer.len(), path.as_ref().display());
        self.load_from_memory(&buffer)?;
        Ok(())
    }

    /// Serializes the document and writes it in the given encoding.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if writing fails.
    pub fn save_to_writer(&self, mut writer: impl Write, encode: Encode) -> Result<(), Error> {
        let bytes = serial::to_bytes(self, encode, &SerializeOptions::default());
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Serializes the document into a file in the given encoding.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>, encode: Encode) -> Result<(), Error> {
        let bytes = serial::to_bytes(self, encode, &SerializeOptions::default());
        log::debug!(
            "writing {} bytes ({encode}) to {}",
            bytes.len(),
            path.as_ref().display()
        );
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Removes every node except the root and resets the root's fields.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // --- Node access ---

    /// Returns the document root node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns `true` if `id` refers to a node that has not been removed.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the node data, `None` if `id` was removed.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes
            .get(id.as_index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_ref())
    }

    /// Returns the node data for editing, `None` if `id` was removed.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes
            .get_mut(id.as_index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_mut())
    }

    /// Returns the node data.
    ///
    /// # Panics
    ///
    /// Panics if `id` was removed or belongs to another document.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn node(&self, id: NodeId) -> &NodeData {
        self.get(id).expect("node was removed from the document")
    }

    /// Returns the node data for editing names, values and attributes.
    ///
    /// # Panics
    ///
    /// Panics if `id` was removed or belongs to another document.
    #[allow(clippy::expect_used)]
    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.get_mut(id).expect("node was removed from the document")
    }

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind()
    }

    /// Returns the name of a node.
    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        self.node(id).name()
    }

    /// Returns the value text of a node.
    #[must_use]
    pub fn value(&self, id: NodeId) -> &str {
        self.node(id).value()
    }

    /// Returns the value of the first attribute called `name` on a node.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).attribute(name)
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns an iterator over the children of a node in insertion order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            inner: self.node(id).children.iter(),
        }
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.first().copied()
    }

    /// Returns the number of children of a node.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.node(id).children.len()
    }

    /// Returns the number of children of a node called `name`.
    #[must_use]
    pub fn child_count_named(&self, id: NodeId, name: &str) -> usize {
        self.find_children(id, name).count()
    }

    /// Returns `true` if the node has at least one child.
    #[must_use]
    pub fn has_children(&self, id: NodeId) -> bool {
        self.node(id).has_children()
    }

    /// Returns `true` if the node has neither children nor a value.
    #[must_use]
    pub fn is_empty(&self, id: NodeId) -> bool {
        self.node(id).is_empty()
    }

    /// Returns the first child called `name`, in insertion order.
    #[must_use]
    pub fn find_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.find_children(id, name).next()
    }

    /// Returns an iterator over the children called `name`.
    pub fn find_children<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .filter(move |&child| self.node(child).name() == name)
    }

    /// Returns an iterator over a node and its ancestors, ending at the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns the number of ancestors between a node and the root.
    ///
    /// The root has depth 0; its children have depth 1.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count() - 1
    }

    /// Returns an iterator over all descendants of a node in document order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.node(id).children.clone();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Returns the number of live nodes, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.live
    }

    // --- Mutation ---

    /// Appends a new child of the given kind and returns its id.
    ///
    /// The node takes a slot vacated by an earlier removal when there is one.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is [`NodeKind::Document`] or `parent` was removed.
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>, kind: NodeKind) -> NodeId {
        assert!(
            kind != NodeKind::Document,
            "a document has exactly one Document node, its root"
        );
        let mut data = NodeData::new(kind, name.into());
        data.parent = Some(parent);
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.nodes[index];
                slot.data = Some(data);
                NodeId::new(index, slot.generation)
            }
            None => {
                let id = NodeId::new(self.nodes.len(), 0);
                self.nodes.push(Slot {
                    generation: 0,
                    data: Some(data),
                });
                id
            }
        };
        self.node_mut(parent).children.push(id);
        self.live += 1;
        id
    }

    /// Appends a new element child and returns its id.
    pub fn add_element(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        self.add_child(parent, name, NodeKind::Element)
    }

    /// Removes `child` from `parent` and frees its subtree.
    ///
    /// Returns `false` and does nothing if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(position) = self
            .get(parent)
            .and_then(|p| p.children.iter().position(|&c| c == child))
        else {
            return false;
        };
        self.node_mut(parent).children.remove(position);
        self.free_subtree(child);
        true
    }

    /// Removes every child of `parent` and frees their subtrees.
    pub fn clear_children(&mut self, parent: NodeId) {
        let children = std::mem::take(&mut self.node_mut(parent).children);
        for child in children {
            self.free_subtree(child);
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let index = current.as_index();
            let Some(slot) = self
                .nodes
                .get_mut(index)
                .filter(|slot| slot.generation == current.generation)
            else {
                continue;
            };
            let Some(data) = slot.data.take() else {
                continue;
            };
            self.live -= 1;
            pending.extend(data.children);
            // A slot whose generation would wrap is retired instead.
            if let Some(next) = slot.generation.checked_add(1) {
                slot.generation = next;
                self.free.push(index);
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    inner: std::slice::Iter<'a, NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().copied()
    }
}

impl ExactSizeIterator for Children<'_> {}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

/// Pre-order iterator over the descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.node(current).children.iter().rev().copied());
        Some(current)
    }
}
