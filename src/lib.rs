//! # slimxml
//!
//! A small in-memory XML document model with a tolerant single-pass parser
//! and an encoding-aware serializer. Documents are read from ANSI
//! (Windows-1252), UTF-8 or UTF-16 buffers, detected from the byte order mark
//! or the content, and written back in any of them.
//!
//! Parsing never aborts on malformed markup: problems are recovered from and
//! collected in [`Document::diagnostics`].
//!
//! ## Quick Start
//!
//! ```
//! use slimxml::{Document, Encode, NameValue};
//!
//! let mut doc = Document::parse_str(r#"<config><window width="800"/></config>"#).unwrap();
//! let config = doc.find_child(doc.root(), "config").unwrap();
//! let window = doc.find_child(config, "window").unwrap();
//! assert_eq!(doc.node(window).read_attribute("width", 0).as_int(), 800);
//!
//! let title = doc.add_element(window, "title");
//! doc.node_mut(title).set_value("Hello");
//!
//! let bytes = slimxml::serial::to_bytes(&doc, Encode::Utf16, &Default::default());
//! let mut again = Document::new();
//! again.load_from_memory(&bytes).unwrap();
//! assert_eq!(again.source_encode, Some(Encode::Utf16));
//! ```

pub mod encoding;
pub mod error;
pub mod parser;
pub mod serial;
pub mod tree;

// Re-export primary types at the crate root for convenience.
pub use encoding::Encode;
pub use error::{Error, ParseError};
pub use tree::{Attribute, Document, NameValue, NodeId, NodeKind, Value};
