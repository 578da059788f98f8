//! XML serialization.
//!
//! This module writes a `Document` tree back to XML text with escaping and
//! optional indentation, then transcodes it to the requested encoding.

pub mod xml;

pub use xml::{escape, serialize, serialize_with_options, to_bytes, SerializeOptions};
