//! Serialization of element trees back to markup.
//!
//! [`serialize`] and [`serialize_with_options`] return text;
//! [`tostring`] additionally encodes the result when an output encoding is
//! requested.

pub mod xml;

pub use xml::{serialize, serialize_with_options, tostring, SerializeOptions, Serialized, Target};
