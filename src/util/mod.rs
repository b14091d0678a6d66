//! Utility modules.
//!
//! - [`escape`]: entity decoding for the parser and escaping for the serializer.

pub mod escape;
