//! Message parsing: MIME part-tree walking and payload decoding.

pub mod decode;
pub mod mime;
