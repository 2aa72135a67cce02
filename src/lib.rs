#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

/// Error types for this crate.
mod error;
pub use error::{Error, Result};

/// EBML variable-length integers and element IDs.
pub mod vint;

/// Element ID constants for the schema subset this crate touches.
pub mod ids;

/// Buffered, seekable file access.
pub mod tag_file;

/// Stream-oriented element header reading and typed payload decoding.
pub mod header;

/// Element serialization into byte buffers.
pub mod writer;

/// Container structure index: where the top-level elements live.
pub mod index;

/// The tag tree and its on-disk codec.
pub mod tags;

mod planner;
mod seekhead;

mod tagger;
pub use tagger::MatroskaTagger;

/// Library version, from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A prelude for common types.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::tagger::MatroskaTagger;
    pub use crate::tags::{SimpleTag, Tag, TagCollection, TargetType};
    pub use crate::vint::{ElementId, VInt64};
}
