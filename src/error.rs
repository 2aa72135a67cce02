/// Error types for this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error, from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file ended in the middle of an element or integer.
    #[error("unexpected end of file")]
    Truncated,

    /// A variable-length integer started with a zero marker byte.
    #[error("invalid variable-length integer marker")]
    InvalidVint,

    /// A value does not fit into a variable-length integer of the requested
    /// (or any) width.
    #[error("value too large for a variable-length integer")]
    VintOverflow,

    /// The file does not start with an EBML header.
    #[error("not an EBML file")]
    NotEbml,

    /// The file is EBML but its DocType is neither `matroska` nor `webm`.
    #[error("not a Matroska or WebM file (doctype {0:?})")]
    NotMkv(String),

    /// The element stream violates the format in some way.
    #[error("corrupt element stream: {0}")]
    Corrupt(&'static str),

    /// A write was attempted on a file opened read-only.
    #[error("file is open read-only")]
    ReadOnly,

    /// The file has no Tags element.
    #[error("no Tags element present")]
    NoTags,

    /// No tag with the given name exists at the album level.
    #[error("tag {0:?} not found")]
    TagNotFound(String),

    /// No placement strategy had enough room for the new Tags element.
    #[error("not enough space to place the new Tags element")]
    NoSpace,
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Inside an element stream an EOF always means a truncated file, so reads
/// map [`std::io::ErrorKind::UnexpectedEof`] to [`Error::Truncated`].
pub(crate) fn map_eof(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::Truncated
    } else {
        Error::Io(e)
    }
}
