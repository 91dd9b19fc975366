use lopdf::ObjectId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by the parse and extract stages.
///
/// Each variant is fatal to the call that produced it: no partially built
/// document is ever returned alongside an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The bytes are not a parseable PDF (bad header, trailer, xref, object
    /// syntax, page tree, or a dangling reference).
    #[error("malformed PDF structure: {0}")]
    MalformedStructure(String),

    /// Parseable, but uses a feature the document model does not represent.
    #[error("unsupported PDF feature: {0}")]
    UnsupportedVersion(String),

    /// A requested page index is not in `[0, page_count)`.
    #[error("page index {index} is out of range (document has {page_count} pages)")]
    IndexOutOfRange { index: usize, page_count: usize },

    /// A page's object graph references an object the source does not hold.
    #[error("page references missing object {0:?}")]
    ResourceResolution(ObjectId),
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedStructure(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Error::UnsupportedVersion(msg.into())
    }
}
