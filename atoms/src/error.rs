use thiserror::Error;

/// Failures of the optimize-and-upload pipeline.
///
/// Every variant is terminal for the single file it happened on; nothing in
/// this crate retries.
#[derive(Error, Debug)]
pub enum MediaError {
    /// The source bytes are not a decodable raster image
    #[error("Could not read image: {0}")]
    Decode(String),

    /// Re-encoding the resized bitmap failed
    #[error("Could not encode image: {0}")]
    Encode(String),

    /// Constraints could not be resolved into a usable set
    #[error("Invalid image options: {0}")]
    InvalidOptions(String),

    /// Opaque failure reported by the object storage collaborator
    #[error("Upload failed: {0}")]
    Upload(String),

    /// The caller asked for the result to be discarded
    #[error("Upload cancelled")]
    Cancelled,

    /// The blocking worker running the codec panicked or was aborted
    #[error("Image task failed: {0}")]
    Task(String),
}

impl MediaError {
    pub fn decode<T: Into<String>>(msg: T) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode<T: Into<String>>(msg: T) -> Self {
        Self::Encode(msg.into())
    }

    pub fn upload<T: Into<String>>(msg: T) -> Self {
        Self::Upload(msg.into())
    }
}

/// Failures of content editing and persistence.
#[derive(Error, Debug, PartialEq)]
pub enum ContentError {
    /// Removing the block would leave the sequence empty
    #[error("Content must contain at least one block")]
    MinimumBlocks,

    #[error("Block index {index} is out of range for {len} blocks")]
    IndexOutOfRange { index: usize, len: usize },

    /// The edited field does not exist on the block's kind
    #[error("Field '{field}' cannot be set on a {kind} block")]
    FieldMismatch { field: &'static str, kind: &'static str },

    /// Persisted blocks could not be decoded (unknown kind, bad shape, empty list)
    #[error("Invalid content blocks: {0}")]
    InvalidBlocks(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Opaque failure from the tabular data store
    #[error("Store error: {0}")]
    Store(String),
}

pub type MediaResult<T> = Result<T, MediaError>;
pub type ContentResult<T> = Result<T, ContentError>;
