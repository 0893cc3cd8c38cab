pub mod blocks;
pub mod error;
pub mod media;
pub mod sections;

pub use error::{ContentError, ContentResult, MediaError, MediaResult};
