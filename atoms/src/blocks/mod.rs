// Structured post content: typed blocks, the ordered sequence and its renderers
pub mod model;
pub mod render;
pub mod sequence;

pub use model::{BlockField, BlockKind, ContentBlock};
pub use render::{render_blocks, render_markdown, ContentFamily};
pub use sequence::BlockSequence;
