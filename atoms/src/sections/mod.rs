// Case-study body: fixed five-section record and its constrained markup
pub mod markup;
pub mod model;

pub use markup::{escape_html, render_inline, render_markup};
pub use model::{CaseStudySections, RenderedSection};
