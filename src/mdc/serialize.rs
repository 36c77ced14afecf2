pub mod attributes;
pub mod renderer;

pub use attributes::render_attributes;
pub use renderer::{serialize_document, RenderContext};
