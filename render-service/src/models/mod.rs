pub mod render;

pub use render::{RenderRequest, RenderResponse};
