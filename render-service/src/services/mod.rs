pub mod metrics;
pub mod prompt;
pub mod providers;

pub use prompt::{compose_prompt, SYSTEM_PREFIX};
pub use providers::{ImageProvider, ProviderError, RenderOutcome};
