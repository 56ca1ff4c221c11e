//! HTTP handlers for the render service.

pub mod health;
pub mod render;
