//! Vertex AI module
//!
//! Agent Engine binding of the platform traits.

pub mod adapter;
pub mod api;
pub mod source;
pub mod stream;

pub use adapter::VertexPlatform;
