//! Chat completion proxying for FreeRouter
//!
//! The front side speaks the OpenAI chat completions wire format; the back
//! side speaks either OpenAI chat (pass-through) or the Anthropic Messages
//! API (full translation, including streaming SSE conversion). The request
//! pipeline drives classification, model selection, per-tier deadlines, and
//! fallback across the selected chain.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod auth;
pub mod context;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod protocol;
pub mod stats;
pub mod state;
pub mod translate;
pub mod upstream;

pub use error::ProxyError;
pub use handlers::api_router;
pub use state::{AppState, Snapshot};

/// Namespace prefix applied to the `model` field of every outgoing response
pub const MODEL_NAMESPACE: &str = "freerouter";

/// Virtual model name that enables smart routing
pub const AUTO_MODEL: &str = "auto";
