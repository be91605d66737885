//! Request classification and model selection for FreeRouter
//!
//! A purely local pipeline: a weighted fourteen-dimension scorer maps a
//! prompt to a complexity tier, an override parser honors explicit user
//! tier directives, and the selector resolves the tier against the active
//! tier table into a routing decision with a cost estimate and fallback
//! chain. No network calls, no shared mutable state.

#![allow(clippy::must_use_candidate, clippy::cast_precision_loss)]

pub mod catalog;
pub mod classify;
pub mod mode;
pub mod selector;

pub use catalog::{ModelCatalog, ModelEntry};
pub use classify::{Classification, classify, estimate_tokens, resolve_tier};
pub use freerouter_config::Tier;
pub use mode::{ModeOverride, parse_mode_override};
pub use selector::{RouteMethod, RoutingDecision, explicit, select};
