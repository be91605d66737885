//! Wire format types
//!
//! `openai` is the front-side format (and the pass-through back side);
//! `anthropic` is the translated back side.

pub mod anthropic;
pub mod openai;
