//! End-to-end tests for FreeRouter
//!
//! All tests live under `tests/`; they start the real server against mock
//! upstreams. This library target is intentionally empty.
