//! Integration test harness.
//!
//! Drives the full pipeline — watcher events, engine, overlay, storage —
//! against deterministic in-memory doubles of the host page and the data
//! provider. No network, no real quote pages.

mod doubles;
mod overlay_flow;
