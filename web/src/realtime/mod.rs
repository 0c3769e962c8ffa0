//! Realtime HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the realtime stream.
//! Session bookkeeping and dispatch live in the `presence` crate.

pub mod handler;
