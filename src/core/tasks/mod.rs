// src/core/tasks/mod.rs

//! Long-running background tasks that run alongside the HTTP server.

pub mod mdns;
pub mod sync;
