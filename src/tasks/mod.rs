//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of the cache engine.
//!
//! # Tasks
//! - Invalidation: forwards bus events into the cache engine

mod invalidation;

pub use invalidation::spawn_invalidation_task;
