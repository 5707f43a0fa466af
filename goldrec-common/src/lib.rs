//! # Golden Recipe Common Library
//!
//! Shared code for the golden-recipe services including:
//! - Error and result types
//! - Configuration loading (TOML, environment, compiled defaults)
//! - Domain event types and the broadcast EventBus
//! - SSE streaming of bus events
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
pub use events::{EventBus, GoldrecEvent};
