//! HTTP API handlers for goldrec-qe
//!
//! REST for engine operations, SSE for domain events.

pub mod certification;
pub mod feedback;
pub mod health;
pub mod recipes;
pub mod sse;

pub use certification::certification_routes;
pub use feedback::feedback_routes;
pub use health::health_routes;
pub use recipes::recipe_routes;
pub use sse::event_stream;
