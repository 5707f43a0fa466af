//! Quality scoring and certification services
//!
//! Pure pipeline stages (no I/O):
//! - `statistics`: per-metric means and trend
//! - `scoring`: weighted composite score
//! - `auto_certification`: unattended certification gate
//! - `certification_workflow`: manual review state machine
//! - `candidate_ranking`: shortlist and golden listings
//!
//! `quality_engine` wires them to the collaborators.

pub mod auto_certification;
pub mod candidate_ranking;
pub mod certification_workflow;
pub mod errors;
pub mod quality_engine;
pub mod recipe_locks;
pub mod scoring;
pub mod statistics;

pub use auto_certification::{Criterion, CriterionOutcome};
pub use certification_workflow::{
    ApprovalRequest, CertificationRequest, DegradeRequest, RejectionRequest,
};
pub use errors::{EngineError, EngineResult};
pub use quality_engine::{FeedbackBatch, QualityEngine, QualityReport};
