//! Event types for the golden-recipe event system
//!
//! Provides the shared event definitions and the EventBus used to broadcast
//! certification and quality transitions to SSE clients and other listeners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Golden-recipe event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GoldrecEvent {
    /// A batch quality record was appended to the feedback store
    FeedbackRecorded {
        recipe_id: String,
        feedback_id: Uuid,
        batch_no: Option<String>,
        /// False when appended in deferred (bulk) mode
        recomputed: bool,
        timestamp: DateTime<Utc>,
    },

    /// Statistics and composite score were recomputed
    QualityRecomputed {
        recipe_id: String,
        golden_score: f64,
        total_executions: usize,
        /// Trend classification (`improving`, `stable`, `declining`, `insufficient-data`)
        quality_trend: String,
        timestamp: DateTime<Utc>,
    },

    /// Recipe cleared every auto-certification gate
    RecipeAutoCertified {
        recipe_id: String,
        golden_score: f64,
        timestamp: DateTime<Utc>,
    },

    /// Manual certification opened with a reviewer list
    CertificationRequested {
        recipe_id: String,
        requested_by: String,
        reviewers: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// One reviewer entry received a decision
    ReviewerDecided {
        recipe_id: String,
        reviewer_id: String,
        /// `approved` or `rejected`
        decision: String,
        /// Administrator who signed on the reviewer's behalf
        proxy_by: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Recipe became golden through the manual route
    RecipeCertified {
        recipe_id: String,
        certified_by: String,
        timestamp: DateTime<Utc>,
    },

    /// A reviewer rejection failed the certification
    CertificationRejected {
        recipe_id: String,
        reviewer_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Golden status revoked
    RecipeDegraded {
        recipe_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl GoldrecEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            GoldrecEvent::FeedbackRecorded { .. } => "FeedbackRecorded",
            GoldrecEvent::QualityRecomputed { .. } => "QualityRecomputed",
            GoldrecEvent::RecipeAutoCertified { .. } => "RecipeAutoCertified",
            GoldrecEvent::CertificationRequested { .. } => "CertificationRequested",
            GoldrecEvent::ReviewerDecided { .. } => "ReviewerDecided",
            GoldrecEvent::RecipeCertified { .. } => "RecipeCertified",
            GoldrecEvent::CertificationRejected { .. } => "CertificationRejected",
            GoldrecEvent::RecipeDegraded { .. } => "RecipeDegraded",
        }
    }

    /// Recipe the event concerns
    pub fn recipe_id(&self) -> &str {
        match self {
            GoldrecEvent::FeedbackRecorded { recipe_id, .. }
            | GoldrecEvent::QualityRecomputed { recipe_id, .. }
            | GoldrecEvent::RecipeAutoCertified { recipe_id, .. }
            | GoldrecEvent::CertificationRequested { recipe_id, .. }
            | GoldrecEvent::ReviewerDecided { recipe_id, .. }
            | GoldrecEvent::RecipeCertified { recipe_id, .. }
            | GoldrecEvent::CertificationRejected { recipe_id, .. }
            | GoldrecEvent::RecipeDegraded { recipe_id, .. } => recipe_id,
        }
    }
}

/// Broadcast bus for GoldrecEvent
///
/// Cloning is cheap; all clones share one channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GoldrecEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    ///
    /// # Examples
    ///
    /// ```
    /// use goldrec_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<GoldrecEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: GoldrecEvent,
    ) -> Result<usize, broadcast::error::SendError<GoldrecEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: GoldrecEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
