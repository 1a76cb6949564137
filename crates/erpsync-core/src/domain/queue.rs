//! Sync queue items and their replay state machine
//!
//! A [`SyncQueueItem`] describes one mutation made while the remote ERP was
//! unreachable. Items are replayed in insertion order and removed from the
//! queue only after the remote side confirmed the write.
//!
//! ```text
//! pending ──► in_flight ──► committed (removed)
//!                │
//!                ├────────► failed ──► in_flight ...
//!                │
//!                └────────► parked ──► pending (manual requeue)
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::collection::Collection;
use super::entity::EntityKind;
use super::errors::DomainError;
use super::newtypes::QueueItemId;

// ============================================================================
// Operation and status
// ============================================================================

/// Kind of mutation carried by a queue item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueOperation {
    Create,
    Update,
    Delete,
}

impl QueueOperation {
    pub fn name(&self) -> &'static str {
        match self {
            QueueOperation::Create => "create",
            QueueOperation::Update => "update",
            QueueOperation::Delete => "delete",
        }
    }
}

impl fmt::Display for QueueOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QueueOperation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" | "insert" => Ok(QueueOperation::Create),
            "update" => Ok(QueueOperation::Update),
            "delete" | "remove" => Ok(QueueOperation::Delete),
            other => Err(DomainError::UnknownOperation(other.to_string())),
        }
    }
}

/// Replay status of a queue item
///
/// Only `Pending`, `Failed` and `Parked` are ever persisted. `InFlight`
/// exists for the duration of one apply call, and a `Committed` item is
/// deleted from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueItemStatus {
    Pending,
    InFlight,
    Failed,
    Parked,
    Committed,
}

impl QueueItemStatus {
    pub fn name(&self) -> &'static str {
        match self {
            QueueItemStatus::Pending => "pending",
            QueueItemStatus::InFlight => "in_flight",
            QueueItemStatus::Failed => "failed",
            QueueItemStatus::Parked => "parked",
            QueueItemStatus::Committed => "committed",
        }
    }

    /// Returns true if the status may be replayed by a drain
    pub fn is_replayable(&self) -> bool {
        matches!(self, QueueItemStatus::Pending | QueueItemStatus::Failed)
    }
}

impl fmt::Display for QueueItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QueueItemStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(QueueItemStatus::Pending),
            "in_flight" => Ok(QueueItemStatus::InFlight),
            "failed" => Ok(QueueItemStatus::Failed),
            "parked" => Ok(QueueItemStatus::Parked),
            "committed" => Ok(QueueItemStatus::Committed),
            other => Err(DomainError::ValidationFailed(format!(
                "unknown queue status: {other}"
            ))),
        }
    }
}

// ============================================================================
// Retry policy
// ============================================================================

/// Capped exponential backoff applied to failed replays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Failures after which an item is parked (0 = never park)
    pub max_attempts: u32,
    /// Delay after the first failure
    pub base_delay: Duration,
    /// Upper bound for any delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before the next attempt after `attempts` failures
    ///
    /// `base_delay * 2^(attempts - 1)`, capped at `max_delay`.
    pub fn delay_for(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1).min(62);
        let multiplier = 2i64.saturating_pow(exponent);
        let millis = self
            .base_delay
            .num_milliseconds()
            .saturating_mul(multiplier)
            .min(self.max_delay.num_milliseconds());
        Duration::milliseconds(millis)
    }

    /// Returns true once an item with `attempts` failures must be parked
    pub fn should_park(&self, attempts: u32) -> bool {
        self.max_attempts != 0 && attempts >= self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::seconds(30),
            max_delay: Duration::hours(1),
        }
    }
}

// ============================================================================
// Queue item
// ============================================================================

/// One queued mutation awaiting replay against the remote ERP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueItem {
    id: QueueItemId,
    /// Insertion order assigned by the queue store (0 until persisted)
    sequence: i64,
    entity: EntityKind,
    operation: QueueOperation,
    payload: Value,
    enqueued_at: DateTime<Utc>,
    attempts: u32,
    last_error: Option<String>,
    next_attempt_at: Option<DateTime<Utc>>,
    status: QueueItemStatus,
}

impl SyncQueueItem {
    /// Creates a new pending item stamped with the current time
    pub fn new(entity: EntityKind, operation: QueueOperation, payload: Value) -> Self {
        Self {
            id: QueueItemId::new(),
            sequence: 0,
            entity,
            operation,
            payload,
            enqueued_at: Utc::now(),
            attempts: 0,
            last_error: None,
            next_attempt_at: None,
            status: QueueItemStatus::Pending,
        }
    }

    /// Sets the store-assigned insertion sequence
    #[must_use]
    pub fn with_sequence(mut self, sequence: i64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Overrides the enqueue timestamp
    #[must_use]
    pub fn with_enqueued_at(mut self, enqueued_at: DateTime<Utc>) -> Self {
        self.enqueued_at = enqueued_at;
        self
    }

    pub fn id(&self) -> &QueueItemId {
        &self.id
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn operation(&self) -> QueueOperation {
        self.operation
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    /// Number of failed replay attempts so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn next_attempt_at(&self) -> Option<DateTime<Utc>> {
        self.next_attempt_at
    }

    pub fn status(&self) -> QueueItemStatus {
        self.status
    }

    pub fn is_parked(&self) -> bool {
        self.status == QueueItemStatus::Parked
    }

    /// Returns true if an automatic drain should replay the item at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status.is_replayable() && self.next_attempt_at.map_or(true, |next| now >= next)
    }
}

// ============================================================================
// State transitions
// ============================================================================

impl SyncQueueItem {
    /// Checks if a status transition is valid
    ///
    /// Valid transitions:
    /// - Pending -> InFlight
    /// - Failed -> InFlight
    /// - InFlight -> Committed, Failed, Parked
    /// - Parked -> Pending (manual requeue)
    /// - Committed -> (terminal)
    pub fn can_transition_to(&self, target: QueueItemStatus) -> bool {
        use QueueItemStatus::*;

        matches!(
            (self.status, target),
            (Pending, InFlight)
                | (Failed, InFlight)
                | (InFlight, Committed)
                | (InFlight, Failed)
                | (InFlight, Parked)
                | (Parked, Pending)
        )
    }

    fn transition_to(&mut self, target: QueueItemStatus) -> Result<(), DomainError> {
        if !self.can_transition_to(target) {
            return Err(DomainError::InvalidState {
                from: self.status.name().to_string(),
                to: target.name().to_string(),
            });
        }
        self.status = target;
        Ok(())
    }

    /// Marks the item as being replayed
    pub fn begin_replay(&mut self) -> Result<(), DomainError> {
        self.transition_to(QueueItemStatus::InFlight)
    }

    /// Marks the item as confirmed by the remote side
    pub fn mark_committed(&mut self) -> Result<(), DomainError> {
        self.transition_to(QueueItemStatus::Committed)
    }

    /// Records a failed replay and schedules the next attempt
    ///
    /// Returns the resulting status: `Failed` with a backoff deadline, or
    /// `Parked` once the policy's attempt cap is reached.
    pub fn record_failure(
        &mut self,
        error: impl Into<String>,
        policy: &RetryPolicy,
        now: DateTime<Utc>,
    ) -> Result<QueueItemStatus, DomainError> {
        let attempts = self.attempts.saturating_add(1);
        let target = if policy.should_park(attempts) {
            QueueItemStatus::Parked
        } else {
            QueueItemStatus::Failed
        };
        self.transition_to(target)?;

        self.attempts = attempts;
        self.last_error = Some(error.into());
        self.next_attempt_at = match target {
            QueueItemStatus::Failed => Some(now + policy.delay_for(attempts)),
            _ => None,
        };
        Ok(target)
    }

    /// Returns a parked item to the pending state with a fresh attempt count
    pub fn requeue(&mut self) -> Result<(), DomainError> {
        self.transition_to(QueueItemStatus::Pending)?;
        self.attempts = 0;
        self.last_error = None;
        self.next_attempt_at = None;
        Ok(())
    }
}

// ============================================================================
// Local change
// ============================================================================

/// What a queued mutation does to the local store
///
/// Written together with its [`SyncQueueItem`], so a local edit never
/// exists without the queue entry that will replay it.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalChange {
    /// Insert or replace records, matched by composite key
    Upsert(Collection),
    /// Remove the records with these composite key strings
    Delete { kind: EntityKind, keys: Vec<String> },
}

impl LocalChange {
    /// Deletion of every record in `records`, by composite key
    pub fn deleting(records: &Collection) -> Result<Self, serde_json::Error> {
        let kind = records.kind();
        let key_fields = kind.composite_key();
        let keys = records
            .to_values()?
            .iter()
            .map(|value| key_fields.key_of(value))
            .collect();
        Ok(LocalChange::Delete { kind, keys })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            LocalChange::Upsert(records) => records.kind(),
            LocalChange::Delete { kind, .. } => *kind,
        }
    }
}
