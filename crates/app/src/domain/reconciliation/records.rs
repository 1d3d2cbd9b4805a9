//! Reconciliation Records

use jiff::Timestamp;

use crate::{
    domain::{
        carts::records::DraftReason, products::records::ProductUuid, users::records::UserUuid,
    },
    uuids::TypedUuid,
};

/// Reconciliation Job UUID
pub type ReconciliationJobUuid = TypedUuid<ReconciliationJob>;

/// A queued request to move one product's lines out of active carts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationJob {
    pub uuid: ReconciliationJobUuid,
    pub product: ProductUuid,
    pub reason: DraftReason,
    pub attempts: u32,
    pub run_after: Timestamp,
    pub last_error: Option<String>,
    pub failed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Job counts by state. Completed jobs are deleted and not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Waiting to run or scheduled for a retry.
    pub pending: u64,

    /// Out of attempts, kept for inspection.
    pub failed: u64,
}

/// Users whose active-cart line for `product` was moved to their draft cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedToDraft {
    pub product: ProductUuid,
    pub reason: DraftReason,
    pub users: Vec<UserUuid>,
}

/// What a dispatch did, depending on the reconciliation mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Moved(MovedToDraft),
    Enqueued(ReconciliationJobUuid),
}
