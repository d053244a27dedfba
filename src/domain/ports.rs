use super::audit::AuditRecord;
use super::entity::{Auditable, EntityId};
use super::loan::{LoanApplication, Repayment, RepaymentStatus, User};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Append-only storage for audit records.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Cheap existence probe for the underlying storage.
    async fn is_available(&self) -> Result<bool>;
    async fn append(&self, record: AuditRecord) -> Result<()>;
    async fn list(&self) -> Result<Vec<AuditRecord>>;
    async fn find_for_object(&self, model_name: &str, object_id: &EntityId) -> Result<Vec<AuditRecord>>;
}

/// Generic persistence for an auditable entity type.
#[async_trait]
pub trait EntityStore<E: Auditable>: Send + Sync {
    async fn get(&self, id: &EntityId) -> Result<Option<E>>;
    /// Persists the entity and returns `true` when it did not exist before.
    async fn save(&self, entity: E) -> Result<bool>;
    async fn delete(&self, id: &EntityId) -> Result<bool>;
}

#[async_trait]
pub trait RepaymentStore: Send + Sync {
    /// Non-deleted repayments due in `[from, to]` with one of `statuses`.
    async fn due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        statuses: &[RepaymentStatus],
    ) -> Result<Vec<Repayment>>;
    /// Non-deleted repayments due strictly before `date` with one of `statuses`.
    async fn due_before(&self, date: NaiveDate, statuses: &[RepaymentStatus]) -> Result<Vec<Repayment>>;
    /// Writes only the status column.
    async fn set_status(&self, id: Uuid, status: RepaymentStatus) -> Result<()>;
}

#[async_trait]
pub trait LoanApplicationStore: Send + Sync {
    /// Non-deleted pending applications created on or before the calendar
    /// day `cutoff` (UTC).
    async fn pending_created_before(&self, cutoff: NaiveDate) -> Result<Vec<LoanApplication>>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn active_admins(&self) -> Result<Vec<User>>;
}

/// Per-pass counts of one reminder run, sent to admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub run_date: NaiveDate,
    pub upcoming: usize,
    pub overdue: usize,
    pub review: usize,
    pub errors: usize,
}

/// Outbound delivery of reminders and notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_payment_reminder(&self, repayment_id: Uuid) -> Result<()>;
    async fn send_overdue_notification(&self, repayment_id: Uuid, days_overdue: i64) -> Result<()>;
    async fn send_review_reminder(&self, loan_id: Uuid) -> Result<()>;
    async fn send_digest(&self, recipients: &[User], digest: &Digest) -> Result<()>;
}

pub type AuditStoreRef = Arc<dyn AuditStore>;
pub type EntityStoreRef<E> = Arc<dyn EntityStore<E>>;
pub type RepaymentStoreRef = Arc<dyn RepaymentStore>;
pub type LoanApplicationStoreRef = Arc<dyn LoanApplicationStore>;
pub type UserDirectoryRef = Arc<dyn UserDirectory>;
pub type NotifierRef = Arc<dyn Notifier>;
