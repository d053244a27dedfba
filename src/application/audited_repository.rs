use super::capture::{CaptureScope, ChangeCapture};
use crate::domain::entity::{Auditable, EntityId};
use crate::domain::loan::{Repayment, RepaymentStatus};
use crate::domain::ports::{EntityStore, EntityStoreRef, RepaymentStore};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

/// Routes every domain write through change capture.
///
/// The pre-save hook, the write and the post-save hook share one
/// [`CaptureScope`] that lives only for the duration of the call. The
/// write's own result is returned unchanged; auditing never alters it.
pub struct AuditedRepository<E: Auditable> {
    store: EntityStoreRef<E>,
    capture: Arc<ChangeCapture>,
}

impl<E: Auditable> Clone for AuditedRepository<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            capture: Arc::clone(&self.capture),
        }
    }
}

impl<E: Auditable> AuditedRepository<E> {
    pub fn new(store: EntityStoreRef<E>, capture: Arc<ChangeCapture>) -> Self {
        Self { store, capture }
    }

    pub async fn get(&self, id: &EntityId) -> Result<Option<E>> {
        self.store.get(id).await
    }

    /// Creates or updates `entity`; returns `true` on create.
    pub async fn save(&self, entity: E) -> Result<bool> {
        let mut scope = CaptureScope::new();
        self.capture
            .pre_save(&mut scope, self.store.as_ref(), &entity)
            .await;

        let created = self.store.save(entity.clone()).await?;

        self.capture.post_save(&mut scope, &entity, created).await;
        Ok(created)
    }

    /// Deletes the entity with `id`; returns `false` when it did not exist.
    pub async fn delete(&self, id: &EntityId) -> Result<bool> {
        let Some(entity) = self.store.get(id).await? else {
            return Ok(false);
        };

        let deleted = self.store.delete(id).await?;
        if deleted {
            self.capture.post_delete(&entity).await;
        }
        Ok(deleted)
    }
}

/// Repayment store decorator that audits status transitions.
///
/// `set_status` stays a single-field write on the inner store; the hooks
/// read the record before and after it.
pub struct AuditedRepaymentStore<S> {
    inner: Arc<S>,
    capture: Arc<ChangeCapture>,
}

impl<S> AuditedRepaymentStore<S>
where
    S: RepaymentStore + EntityStore<Repayment>,
{
    pub fn new(inner: Arc<S>, capture: Arc<ChangeCapture>) -> Self {
        Self { inner, capture }
    }
}

#[async_trait]
impl<S> RepaymentStore for AuditedRepaymentStore<S>
where
    S: RepaymentStore + EntityStore<Repayment> + 'static,
{
    async fn due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        statuses: &[RepaymentStatus],
    ) -> Result<Vec<Repayment>> {
        self.inner.due_between(from, to, statuses).await
    }

    async fn due_before(&self, date: NaiveDate, statuses: &[RepaymentStatus]) -> Result<Vec<Repayment>> {
        self.inner.due_before(date, statuses).await
    }

    async fn set_status(&self, id: Uuid, status: RepaymentStatus) -> Result<()> {
        let entity_id = EntityId::from(id);
        let mut scope = CaptureScope::new();
        match self.inner.get(&entity_id).await {
            Ok(Some(current)) => {
                self.capture
                    .pre_save(&mut scope, self.inner.as_ref(), &current)
                    .await;
            }
            Ok(None) => {}
            Err(e) => debug!(repayment_id = %id, error = %e, "pre-write read for audit failed"),
        }

        self.inner.set_status(id, status).await?;

        match self.inner.get(&entity_id).await {
            Ok(Some(updated)) => self.capture.post_save(&mut scope, &updated, false).await,
            Ok(None) => {}
            Err(e) => error!(
                repayment_id = %id,
                error = %e,
                "status written but audit read failed; transition not audited"
            ),
        }
        Ok(())
    }
}
