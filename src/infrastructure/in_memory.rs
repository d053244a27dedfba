use crate::domain::audit::AuditRecord;
use crate::domain::entity::{Auditable, EntityId};
use crate::domain::loan::{LoanApplication, LoanStatus, Repayment, RepaymentStatus, User};
use crate::domain::ports::{
    AuditStore, EntityStore, LoanApplicationStore, RepaymentStore, UserDirectory,
};
use crate::error::{LoanOpsError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe, append-only in-memory audit trail.
///
/// Can start unprovisioned to stand in for an audit table whose migration
/// has not run yet: the availability probe reports `false` and appends fail
/// until [`InMemoryAuditStore::provision`] is called.
#[derive(Clone)]
pub struct InMemoryAuditStore {
    records: Arc<RwLock<Vec<AuditRecord>>>,
    provisioned: Arc<AtomicBool>,
}

impl Default for InMemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self {
            records: Arc::default(),
            provisioned: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn unprovisioned() -> Self {
        let store = Self::new();
        store.provisioned.store(false, Ordering::SeqCst);
        store
    }

    pub fn provision(&self) {
        self.provisioned.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn is_available(&self) -> Result<bool> {
        Ok(self.provisioned.load(Ordering::SeqCst))
    }

    async fn append(&self, record: AuditRecord) -> Result<()> {
        if !self.provisioned.load(Ordering::SeqCst) {
            return Err(LoanOpsError::Storage(
                "audit store is not provisioned".to_string(),
            ));
        }
        self.records.write().await.push(record);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<AuditRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn find_for_object(&self, model_name: &str, object_id: &EntityId) -> Result<Vec<AuditRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.model_name == model_name && r.object_id.as_ref() == Some(object_id))
            .cloned()
            .collect())
    }
}

/// A thread-safe in-memory store for any auditable entity.
///
/// Uses `Arc<RwLock<HashMap<EntityId, E>>>`; clones share the same map.
pub struct InMemoryEntityStore<E> {
    entities: Arc<RwLock<HashMap<EntityId, E>>>,
}

impl<E> Clone for InMemoryEntityStore<E> {
    fn clone(&self) -> Self {
        Self {
            entities: Arc::clone(&self.entities),
        }
    }
}

impl<E> Default for InMemoryEntityStore<E> {
    fn default() -> Self {
        Self {
            entities: Arc::default(),
        }
    }
}

impl<E: Auditable> InMemoryEntityStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<E> {
        self.entities.read().await.values().cloned().collect()
    }

    async fn filter<F>(&self, predicate: F) -> Vec<E>
    where
        F: Fn(&E) -> bool,
    {
        self.entities
            .read()
            .await
            .values()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl<E: Auditable> EntityStore<E> for InMemoryEntityStore<E> {
    async fn get(&self, id: &EntityId) -> Result<Option<E>> {
        Ok(self.entities.read().await.get(id).cloned())
    }

    async fn save(&self, entity: E) -> Result<bool> {
        let id = entity.entity_id().ok_or_else(|| {
            LoanOpsError::Validation(format!("{} has no identity", E::ENTITY_TYPE))
        })?;
        Ok(self.entities.write().await.insert(id, entity).is_none())
    }

    async fn delete(&self, id: &EntityId) -> Result<bool> {
        Ok(self.entities.write().await.remove(id).is_some())
    }
}

/// In-memory repayment schedule: generic entity storage plus the reminder queries.
#[derive(Clone, Default)]
pub struct InMemoryRepaymentStore {
    inner: InMemoryEntityStore<Repayment>,
}

impl InMemoryRepaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Repayment> {
        self.inner.all().await
    }
}

#[async_trait]
impl EntityStore<Repayment> for InMemoryRepaymentStore {
    async fn get(&self, id: &EntityId) -> Result<Option<Repayment>> {
        self.inner.get(id).await
    }

    async fn save(&self, entity: Repayment) -> Result<bool> {
        self.inner.save(entity).await
    }

    async fn delete(&self, id: &EntityId) -> Result<bool> {
        self.inner.delete(id).await
    }
}

#[async_trait]
impl RepaymentStore for InMemoryRepaymentStore {
    async fn due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        statuses: &[RepaymentStatus],
    ) -> Result<Vec<Repayment>> {
        Ok(self
            .inner
            .filter(|r| {
                !r.is_deleted && r.due_date >= from && r.due_date <= to && statuses.contains(&r.status)
            })
            .await)
    }

    async fn due_before(&self, date: NaiveDate, statuses: &[RepaymentStatus]) -> Result<Vec<Repayment>> {
        Ok(self
            .inner
            .filter(|r| !r.is_deleted && r.due_date < date && statuses.contains(&r.status))
            .await)
    }

    async fn set_status(&self, id: Uuid, status: RepaymentStatus) -> Result<()> {
        let mut entities = self.inner.entities.write().await;
        let repayment = entities
            .get_mut(&EntityId::from(id))
            .ok_or_else(|| LoanOpsError::NotFound {
                entity: "repayment",
                id: id.to_string(),
            })?;
        repayment.status = status;
        Ok(())
    }
}

/// In-memory loan applications.
#[derive(Clone, Default)]
pub struct InMemoryLoanApplicationStore {
    inner: InMemoryEntityStore<LoanApplication>,
}

impl InMemoryLoanApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore<LoanApplication> for InMemoryLoanApplicationStore {
    async fn get(&self, id: &EntityId) -> Result<Option<LoanApplication>> {
        self.inner.get(id).await
    }

    async fn save(&self, entity: LoanApplication) -> Result<bool> {
        self.inner.save(entity).await
    }

    async fn delete(&self, id: &EntityId) -> Result<bool> {
        self.inner.delete(id).await
    }
}

#[async_trait]
impl LoanApplicationStore for InMemoryLoanApplicationStore {
    async fn pending_created_before(&self, cutoff: NaiveDate) -> Result<Vec<LoanApplication>> {
        Ok(self
            .inner
            .filter(|l| !l.is_deleted && l.status == LoanStatus::Pending && l.created_at.date_naive() <= cutoff)
            .await)
    }
}

/// In-memory user directory.
#[derive(Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<Vec<User>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, user: User) {
        self.users.write().await.push(user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn active_admins(&self) -> Result<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|u| u.is_active_admin())
            .cloned()
            .collect())
    }
}
