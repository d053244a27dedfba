use crate::domain::audit::AuditRecord;
use crate::domain::entity::EntityId;
use crate::domain::ports::AuditStore;
use crate::error::{LoanOpsError, Result};
use async_trait::async_trait;
use rocksdb::{BoundColumnFamily, DBWithThreadMode, IteratorMode, MultiThreaded, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding the audit trail.
pub const CF_AUDIT_RECORDS: &str = "audit_records";

type Db = DBWithThreadMode<MultiThreaded>;

/// A persistent, append-only audit store backed by RocksDB.
///
/// Records are keyed by `timestamp_nanos || record_id` so iteration yields
/// them in append order. The column family doubles as the "table": while it
/// is missing the store reports itself unavailable.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbAuditStore {
    db: Arc<Db>,
}

impl RocksDbAuditStore {
    /// Opens or creates a database at `path` with the audit column family.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = Self::open_unprovisioned(path)?;
        store.provision()?;
        Ok(store)
    }

    /// Opens or creates a database at `path` without creating the audit
    /// column family.
    pub fn open_unprovisioned<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let existing = Db::list_cf(&opts, path.as_ref()).unwrap_or_default();
        let db = if existing.is_empty() {
            Db::open(&opts, path)?
        } else {
            Db::open_cf(&opts, path, existing)?
        };

        Ok(Self { db: Arc::new(db) })
    }

    /// Creates the audit column family if it does not exist yet.
    pub fn provision(&self) -> Result<()> {
        if self.db.cf_handle(CF_AUDIT_RECORDS).is_none() {
            self.db.create_cf(CF_AUDIT_RECORDS, &Options::default())?;
        }
        Ok(())
    }

    fn audit_cf(&self) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db.cf_handle(CF_AUDIT_RECORDS).ok_or_else(|| {
            LoanOpsError::Storage("audit_records column family not found".to_string())
        })
    }

    fn key(record: &AuditRecord) -> Vec<u8> {
        let nanos = record.timestamp.timestamp_nanos_opt().unwrap_or_default();
        let mut key = Vec::with_capacity(24);
        key.extend_from_slice(&nanos.to_be_bytes());
        key.extend_from_slice(record.id.as_bytes());
        key
    }

    fn scan(&self) -> Result<Vec<AuditRecord>> {
        let cf = self.audit_cf()?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_key, value) = item?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl AuditStore for RocksDbAuditStore {
    async fn is_available(&self) -> Result<bool> {
        Ok(self.db.cf_handle(CF_AUDIT_RECORDS).is_some())
    }

    async fn append(&self, record: AuditRecord) -> Result<()> {
        let cf = self.audit_cf()?;
        let value = serde_json::to_vec(&record)?;
        self.db.put_cf(&cf, Self::key(&record), value)?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<AuditRecord>> {
        self.scan()
    }

    async fn find_for_object(&self, model_name: &str, object_id: &EntityId) -> Result<Vec<AuditRecord>> {
        Ok(self
            .scan()?
            .into_iter()
            .filter(|r| r.model_name == model_name && r.object_id.as_ref() == Some(object_id))
            .collect())
    }
}
