use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoanOpsError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Delivery error: {0}")]
    Delivery(String),
    #[error("Reminder queue is closed")]
    QueueClosed,
}

pub type Result<T> = std::result::Result<T, LoanOpsError>;
