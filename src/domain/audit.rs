use super::entity::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Success,
    Failure,
}

/// Old and new value of one changed field.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Input for [`AuditRecord::new`].
#[derive(Debug, Clone)]
pub struct NewAuditRecord {
    pub action: AuditAction,
    pub model_name: String,
    pub object_id: Option<EntityId>,
    pub object_repr: String,
    pub changes: Option<BTreeMap<String, FieldChange>>,
    pub snapshot: Option<Value>,
    pub actor: Option<Uuid>,
    pub ip_address: Option<IpAddr>,
    pub module: Option<String>,
    pub compliance_relevant: bool,
    pub retention_days: u32,
}

/// One observed mutation of a persisted record.
///
/// Records are append-only: nothing in the crate mutates a record after
/// [`AuditRecord::new`] returns, and no store port exposes an update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub severity: Severity,
    pub status: AuditStatus,
    pub actor: Option<Uuid>,
    pub ip_address: Option<IpAddr>,
    pub model_name: String,
    pub object_id: Option<EntityId>,
    pub object_repr: String,
    /// Field-level diff. Only ever set for `UPDATE`.
    pub changes: Option<BTreeMap<String, FieldChange>>,
    /// Full field map for `CREATE` and `DELETE`.
    pub snapshot: Option<Value>,
    pub tags: Vec<String>,
    pub module: Option<String>,
    pub feature: Option<String>,
    pub error_message: Option<String>,
    pub is_compliance_relevant: bool,
    pub retention_days: u32,
}

impl AuditRecord {
    pub fn new(req: NewAuditRecord) -> Self {
        let severity = match (req.action, req.compliance_relevant) {
            (AuditAction::Delete, true) => Severity::High,
            (AuditAction::Delete, false) => Severity::Medium,
            _ => Severity::Low,
        };
        let changes = match req.action {
            AuditAction::Update => req.changes,
            AuditAction::Create | AuditAction::Delete => None,
        };
        let snapshot = match req.action {
            AuditAction::Update => None,
            AuditAction::Create | AuditAction::Delete => req.snapshot,
        };

        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action: req.action,
            severity,
            status: AuditStatus::Success,
            actor: req.actor,
            ip_address: req.ip_address,
            feature: Some(req.model_name.clone()),
            model_name: req.model_name,
            object_id: req.object_id,
            object_repr: req.object_repr,
            changes,
            snapshot,
            tags: vec![req.action.as_str().to_lowercase()],
            module: req.module,
            error_message: None,
            is_compliance_relevant: req.compliance_relevant,
            retention_days: req.retention_days,
        }
    }

    /// Whether the retention window has elapsed at `now`.
    pub fn is_archivable(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp > chrono::Duration::days(i64::from(self.retention_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(action: AuditAction) -> NewAuditRecord {
        NewAuditRecord {
            action,
            model_name: "repayment".to_string(),
            object_id: Some(EntityId::new("r-1")),
            object_repr: "Repayment #1".to_string(),
            changes: Some(BTreeMap::from([(
                "status".to_string(),
                FieldChange {
                    old: json!("pending"),
                    new: json!("overdue"),
                },
            )])),
            snapshot: Some(json!({"status": "pending"})),
            actor: None,
            ip_address: None,
            module: Some("repayments".to_string()),
            compliance_relevant: true,
            retention_days: 30,
        }
    }

    #[test]
    fn test_create_keeps_snapshot_and_drops_changes() {
        let record = AuditRecord::new(request(AuditAction::Create));
        assert!(record.changes.is_none());
        assert_eq!(record.snapshot, Some(json!({"status": "pending"})));
        assert_eq!(record.severity, Severity::Low);
        assert_eq!(record.tags, vec!["create".to_string()]);
    }

    #[test]
    fn test_update_keeps_changes_only() {
        let record = AuditRecord::new(request(AuditAction::Update));
        assert!(record.snapshot.is_none());
        assert_eq!(record.changes.unwrap()["status"].new, json!("overdue"));
    }

    #[test]
    fn test_compliance_delete_is_high_severity() {
        let record = AuditRecord::new(request(AuditAction::Delete));
        assert_eq!(record.severity, Severity::High);

        let mut req = request(AuditAction::Delete);
        req.compliance_relevant = false;
        assert_eq!(AuditRecord::new(req).severity, Severity::Medium);
    }

    #[test]
    fn test_archivable_after_retention() {
        let record = AuditRecord::new(request(AuditAction::Create));
        assert!(!record.is_archivable(record.timestamp + chrono::Duration::days(30)));
        assert!(record.is_archivable(record.timestamp + chrono::Duration::days(31)));
    }

    #[test]
    fn test_action_serializes_uppercase() {
        let record = AuditRecord::new(request(AuditAction::Delete));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["action"], "DELETE");
        assert_eq!(json["severity"], "HIGH");
        assert_eq!(json["status"], "SUCCESS");
    }
}
