use super::request_context::RequestContext;
use crate::domain::audit::{AuditAction, AuditRecord, NewAuditRecord};
use crate::domain::diff::diff_fields;
use crate::domain::entity::{Auditable, EntityId, FieldMap, snapshot_json};
use crate::domain::ports::{AuditStoreRef, EntityStore};
use std::collections::HashMap;
use tracing::{debug, error};

/// Infrastructure entity types that are never audited.
pub const EXCLUDED_ENTITY_TYPES: &[&str] = &[
    "audit_record",
    "session",
    "migration",
    "content_type",
    "permission",
    "log_entry",
];

pub fn is_excluded(entity_type: &str) -> bool {
    EXCLUDED_ENTITY_TYPES.contains(&entity_type)
}

/// Pre-mutation state of one entity, held between the pre- and post-save hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeCaptureContext {
    pub model_name: &'static str,
    pub object_id: EntityId,
    pub snapshot: FieldMap,
}

/// Scratch store for a single logical write operation, keyed by entity type.
///
/// Each operation owns its scope, so nothing stashed here is visible to any
/// other operation. Contexts left behind are discarded with the scope.
#[derive(Debug, Default)]
pub struct CaptureScope {
    pending: HashMap<&'static str, ChangeCaptureContext>,
}

impl CaptureScope {
    pub fn new() -> Self {
        Self::default()
    }

    fn stash(&mut self, context: ChangeCaptureContext) {
        self.pending.insert(context.model_name, context);
    }

    fn take(&mut self, entity_type: &str) -> Option<ChangeCaptureContext> {
        self.pending.remove(entity_type)
    }

    #[cfg(test)]
    fn get(&self, entity_type: &str) -> Option<&ChangeCaptureContext> {
        self.pending.get(entity_type)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Produces the append-only audit trail for entity mutations.
///
/// All three hooks are fail-open: nothing they do can return an error to
/// the caller, and persistence failures are logged and dropped.
pub struct ChangeCapture {
    audit_store: AuditStoreRef,
}

impl ChangeCapture {
    pub fn new(audit_store: AuditStoreRef) -> Self {
        Self { audit_store }
    }

    async fn is_enabled(&self, entity_type: &str) -> bool {
        if is_excluded(entity_type) {
            return false;
        }
        match self.audit_store.is_available().await {
            Ok(available) => available,
            Err(e) => {
                debug!(error = %e, "audit store probe failed");
                false
            }
        }
    }

    /// Stashes the persisted state of `entity` before it is written.
    pub async fn pre_save<E: Auditable>(
        &self,
        scope: &mut CaptureScope,
        store: &dyn EntityStore<E>,
        entity: &E,
    ) {
        if !self.is_enabled(E::ENTITY_TYPE).await {
            return;
        }
        let Some(id) = entity.entity_id() else {
            return;
        };

        match store.get(&id).await {
            Ok(Some(existing)) => scope.stash(ChangeCaptureContext {
                model_name: E::ENTITY_TYPE,
                object_id: id,
                snapshot: existing.fields(),
            }),
            Ok(None) => {}
            Err(e) => {
                debug!(model = E::ENTITY_TYPE, object_id = %id, error = %e, "pre-save lookup failed");
            }
        }
    }

    /// Records a CREATE or UPDATE for `entity` after it was written.
    pub async fn post_save<E: Auditable>(&self, scope: &mut CaptureScope, entity: &E, created: bool) {
        if !self.is_enabled(E::ENTITY_TYPE).await {
            return;
        }
        let object_id = entity.entity_id();
        let fields = entity.fields();

        let (action, changes, snapshot) = if created {
            // Nothing to diff against on create.
            scope.take(E::ENTITY_TYPE);
            (AuditAction::Create, None, Some(snapshot_json(&fields)))
        } else {
            let changes = scope
                .take(E::ENTITY_TYPE)
                .filter(|ctx| Some(&ctx.object_id) == object_id.as_ref())
                .map(|ctx| diff_fields(&ctx.snapshot, &fields));
            (AuditAction::Update, changes, None)
        };

        self.persist::<E>(NewAuditRecord {
            action,
            model_name: E::ENTITY_TYPE.to_string(),
            object_id,
            object_repr: entity.repr(),
            changes,
            snapshot,
            actor: None,
            ip_address: None,
            module: E::MODULE.map(str::to_string),
            compliance_relevant: E::COMPLIANCE_RELEVANT,
            retention_days: E::RETENTION_DAYS,
        })
        .await;
    }

    /// Records a DELETE for `entity` after it was removed.
    pub async fn post_delete<E: Auditable>(&self, entity: &E) {
        if !self.is_enabled(E::ENTITY_TYPE).await {
            return;
        }
        self.persist::<E>(NewAuditRecord {
            action: AuditAction::Delete,
            model_name: E::ENTITY_TYPE.to_string(),
            object_id: entity.entity_id(),
            object_repr: entity.repr(),
            changes: None,
            snapshot: Some(snapshot_json(&entity.fields())),
            actor: None,
            ip_address: None,
            module: E::MODULE.map(str::to_string),
            compliance_relevant: E::COMPLIANCE_RELEVANT,
            retention_days: E::RETENTION_DAYS,
        })
        .await;
    }

    async fn persist<E: Auditable>(&self, mut req: NewAuditRecord) {
        if let Some(ctx) = RequestContext::current() {
            req.actor = ctx.actor;
            req.ip_address = ctx.ip_address;
        }
        let record = AuditRecord::new(req);
        let action = record.action;
        let object_id = record.object_id.clone();

        if let Err(e) = self.audit_store.append(record).await {
            error!(
                model = E::ENTITY_TYPE,
                object_id = ?object_id,
                %action,
                error = %e,
                "failed to persist audit record"
            );
        } else {
            debug!(model = E::ENTITY_TYPE, object_id = ?object_id, %action, "audit record persisted");
        }
    }
}
