//! Outbound audit-log payload types.
//!
//! Every mutation on shipments produces an `AuditRecord` that is POSTed
//! to an external audit sink (see `services::audit_service`). Records are
//! diagnostic: delivery is best-effort and snapshots may be stale under
//! concurrent writes.

use serde::Serialize;
use uuid::Uuid;

/// Mutation kind reported to the audit sink.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    StatusChange,
    EventAdded,
}

/// Before/after snapshots of the mutated entity.
///
/// `before` is absent for creations; for status changes both sides are
/// full shipment snapshots (including events).
#[derive(Debug, Clone, Serialize)]
pub struct AuditChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,
}

/// Audit-log entry sent to the external sink.
///
/// # JSON Example
///
/// ```json
/// {
///   "action": "status_change",
///   "entityType": "shipments",
///   "entityId": "550e8400-e29b-41d4-a716-446655440000",
///   "changes": { "before": { "...": "..." }, "after": { "...": "..." } },
///   "metadata": { "source": "shipments-backend", "reason": "left warehouse" }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Acting user, when the mutation is tied to one (API-key calls are not)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,

    pub action: AuditAction,

    /// Entity collection name, e.g. "shipments"
    pub entity_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<AuditChanges>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl AuditRecord {
    /// Create a record for an entity mutation with no changes attached yet.
    pub fn new(action: AuditAction, entity_type: &str, entity_id: Uuid) -> Self {
        Self {
            user_id: None,
            action,
            entity_type: entity_type.to_string(),
            entity_id: Some(entity_id),
            changes: None,
            ip_address: None,
            user_agent: None,
            metadata: None,
        }
    }

    /// Attach before/after snapshots.
    pub fn with_changes(
        mut self,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        self.changes = Some(AuditChanges { before, after });
        self
    }

    /// Attach free-form metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_camel_case_and_omits_absent_fields() {
        let record = AuditRecord::new(AuditAction::Create, "shipments", Uuid::new_v4())
            .with_changes(None, Some(json!({"status": "pending"})))
            .with_metadata(json!({"source": "shipments-backend"}));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["action"], "create");
        assert_eq!(value["entityType"], "shipments");
        assert!(value.get("userId").is_none());
        assert!(value.get("ipAddress").is_none());
        assert!(value["changes"].get("before").is_none());
        assert_eq!(value["changes"]["after"]["status"], "pending");
    }

    #[test]
    fn action_names_match_the_sink_vocabulary() {
        assert_eq!(
            serde_json::to_string(&AuditAction::StatusChange).unwrap(),
            "\"status_change\""
        );
        assert_eq!(
            serde_json::to_string(&AuditAction::EventAdded).unwrap(),
            "\"event_added\""
        );
    }
}
