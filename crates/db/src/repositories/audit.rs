//! Audit sink: append-only record of every ledger-affecting operation.
//!
//! Rows are written through the caller's transaction so the audit trail
//! commits (or rolls back) atomically with the mutation it describes.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};
use uuid::Uuid;

use crate::entities::audit_logs;

/// One audit record: what happened, to what, and the data around it.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// The company the action concerns, when known.
    pub company_id: Option<Uuid>,
    /// Action name, e.g. `leave.allocate`.
    pub action: String,
    /// Target entity kind, e.g. `leave_request`.
    pub target_type: String,
    /// Target entity identity.
    pub target_id: String,
    /// State before the mutation.
    pub before_data: Option<serde_json::Value>,
    /// State after the mutation.
    pub after_data: Option<serde_json::Value>,
    /// Free-form context (quantities, reasons, summaries).
    pub details: Option<serde_json::Value>,
}

impl AuditEntry {
    /// Creates an entry with the required fields; data defaults to `None`.
    #[must_use]
    pub fn new(
        company_id: Option<Uuid>,
        action: impl Into<String>,
        target_type: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            company_id,
            action: action.into(),
            target_type: target_type.into(),
            target_id: target_id.into(),
            before_data: None,
            after_data: None,
            details: None,
        }
    }

    /// Attaches before-state data.
    #[must_use]
    pub fn before(mut self, data: serde_json::Value) -> Self {
        self.before_data = Some(data);
        self
    }

    /// Attaches after-state data.
    #[must_use]
    pub fn after(mut self, data: serde_json::Value) -> Self {
        self.after_data = Some(data);
        self
    }

    /// Attaches free-form details.
    #[must_use]
    pub fn details(mut self, data: serde_json::Value) -> Self {
        self.details = Some(data);
        self
    }
}

/// Writer for the append-only audit log.
pub struct AuditRepository;

impl AuditRepository {
    /// Appends one audit row on the given connection or transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn record<C: ConnectionTrait>(conn: &C, entry: AuditEntry) -> Result<(), DbErr> {
        let row = audit_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(entry.company_id),
            action: Set(entry.action),
            target_type: Set(entry.target_type),
            target_id: Set(entry.target_id),
            before_data: Set(entry.before_data),
            after_data: Set(entry.after_data),
            details: Set(entry.details),
            created_at: Set(Utc::now().into()),
        };
        row.insert(conn).await?;
        Ok(())
    }
}
