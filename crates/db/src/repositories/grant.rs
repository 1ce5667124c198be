//! Grant repository: manual/back-fill grants and per-grant drill-down.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use recess_core::balance::GrantSummary;
use recess_shared::types::GrantId;

use crate::entities::{leave_consumptions, leave_grants};

use super::audit::{AuditEntry, AuditRepository};

/// Error types for grant operations.
#[derive(Debug, thiserror::Error)]
pub enum GrantRepoError {
    /// Manual grants must carry a positive quantity.
    #[error("Grant quantity must be positive, got {0}")]
    InvalidQuantity(Decimal),

    /// A grant cannot expire before it is granted.
    #[error("Grant expiry {expires_on} is before grant date {granted_on}")]
    InvalidExpiry {
        /// The grant date.
        granted_on: NaiveDate,
        /// The configured expiry.
        expires_on: NaiveDate,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for a manual or back-fill grant.
#[derive(Debug, Clone)]
pub struct ManualGrantInput {
    /// The company the grant belongs to.
    pub company_id: Uuid,
    /// The receiving employee.
    pub user_id: Uuid,
    /// The leave type being granted.
    pub leave_type_id: Uuid,
    /// Granted quantity in hours.
    pub quantity_hours: Decimal,
    /// Explicit grant date.
    pub granted_on: NaiveDate,
    /// Explicit expiry; `None` never expires.
    pub expires_on: Option<NaiveDate>,
    /// Why the grant was made.
    pub note: Option<String>,
}

/// A grant line with its two remainders, for UI drill-down.
#[derive(Debug, Clone)]
pub struct GrantWithRemaining {
    /// The grant row.
    pub grant: leave_grants::Model,
    /// Hours remaining counting only confirmed consumption.
    pub remaining_confirmed: Decimal,
    /// Hours remaining counting holds as well.
    pub remaining_including_holds: Decimal,
    /// Whether the grant is expired as of the requested date.
    pub is_expired: bool,
}

/// Loads grants for a user with their consumption totals aggregated.
///
/// With `lock`, the grant rows are selected `FOR UPDATE` so a surrounding
/// transaction serializes against concurrent allocators.
pub(crate) async fn load_grant_summaries<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    leave_type_id: Option<Uuid>,
    lock: bool,
) -> Result<Vec<(leave_grants::Model, GrantSummary)>, DbErr> {
    let mut query = leave_grants::Entity::find()
        .filter(leave_grants::Column::UserId.eq(user_id));
    if let Some(leave_type_id) = leave_type_id {
        query = query.filter(leave_grants::Column::LeaveTypeId.eq(leave_type_id));
    }
    if lock {
        query = query.lock_exclusive();
    }
    let grants = query.all(conn).await?;
    summarize_grants(conn, grants).await
}

/// Aggregates consumption totals onto the given grant rows.
pub(crate) async fn summarize_grants<C: ConnectionTrait>(
    conn: &C,
    grants: Vec<leave_grants::Model>,
) -> Result<Vec<(leave_grants::Model, GrantSummary)>, DbErr> {
    if grants.is_empty() {
        return Ok(vec![]);
    }

    let grant_ids: Vec<Uuid> = grants.iter().map(|g| g.id).collect();
    let consumptions = leave_consumptions::Entity::find()
        .filter(leave_consumptions::Column::GrantId.is_in(grant_ids))
        .all(conn)
        .await?;

    let mut totals: std::collections::HashMap<Uuid, (Decimal, Decimal)> =
        std::collections::HashMap::new();
    for row in consumptions {
        let entry = totals.entry(row.grant_id).or_default();
        if row.is_hold {
            entry.1 += row.quantity_hours;
        } else {
            entry.0 += row.quantity_hours;
        }
    }

    Ok(grants
        .into_iter()
        .map(|model| {
            let (confirmed, held) = totals.get(&model.id).copied().unwrap_or_default();
            let summary = GrantSummary {
                id: GrantId::from_uuid(model.id),
                granted_on: model.granted_on,
                expires_on: model.expires_on,
                quantity: model.quantity_hours,
                confirmed_consumed: confirmed,
                held_consumed: held,
            };
            (model, summary)
        })
        .collect())
}

/// FIFO-by-expiry sort key for grant listings.
pub(crate) fn fifo_key(model: &leave_grants::Model) -> (bool, NaiveDate, NaiveDate, Uuid) {
    (
        model.expires_on.is_none(),
        model.expires_on.unwrap_or(NaiveDate::MAX),
        model.granted_on,
        model.id,
    )
}

/// Repository for grant rows.
#[derive(Debug, Clone)]
pub struct GrantRepository {
    db: DatabaseConnection,
}

impl GrantRepository {
    /// Creates a new grant repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a manual/back-fill grant with an explicit date and expiry.
    ///
    /// # Errors
    ///
    /// Rejects non-positive quantities and expiry before the grant date.
    pub async fn create_manual_grant(
        &self,
        input: ManualGrantInput,
    ) -> Result<leave_grants::Model, GrantRepoError> {
        if input.quantity_hours <= Decimal::ZERO {
            return Err(GrantRepoError::InvalidQuantity(input.quantity_hours));
        }
        if let Some(expires_on) = input.expires_on {
            if expires_on < input.granted_on {
                return Err(GrantRepoError::InvalidExpiry {
                    granted_on: input.granted_on,
                    expires_on,
                });
            }
        }

        let txn = self.db.begin().await?;

        let grant = leave_grants::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            user_id: Set(input.user_id),
            leave_type_id: Set(input.leave_type_id),
            policy_id: Set(None),
            quantity_hours: Set(input.quantity_hours),
            granted_on: Set(input.granted_on),
            expires_on: Set(input.expires_on),
            note: Set(input.note.clone()),
            created_at: Set(Utc::now().into()),
        };
        let grant = grant.insert(&txn).await?;

        AuditRepository::record(
            &txn,
            AuditEntry::new(
                Some(input.company_id),
                "leave.grant.manual",
                "leave_grant",
                grant.id.to_string(),
            )
            .after(json!({
                "user_id": grant.user_id,
                "leave_type_id": grant.leave_type_id,
                "quantity_hours": grant.quantity_hours,
                "granted_on": grant.granted_on,
                "expires_on": grant.expires_on,
            }))
            .details(json!({ "note": input.note })),
        )
        .await?;

        txn.commit().await?;
        Ok(grant)
    }

    /// Lists a user's grants with both remainders, ordered FIFO-by-expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the queries fail.
    pub async fn list_with_remaining(
        &self,
        user_id: Uuid,
        leave_type_id: Option<Uuid>,
        as_of: NaiveDate,
    ) -> Result<Vec<GrantWithRemaining>, GrantRepoError> {
        let mut rows = load_grant_summaries(&self.db, user_id, leave_type_id, false).await?;
        rows.sort_by_key(|(model, _)| fifo_key(model));

        Ok(rows
            .into_iter()
            .map(|(grant, summary)| GrantWithRemaining {
                remaining_confirmed: summary.remaining_confirmed(),
                remaining_including_holds: summary.remaining_including_holds(),
                is_expired: summary.is_expired(as_of),
                grant,
            })
            .collect())
    }
}
