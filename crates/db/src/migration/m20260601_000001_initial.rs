//! Initial schema for the leave ledger.
//!
//! Creates the company/employee reference tables, the leave type and policy
//! configuration, and the two ledger tables (grants, consumptions) plus the
//! append-only audit log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TABLE IF EXISTS audit_logs CASCADE;
DROP TABLE IF EXISTS leave_consumptions CASCADE;
DROP TABLE IF EXISTS leave_grants CASCADE;
DROP TABLE IF EXISTS company_holidays CASCADE;
DROP TABLE IF EXISTS leave_policies CASCADE;
DROP TABLE IF EXISTS leave_types CASCADE;
DROP TABLE IF EXISTS employees CASCADE;
DROP TABLE IF EXISTS companies CASCADE;
DROP TYPE IF EXISTS consumption_kind;
DROP TYPE IF EXISTS deduction_timing;
DROP TYPE IF EXISTS min_unit;
DROP TYPE IF EXISTS accrual_method;
",
        )
        .await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r#"
-- Enum types
CREATE TYPE accrual_method AS ENUM ('anniversary', 'fiscal_fixed', 'monthly');
CREATE TYPE min_unit AS ENUM ('1h', '0.5d', '1d');
CREATE TYPE deduction_timing AS ENUM ('apply', 'approve');
CREATE TYPE consumption_kind AS ENUM ('request', 'forfeit');

-- Companies
CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    timezone VARCHAR(64) NOT NULL DEFAULT 'UTC',
    non_working_weekdays JSONB NOT NULL DEFAULT '[6, 7]',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Employees (the slice of the user record the ledger needs)
CREATE TABLE employees (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    display_name VARCHAR(255) NOT NULL,
    eligible_from DATE NOT NULL,
    fte_ratio NUMERIC(5, 4) NOT NULL DEFAULT 1,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_fte_ratio CHECK (fte_ratio > 0 AND fte_ratio <= 1)
);

CREATE INDEX idx_employees_company ON employees(company_id) WHERE is_active;

-- Leave types
CREATE TABLE leave_types (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_leave_types_name UNIQUE (company_id, name)
);

-- Accrual policies, one active policy per (company, leave type)
CREATE TABLE leave_policies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    leave_type_id UUID NOT NULL REFERENCES leave_types(id) ON DELETE CASCADE,
    accrual_method accrual_method NOT NULL,
    service_bands JSONB NOT NULL,
    prorate_part_time BOOLEAN NOT NULL DEFAULT FALSE,
    carryover_max_days NUMERIC(6, 2),
    expire_months INTEGER NOT NULL,
    min_unit min_unit NOT NULL DEFAULT '1h',
    hours_per_day NUMERIC(4, 2) NOT NULL DEFAULT 8,
    allow_negative BOOLEAN NOT NULL DEFAULT FALSE,
    deduction_timing deduction_timing NOT NULL DEFAULT 'apply',
    business_days_only BOOLEAN NOT NULL DEFAULT FALSE,
    blackout_dates JSONB NOT NULL DEFAULT '[]',
    grant_month INTEGER,
    grant_day INTEGER,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_expire_months CHECK (expire_months > 0),
    CONSTRAINT chk_hours_per_day CHECK (hours_per_day > 0 AND hours_per_day <= 24),
    CONSTRAINT chk_carryover CHECK (carryover_max_days IS NULL OR carryover_max_days >= 0),
    CONSTRAINT chk_grant_month CHECK (grant_month IS NULL OR grant_month BETWEEN 1 AND 12),
    CONSTRAINT chk_grant_day CHECK (grant_day IS NULL OR grant_day BETWEEN 1 AND 31)
);

CREATE UNIQUE INDEX uq_leave_policies_active
    ON leave_policies(company_id, leave_type_id) WHERE is_active;

-- Company holiday calendar (blackout dates from the calendar data source)
CREATE TABLE company_holidays (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    holiday_date DATE NOT NULL,
    name VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_company_holidays UNIQUE (company_id, holiday_date)
);

-- Grant ledger: append-mostly source of truth for hours ever given
CREATE TABLE leave_grants (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    leave_type_id UUID NOT NULL REFERENCES leave_types(id) ON DELETE CASCADE,
    policy_id UUID REFERENCES leave_policies(id) ON DELETE SET NULL,
    quantity_hours NUMERIC(8, 2) NOT NULL,
    granted_on DATE NOT NULL,
    expires_on DATE,
    note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_grant_quantity CHECK (quantity_hours >= 0),
    CONSTRAINT chk_grant_expiry CHECK (expires_on IS NULL OR expires_on >= granted_on)
);

-- Idempotency: at most one engine-issued grant per (user, type, date).
-- Manual/back-fill grants (policy_id IS NULL) are exempt.
CREATE UNIQUE INDEX uq_leave_grants_engine_issue
    ON leave_grants(user_id, leave_type_id, granted_on) WHERE policy_id IS NOT NULL;

CREATE INDEX idx_leave_grants_user_type ON leave_grants(user_id, leave_type_id);
CREATE INDEX idx_leave_grants_expiry ON leave_grants(expires_on) WHERE expires_on IS NOT NULL;

-- Consumption ledger: source of truth for hours taken
CREATE TABLE leave_consumptions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    grant_id UUID NOT NULL REFERENCES leave_grants(id) ON DELETE CASCADE,
    request_id UUID,
    kind consumption_kind NOT NULL DEFAULT 'request',
    quantity_hours NUMERIC(8, 2) NOT NULL,
    is_hold BOOLEAN NOT NULL,
    consumed_on DATE NOT NULL,
    note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_consumption_quantity CHECK (quantity_hours > 0),
    CONSTRAINT chk_request_rows_have_request CHECK (
        (kind = 'request' AND request_id IS NOT NULL)
        OR (kind = 'forfeit' AND request_id IS NULL AND NOT is_hold)
    )
);

CREATE INDEX idx_leave_consumptions_grant ON leave_consumptions(grant_id);
CREATE INDEX idx_leave_consumptions_request ON leave_consumptions(request_id)
    WHERE request_id IS NOT NULL;

-- Append-only audit log
CREATE TABLE audit_logs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID,
    action VARCHAR(64) NOT NULL,
    target_type VARCHAR(64) NOT NULL,
    target_id VARCHAR(64) NOT NULL,
    before_data JSONB,
    after_data JSONB,
    details JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_audit_logs_target ON audit_logs(target_type, target_id);
CREATE INDEX idx_audit_logs_company ON audit_logs(company_id, created_at DESC);
"#;
