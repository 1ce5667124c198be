//! `SeaORM` entity definitions for the leave ledger tables.

pub mod audit_logs;
pub mod companies;
pub mod company_holidays;
pub mod employees;
pub mod leave_consumptions;
pub mod leave_grants;
pub mod leave_policies;
pub mod leave_types;
pub mod sea_orm_active_enums;
