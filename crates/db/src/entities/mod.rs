//! `SeaORM` entity definitions.
//!
//! One module per table. Every table except `tenants` carries `tenant_id`.

pub mod care_plans;
pub mod case_notes;
pub mod clients;
pub mod invoice_line_items;
pub mod invoices;
pub mod medication_records;
pub mod public_holidays;
pub mod rate_card_items;
pub mod sea_orm_active_enums;
pub mod sessions;
pub mod shifts;
pub mod tenants;
pub mod users;
