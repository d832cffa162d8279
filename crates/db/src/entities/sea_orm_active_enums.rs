//! `SeaORM` active enums mapped to `PostgreSQL` enum types.
//!
//! Each enum converts to and from its `carebase-core` counterpart so
//! repositories can hand domain types to the rule functions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use carebase_core::{auth, billing, records, roster};

macro_rules! mirror_enum {
    ($db:ident, $core:ty, [$($variant:ident),+ $(,)?]) => {
        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                type Core = $core;
                match value {
                    $(Core::$variant => Self::$variant,)+
                }
            }
        }
    };
}

/// Staff role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Tenant administrator.
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Roster and billing coordinator.
    #[sea_orm(string_value = "coordinator")]
    Coordinator,
    /// Support worker.
    #[sea_orm(string_value = "support_worker")]
    SupportWorker,
}

mirror_enum!(UserRole, auth::UserRole, [Admin, Coordinator, SupportWorker]);

/// Shift status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "shift_status")]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    /// Nobody assigned.
    #[sea_orm(string_value = "unassigned")]
    Unassigned,
    /// Requested by a support worker.
    #[sea_orm(string_value = "requested")]
    Requested,
    /// Staff member rostered on.
    #[sea_orm(string_value = "assigned")]
    Assigned,
    /// Started.
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// Finished.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Will not go ahead.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

mirror_enum!(
    ShiftStatus,
    roster::ShiftStatus,
    [Unassigned, Requested, Assigned, InProgress, Completed, Cancelled]
);

/// Case note category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "case_note_category")]
#[serde(rename_all = "snake_case")]
pub enum CaseNoteCategory {
    /// Everyday observations.
    #[sea_orm(string_value = "general")]
    General,
    /// Progress against goals.
    #[sea_orm(string_value = "progress")]
    Progress,
    /// Incident report.
    #[sea_orm(string_value = "incident")]
    Incident,
    /// Medication note.
    #[sea_orm(string_value = "medication")]
    Medication,
    /// Behaviour support note.
    #[sea_orm(string_value = "behaviour")]
    Behaviour,
}

mirror_enum!(
    CaseNoteCategory,
    records::CaseNoteCategory,
    [General, Progress, Incident, Medication, Behaviour]
);

/// Care plan status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "care_plan_status")]
#[serde(rename_all = "snake_case")]
pub enum CarePlanStatus {
    /// Being written.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// In effect.
    #[sea_orm(string_value = "active")]
    Active,
    /// Ended.
    #[sea_orm(string_value = "archived")]
    Archived,
}

mirror_enum!(CarePlanStatus, records::CarePlanStatus, [Draft, Active, Archived]);

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invoice_status")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Being prepared.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Sent.
    #[sea_orm(string_value = "issued")]
    Issued,
    /// Paid.
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Cancelled.
    #[sea_orm(string_value = "void")]
    Void,
}

mirror_enum!(InvoiceStatus, billing::InvoiceStatus, [Draft, Issued, Paid, Void]);

/// NDIS rate band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "rate_band")]
#[serde(rename_all = "snake_case")]
pub enum RateBand {
    /// Weekday 06:00 to 20:00.
    #[sea_orm(string_value = "weekday_daytime")]
    WeekdayDaytime,
    /// Weekday finishing after 20:00.
    #[sea_orm(string_value = "weekday_evening")]
    WeekdayEvening,
    /// Weekday overnight.
    #[sea_orm(string_value = "weekday_night")]
    WeekdayNight,
    /// Saturday.
    #[sea_orm(string_value = "saturday")]
    Saturday,
    /// Sunday.
    #[sea_orm(string_value = "sunday")]
    Sunday,
    /// Public holiday.
    #[sea_orm(string_value = "public_holiday")]
    PublicHoliday,
}

mirror_enum!(
    RateBand,
    billing::RateBand,
    [WeekdayDaytime, WeekdayEvening, WeekdayNight, Saturday, Sunday, PublicHoliday]
);
