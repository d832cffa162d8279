//! `SeaORM` Entity for clients table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub ndis_number: Option<String>,
    pub date_of_birth: Option<Date>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenants::Entity",
        from = "Column::TenantId",
        to = "super::tenants::Column::Id"
    )]
    Tenants,
    #[sea_orm(has_many = "super::shifts::Entity")]
    Shifts,
    #[sea_orm(has_many = "super::case_notes::Entity")]
    CaseNotes,
    #[sea_orm(has_many = "super::care_plans::Entity")]
    CarePlans,
    #[sea_orm(has_many = "super::medication_records::Entity")]
    MedicationRecords,
    #[sea_orm(has_many = "super::invoices::Entity")]
    Invoices,
}

impl Related<super::tenants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenants.def()
    }
}

impl Related<super::shifts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shifts.def()
    }
}

impl Related<super::case_notes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CaseNotes.def()
    }
}

impl Related<super::care_plans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CarePlans.def()
    }
}

impl Related<super::medication_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MedicationRecords.def()
    }
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
