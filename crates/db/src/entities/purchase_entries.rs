//! `SeaORM` Entity for purchase_entries table.

use super::sea_orm_active_enums::PurchaseStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub supplier_id: Uuid,
    pub code: String,
    pub status: PurchaseStatus,
    pub bill_date: Date,
    pub due_date: Option<Date>,
    pub reference: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[sea_orm(column_type = "Char(Some(3u32))")]
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub header_discount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub discount_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub tax_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub supplier_expense: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub other_expense: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub grand_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub amount_paid: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub amount_due: Decimal,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::suppliers::Entity",
        from = "Column::SupplierId",
        to = "super::suppliers::Column::Id"
    )]
    Suppliers,
    #[sea_orm(has_many = "super::purchase_entry_lines::Entity")]
    PurchaseEntryLines,
    #[sea_orm(has_many = "super::purchase_payments::Entity")]
    PurchasePayments,
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suppliers.def()
    }
}

impl Related<super::purchase_entry_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseEntryLines.def()
    }
}

impl Related<super::purchase_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchasePayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
