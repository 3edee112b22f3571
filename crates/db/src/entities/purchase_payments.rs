//! `SeaORM` Entity for purchase_payments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub purchase_entry_id: Uuid,
    pub paid_at: DateTimeWithTimeZone,
    pub method: String,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub amount: Decimal,
    pub reference: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_entries::Entity",
        from = "Column::PurchaseEntryId",
        to = "super::purchase_entries::Column::Id",
        on_delete = "Cascade"
    )]
    PurchaseEntries,
}

impl Related<super::purchase_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
