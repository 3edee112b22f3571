//! `SeaORM` Entity for suppliers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub outstanding_balance: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchase_entries::Entity")]
    PurchaseEntries,
}

impl Related<super::purchase_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
