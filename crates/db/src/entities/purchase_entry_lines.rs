//! `SeaORM` Entity for purchase_entry_lines table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_entry_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub purchase_entry_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub qty_ordered: i64,
    pub qty_received: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub unit_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub discount_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((9, 4)))")]
    pub tax_percent: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub line_total: Decimal,
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
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id"
    )]
    Products,
}

impl Related<super::purchase_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseEntries.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
