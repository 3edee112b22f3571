//! Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `purchase_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "purchase_status")]
pub enum PurchaseStatus {
    /// Draft.
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    /// Confirmed.
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    /// Partially received.
    #[sea_orm(string_value = "PARTIALLY_RECEIVED")]
    PartiallyReceived,
    /// Received.
    #[sea_orm(string_value = "RECEIVED")]
    Received,
    /// Cancelled.
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl From<procura_core::purchasing::PurchaseStatus> for PurchaseStatus {
    fn from(status: procura_core::purchasing::PurchaseStatus) -> Self {
        use procura_core::purchasing::PurchaseStatus as Core;
        match status {
            Core::Draft => Self::Draft,
            Core::Confirmed => Self::Confirmed,
            Core::PartiallyReceived => Self::PartiallyReceived,
            Core::Received => Self::Received,
            Core::Cancelled => Self::Cancelled,
        }
    }
}

impl From<PurchaseStatus> for procura_core::purchasing::PurchaseStatus {
    fn from(status: PurchaseStatus) -> Self {
        match status {
            PurchaseStatus::Draft => Self::Draft,
            PurchaseStatus::Confirmed => Self::Confirmed,
            PurchaseStatus::PartiallyReceived => Self::PartiallyReceived,
            PurchaseStatus::Received => Self::Received,
            PurchaseStatus::Cancelled => Self::Cancelled,
        }
    }
}
