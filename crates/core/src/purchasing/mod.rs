//! Purchase entry lifecycle for Procura.
//!
//! This module implements the purchase entry state machine together with
//! its costing, receiving, payment and supplier balance rules.
//!
//! # Modules
//!
//! - `types` - Domain types (PurchaseEntry, PurchaseStatus, inputs, change sets)
//! - `error` - Purchasing error types
//! - `costing` - Line costing
//! - `totals` - Entry totals aggregation
//! - `entry` - Aggregate transitions (draft, update, confirm, cancel)
//! - `receiving` - Goods receipt processing
//! - `payment` - Payment ledger
//! - `balance` - Supplier balance reconciliation
//! - `store` - Collaborator traits
//! - `memory` - In-memory store
//! - `service` - Workflow orchestrator

pub mod balance;
pub mod costing;
pub mod entry;
pub mod error;
pub mod memory;
pub mod payment;
pub mod receiving;
pub mod service;
pub mod store;
pub mod totals;
pub mod types;

#[cfg(test)]
mod costing_props;
#[cfg(test)]
mod receiving_props;
#[cfg(test)]
mod totals_props;

pub use balance::SupplierBalanceReconciler;
pub use costing::{LineCost, LineCosting};
pub use error::{ErrorKind, PurchaseError};
pub use memory::InMemoryPurchaseStore;
pub use payment::{DEFAULT_PAYMENT_METHOD, PaymentLedger, RecordedPayment};
pub use receiving::ReceivingProcessor;
pub use service::PurchaseWorkflow;
pub use store::{ProductCatalog, PurchaseEntryStore, SupplierDirectory};
pub use totals::{EntryTotals, HeaderCharges, TotalsAggregator};
pub use types::{
    BalanceTrigger, ConfirmPurchaseInput, CreatePurchaseInput, LineInput, PaymentInput,
    ProductRef, PurchaseChangeSet, PurchaseEntry, PurchaseFilter, PurchaseLine, PurchasePayment,
    PurchaseStatus, ReceiptLineInput, ReceivePurchaseInput, StockReceipt, SupplierAdjustment,
    SupplierRef, UpdateLineInput, UpdatePurchaseInput,
};
