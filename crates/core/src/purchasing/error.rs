//! Purchasing error types.
//!
//! Every variant belongs to exactly one `ErrorKind`. Validation and state
//! checks run before any mutation, so a returned error always means nothing
//! was written.

use rust_decimal::Decimal;
use thiserror::Error;

use procura_shared::AppError;
use procura_shared::types::{ProductId, PurchaseEntryId, PurchaseLineId, SupplierId};

use crate::purchasing::types::PurchaseStatus;

/// Coarse classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Referenced entity is missing or owned by another tenant.
    NotFound,
    /// Request shape is invalid.
    BadRequest,
    /// Operation is not allowed from the current state.
    InvalidState,
    /// Concurrent write detected.
    Conflict,
    /// Infrastructure failure.
    Internal,
}

/// Errors that can occur in the purchasing engine.
#[derive(Debug, Error)]
pub enum PurchaseError {
    /// Purchase entry not found.
    #[error("Purchase entry {0} not found")]
    EntryNotFound(PurchaseEntryId),

    /// Supplier not found.
    #[error("Supplier {0} not found")]
    SupplierNotFound(SupplierId),

    /// Product not found.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// Line not found on the entry.
    #[error("Line {0} not found on purchase entry")]
    LineNotFound(PurchaseLineId),

    /// Supplier is required.
    #[error("Supplier is required")]
    SupplierRequired,

    /// Entry has no lines.
    #[error("Purchase entry must have at least one line")]
    NoLines,

    /// Line is missing its product.
    #[error("Line {index} is missing a product")]
    MissingProduct {
        /// Zero-based position of the line in the request.
        index: usize,
    },

    /// Line is missing its unit cost.
    #[error("Line {index} is missing a unit cost")]
    MissingUnitCost {
        /// Zero-based position of the line in the request.
        index: usize,
    },

    /// Line orders nothing.
    #[error("Line {index} must order a positive quantity")]
    ZeroQuantity {
        /// Zero-based position of the line in the request.
        index: usize,
    },

    /// Unit cost is zero or negative.
    #[error("Unit cost must be positive, got {0}")]
    NonPositiveUnitCost(Decimal),

    /// A discount, tax or expense field is negative.
    #[error("{field} cannot be negative, got {value}")]
    NegativeAmount {
        /// Offending field.
        field: &'static str,
        /// Supplied value.
        value: Decimal,
    },

    /// Payment amount is zero or negative.
    #[error("Payment amount must be positive, got {0}")]
    NonPositivePayment(Decimal),

    /// Receive request adds nothing.
    #[error("Receive request must add a positive quantity")]
    NothingToReceive,

    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: PurchaseStatus,
        /// The attempted target status.
        to: PurchaseStatus,
    },

    /// Entry can no longer be edited.
    #[error("Cannot modify purchase entry in status {0}")]
    NotEditable(PurchaseStatus),

    /// Goods were already received against the entry.
    #[error("Purchase entry already has received goods")]
    ReceiptsRecorded,

    /// Supplier can only change while the entry is a draft.
    #[error("Supplier cannot change once the purchase entry is confirmed")]
    SupplierLocked,

    /// Receipt would exceed the ordered quantity.
    #[error(
        "Receiving quantity exceeds ordered amount on line {line_id}: ordered {ordered}, received {received}, requested {requested}"
    )]
    OverReceipt {
        /// Target line.
        line_id: PurchaseLineId,
        /// Quantity ordered.
        ordered: u32,
        /// Quantity received before the request.
        received: u32,
        /// Quantity requested.
        requested: u64,
    },

    /// Payment against a cancelled entry.
    #[error("Cannot record a payment on a cancelled purchase entry")]
    PaymentOnCancelled,

    /// Edit would push the grand total below what was already paid.
    #[error("Grand total {grand_total} would fall below amount already paid {amount_paid}")]
    PaidExceedsTotal {
        /// Grand total after the edit.
        grand_total: Decimal,
        /// Amount already paid.
        amount_paid: Decimal,
    },

    /// Entry changed since it was loaded.
    #[error("Purchase entry {0} was modified concurrently, please retry")]
    StaleEntry(PurchaseEntryId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PurchaseError {
    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EntryNotFound(_)
            | Self::SupplierNotFound(_)
            | Self::ProductNotFound(_)
            | Self::LineNotFound(_) => ErrorKind::NotFound,

            Self::SupplierRequired
            | Self::NoLines
            | Self::MissingProduct { .. }
            | Self::MissingUnitCost { .. }
            | Self::ZeroQuantity { .. }
            | Self::NonPositiveUnitCost(_)
            | Self::NegativeAmount { .. }
            | Self::NonPositivePayment(_)
            | Self::NothingToReceive => ErrorKind::BadRequest,

            Self::InvalidTransition { .. }
            | Self::NotEditable(_)
            | Self::ReceiptsRecorded
            | Self::SupplierLocked
            | Self::OverReceipt { .. }
            | Self::PaymentOnCancelled
            | Self::PaidExceedsTotal { .. } => ErrorKind::InvalidState,

            Self::StaleEntry(_) => ErrorKind::Conflict,

            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::BadRequest => 400,
            ErrorKind::InvalidState | ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EntryNotFound(_) => "PURCHASE_ENTRY_NOT_FOUND",
            Self::SupplierNotFound(_) => "SUPPLIER_NOT_FOUND",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::LineNotFound(_) => "LINE_NOT_FOUND",
            Self::SupplierRequired => "SUPPLIER_REQUIRED",
            Self::NoLines => "NO_LINES",
            Self::MissingProduct { .. } => "MISSING_PRODUCT",
            Self::MissingUnitCost { .. } => "MISSING_UNIT_COST",
            Self::ZeroQuantity { .. } => "ZERO_QUANTITY",
            Self::NonPositiveUnitCost(_) => "NON_POSITIVE_UNIT_COST",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::NonPositivePayment(_) => "NON_POSITIVE_PAYMENT",
            Self::NothingToReceive => "NOTHING_TO_RECEIVE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotEditable(_) => "NOT_EDITABLE",
            Self::ReceiptsRecorded => "RECEIPTS_RECORDED",
            Self::SupplierLocked => "SUPPLIER_LOCKED",
            Self::OverReceipt { .. } => "OVER_RECEIPT",
            Self::PaymentOnCancelled => "PAYMENT_ON_CANCELLED",
            Self::PaidExceedsTotal { .. } => "PAID_EXCEEDS_TOTAL",
            Self::StaleEntry(_) => "STALE_ENTRY",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<PurchaseError> for AppError {
    fn from(err: PurchaseError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::BadRequest => Self::BadRequest(message),
            ErrorKind::InvalidState => Self::InvalidState(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::Internal => Self::Database(message),
        }
    }
}
