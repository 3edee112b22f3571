//! Purchasing domain types.
//!
//! The purchase entry aggregate owns its lines and payments as plain value
//! collections; mutation goes through the aggregate root methods in `entry`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use procura_shared::types::{
    Currency, ProductId, PurchaseEntryId, PurchaseLineId, PurchasePaymentId, SupplierId, TenantId,
};

/// Purchase entry status.
///
/// The valid transitions are:
/// - Draft → Confirmed (confirm)
/// - Confirmed → PartiallyReceived | Received (receive)
/// - PartiallyReceived → PartiallyReceived | Received (receive)
/// - Draft | Confirmed → Cancelled (cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseStatus {
    /// Entry is being prepared and can be freely edited.
    Draft,
    /// Bill is payable; nothing has been received yet.
    Confirmed,
    /// Some ordered quantity has arrived.
    PartiallyReceived,
    /// Every line is fully received (terminal).
    Received,
    /// Entry was abandoned before any receipt (terminal).
    Cancelled,
}

impl PurchaseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Confirmed => "CONFIRMED",
            Self::PartiallyReceived => "PARTIALLY_RECEIVED",
            Self::Received => "RECEIVED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "CONFIRMED" => Some(Self::Confirmed),
            "PARTIALLY_RECEIVED" => Some(Self::PartiallyReceived),
            "RECEIVED" => Some(Self::Received),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true for states no operation can leave.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Received | Self::Cancelled)
    }

    /// Returns true if goods may be received in this state.
    #[must_use]
    pub fn accepts_receipts(&self) -> bool {
        matches!(self, Self::Confirmed | Self::PartiallyReceived)
    }

    /// Returns true once the bill is payable and tracked on the supplier balance.
    #[must_use]
    pub fn is_payable(&self) -> bool {
        matches!(
            self,
            Self::Confirmed | Self::PartiallyReceived | Self::Received
        )
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ordered product on a purchase entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    /// Line ID.
    pub id: PurchaseLineId,
    /// Ordered product.
    pub product_id: ProductId,
    /// Free-text description.
    pub description: Option<String>,
    /// Quantity ordered.
    pub qty_ordered: u32,
    /// Quantity received so far; never exceeds `qty_ordered`.
    pub qty_received: u32,
    /// Cost per unit (positive).
    pub unit_cost: Decimal,
    /// Flat discount on the line.
    pub discount_amount: Decimal,
    /// Tax percentage applied after the discount.
    pub tax_percent: Decimal,
    /// Derived line total.
    pub line_total: Decimal,
}

impl PurchaseLine {
    /// Quantity still expected from the supplier.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.qty_ordered - self.qty_received
    }

    /// Returns true when everything ordered has arrived.
    #[must_use]
    pub fn is_fully_received(&self) -> bool {
        self.qty_received == self.qty_ordered
    }
}

/// Immutable payment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasePayment {
    /// Payment ID.
    pub id: PurchasePaymentId,
    /// When the payment was made.
    pub paid_at: DateTime<Utc>,
    /// Payment method label (cash, transfer, ...).
    pub method: String,
    /// Amount paid (positive).
    pub amount: Decimal,
    /// Optional external reference.
    pub reference: Option<String>,
    /// Optional note.
    pub note: Option<String>,
}

/// Purchase entry aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseEntry {
    /// Entry ID.
    pub id: PurchaseEntryId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Billing supplier.
    pub supplier_id: SupplierId,
    /// Human-readable code, unique per tenant.
    pub code: String,
    /// Lifecycle status.
    pub status: PurchaseStatus,
    /// Bill date.
    pub bill_date: NaiveDate,
    /// Payment due date.
    pub due_date: Option<NaiveDate>,
    /// Supplier's reference (invoice number, ...).
    pub reference: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Currency of every amount on the entry.
    pub currency: Currency,
    /// Σ unit cost × quantity ordered.
    pub subtotal: Decimal,
    /// Header-level discount as entered.
    pub header_discount: Decimal,
    /// Header discount plus every line discount.
    pub discount_total: Decimal,
    /// Σ line tax components.
    pub tax_total: Decimal,
    /// Expense charged by the supplier (freight, handling).
    pub supplier_expense: Decimal,
    /// Any other expense attached to the bill.
    pub other_expense: Decimal,
    /// Derived grand total.
    pub grand_total: Decimal,
    /// Σ payments.
    pub amount_paid: Decimal,
    /// Derived amount still owed.
    pub amount_due: Decimal,
    /// Optimistic concurrency version, bumped on every commit.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Ordered lines.
    pub lines: Vec<PurchaseLine>,
    /// Payments in recording order.
    pub payments: Vec<PurchasePayment>,
}

/// Supplier as seen by the engine (identity plus balance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRef {
    /// Supplier ID.
    pub id: SupplierId,
    /// Amount the tenant currently owes the supplier.
    pub outstanding_balance: Decimal,
}

/// Product as seen by the engine (identity plus stock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Product ID.
    pub id: ProductId,
    /// Stock on hand.
    pub on_hand: i64,
}

// ============================================================================
// Inputs
// ============================================================================

/// Input for a new line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineInput {
    /// Ordered product.
    pub product_id: Option<ProductId>,
    /// Free-text description.
    pub description: Option<String>,
    /// Quantity ordered.
    #[serde(default)]
    pub qty_ordered: u32,
    /// Cost per unit; required.
    pub unit_cost: Option<Decimal>,
    /// Flat discount (defaults to zero).
    pub discount_amount: Option<Decimal>,
    /// Tax percentage (defaults to zero).
    pub tax_percent: Option<Decimal>,
}

/// Payment attached to a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentInput {
    /// Amount paid; must be positive.
    pub amount: Decimal,
    /// Method label; defaults to `cash`.
    pub method: Option<String>,
    /// Payment time; defaults to now.
    pub paid_at: Option<DateTime<Utc>>,
    /// Optional external reference.
    pub reference: Option<String>,
    /// Optional note.
    pub note: Option<String>,
}

/// Input for creating a purchase entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePurchaseInput {
    /// Billing supplier.
    pub supplier_id: Option<SupplierId>,
    /// Bill date; defaults to today.
    pub bill_date: Option<NaiveDate>,
    /// Payment due date.
    pub due_date: Option<NaiveDate>,
    /// Supplier's reference.
    pub reference: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Currency; defaults to the configured one.
    pub currency: Option<Currency>,
    /// Header discount.
    pub discount_total: Option<Decimal>,
    /// Supplier expense.
    pub supplier_expense: Option<Decimal>,
    /// Other expense.
    pub other_expense: Option<Decimal>,
    /// Lines; at least one is required.
    #[serde(default)]
    pub lines: Vec<LineInput>,
    /// Payment recorded together with the draft.
    pub initial_payment: Option<PaymentInput>,
}

/// Line in an update request.
///
/// A line whose `id` matches an existing line edits it in place; any other
/// line is appended.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLineInput {
    /// Existing line to edit.
    pub id: Option<PurchaseLineId>,
    /// New product.
    pub product_id: Option<ProductId>,
    /// New description.
    pub description: Option<String>,
    /// New ordered quantity.
    pub qty_ordered: Option<u32>,
    /// New unit cost.
    pub unit_cost: Option<Decimal>,
    /// New discount.
    pub discount_amount: Option<Decimal>,
    /// New tax percentage.
    pub tax_percent: Option<Decimal>,
}

/// Partial update of a purchase entry; only supplied fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePurchaseInput {
    /// New supplier (draft only).
    pub supplier_id: Option<SupplierId>,
    /// New bill date.
    pub bill_date: Option<NaiveDate>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
    /// New reference.
    pub reference: Option<String>,
    /// New notes.
    pub notes: Option<String>,
    /// New currency.
    pub currency: Option<Currency>,
    /// New header discount.
    pub discount_total: Option<Decimal>,
    /// New supplier expense.
    pub supplier_expense: Option<Decimal>,
    /// New other expense.
    pub other_expense: Option<Decimal>,
    /// Lines to edit or append.
    pub lines: Option<Vec<UpdateLineInput>>,
}

/// Input for confirming a draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmPurchaseInput {
    /// Payment made at confirmation.
    pub payment: Option<PaymentInput>,
}

/// Quantity arriving for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLineInput {
    /// Target line.
    pub line_id: PurchaseLineId,
    /// Quantity to add to `qty_received`.
    pub quantity: u32,
}

/// Input for receiving goods.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceivePurchaseInput {
    /// Quantities per line.
    #[serde(default)]
    pub lines: Vec<ReceiptLineInput>,
}

/// Filter for listing purchase entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseFilter {
    /// Substring matched against code, reference and notes.
    pub search: Option<String>,
    /// Filter by status.
    pub status: Option<PurchaseStatus>,
    /// Filter by supplier.
    pub supplier_id: Option<SupplierId>,
    /// Bill date range start (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Bill date range end (inclusive).
    pub date_to: Option<NaiveDate>,
}

impl PurchaseFilter {
    /// Returns the trimmed search term, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns true if the entry satisfies every supplied criterion.
    #[must_use]
    pub fn matches(&self, entry: &PurchaseEntry) -> bool {
        if self.status.is_some_and(|status| entry.status != status) {
            return false;
        }
        if self.supplier_id.is_some_and(|id| entry.supplier_id != id) {
            return false;
        }
        if self.date_from.is_some_and(|from| entry.bill_date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| entry.bill_date > to) {
            return false;
        }
        match self.search_term() {
            Some(term) => [
                Some(entry.code.as_str()),
                entry.reference.as_deref(),
                entry.notes.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.contains(term)),
            None => true,
        }
    }
}

// ============================================================================
// Side effects
// ============================================================================

/// What caused a supplier balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceTrigger {
    /// Entry confirmed; the bill became payable.
    Confirm,
    /// Payment recorded against a payable entry.
    Payment,
    /// Confirmed entry cancelled.
    Cancel,
    /// Confirmed entry edited.
    Update,
}

/// Signed change to a supplier's outstanding balance.
///
/// Stores apply it atomically and floor the resulting balance at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierAdjustment {
    /// Supplier whose balance moves.
    pub supplier_id: SupplierId,
    /// What caused the adjustment.
    pub trigger: BalanceTrigger,
    /// Signed amount.
    pub delta: Decimal,
}

/// Stock arriving for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReceipt {
    /// Product whose stock grows.
    pub product_id: ProductId,
    /// Quantity added to on-hand stock.
    pub quantity: u32,
}

/// Everything one transition writes, applied all-or-nothing by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseChangeSet {
    /// Entry state after the transition (version not yet bumped).
    pub entry: PurchaseEntry,
    /// Version the entry was loaded with; `None` when the entry is new.
    pub expected_version: Option<i64>,
    /// Payments appended by this transition.
    pub new_payments: Vec<PurchasePayment>,
    /// Supplier balance adjustments in the order they occurred.
    pub supplier_adjustments: Vec<SupplierAdjustment>,
    /// Product stock increments.
    pub stock_receipts: Vec<StockReceipt>,
}

impl PurchaseChangeSet {
    /// Change set for an entry that does not exist yet.
    #[must_use]
    pub fn insert(entry: PurchaseEntry) -> Self {
        Self {
            entry,
            expected_version: None,
            new_payments: Vec::new(),
            supplier_adjustments: Vec::new(),
            stock_receipts: Vec::new(),
        }
    }

    /// Change set for an entry loaded at `version`.
    #[must_use]
    pub fn update(entry: PurchaseEntry) -> Self {
        let expected_version = Some(entry.version);
        Self {
            entry,
            expected_version,
            new_payments: Vec::new(),
            supplier_adjustments: Vec::new(),
            stock_receipts: Vec::new(),
        }
    }

    /// Net signed change to the supplier balance.
    #[must_use]
    pub fn net_supplier_delta(&self) -> Decimal {
        self.supplier_adjustments.iter().map(|a| a.delta).sum()
    }
}
