//! Purchase entry aggregate behaviour.
//!
//! Lines and payments are only changed through these methods so the derived
//! totals are re-computed whenever something cost-relevant moves.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use procura_shared::types::{
    Currency, MONEY_SCALE, PurchaseEntryId, PurchaseLineId, SupplierId, TenantId, round_money,
};

use super::balance::SupplierBalanceReconciler;
use super::costing::LineCosting;
use super::error::PurchaseError;
use super::totals::{HeaderCharges, TotalsAggregator};
use super::types::{
    CreatePurchaseInput, LineInput, PurchaseEntry, PurchaseLine, PurchaseStatus,
    SupplierAdjustment, UpdateLineInput, UpdatePurchaseInput,
};

// ============================================================================
// Field validation
// ============================================================================

/// Fraction digits kept on a line tax percentage.
const TAX_PERCENT_SCALE: u32 = 4;

/// Rounds a money input to cents; the sign check runs on the stored value.
fn non_negative(field: &'static str, value: Option<Decimal>) -> Result<Decimal, PurchaseError> {
    let value = round_money(value.unwrap_or(Decimal::ZERO));
    if value < Decimal::ZERO {
        return Err(PurchaseError::NegativeAmount { field, value });
    }
    Ok(value)
}

fn non_negative_percent(
    field: &'static str,
    value: Option<Decimal>,
) -> Result<Decimal, PurchaseError> {
    let value = value
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(TAX_PERCENT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if value < Decimal::ZERO {
        return Err(PurchaseError::NegativeAmount { field, value });
    }
    Ok(value)
}

/// Rejects unit costs that round to zero cents.
fn positive_unit_cost(unit_cost: Decimal) -> Result<Decimal, PurchaseError> {
    let unit_cost = round_money(unit_cost);
    if unit_cost <= Decimal::ZERO {
        return Err(PurchaseError::NonPositiveUnitCost(unit_cost));
    }
    Ok(unit_cost)
}

fn positive_quantity(index: usize, qty: u32) -> Result<u32, PurchaseError> {
    if qty == 0 {
        return Err(PurchaseError::ZeroQuantity { index });
    }
    Ok(qty)
}

impl LineInput {
    /// Validates the line and builds it with its cost computed.
    pub fn into_line(self, index: usize) -> Result<PurchaseLine, PurchaseError> {
        let product_id = self
            .product_id
            .ok_or(PurchaseError::MissingProduct { index })?;
        let unit_cost = self
            .unit_cost
            .ok_or(PurchaseError::MissingUnitCost { index })
            .and_then(positive_unit_cost)?;
        let qty_ordered = positive_quantity(index, self.qty_ordered)?;
        let discount_amount = non_negative("discount_amount", self.discount_amount)?;
        let tax_percent = non_negative_percent("tax_percent", self.tax_percent)?;

        Ok(PurchaseLine {
            id: PurchaseLineId::new(),
            product_id,
            description: self.description,
            qty_ordered,
            qty_received: 0,
            unit_cost,
            discount_amount,
            tax_percent,
            line_total: LineCosting::line_total(
                unit_cost,
                qty_ordered,
                discount_amount,
                tax_percent,
            ),
        })
    }
}

impl CreatePurchaseInput {
    /// Checks the request shape without touching any collaborator.
    pub fn validate(&self) -> Result<SupplierId, PurchaseError> {
        let supplier_id = self.supplier_id.ok_or(PurchaseError::SupplierRequired)?;
        if self.lines.is_empty() {
            return Err(PurchaseError::NoLines);
        }
        for (index, line) in self.lines.iter().enumerate() {
            line.clone().into_line(index)?;
        }
        non_negative("discount_total", self.discount_total)?;
        non_negative("supplier_expense", self.supplier_expense)?;
        non_negative("other_expense", self.other_expense)?;
        Ok(supplier_id)
    }
}

impl UpdateLineInput {
    fn apply_to(&self, index: usize, line: &mut PurchaseLine) -> Result<(), PurchaseError> {
        if let Some(product_id) = self.product_id {
            line.product_id = product_id;
        }
        if let Some(description) = &self.description {
            line.description = Some(description.clone());
        }
        if let Some(qty) = self.qty_ordered {
            line.qty_ordered = positive_quantity(index, qty)?;
        }
        if let Some(unit_cost) = self.unit_cost {
            line.unit_cost = positive_unit_cost(unit_cost)?;
        }
        if self.discount_amount.is_some() {
            line.discount_amount = non_negative("discount_amount", self.discount_amount)?;
        }
        if self.tax_percent.is_some() {
            line.tax_percent = non_negative_percent("tax_percent", self.tax_percent)?;
        }
        line.line_total = LineCosting::line_total(
            line.unit_cost,
            line.qty_ordered,
            line.discount_amount,
            line.tax_percent,
        );
        Ok(())
    }

    fn into_new_line(self, index: usize) -> Result<PurchaseLine, PurchaseError> {
        LineInput {
            product_id: self.product_id,
            description: self.description,
            qty_ordered: self.qty_ordered.unwrap_or(0),
            unit_cost: self.unit_cost,
            discount_amount: self.discount_amount,
            tax_percent: self.tax_percent,
        }
        .into_line(index)
    }
}

// ============================================================================
// Aggregate
// ============================================================================

impl PurchaseEntry {
    /// Builds a new draft from a create request.
    ///
    /// The initial payment, if any, is recorded separately through the
    /// payment ledger.
    pub fn draft(
        tenant_id: TenantId,
        code: String,
        input: CreatePurchaseInput,
        default_currency: Currency,
        now: DateTime<Utc>,
    ) -> Result<Self, PurchaseError> {
        let supplier_id = input.validate()?;
        let lines = input
            .lines
            .into_iter()
            .enumerate()
            .map(|(index, line)| line.into_line(index))
            .collect::<Result<Vec<_>, _>>()?;

        let mut entry = Self {
            id: PurchaseEntryId::new(),
            tenant_id,
            supplier_id,
            code,
            status: PurchaseStatus::Draft,
            bill_date: input.bill_date.unwrap_or_else(|| now.date_naive()),
            due_date: input.due_date,
            reference: input.reference,
            notes: input.notes,
            currency: input.currency.unwrap_or(default_currency),
            subtotal: Decimal::ZERO,
            header_discount: non_negative("discount_total", input.discount_total)?,
            discount_total: Decimal::ZERO,
            tax_total: Decimal::ZERO,
            supplier_expense: non_negative("supplier_expense", input.supplier_expense)?,
            other_expense: non_negative("other_expense", input.other_expense)?,
            grand_total: Decimal::ZERO,
            amount_paid: Decimal::new(0, MONEY_SCALE),
            amount_due: Decimal::ZERO,
            version: 0,
            created_at: now,
            updated_at: now,
            lines,
            payments: Vec::new(),
        };
        entry.recompute_totals();
        Ok(entry)
    }

    /// Header charges as currently entered.
    #[must_use]
    pub fn header_charges(&self) -> HeaderCharges {
        HeaderCharges {
            discount: self.header_discount,
            supplier_expense: self.supplier_expense,
            other_expense: self.other_expense,
        }
    }

    /// Re-derives every line total and the entry totals.
    pub fn recompute_totals(&mut self) {
        for line in &mut self.lines {
            line.line_total = LineCosting::line_total(
                line.unit_cost,
                line.qty_ordered,
                line.discount_amount,
                line.tax_percent,
            );
        }
        let totals =
            TotalsAggregator::aggregate(&self.lines, self.header_charges(), self.amount_paid);
        self.subtotal = totals.subtotal;
        self.discount_total = totals.discount_total;
        self.tax_total = totals.tax_total;
        self.grand_total = totals.grand_total;
        self.amount_due = totals.amount_due;
    }

    /// Returns true once any quantity has been received.
    #[must_use]
    pub fn has_receipts(&self) -> bool {
        self.lines.iter().any(|line| line.qty_received > 0)
    }

    /// Status implied by the received quantities.
    #[must_use]
    pub fn receipt_status(&self) -> PurchaseStatus {
        if self.lines.iter().all(PurchaseLine::is_fully_received) {
            PurchaseStatus::Received
        } else {
            PurchaseStatus::PartiallyReceived
        }
    }

    /// Fails unless the entry can still be edited.
    pub fn ensure_editable(&self) -> Result<(), PurchaseError> {
        match self.status {
            PurchaseStatus::Received | PurchaseStatus::Cancelled => {
                Err(PurchaseError::NotEditable(self.status))
            }
            PurchaseStatus::PartiallyReceived => Err(PurchaseError::ReceiptsRecorded),
            PurchaseStatus::Draft | PurchaseStatus::Confirmed if self.has_receipts() => {
                Err(PurchaseError::ReceiptsRecorded)
            }
            PurchaseStatus::Draft | PurchaseStatus::Confirmed => Ok(()),
        }
    }

    /// Applies a partial update.
    ///
    /// Lines are matched by id; request lines without a matching id are
    /// appended. Nothing changes if any check fails.
    pub fn apply_update(
        &mut self,
        input: UpdatePurchaseInput,
        now: DateTime<Utc>,
    ) -> Result<Option<SupplierAdjustment>, PurchaseError> {
        self.ensure_editable()?;

        let mut next = self.clone();

        if let Some(supplier_id) = input.supplier_id
            && supplier_id != self.supplier_id
        {
            if self.status != PurchaseStatus::Draft {
                return Err(PurchaseError::SupplierLocked);
            }
            next.supplier_id = supplier_id;
        }

        if let Some(bill_date) = input.bill_date {
            next.bill_date = bill_date;
        }
        if input.due_date.is_some() {
            next.due_date = input.due_date;
        }
        if input.reference.is_some() {
            next.reference = input.reference;
        }
        if input.notes.is_some() {
            next.notes = input.notes;
        }
        if let Some(currency) = input.currency {
            next.currency = currency;
        }
        if input.discount_total.is_some() {
            next.header_discount = non_negative("discount_total", input.discount_total)?;
        }
        if input.supplier_expense.is_some() {
            next.supplier_expense = non_negative("supplier_expense", input.supplier_expense)?;
        }
        if input.other_expense.is_some() {
            next.other_expense = non_negative("other_expense", input.other_expense)?;
        }

        for (index, line_input) in input.lines.into_iter().flatten().enumerate() {
            let existing = line_input
                .id
                .and_then(|id| next.lines.iter().position(|line| line.id == id));
            match existing {
                Some(position) => line_input.apply_to(index, &mut next.lines[position])?,
                None => next.lines.push(line_input.into_new_line(index)?),
            }
        }

        next.recompute_totals();
        if next.grand_total < next.amount_paid {
            return Err(PurchaseError::PaidExceedsTotal {
                grand_total: next.grand_total,
                amount_paid: next.amount_paid,
            });
        }

        let adjustment = SupplierBalanceReconciler::on_update(
            next.supplier_id,
            next.status,
            self.amount_due,
            next.amount_due,
        );
        next.updated_at = now;
        *self = next;
        Ok(adjustment)
    }

    /// Moves a draft to confirmed, making its amount due payable.
    pub fn confirm(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<SupplierAdjustment>, PurchaseError> {
        if self.status != PurchaseStatus::Draft {
            return Err(PurchaseError::InvalidTransition {
                from: self.status,
                to: PurchaseStatus::Confirmed,
            });
        }

        self.recompute_totals();
        self.status = PurchaseStatus::Confirmed;
        self.updated_at = now;
        Ok(SupplierBalanceReconciler::on_confirm(
            self.supplier_id,
            self.amount_due,
        ))
    }

    /// Cancels a draft or confirmed entry and zeroes its amount due.
    pub fn cancel(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<SupplierAdjustment>, PurchaseError> {
        if self.has_receipts() {
            return Err(PurchaseError::ReceiptsRecorded);
        }
        let previous = self.status;
        if !matches!(previous, PurchaseStatus::Draft | PurchaseStatus::Confirmed) {
            return Err(PurchaseError::InvalidTransition {
                from: previous,
                to: PurchaseStatus::Cancelled,
            });
        }

        let adjustment =
            SupplierBalanceReconciler::on_cancel(self.supplier_id, previous, self.amount_due);
        self.status = PurchaseStatus::Cancelled;
        self.amount_due = Decimal::new(0, MONEY_SCALE);
        self.updated_at = now;
        Ok(adjustment)
    }
}
