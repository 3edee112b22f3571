//! Payment ledger.
//!
//! Payments are append-only. Recording one raises `amount_paid`, re-derives
//! `amount_due` and, once the entry is payable, lowers the supplier balance.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use procura_shared::types::{PurchasePaymentId, round_money};

use super::balance::SupplierBalanceReconciler;
use super::error::PurchaseError;
use super::totals::TotalsAggregator;
use super::types::{
    PaymentInput, PurchaseChangeSet, PurchaseEntry, PurchasePayment, PurchaseStatus,
    SupplierAdjustment,
};

/// Method label used when a payment does not name one.
pub const DEFAULT_PAYMENT_METHOD: &str = "cash";

/// Outcome of recording a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPayment {
    /// The appended payment.
    pub payment: PurchasePayment,
    /// Supplier balance change, if the entry is payable.
    pub adjustment: Option<SupplierAdjustment>,
}

/// Stateless payment ledger.
pub struct PaymentLedger;

impl PaymentLedger {
    /// Validates a payment request against an entry status.
    pub fn validate(status: PurchaseStatus, input: &PaymentInput) -> Result<(), PurchaseError> {
        if status == PurchaseStatus::Cancelled {
            return Err(PurchaseError::PaymentOnCancelled);
        }
        if round_money(input.amount) <= Decimal::ZERO {
            return Err(PurchaseError::NonPositivePayment(input.amount));
        }
        Ok(())
    }

    /// Appends a payment to the entry.
    pub fn record(
        entry: &mut PurchaseEntry,
        input: PaymentInput,
        now: DateTime<Utc>,
    ) -> Result<RecordedPayment, PurchaseError> {
        Self::validate(entry.status, &input)?;

        let amount = round_money(input.amount);
        let payment = PurchasePayment {
            id: PurchasePaymentId::new(),
            paid_at: input.paid_at.unwrap_or(now),
            method: input
                .method
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            amount,
            reference: input.reference,
            note: input.note,
        };

        entry.amount_paid += amount;
        entry.amount_due = TotalsAggregator::amount_due(entry.grand_total, entry.amount_paid);
        entry.payments.push(payment.clone());
        entry.updated_at = now;

        let adjustment =
            SupplierBalanceReconciler::on_payment(entry.supplier_id, entry.status, amount);

        Ok(RecordedPayment {
            payment,
            adjustment,
        })
    }
}

impl PurchaseChangeSet {
    /// Records a payment on the entry and queues its writes.
    pub fn record_payment(
        &mut self,
        input: PaymentInput,
        now: DateTime<Utc>,
    ) -> Result<(), PurchaseError> {
        let recorded = PaymentLedger::record(&mut self.entry, input, now)?;
        self.new_payments.push(recorded.payment);
        self.supplier_adjustments.extend(recorded.adjustment);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purchasing::types::BalanceTrigger;
    use chrono::NaiveDate;
    use procura_shared::types::{Currency, PurchaseEntryId, SupplierId, TenantId};
    use rust_decimal_macros::dec;

    fn entry(status: PurchaseStatus, grand_total: Decimal) -> PurchaseEntry {
        let now = Utc::now();
        PurchaseEntry {
            id: PurchaseEntryId::new(),
            tenant_id: TenantId::new(),
            supplier_id: SupplierId::new(),
            code: "PUR-000001".to_string(),
            status,
            bill_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            due_date: None,
            reference: None,
            notes: None,
            currency: Currency::Usd,
            subtotal: grand_total,
            header_discount: Decimal::ZERO,
            discount_total: Decimal::ZERO,
            tax_total: Decimal::ZERO,
            supplier_expense: Decimal::ZERO,
            other_expense: Decimal::ZERO,
            grand_total,
            amount_paid: Decimal::ZERO,
            amount_due: grand_total,
            version: 1,
            created_at: now,
            updated_at: now,
            lines: vec![],
            payments: vec![],
        }
    }

    fn pay(amount: Decimal) -> PaymentInput {
        PaymentInput {
            amount,
            ..Default::default()
        }
    }

    #[test]
    fn test_payment_on_confirmed_entry() {
        let mut e = entry(PurchaseStatus::Confirmed, dec!(1000.00));
        let recorded = PaymentLedger::record(&mut e, pay(dec!(400.00)), Utc::now()).unwrap();

        assert_eq!(e.amount_paid, dec!(400.00));
        assert_eq!(e.amount_due, dec!(600.00));
        assert_eq!(e.payments.len(), 1);
        assert_eq!(recorded.payment.method, DEFAULT_PAYMENT_METHOD);

        let adj = recorded.adjustment.unwrap();
        assert_eq!(adj.trigger, BalanceTrigger::Payment);
        assert_eq!(adj.delta, dec!(-400.00));
    }

    #[test]
    fn test_payment_on_draft_leaves_supplier_alone() {
        let mut e = entry(PurchaseStatus::Draft, dec!(1000.00));
        let recorded = PaymentLedger::record(&mut e, pay(dec!(250.00)), Utc::now()).unwrap();

        assert_eq!(e.amount_due, dec!(750.00));
        assert!(recorded.adjustment.is_none());
    }

    #[test]
    fn test_overpayment_floors_amount_due() {
        let mut e = entry(PurchaseStatus::Received, dec!(100.00));
        let recorded = PaymentLedger::record(&mut e, pay(dec!(150.00)), Utc::now()).unwrap();

        assert_eq!(e.amount_paid, dec!(150.00));
        assert_eq!(e.amount_due, Decimal::ZERO);
        assert_eq!(recorded.adjustment.unwrap().delta, dec!(-150.00));
    }

    #[test]
    fn test_rejects_cancelled_entry() {
        let mut e = entry(PurchaseStatus::Cancelled, dec!(100.00));
        let before = e.clone();
        let err = PaymentLedger::record(&mut e, pay(dec!(10.00)), Utc::now()).unwrap_err();

        assert!(matches!(err, PurchaseError::PaymentOnCancelled));
        assert_eq!(e, before);
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let mut e = entry(PurchaseStatus::Confirmed, dec!(100.00));
        let before = e.clone();

        for amount in [dec!(0), dec!(-5.00)] {
            let err = PaymentLedger::record(&mut e, pay(amount), Utc::now()).unwrap_err();
            assert!(matches!(err, PurchaseError::NonPositivePayment(_)));
        }
        assert_eq!(e, before);
    }

    #[test]
    fn test_keeps_supplied_details() {
        let mut e = entry(PurchaseStatus::Confirmed, dec!(100.00));
        let paid_at = Utc::now() - chrono::Duration::days(2);
        let input = PaymentInput {
            amount: dec!(20.005),
            method: Some(" transfer ".to_string()),
            paid_at: Some(paid_at),
            reference: Some("TRX-1".to_string()),
            note: None,
        };
        let recorded = PaymentLedger::record(&mut e, input, Utc::now()).unwrap();

        assert_eq!(recorded.payment.amount, dec!(20.01));
        assert_eq!(recorded.payment.method, "transfer");
        assert_eq!(recorded.payment.paid_at, paid_at);
        assert_eq!(recorded.payment.reference.as_deref(), Some("TRX-1"));
    }
}
