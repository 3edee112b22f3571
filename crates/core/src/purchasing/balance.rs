//! Supplier balance reconciliation.
//!
//! The supplier's outstanding balance only moves through four triggers:
//! - confirm: `+= amount_due`
//! - payment on a payable entry: `-= amount`
//! - cancel of a confirmed entry with something due: `-= amount_due`
//! - update of a confirmed entry: `+= new_due - old_due`
//!
//! Every adjustment is applied with the resulting balance floored at zero.

use rust_decimal::Decimal;

use procura_shared::types::{SupplierId, floor_at_zero, round_money};

use super::types::{BalanceTrigger, PurchaseStatus, SupplierAdjustment};

/// Stateless supplier balance reconciler.
pub struct SupplierBalanceReconciler;

impl SupplierBalanceReconciler {
    /// Adjustment when a draft is confirmed.
    #[must_use]
    pub fn on_confirm(supplier_id: SupplierId, amount_due: Decimal) -> Option<SupplierAdjustment> {
        Self::adjustment(supplier_id, BalanceTrigger::Confirm, amount_due)
    }

    /// Adjustment when a payment is recorded.
    ///
    /// Drafts are not payable yet, so paying one leaves the supplier untouched.
    #[must_use]
    pub fn on_payment(
        supplier_id: SupplierId,
        status: PurchaseStatus,
        amount: Decimal,
    ) -> Option<SupplierAdjustment> {
        if !status.is_payable() {
            return None;
        }
        Self::adjustment(supplier_id, BalanceTrigger::Payment, -amount)
    }

    /// Adjustment when an entry is cancelled from `previous` status.
    #[must_use]
    pub fn on_cancel(
        supplier_id: SupplierId,
        previous: PurchaseStatus,
        amount_due: Decimal,
    ) -> Option<SupplierAdjustment> {
        if previous != PurchaseStatus::Confirmed || amount_due <= Decimal::ZERO {
            return None;
        }
        Self::adjustment(supplier_id, BalanceTrigger::Cancel, -amount_due)
    }

    /// Adjustment when an entry in `status` is edited.
    #[must_use]
    pub fn on_update(
        supplier_id: SupplierId,
        status: PurchaseStatus,
        old_due: Decimal,
        new_due: Decimal,
    ) -> Option<SupplierAdjustment> {
        if status != PurchaseStatus::Confirmed {
            return None;
        }
        Self::adjustment(supplier_id, BalanceTrigger::Update, new_due - old_due)
    }

    /// Applies a signed delta to a balance, flooring the result at zero.
    #[must_use]
    pub fn apply(balance: Decimal, delta: Decimal) -> Decimal {
        round_money(floor_at_zero(balance + delta))
    }

    fn adjustment(
        supplier_id: SupplierId,
        trigger: BalanceTrigger,
        delta: Decimal,
    ) -> Option<SupplierAdjustment> {
        if delta.is_zero() {
            return None;
        }
        Some(SupplierAdjustment {
            supplier_id,
            trigger,
            delta: round_money(delta),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_confirm_adds_amount_due() {
        let supplier = SupplierId::new();
        let adj = SupplierBalanceReconciler::on_confirm(supplier, dec!(1000.00)).unwrap();
        assert_eq!(adj.trigger, BalanceTrigger::Confirm);
        assert_eq!(adj.delta, dec!(1000.00));
        assert_eq!(adj.supplier_id, supplier);
    }

    #[test]
    fn test_confirm_with_nothing_due_is_noop() {
        assert!(SupplierBalanceReconciler::on_confirm(SupplierId::new(), Decimal::ZERO).is_none());
    }

    #[test]
    fn test_payment_only_on_payable_entries() {
        let supplier = SupplierId::new();
        assert!(
            SupplierBalanceReconciler::on_payment(supplier, PurchaseStatus::Draft, dec!(50))
                .is_none()
        );

        for status in [
            PurchaseStatus::Confirmed,
            PurchaseStatus::PartiallyReceived,
            PurchaseStatus::Received,
        ] {
            let adj = SupplierBalanceReconciler::on_payment(supplier, status, dec!(400.00)).unwrap();
            assert_eq!(adj.delta, dec!(-400.00));
            assert_eq!(adj.trigger, BalanceTrigger::Payment);
        }
    }

    #[test]
    fn test_cancel_reverses_only_confirmed_amount_due() {
        let supplier = SupplierId::new();
        let adj =
            SupplierBalanceReconciler::on_cancel(supplier, PurchaseStatus::Confirmed, dec!(1000.00))
                .unwrap();
        assert_eq!(adj.delta, dec!(-1000.00));

        assert!(
            SupplierBalanceReconciler::on_cancel(supplier, PurchaseStatus::Draft, dec!(1000.00))
                .is_none()
        );
        assert!(
            SupplierBalanceReconciler::on_cancel(supplier, PurchaseStatus::Confirmed, dec!(0))
                .is_none()
        );
    }

    #[test]
    fn test_update_applies_signed_delta() {
        let supplier = SupplierId::new();
        let up = SupplierBalanceReconciler::on_update(
            supplier,
            PurchaseStatus::Confirmed,
            dec!(600.00),
            dec!(750.00),
        )
        .unwrap();
        assert_eq!(up.delta, dec!(150.00));

        let down = SupplierBalanceReconciler::on_update(
            supplier,
            PurchaseStatus::Confirmed,
            dec!(600.00),
            dec!(100.00),
        )
        .unwrap();
        assert_eq!(down.delta, dec!(-500.00));

        assert!(
            SupplierBalanceReconciler::on_update(
                supplier,
                PurchaseStatus::Draft,
                dec!(600.00),
                dec!(100.00),
            )
            .is_none()
        );
    }

    #[test]
    fn test_apply_floors_at_zero() {
        assert_eq!(
            SupplierBalanceReconciler::apply(dec!(300.00), dec!(-400.00)),
            Decimal::ZERO
        );
        assert_eq!(
            SupplierBalanceReconciler::apply(dec!(300.00), dec!(-100.00)),
            dec!(200.00)
        );
        assert_eq!(
            SupplierBalanceReconciler::apply(Decimal::ZERO, dec!(1000.00)),
            dec!(1000.00)
        );
    }
}
