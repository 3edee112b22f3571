//! Entry totals aggregation.

use rust_decimal::Decimal;

use procura_shared::types::{floor_at_zero, round_money};

use super::costing::LineCosting;
use super::types::PurchaseLine;

/// Header-level financial fields entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderCharges {
    /// Header discount (added to line discounts, not layered on them).
    pub discount: Decimal,
    /// Supplier expense.
    pub supplier_expense: Decimal,
    /// Other expense.
    pub other_expense: Decimal,
}

/// Derived totals of a purchase entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTotals {
    /// Σ unit cost × quantity ordered.
    pub subtotal: Decimal,
    /// Header discount + Σ line discounts.
    pub discount_total: Decimal,
    /// Σ line tax components.
    pub tax_total: Decimal,
    /// `max(0, subtotal − discount_total + tax_total + supplier_expense + other_expense)`.
    pub grand_total: Decimal,
    /// `max(0, grand_total − amount_paid)`.
    pub amount_due: Decimal,
}

/// Stateless totals aggregator.
pub struct TotalsAggregator;

impl TotalsAggregator {
    /// Folds lines and header charges into entry totals.
    #[must_use]
    pub fn aggregate(
        lines: &[PurchaseLine],
        header: HeaderCharges,
        amount_paid: Decimal,
    ) -> EntryTotals {
        let mut subtotal = Decimal::ZERO;
        let mut line_discounts = Decimal::ZERO;
        let mut tax_total = Decimal::ZERO;

        for line in lines {
            let cost = LineCosting::cost(
                line.unit_cost,
                line.qty_ordered,
                line.discount_amount,
                line.tax_percent,
            );
            subtotal += cost.gross;
            line_discounts += line.discount_amount;
            tax_total += cost.tax;
        }

        let subtotal = round_money(subtotal);
        let tax_total = round_money(tax_total);
        let discount_total = round_money(header.discount + line_discounts);
        let grand_total = Self::grand_total(
            subtotal,
            discount_total,
            tax_total,
            header.supplier_expense,
            header.other_expense,
        );

        EntryTotals {
            subtotal,
            discount_total,
            tax_total,
            grand_total,
            amount_due: Self::amount_due(grand_total, amount_paid),
        }
    }

    /// Grand total from its components, floored at zero.
    #[must_use]
    pub fn grand_total(
        subtotal: Decimal,
        discount_total: Decimal,
        tax_total: Decimal,
        supplier_expense: Decimal,
        other_expense: Decimal,
    ) -> Decimal {
        round_money(floor_at_zero(
            subtotal - discount_total + tax_total + supplier_expense + other_expense,
        ))
    }

    /// Amount still owed, floored at zero.
    #[must_use]
    pub fn amount_due(grand_total: Decimal, amount_paid: Decimal) -> Decimal {
        round_money(floor_at_zero(grand_total - amount_paid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procura_shared::types::{ProductId, PurchaseLineId};
    use rust_decimal_macros::dec;

    fn line(unit_cost: Decimal, qty: u32, discount: Decimal, tax: Decimal) -> PurchaseLine {
        PurchaseLine {
            id: PurchaseLineId::new(),
            product_id: ProductId::new(),
            description: None,
            qty_ordered: qty,
            qty_received: 0,
            unit_cost,
            discount_amount: discount,
            tax_percent: tax,
            line_total: LineCosting::line_total(unit_cost, qty, discount, tax),
        }
    }

    #[test]
    fn test_single_line_without_extras() {
        let lines = vec![line(dec!(100.00), 10, dec!(0), dec!(0))];
        let totals = TotalsAggregator::aggregate(&lines, HeaderCharges::default(), dec!(0));

        assert_eq!(totals.subtotal, dec!(1000.00));
        assert_eq!(totals.discount_total, dec!(0));
        assert_eq!(totals.tax_total, dec!(0));
        assert_eq!(totals.grand_total, dec!(1000.00));
        assert_eq!(totals.amount_due, dec!(1000.00));
    }

    #[test]
    fn test_header_and_line_discounts_are_additive() {
        let lines = vec![
            line(dec!(50.00), 4, dec!(20.00), dec!(10)),
            line(dec!(10.00), 5, dec!(0), dec!(0)),
        ];
        let header = HeaderCharges {
            discount: dec!(15.00),
            supplier_expense: dec!(12.50),
            other_expense: dec!(2.50),
        };
        let totals = TotalsAggregator::aggregate(&lines, header, dec!(100.00));

        // subtotal 200 + 50, discounts 20 + 15, tax 10% of 180
        assert_eq!(totals.subtotal, dec!(250.00));
        assert_eq!(totals.discount_total, dec!(35.00));
        assert_eq!(totals.tax_total, dec!(18.00));
        assert_eq!(totals.grand_total, dec!(248.00));
        assert_eq!(totals.amount_due, dec!(148.00));
    }

    #[test]
    fn test_grand_total_floors_at_zero() {
        let lines = vec![line(dec!(10.00), 1, dec!(0), dec!(0))];
        let header = HeaderCharges {
            discount: dec!(50.00),
            ..HeaderCharges::default()
        };
        let totals = TotalsAggregator::aggregate(&lines, header, dec!(0));
        assert_eq!(totals.grand_total, Decimal::ZERO);
        assert_eq!(totals.amount_due, Decimal::ZERO);
        assert_eq!(totals.grand_total.to_string(), "0.00");
        assert_eq!(totals.amount_due.to_string(), "0.00");
    }

    #[test]
    fn test_empty_entry_totals_carry_two_digits() {
        let totals = TotalsAggregator::aggregate(&[], HeaderCharges::default(), dec!(0));
        assert_eq!(totals.subtotal.to_string(), "0.00");
        assert_eq!(totals.tax_total.to_string(), "0.00");
        assert_eq!(totals.discount_total.to_string(), "0.00");
        assert_eq!(totals.grand_total.to_string(), "0.00");
    }

    #[test]
    fn test_overpayment_leaves_nothing_due() {
        assert_eq!(
            TotalsAggregator::amount_due(dec!(100.00), dec!(120.00)).to_string(),
            "0.00"
        );
        assert_eq!(
            TotalsAggregator::amount_due(dec!(100.00), dec!(40.00)),
            dec!(60.00)
        );
    }
}
