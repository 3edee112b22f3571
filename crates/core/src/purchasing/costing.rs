//! Line costing.
//!
//! Costing uses the ordered quantity: it reflects what is billed, while
//! receiving tracks physical arrival separately.

use rust_decimal::Decimal;

use procura_shared::types::{floor_at_zero, round_money};

/// Cost breakdown of a single line, every amount rounded to two digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCost {
    /// Unit cost × quantity ordered.
    pub gross: Decimal,
    /// Gross minus discount, floored at zero.
    pub net: Decimal,
    /// Tax on the net amount.
    pub tax: Decimal,
    /// Net plus tax.
    pub total: Decimal,
}

/// Stateless line costing.
pub struct LineCosting;

impl LineCosting {
    /// Computes the cost breakdown of a line.
    ///
    /// `total = round2(max(0, unit_cost × qty − discount) × (1 + tax_percent / 100))`
    /// with half-up rounding. The tax component is `total − net` so the
    /// three amounts always add up.
    #[must_use]
    pub fn cost(
        unit_cost: Decimal,
        qty_ordered: u32,
        discount_amount: Decimal,
        tax_percent: Decimal,
    ) -> LineCost {
        let raw_gross = unit_cost * Decimal::from(qty_ordered);
        let raw_net = floor_at_zero(raw_gross - discount_amount);
        let total =
            round_money(raw_net * (Decimal::ONE + tax_percent / Decimal::ONE_HUNDRED));
        let net = round_money(raw_net);

        LineCost {
            gross: round_money(raw_gross),
            net,
            tax: total - net,
            total,
        }
    }

    /// Computes only the line total.
    #[must_use]
    pub fn line_total(
        unit_cost: Decimal,
        qty_ordered: u32,
        discount_amount: Decimal,
        tax_percent: Decimal,
    ) -> Decimal {
        Self::cost(unit_cost, qty_ordered, discount_amount, tax_percent).total
    }
}
