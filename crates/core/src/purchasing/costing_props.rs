//! Property-based tests for line costing.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::costing::LineCosting;

/// Strategy to generate unit costs (0.01 to 10,000.00).
fn unit_cost() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate flat discounts (0.00 to 5,000.00).
fn discount() -> impl Strategy<Value = Decimal> {
    (0i64..500_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate tax percentages (0.0000 to 30.0000).
fn tax_percent() -> impl Strategy<Value = Decimal> {
    (0i64..300_000i64).prop_map(|v| Decimal::new(v, 4))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every amount is non-negative and carries at most two fraction digits.
    #[test]
    fn prop_amounts_are_non_negative_cents(
        cost in unit_cost(),
        qty in 1u32..1_000,
        disc in discount(),
        tax in tax_percent(),
    ) {
        let line = LineCosting::cost(cost, qty, disc, tax);
        for amount in [line.gross, line.net, line.tax, line.total] {
            prop_assert!(amount >= Decimal::ZERO);
            prop_assert_eq!(amount, amount.round_dp(2));
        }
    }

    /// Net plus tax always equals the total.
    #[test]
    fn prop_components_add_up(
        cost in unit_cost(),
        qty in 1u32..1_000,
        disc in discount(),
        tax in tax_percent(),
    ) {
        let line = LineCosting::cost(cost, qty, disc, tax);
        prop_assert_eq!(line.net + line.tax, line.total);
        prop_assert!(line.net <= line.gross);
    }

    /// Without discount or tax the total is exactly cost times quantity.
    #[test]
    fn prop_plain_line_is_cost_times_quantity(
        cost in unit_cost(),
        qty in 1u32..1_000,
    ) {
        let total = LineCosting::line_total(cost, qty, Decimal::ZERO, Decimal::ZERO);
        prop_assert_eq!(total, cost * Decimal::from(qty));
    }

    /// A larger discount never yields a larger total.
    #[test]
    fn prop_discount_is_monotonic(
        cost in unit_cost(),
        qty in 1u32..100,
        a in discount(),
        b in discount(),
        tax in tax_percent(),
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            LineCosting::line_total(cost, qty, high, tax)
                <= LineCosting::line_total(cost, qty, low, tax)
        );
    }
}
