//! Property-based tests for entry totals and supplier balance deltas.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use procura_shared::types::{Currency, ProductId, SupplierId, TenantId};

use super::totals::TotalsAggregator;
use super::types::{CreatePurchaseInput, LineInput, PaymentInput, PurchaseEntry};

/// Strategy to generate money amounts (0.00 to 10,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a valid line.
fn line() -> impl Strategy<Value = LineInput> {
    (1i64..100_000i64, 1u32..50, 0i64..50_000i64, 0i64..250_000i64).prop_map(
        |(cost, qty, disc, tax)| LineInput {
            product_id: Some(ProductId::new()),
            description: None,
            qty_ordered: qty,
            unit_cost: Some(Decimal::new(cost, 2)),
            discount_amount: Some(Decimal::new(disc, 2)),
            tax_percent: Some(Decimal::new(tax, 4)),
        },
    )
}

fn draft(
    lines: Vec<LineInput>,
    header_discount: Decimal,
    supplier_expense: Decimal,
    other_expense: Decimal,
) -> PurchaseEntry {
    let input = CreatePurchaseInput {
        supplier_id: Some(SupplierId::new()),
        discount_total: Some(header_discount),
        supplier_expense: Some(supplier_expense),
        other_expense: Some(other_expense),
        lines,
        ..Default::default()
    };
    PurchaseEntry::draft(
        TenantId::new(),
        "PUR-000001".to_string(),
        input,
        Currency::Usd,
        Utc::now(),
    )
    .unwrap()
}

fn assert_totals_invariant(entry: &PurchaseEntry) -> Result<(), TestCaseError> {
    let expected_grand = (entry.subtotal - entry.discount_total
        + entry.tax_total
        + entry.supplier_expense
        + entry.other_expense)
        .max(Decimal::ZERO);
    prop_assert_eq!(entry.grand_total, expected_grand);
    prop_assert_eq!(
        entry.amount_due,
        (entry.grand_total - entry.amount_paid).max(Decimal::ZERO)
    );
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Grand total and amount due follow their formulas after creation.
    #[test]
    fn prop_draft_satisfies_totals_invariant(
        lines in prop::collection::vec(line(), 1..8),
        header in amount(),
        supplier_expense in amount(),
        other_expense in amount(),
    ) {
        let entry = draft(lines, header, supplier_expense, other_expense);
        assert_totals_invariant(&entry)?;
    }

    /// Discount total is the header discount plus every line discount.
    #[test]
    fn prop_discounts_are_additive(
        lines in prop::collection::vec(line(), 1..8),
        header in amount(),
    ) {
        let line_discounts: Decimal = lines
            .iter()
            .filter_map(|l| l.discount_amount)
            .sum();
        let entry = draft(lines, header, Decimal::ZERO, Decimal::ZERO);
        prop_assert_eq!(entry.discount_total, header + line_discounts);
    }

    /// Payments keep the invariant and never push amount due below zero.
    #[test]
    fn prop_payments_keep_totals_invariant(
        lines in prop::collection::vec(line(), 1..4),
        payments in prop::collection::vec(1i64..500_000i64, 1..6),
    ) {
        let mut entry = draft(lines, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        let mut paid = Decimal::ZERO;
        for cents in payments {
            let amount = Decimal::new(cents, 2);
            paid += amount;
            super::payment::PaymentLedger::record(
                &mut entry,
                PaymentInput { amount, ..Default::default() },
                Utc::now(),
            )
            .unwrap();
            assert_totals_invariant(&entry)?;
        }
        prop_assert_eq!(entry.amount_paid, paid);
        prop_assert_eq!(
            TotalsAggregator::amount_due(entry.grand_total, paid),
            entry.amount_due
        );
    }
}
