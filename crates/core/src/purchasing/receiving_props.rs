//! Property-based tests for goods receipt.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use procura_shared::types::{Currency, ProductId, SupplierId, TenantId};

use super::error::PurchaseError;
use super::receiving::ReceivingProcessor;
use super::types::{
    CreatePurchaseInput, LineInput, PurchaseEntry, PurchaseStatus, ReceiptLineInput,
    ReceivePurchaseInput,
};

fn confirmed(quantities: &[u32]) -> PurchaseEntry {
    let input = CreatePurchaseInput {
        supplier_id: Some(SupplierId::new()),
        lines: quantities
            .iter()
            .map(|&qty| LineInput {
                product_id: Some(ProductId::new()),
                qty_ordered: qty,
                unit_cost: Some(Decimal::ONE),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };
    let mut entry = PurchaseEntry::draft(
        TenantId::new(),
        "PUR-000001".to_string(),
        input,
        Currency::Usd,
        Utc::now(),
    )
    .unwrap();
    entry.confirm(Utc::now()).unwrap();
    entry
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Received quantities stay within bounds, failed requests change nothing,
    /// and the status is RECEIVED exactly when every line is complete.
    #[test]
    fn prop_received_never_exceeds_ordered(
        quantities in prop::collection::vec(1u32..20, 1..5),
        requests in prop::collection::vec((0usize..5, 0u32..25), 1..20),
    ) {
        let mut entry = confirmed(&quantities);

        for (index, qty) in requests {
            let line_id = entry.lines[index % entry.lines.len()].id;
            let before = entry.clone();
            let input = ReceivePurchaseInput {
                lines: vec![ReceiptLineInput { line_id, quantity: qty }],
            };

            match ReceivingProcessor::receive(&mut entry, &input, Utc::now()) {
                Ok(receipts) => {
                    let stocked: u32 = receipts.iter().map(|r| r.quantity).sum();
                    prop_assert_eq!(stocked, qty);
                }
                Err(
                    PurchaseError::OverReceipt { .. }
                    | PurchaseError::NothingToReceive
                    | PurchaseError::InvalidTransition { .. },
                ) => prop_assert_eq!(&entry, &before),
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }

            for line in &entry.lines {
                prop_assert!(line.qty_received <= line.qty_ordered);
            }
            if entry.status != PurchaseStatus::Confirmed {
                let complete = entry.lines.iter().all(|l| l.qty_received == l.qty_ordered);
                prop_assert_eq!(entry.status == PurchaseStatus::Received, complete);
            }
        }
    }
}
