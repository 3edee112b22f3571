//! Receiving processor.

use chrono::{DateTime, Utc};

use procura_shared::types::PurchaseLineId;

use super::error::PurchaseError;
use super::types::{PurchaseEntry, PurchaseStatus, ReceivePurchaseInput, StockReceipt};

/// Stateless receiving processor.
pub struct ReceivingProcessor;

impl ReceivingProcessor {
    /// Records arriving quantities on the entry's lines.
    ///
    /// The whole request is validated before any line changes. Quantities
    /// targeting the same line are summed. Returns one stock receipt per line
    /// that received a positive quantity.
    pub fn receive(
        entry: &mut PurchaseEntry,
        input: &ReceivePurchaseInput,
        now: DateTime<Utc>,
    ) -> Result<Vec<StockReceipt>, PurchaseError> {
        if !entry.status.accepts_receipts() {
            return Err(PurchaseError::InvalidTransition {
                from: entry.status,
                to: PurchaseStatus::Received,
            });
        }

        let mut requested: Vec<(PurchaseLineId, u64)> = Vec::new();
        for receipt in &input.lines {
            match requested.iter_mut().find(|(id, _)| *id == receipt.line_id) {
                Some((_, qty)) => *qty += u64::from(receipt.quantity),
                None => requested.push((receipt.line_id, u64::from(receipt.quantity))),
            }
        }

        // (line index, new qty_received, increment)
        let mut plan: Vec<(usize, u32, u32)> = Vec::with_capacity(requested.len());
        for (line_id, qty) in requested {
            let index = entry
                .lines
                .iter()
                .position(|line| line.id == line_id)
                .ok_or(PurchaseError::LineNotFound(line_id))?;
            if qty == 0 {
                continue;
            }

            let line = &entry.lines[index];
            let over_receipt = || PurchaseError::OverReceipt {
                line_id,
                ordered: line.qty_ordered,
                received: line.qty_received,
                requested: qty,
            };
            let increment = u32::try_from(qty).map_err(|_| over_receipt())?;
            let new_received = line
                .qty_received
                .checked_add(increment)
                .filter(|total| *total <= line.qty_ordered)
                .ok_or_else(over_receipt)?;

            plan.push((index, new_received, increment));
        }

        if plan.is_empty() {
            return Err(PurchaseError::NothingToReceive);
        }

        let mut receipts = Vec::with_capacity(plan.len());
        for (index, new_received, increment) in plan {
            let line = &mut entry.lines[index];
            line.qty_received = new_received;
            receipts.push(StockReceipt {
                product_id: line.product_id,
                quantity: increment,
            });
        }

        entry.status = entry.receipt_status();
        entry.updated_at = now;

        Ok(receipts)
    }
}
