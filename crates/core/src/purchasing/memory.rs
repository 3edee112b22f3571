//! In-memory implementation of the purchasing collaborators.
//!
//! Holds suppliers, products and entries behind one async mutex so a change
//! set is applied atomically. Used for embedding and tests.

use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use procura_shared::types::{PageRequest, ProductId, PurchaseEntryId, SupplierId, TenantId};

use super::balance::SupplierBalanceReconciler;
use super::error::PurchaseError;
use super::store::{ProductCatalog, PurchaseEntryStore, SupplierDirectory};
use super::types::{ProductRef, PurchaseChangeSet, PurchaseEntry, PurchaseFilter, SupplierRef};

#[derive(Debug, Default)]
struct State {
    suppliers: HashMap<(TenantId, SupplierId), Decimal>,
    products: HashMap<(TenantId, ProductId), i64>,
    entries: HashMap<PurchaseEntryId, PurchaseEntry>,
    sequences: HashMap<TenantId, u64>,
}

/// Purchasing store kept entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryPurchaseStore {
    state: Mutex<State>,
}

impl InMemoryPurchaseStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a supplier with an opening balance.
    pub async fn add_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
        outstanding_balance: Decimal,
    ) {
        self.state
            .lock()
            .await
            .suppliers
            .insert((tenant_id, supplier_id), outstanding_balance);
    }

    /// Registers a product with opening stock.
    pub async fn add_product(&self, tenant_id: TenantId, product_id: ProductId, on_hand: i64) {
        self.state
            .lock()
            .await
            .products
            .insert((tenant_id, product_id), on_hand);
    }

    /// Current supplier balance, if the supplier exists.
    pub async fn supplier_balance(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Option<Decimal> {
        self.state
            .lock()
            .await
            .suppliers
            .get(&(tenant_id, supplier_id))
            .copied()
    }

    /// Current stock on hand, if the product exists.
    pub async fn stock_on_hand(&self, tenant_id: TenantId, product_id: ProductId) -> Option<i64> {
        self.state
            .lock()
            .await
            .products
            .get(&(tenant_id, product_id))
            .copied()
    }
}

#[async_trait]
impl SupplierDirectory for InMemoryPurchaseStore {
    async fn find_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Result<Option<SupplierRef>, PurchaseError> {
        Ok(self.supplier_balance(tenant_id, supplier_id).await.map(
            |outstanding_balance| SupplierRef {
                id: supplier_id,
                outstanding_balance,
            },
        ))
    }
}

#[async_trait]
impl ProductCatalog for InMemoryPurchaseStore {
    async fn find_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<ProductRef>, PurchaseError> {
        Ok(self
            .stock_on_hand(tenant_id, product_id)
            .await
            .map(|on_hand| ProductRef {
                id: product_id,
                on_hand,
            }))
    }
}

#[async_trait]
impl PurchaseEntryStore for InMemoryPurchaseStore {
    async fn find_entry(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
    ) -> Result<Option<PurchaseEntry>, PurchaseError> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .get(&entry_id)
            .filter(|entry| entry.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_entries(
        &self,
        tenant_id: TenantId,
        filter: &PurchaseFilter,
        page: PageRequest,
    ) -> Result<(Vec<PurchaseEntry>, u64), PurchaseError> {
        let state = self.state.lock().await;
        let mut matching: Vec<&PurchaseEntry> = state
            .entries
            .values()
            .filter(|entry| entry.tenant_id == tenant_id && filter.matches(entry))
            .collect();
        matching.sort_by_key(|entry| {
            (
                Reverse(entry.bill_date),
                Reverse(entry.created_at),
                entry.id,
            )
        });

        let total = u64::try_from(matching.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let data = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((data, total))
    }

    async fn next_code_sequence(&self, tenant_id: TenantId) -> Result<u64, PurchaseError> {
        let mut state = self.state.lock().await;
        let sequence = state.sequences.entry(tenant_id).or_insert(0);
        *sequence += 1;
        Ok(*sequence)
    }

    async fn commit(
        &self,
        tenant_id: TenantId,
        change: PurchaseChangeSet,
    ) -> Result<PurchaseEntry, PurchaseError> {
        let mut state = self.state.lock().await;
        let entry_id = change.entry.id;

        let stored_version = match state.entries.get(&entry_id) {
            Some(entry) if entry.tenant_id != tenant_id => {
                return Err(PurchaseError::EntryNotFound(entry_id));
            }
            Some(entry) => Some(entry.version),
            None => None,
        };
        match (change.expected_version, stored_version) {
            (None, None) => {}
            (Some(expected), Some(stored)) if expected == stored => {}
            (Some(_), None) => return Err(PurchaseError::EntryNotFound(entry_id)),
            _ => return Err(PurchaseError::StaleEntry(entry_id)),
        }

        for adjustment in &change.supplier_adjustments {
            if !state
                .suppliers
                .contains_key(&(tenant_id, adjustment.supplier_id))
            {
                return Err(PurchaseError::SupplierNotFound(adjustment.supplier_id));
            }
        }
        for receipt in &change.stock_receipts {
            if !state.products.contains_key(&(tenant_id, receipt.product_id)) {
                return Err(PurchaseError::ProductNotFound(receipt.product_id));
            }
        }

        for adjustment in &change.supplier_adjustments {
            if let Some(balance) = state
                .suppliers
                .get_mut(&(tenant_id, adjustment.supplier_id))
            {
                *balance = SupplierBalanceReconciler::apply(*balance, adjustment.delta);
            }
        }
        for receipt in &change.stock_receipts {
            if let Some(on_hand) = state.products.get_mut(&(tenant_id, receipt.product_id)) {
                *on_hand += i64::from(receipt.quantity);
            }
        }

        let mut entry = change.entry;
        entry.version = change.expected_version.map_or(1, |version| version + 1);
        state.entries.insert(entry_id, entry.clone());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purchasing::types::{
        BalanceTrigger, CreatePurchaseInput, LineInput, StockReceipt, SupplierAdjustment,
    };
    use chrono::Utc;
    use procura_shared::types::Currency;
    use rust_decimal_macros::dec;

    async fn seeded() -> (InMemoryPurchaseStore, TenantId, SupplierId, ProductId) {
        let store = InMemoryPurchaseStore::new();
        let tenant = TenantId::new();
        let supplier = SupplierId::new();
        let product = ProductId::new();
        store.add_supplier(tenant, supplier, dec!(100.00)).await;
        store.add_product(tenant, product, 5).await;
        (store, tenant, supplier, product)
    }

    fn draft(tenant: TenantId, supplier: SupplierId, product: ProductId) -> PurchaseEntry {
        let input = CreatePurchaseInput {
            supplier_id: Some(supplier),
            lines: vec![LineInput {
                product_id: Some(product),
                qty_ordered: 4,
                unit_cost: Some(dec!(10.00)),
                ..Default::default()
            }],
            ..Default::default()
        };
        PurchaseEntry::draft(tenant, "PUR-000001".to_string(), input, Currency::Usd, Utc::now())
            .unwrap()
    }

    fn adjustment(supplier_id: SupplierId, delta: Decimal) -> SupplierAdjustment {
        SupplierAdjustment {
            supplier_id,
            trigger: BalanceTrigger::Payment,
            delta,
        }
    }

    #[tokio::test]
    async fn test_lookups_are_tenant_scoped() {
        let (store, tenant, supplier, product) = seeded().await;
        let other = TenantId::new();

        assert!(store.find_supplier(tenant, supplier).await.unwrap().is_some());
        assert!(store.find_supplier(other, supplier).await.unwrap().is_none());
        assert!(store.find_product(other, product).await.unwrap().is_none());
        assert_eq!(
            store.find_product(tenant, product).await.unwrap().unwrap().on_hand,
            5
        );

        let entry = store
            .commit(tenant, PurchaseChangeSet::insert(draft(tenant, supplier, product)))
            .await
            .unwrap();
        assert!(store.find_entry(other, entry.id).await.unwrap().is_none());
        assert!(store.find_entry(tenant, entry.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_code_sequences_are_per_tenant() {
        let store = InMemoryPurchaseStore::new();
        let a = TenantId::new();
        let b = TenantId::new();

        assert_eq!(store.next_code_sequence(a).await.unwrap(), 1);
        assert_eq!(store.next_code_sequence(a).await.unwrap(), 2);
        assert_eq!(store.next_code_sequence(b).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_commit_bumps_version_and_detects_stale_writes() {
        let (store, tenant, supplier, product) = seeded().await;

        let stored = store
            .commit(tenant, PurchaseChangeSet::insert(draft(tenant, supplier, product)))
            .await
            .unwrap();
        assert_eq!(stored.version, 1);

        let updated = store
            .commit(tenant, PurchaseChangeSet::update(stored.clone()))
            .await
            .unwrap();
        assert_eq!(updated.version, 2);

        let err = store
            .commit(tenant, PurchaseChangeSet::update(stored.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, PurchaseError::StaleEntry(_)));

        let err = store
            .commit(tenant, PurchaseChangeSet::insert(stored))
            .await
            .unwrap_err();
        assert!(matches!(err, PurchaseError::StaleEntry(_)));
    }

    #[tokio::test]
    async fn test_adjustments_floor_each_step() {
        let (store, tenant, supplier, product) = seeded().await;

        let mut change = PurchaseChangeSet::insert(draft(tenant, supplier, product));
        change.supplier_adjustments.push(adjustment(supplier, dec!(-250.00)));
        change.supplier_adjustments.push(adjustment(supplier, dec!(40.00)));
        store.commit(tenant, change).await.unwrap();

        assert_eq!(
            store.supplier_balance(tenant, supplier).await,
            Some(dec!(40.00))
        );
    }

    #[tokio::test]
    async fn test_commit_rejects_unknown_supplier_without_side_effects() {
        let (store, tenant, supplier, product) = seeded().await;
        let entry = draft(tenant, supplier, product);
        let entry_id = entry.id;

        let mut change = PurchaseChangeSet::insert(entry);
        change.stock_receipts.push(StockReceipt {
            product_id: product,
            quantity: 3,
        });
        change
            .supplier_adjustments
            .push(adjustment(SupplierId::new(), dec!(10.00)));

        let err = store.commit(tenant, change).await.unwrap_err();
        assert!(matches!(err, PurchaseError::SupplierNotFound(_)));
        assert_eq!(store.stock_on_hand(tenant, product).await, Some(5));
        assert!(store.find_entry(tenant, entry_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stock_receipts_increment_on_hand() {
        let (store, tenant, supplier, product) = seeded().await;

        let mut change = PurchaseChangeSet::insert(draft(tenant, supplier, product));
        change.stock_receipts.push(StockReceipt {
            product_id: product,
            quantity: 3,
        });
        store.commit(tenant, change).await.unwrap();

        assert_eq!(store.stock_on_hand(tenant, product).await, Some(8));
    }
}
