//! Collaborator interfaces consumed by the purchase workflow.
//!
//! Every lookup is tenant-scoped: a record owned by another tenant is
//! reported as absent.

use async_trait::async_trait;

use procura_shared::types::{PageRequest, ProductId, PurchaseEntryId, SupplierId, TenantId};

use super::error::PurchaseError;
use super::types::{ProductRef, PurchaseChangeSet, PurchaseEntry, PurchaseFilter, SupplierRef};

/// Read access to suppliers.
#[async_trait]
pub trait SupplierDirectory: Send + Sync {
    /// Finds a supplier owned by the tenant.
    async fn find_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Result<Option<SupplierRef>, PurchaseError>;
}

/// Read access to products.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Finds a product owned by the tenant.
    async fn find_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<ProductRef>, PurchaseError>;
}

/// Persistence for purchase entries.
#[async_trait]
pub trait PurchaseEntryStore: Send + Sync {
    /// Loads an entry with its lines and payments.
    async fn find_entry(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
    ) -> Result<Option<PurchaseEntry>, PurchaseError>;

    /// Returns one page of matching entries plus the total match count,
    /// newest bill date first.
    async fn list_entries(
        &self,
        tenant_id: TenantId,
        filter: &PurchaseFilter,
        page: PageRequest,
    ) -> Result<(Vec<PurchaseEntry>, u64), PurchaseError>;

    /// Reserves the next entry code sequence value for the tenant.
    async fn next_code_sequence(&self, tenant_id: TenantId) -> Result<u64, PurchaseError>;

    /// Applies a change set all-or-nothing and returns the stored entry.
    ///
    /// Implementations must:
    /// - fail with `StaleEntry` when the stored version differs from
    ///   `expected_version` (or the entry already exists on insert)
    /// - apply supplier adjustments as atomic increments, flooring each
    ///   resulting balance at zero
    /// - bump the entry version
    async fn commit(
        &self,
        tenant_id: TenantId,
        change: PurchaseChangeSet,
    ) -> Result<PurchaseEntry, PurchaseError>;
}
