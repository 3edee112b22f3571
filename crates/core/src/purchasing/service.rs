//! Purchase workflow orchestrator.
//!
//! Each operation loads the aggregate, runs every check, mutates an in-memory
//! copy and hands the resulting change set to the store in one commit. A
//! rejected operation never reaches the store.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use procura_shared::PurchasingConfig;
use procura_shared::types::{
    PageRequest, PageResponse, ProductId, PurchaseEntryId, SupplierId, TenantId,
};

use super::error::{ErrorKind, PurchaseError};
use super::payment::PaymentLedger;
use super::receiving::ReceivingProcessor;
use super::store::{ProductCatalog, PurchaseEntryStore, SupplierDirectory};
use super::types::{
    ConfirmPurchaseInput, CreatePurchaseInput, PaymentInput, PurchaseChangeSet, PurchaseEntry,
    PurchaseFilter, PurchaseStatus, ReceivePurchaseInput, UpdatePurchaseInput,
};

/// Orchestrates purchase entry transitions over a store.
pub struct PurchaseWorkflow<S> {
    store: S,
    config: PurchasingConfig,
}

impl<S> PurchaseWorkflow<S>
where
    S: SupplierDirectory + ProductCatalog + PurchaseEntryStore,
{
    /// Creates a workflow over the given store.
    pub fn new(store: S, config: PurchasingConfig) -> Self {
        Self { store, config }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the purchasing configuration.
    pub fn config(&self) -> &PurchasingConfig {
        &self.config
    }

    /// Creates a draft entry, optionally with an initial payment.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        input: CreatePurchaseInput,
    ) -> Result<PurchaseEntry, PurchaseError> {
        let result = self.try_create(tenant_id, input).await;
        log_outcome("create", tenant_id, result)
    }

    /// Applies a partial update to a draft or unreceived confirmed entry.
    pub async fn update(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
        input: UpdatePurchaseInput,
    ) -> Result<PurchaseEntry, PurchaseError> {
        let result = self.try_update(tenant_id, entry_id, input).await;
        log_outcome("update", tenant_id, result)
    }

    /// Confirms a draft, optionally recording a payment.
    pub async fn confirm(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
        input: ConfirmPurchaseInput,
    ) -> Result<PurchaseEntry, PurchaseError> {
        let result = self.try_confirm(tenant_id, entry_id, input).await;
        log_outcome("confirm", tenant_id, result)
    }

    /// Records arriving goods.
    pub async fn receive(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
        input: ReceivePurchaseInput,
    ) -> Result<PurchaseEntry, PurchaseError> {
        let result = self.try_receive(tenant_id, entry_id, input).await;
        log_outcome("receive", tenant_id, result)
    }

    /// Records a payment.
    pub async fn add_payment(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
        input: PaymentInput,
    ) -> Result<PurchaseEntry, PurchaseError> {
        let result = self.try_add_payment(tenant_id, entry_id, input).await;
        log_outcome("add_payment", tenant_id, result)
    }

    /// Cancels a draft or confirmed entry that has received nothing.
    pub async fn cancel(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
    ) -> Result<PurchaseEntry, PurchaseError> {
        let result = self.try_cancel(tenant_id, entry_id).await;
        log_outcome("cancel", tenant_id, result)
    }

    /// Loads one entry.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
    ) -> Result<PurchaseEntry, PurchaseError> {
        self.load(tenant_id, entry_id).await
    }

    /// Lists entries matching the filter, newest bill date first.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        filter: &PurchaseFilter,
        page: PageRequest,
    ) -> Result<PageResponse<PurchaseEntry>, PurchaseError> {
        let page = page.normalized();
        let (entries, total) = self.store.list_entries(tenant_id, filter, page).await?;
        debug!(
            tenant_id = %tenant_id,
            page = page.page,
            per_page = page.per_page,
            total,
            "Listed purchase entries"
        );
        Ok(PageResponse::new(entries, page, total))
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    async fn try_create(
        &self,
        tenant_id: TenantId,
        mut input: CreatePurchaseInput,
    ) -> Result<PurchaseEntry, PurchaseError> {
        let supplier_id = input.validate()?;
        if let Some(payment) = &input.initial_payment {
            PaymentLedger::validate(PurchaseStatus::Draft, payment)?;
        }

        self.require_supplier(tenant_id, supplier_id).await?;
        self.require_products(tenant_id, input.lines.iter().filter_map(|l| l.product_id))
            .await?;

        let sequence = self.store.next_code_sequence(tenant_id).await?;
        let code = self.config.format_code(sequence);
        let initial_payment = input.initial_payment.take();
        let now = Utc::now();

        let entry =
            PurchaseEntry::draft(tenant_id, code, input, self.config.default_currency, now)?;
        let mut change = PurchaseChangeSet::insert(entry);
        if let Some(payment) = initial_payment {
            change.record_payment(payment, now)?;
        }

        self.store.commit(tenant_id, change).await
    }

    async fn try_update(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
        input: UpdatePurchaseInput,
    ) -> Result<PurchaseEntry, PurchaseError> {
        let entry = self.load(tenant_id, entry_id).await?;
        entry.ensure_editable()?;

        if entry.status == PurchaseStatus::Draft
            && let Some(supplier_id) = input.supplier_id
            && supplier_id != entry.supplier_id
        {
            self.require_supplier(tenant_id, supplier_id).await?;
        }
        self.require_products(
            tenant_id,
            input
                .lines
                .iter()
                .flatten()
                .filter_map(|line| line.product_id),
        )
        .await?;

        let mut change = PurchaseChangeSet::update(entry);
        let adjustment = change.entry.apply_update(input, Utc::now())?;
        change.supplier_adjustments.extend(adjustment);

        self.store.commit(tenant_id, change).await
    }

    async fn try_confirm(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
        input: ConfirmPurchaseInput,
    ) -> Result<PurchaseEntry, PurchaseError> {
        let entry = self.load(tenant_id, entry_id).await?;
        let now = Utc::now();

        let mut change = PurchaseChangeSet::update(entry);
        let adjustment = change.entry.confirm(now)?;
        change.supplier_adjustments.extend(adjustment);
        if let Some(payment) = input.payment {
            change.record_payment(payment, now)?;
        }

        self.store.commit(tenant_id, change).await
    }

    async fn try_receive(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
        input: ReceivePurchaseInput,
    ) -> Result<PurchaseEntry, PurchaseError> {
        let entry = self.load(tenant_id, entry_id).await?;

        let mut change = PurchaseChangeSet::update(entry);
        change.stock_receipts = ReceivingProcessor::receive(&mut change.entry, &input, Utc::now())?;

        self.store.commit(tenant_id, change).await
    }

    async fn try_add_payment(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
        input: PaymentInput,
    ) -> Result<PurchaseEntry, PurchaseError> {
        let entry = self.load(tenant_id, entry_id).await?;

        let mut change = PurchaseChangeSet::update(entry);
        change.record_payment(input, Utc::now())?;

        self.store.commit(tenant_id, change).await
    }

    async fn try_cancel(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
    ) -> Result<PurchaseEntry, PurchaseError> {
        let entry = self.load(tenant_id, entry_id).await?;

        let mut change = PurchaseChangeSet::update(entry);
        let adjustment = change.entry.cancel(Utc::now())?;
        change.supplier_adjustments.extend(adjustment);

        self.store.commit(tenant_id, change).await
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    async fn load(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
    ) -> Result<PurchaseEntry, PurchaseError> {
        self.store
            .find_entry(tenant_id, entry_id)
            .await?
            .ok_or(PurchaseError::EntryNotFound(entry_id))
    }

    async fn require_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Result<(), PurchaseError> {
        match self.store.find_supplier(tenant_id, supplier_id).await? {
            Some(_) => Ok(()),
            None => Err(PurchaseError::SupplierNotFound(supplier_id)),
        }
    }

    async fn require_products(
        &self,
        tenant_id: TenantId,
        product_ids: impl Iterator<Item = ProductId>,
    ) -> Result<(), PurchaseError> {
        let mut seen = HashSet::new();
        for product_id in product_ids {
            if !seen.insert(product_id) {
                continue;
            }
            if self
                .store
                .find_product(tenant_id, product_id)
                .await?
                .is_none()
            {
                return Err(PurchaseError::ProductNotFound(product_id));
            }
        }
        Ok(())
    }
}

fn log_outcome(
    operation: &'static str,
    tenant_id: TenantId,
    result: Result<PurchaseEntry, PurchaseError>,
) -> Result<PurchaseEntry, PurchaseError> {
    match &result {
        Ok(entry) => info!(
            operation,
            tenant_id = %tenant_id,
            entry_id = %entry.id,
            code = %entry.code,
            status = %entry.status,
            grand_total = %entry.grand_total,
            amount_paid = %entry.amount_paid,
            amount_due = %entry.amount_due,
            version = entry.version,
            "Purchase entry committed"
        ),
        Err(err) if err.kind() == ErrorKind::Internal => error!(
            operation,
            tenant_id = %tenant_id,
            error = %err,
            "Purchase operation failed"
        ),
        Err(err) => warn!(
            operation,
            tenant_id = %tenant_id,
            error_code = err.error_code(),
            error = %err,
            "Purchase operation rejected"
        ),
    }
    result
}
