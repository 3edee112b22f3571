//! Purchase entry repository.
//!
//! SeaORM implementation of the purchasing collaborator traits. Every call
//! runs in its own RLS-scoped transaction; `commit` applies a whole change
//! set inside one transaction so a failed version check or a missing
//! supplier leaves nothing behind.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbBackend, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, Statement, Value,
    sea_query::{Expr, OnConflict},
};
use tracing::debug;
use uuid::Uuid;

use procura_core::purchasing::{
    ProductCatalog, ProductRef, PurchaseChangeSet, PurchaseEntry, PurchaseEntryStore,
    PurchaseError, PurchaseFilter, PurchaseLine, PurchasePayment, StockReceipt, SupplierAdjustment,
    SupplierDirectory, SupplierRef,
};
use procura_shared::types::{
    Currency, PageRequest, ProductId, PurchaseEntryId, SupplierId, TenantId,
};

use crate::entities::{
    products, purchase_entries, purchase_entry_lines, purchase_payments,
    sea_orm_active_enums::PurchaseStatus as DbPurchaseStatus, suppliers,
};
use crate::rls::RlsConnection;

/// Atomic supplier balance adjustment floored at zero.
const ADJUST_SUPPLIER_BALANCE_SQL: &str = r"
UPDATE suppliers
SET outstanding_balance = GREATEST(0, outstanding_balance + $1),
    updated_at = now()
WHERE id = $2 AND tenant_id = $3
";

/// Reserves the next code sequence value for a tenant.
const NEXT_CODE_SEQUENCE_SQL: &str = r"
INSERT INTO purchase_code_sequences (tenant_id, last_value)
VALUES ($1, 1)
ON CONFLICT (tenant_id)
DO UPDATE SET last_value = purchase_code_sequences.last_value + 1
RETURNING last_value
";

/// Purchase entry repository backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    db: DatabaseConnection,
}

impl PurchaseRepository {
    /// Creates a new purchase repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn begin(&self, tenant_id: TenantId) -> Result<RlsConnection, PurchaseError> {
        RlsConnection::new(&self.db, tenant_id)
            .await
            .map_err(db_err)
    }
}

fn db_err(e: DbErr) -> PurchaseError {
    PurchaseError::Database(e.to_string())
}

// ============================================================================
// Reads
// ============================================================================

#[async_trait]
impl SupplierDirectory for PurchaseRepository {
    async fn find_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Result<Option<SupplierRef>, PurchaseError> {
        let rls = self.begin(tenant_id).await?;

        let supplier = suppliers::Entity::find_by_id(supplier_id.into_inner())
            .filter(suppliers::Column::TenantId.eq(tenant_id.into_inner()))
            .one(rls.transaction())
            .await
            .map_err(db_err)?;

        rls.commit().await.map_err(db_err)?;

        Ok(supplier.map(|s| SupplierRef {
            id: SupplierId::from_uuid(s.id),
            outstanding_balance: s.outstanding_balance,
        }))
    }
}

#[async_trait]
impl ProductCatalog for PurchaseRepository {
    async fn find_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<ProductRef>, PurchaseError> {
        let rls = self.begin(tenant_id).await?;

        let product = products::Entity::find_by_id(product_id.into_inner())
            .filter(products::Column::TenantId.eq(tenant_id.into_inner()))
            .one(rls.transaction())
            .await
            .map_err(db_err)?;

        rls.commit().await.map_err(db_err)?;

        Ok(product.map(|p| ProductRef {
            id: ProductId::from_uuid(p.id),
            on_hand: p.on_hand,
        }))
    }
}

#[async_trait]
impl PurchaseEntryStore for PurchaseRepository {
    async fn find_entry(
        &self,
        tenant_id: TenantId,
        entry_id: PurchaseEntryId,
    ) -> Result<Option<PurchaseEntry>, PurchaseError> {
        let rls = self.begin(tenant_id).await?;
        let txn = rls.transaction();

        let Some(model) = purchase_entries::Entity::find_by_id(entry_id.into_inner())
            .filter(purchase_entries::Column::TenantId.eq(tenant_id.into_inner()))
            .one(txn)
            .await
            .map_err(db_err)?
        else {
            rls.commit().await.map_err(db_err)?;
            return Ok(None);
        };

        let mut entries = load_aggregates(txn, vec![model]).await?;
        rls.commit().await.map_err(db_err)?;

        Ok(entries.pop())
    }

    async fn list_entries(
        &self,
        tenant_id: TenantId,
        filter: &PurchaseFilter,
        page: PageRequest,
    ) -> Result<(Vec<PurchaseEntry>, u64), PurchaseError> {
        let page = page.normalized();
        let rls = self.begin(tenant_id).await?;
        let txn = rls.transaction();

        let paginator = purchase_entries::Entity::find()
            .filter(list_condition(tenant_id, filter))
            .order_by_desc(purchase_entries::Column::BillDate)
            .order_by_desc(purchase_entries::Column::CreatedAt)
            .order_by_asc(purchase_entries::Column::Id)
            .paginate(txn, page.limit());

        let total = paginator.num_items().await.map_err(db_err)?;
        let models = paginator
            .fetch_page(u64::from(page.page - 1))
            .await
            .map_err(db_err)?;

        let entries = load_aggregates(txn, models).await?;
        rls.commit().await.map_err(db_err)?;

        Ok((entries, total))
    }

    async fn next_code_sequence(&self, tenant_id: TenantId) -> Result<u64, PurchaseError> {
        let rls = self.begin(tenant_id).await?;

        let row = rls
            .transaction()
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                NEXT_CODE_SEQUENCE_SQL,
                [Value::from(tenant_id.into_inner())],
            ))
            .await
            .map_err(db_err)?
            .ok_or_else(|| PurchaseError::Database("code sequence returned no row".to_string()))?;

        let last_value: i64 = row.try_get("", "last_value").map_err(db_err)?;
        rls.commit().await.map_err(db_err)?;

        u64::try_from(last_value)
            .map_err(|_| PurchaseError::Database(format!("invalid code sequence {last_value}")))
    }

    async fn commit(
        &self,
        tenant_id: TenantId,
        change: PurchaseChangeSet,
    ) -> Result<PurchaseEntry, PurchaseError> {
        let PurchaseChangeSet {
            mut entry,
            expected_version,
            new_payments,
            supplier_adjustments,
            stock_receipts,
        } = change;

        let rls = self.begin(tenant_id).await?;
        let txn = rls.transaction();

        let version = expected_version.map_or(1, |v| v + 1);
        entry.version = version;

        match expected_version {
            None => {
                let inserted = purchase_entries::Entity::insert(header_model(&entry))
                    .on_conflict(
                        OnConflict::column(purchase_entries::Column::Id)
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec_without_returning(txn)
                    .await
                    .map_err(db_err)?;

                if inserted == 0 {
                    return Err(PurchaseError::StaleEntry(entry.id));
                }
            }
            Some(expected) => {
                let mut header = header_model(&entry);
                header.id = NotSet;
                header.tenant_id = NotSet;
                header.created_at = NotSet;

                let result = purchase_entries::Entity::update_many()
                    .set(header)
                    .filter(purchase_entries::Column::Id.eq(entry.id.into_inner()))
                    .filter(purchase_entries::Column::TenantId.eq(tenant_id.into_inner()))
                    .filter(purchase_entries::Column::Version.eq(expected))
                    .exec(txn)
                    .await
                    .map_err(db_err)?;

                if result.rows_affected == 0 {
                    let exists = purchase_entries::Entity::find_by_id(entry.id.into_inner())
                        .filter(purchase_entries::Column::TenantId.eq(tenant_id.into_inner()))
                        .count(txn)
                        .await
                        .map_err(db_err)?
                        > 0;
                    return Err(if exists {
                        PurchaseError::StaleEntry(entry.id)
                    } else {
                        PurchaseError::EntryNotFound(entry.id)
                    });
                }
            }
        }

        upsert_lines(txn, &entry).await?;
        insert_payments(txn, &entry, &new_payments).await?;

        for adjustment in &supplier_adjustments {
            adjust_supplier(txn, tenant_id, adjustment).await?;
        }
        for receipt in &stock_receipts {
            add_stock(txn, tenant_id, receipt).await?;
        }

        rls.commit().await.map_err(db_err)?;

        debug!(
            tenant_id = %tenant_id,
            entry_id = %entry.id,
            version,
            payments = new_payments.len(),
            adjustments = supplier_adjustments.len(),
            receipts = stock_receipts.len(),
            "Purchase change set committed"
        );

        Ok(entry)
    }
}

// ============================================================================
// Commit helpers
// ============================================================================

fn header_model(entry: &PurchaseEntry) -> purchase_entries::ActiveModel {
    purchase_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        tenant_id: Set(entry.tenant_id.into_inner()),
        supplier_id: Set(entry.supplier_id.into_inner()),
        code: Set(entry.code.clone()),
        status: Set(DbPurchaseStatus::from(entry.status)),
        bill_date: Set(entry.bill_date),
        due_date: Set(entry.due_date),
        reference: Set(entry.reference.clone()),
        notes: Set(entry.notes.clone()),
        currency: Set(entry.currency.code().to_string()),
        subtotal: Set(entry.subtotal),
        header_discount: Set(entry.header_discount),
        discount_total: Set(entry.discount_total),
        tax_total: Set(entry.tax_total),
        supplier_expense: Set(entry.supplier_expense),
        other_expense: Set(entry.other_expense),
        grand_total: Set(entry.grand_total),
        amount_paid: Set(entry.amount_paid),
        amount_due: Set(entry.amount_due),
        version: Set(entry.version),
        created_at: Set(entry.created_at.into()),
        updated_at: Set(entry.updated_at.into()),
    }
}

async fn upsert_lines(txn: &DatabaseTransaction, entry: &PurchaseEntry) -> Result<(), PurchaseError> {
    if entry.lines.is_empty() {
        return Ok(());
    }

    let mut models = Vec::with_capacity(entry.lines.len());
    for (position, line) in entry.lines.iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| PurchaseError::Database(format!("line position {position} out of range")))?;
        models.push(purchase_entry_lines::ActiveModel {
            id: Set(line.id.into_inner()),
            tenant_id: Set(entry.tenant_id.into_inner()),
            purchase_entry_id: Set(entry.id.into_inner()),
            position: Set(position),
            product_id: Set(line.product_id.into_inner()),
            description: Set(line.description.clone()),
            qty_ordered: Set(i64::from(line.qty_ordered)),
            qty_received: Set(i64::from(line.qty_received)),
            unit_cost: Set(line.unit_cost),
            discount_amount: Set(line.discount_amount),
            tax_percent: Set(line.tax_percent),
            line_total: Set(line.line_total),
        });
    }

    purchase_entry_lines::Entity::insert_many(models)
        .on_conflict(
            OnConflict::column(purchase_entry_lines::Column::Id)
                .update_columns([
                    purchase_entry_lines::Column::Position,
                    purchase_entry_lines::Column::ProductId,
                    purchase_entry_lines::Column::Description,
                    purchase_entry_lines::Column::QtyOrdered,
                    purchase_entry_lines::Column::QtyReceived,
                    purchase_entry_lines::Column::UnitCost,
                    purchase_entry_lines::Column::DiscountAmount,
                    purchase_entry_lines::Column::TaxPercent,
                    purchase_entry_lines::Column::LineTotal,
                ])
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await
        .map_err(db_err)?;

    Ok(())
}

async fn insert_payments(
    txn: &DatabaseTransaction,
    entry: &PurchaseEntry,
    payments: &[PurchasePayment],
) -> Result<(), PurchaseError> {
    if payments.is_empty() {
        return Ok(());
    }

    let now = Utc::now();
    let models = payments.iter().map(|payment| purchase_payments::ActiveModel {
        id: Set(payment.id.into_inner()),
        tenant_id: Set(entry.tenant_id.into_inner()),
        purchase_entry_id: Set(entry.id.into_inner()),
        paid_at: Set(payment.paid_at.into()),
        method: Set(payment.method.clone()),
        amount: Set(payment.amount),
        reference: Set(payment.reference.clone()),
        note: Set(payment.note.clone()),
        created_at: Set(now.into()),
    });

    purchase_payments::Entity::insert_many(models)
        .exec_without_returning(txn)
        .await
        .map_err(db_err)?;

    Ok(())
}

async fn adjust_supplier(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    adjustment: &SupplierAdjustment,
) -> Result<(), PurchaseError> {
    let result = txn
        .execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            ADJUST_SUPPLIER_BALANCE_SQL,
            [
                Value::from(adjustment.delta),
                Value::from(adjustment.supplier_id.into_inner()),
                Value::from(tenant_id.into_inner()),
            ],
        ))
        .await
        .map_err(db_err)?;

    if result.rows_affected() == 0 {
        return Err(PurchaseError::SupplierNotFound(adjustment.supplier_id));
    }
    Ok(())
}

async fn add_stock(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    receipt: &StockReceipt,
) -> Result<(), PurchaseError> {
    let result = products::Entity::update_many()
        .col_expr(
            products::Column::OnHand,
            Expr::col(products::Column::OnHand).add(i64::from(receipt.quantity)),
        )
        .col_expr(products::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(products::Column::Id.eq(receipt.product_id.into_inner()))
        .filter(products::Column::TenantId.eq(tenant_id.into_inner()))
        .exec(txn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        return Err(PurchaseError::ProductNotFound(receipt.product_id));
    }
    Ok(())
}

// ============================================================================
// Read helpers
// ============================================================================

fn list_condition(tenant_id: TenantId, filter: &PurchaseFilter) -> Condition {
    let mut condition =
        Condition::all().add(purchase_entries::Column::TenantId.eq(tenant_id.into_inner()));

    if let Some(status) = filter.status {
        condition =
            condition.add(purchase_entries::Column::Status.eq(DbPurchaseStatus::from(status)));
    }
    if let Some(supplier_id) = filter.supplier_id {
        condition =
            condition.add(purchase_entries::Column::SupplierId.eq(supplier_id.into_inner()));
    }
    if let Some(from) = filter.date_from {
        condition = condition.add(purchase_entries::Column::BillDate.gte(from));
    }
    if let Some(to) = filter.date_to {
        condition = condition.add(purchase_entries::Column::BillDate.lte(to));
    }
    if let Some(term) = filter.search_term() {
        condition = condition.add(
            Condition::any()
                .add(purchase_entries::Column::Code.contains(term))
                .add(purchase_entries::Column::Reference.contains(term))
                .add(purchase_entries::Column::Notes.contains(term)),
        );
    }

    condition
}

/// Loads lines and payments for the headers, preserving header order.
async fn load_aggregates(
    txn: &DatabaseTransaction,
    headers: Vec<purchase_entries::Model>,
) -> Result<Vec<PurchaseEntry>, PurchaseError> {
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();

    let mut lines_by_entry: HashMap<Uuid, Vec<purchase_entry_lines::Model>> = HashMap::new();
    for line in purchase_entry_lines::Entity::find()
        .filter(purchase_entry_lines::Column::PurchaseEntryId.is_in(ids.clone()))
        .order_by_asc(purchase_entry_lines::Column::Position)
        .all(txn)
        .await
        .map_err(db_err)?
    {
        lines_by_entry
            .entry(line.purchase_entry_id)
            .or_default()
            .push(line);
    }

    let mut payments_by_entry: HashMap<Uuid, Vec<purchase_payments::Model>> = HashMap::new();
    for payment in purchase_payments::Entity::find()
        .filter(purchase_payments::Column::PurchaseEntryId.is_in(ids))
        .order_by_asc(purchase_payments::Column::CreatedAt)
        .order_by_asc(purchase_payments::Column::Id)
        .all(txn)
        .await
        .map_err(db_err)?
    {
        payments_by_entry
            .entry(payment.purchase_entry_id)
            .or_default()
            .push(payment);
    }

    headers
        .into_iter()
        .map(|header| {
            let lines = lines_by_entry.remove(&header.id).unwrap_or_default();
            let payments = payments_by_entry.remove(&header.id).unwrap_or_default();
            to_domain(header, lines, payments)
        })
        .collect()
}

fn quantity(value: i64, column: &str) -> Result<u32, PurchaseError> {
    u32::try_from(value).map_err(|_| PurchaseError::Database(format!("invalid {column}: {value}")))
}

fn to_domain(
    header: purchase_entries::Model,
    lines: Vec<purchase_entry_lines::Model>,
    payments: Vec<purchase_payments::Model>,
) -> Result<PurchaseEntry, PurchaseError> {
    let currency: Currency = header
        .currency
        .trim()
        .parse()
        .map_err(PurchaseError::Database)?;

    let lines = lines
        .into_iter()
        .map(|line| {
            Ok(PurchaseLine {
                id: line.id.into(),
                product_id: line.product_id.into(),
                description: line.description,
                qty_ordered: quantity(line.qty_ordered, "qty_ordered")?,
                qty_received: quantity(line.qty_received, "qty_received")?,
                unit_cost: line.unit_cost,
                discount_amount: line.discount_amount,
                tax_percent: line.tax_percent,
                line_total: line.line_total,
            })
        })
        .collect::<Result<Vec<_>, PurchaseError>>()?;

    let payments = payments
        .into_iter()
        .map(|payment| PurchasePayment {
            id: payment.id.into(),
            paid_at: payment.paid_at.with_timezone(&Utc),
            method: payment.method,
            amount: payment.amount,
            reference: payment.reference,
            note: payment.note,
        })
        .collect();

    Ok(PurchaseEntry {
        id: header.id.into(),
        tenant_id: header.tenant_id.into(),
        supplier_id: header.supplier_id.into(),
        code: header.code,
        status: header.status.into(),
        bill_date: header.bill_date,
        due_date: header.due_date,
        reference: header.reference,
        notes: header.notes,
        currency,
        subtotal: header.subtotal,
        header_discount: header.header_discount,
        discount_total: header.discount_total,
        tax_total: header.tax_total,
        supplier_expense: header.supplier_expense,
        other_expense: header.other_expense,
        grand_total: header.grand_total,
        amount_paid: header.amount_paid,
        amount_due: header.amount_due,
        version: header.version,
        created_at: header.created_at.with_timezone(&Utc),
        updated_at: header.updated_at.with_timezone(&Utc),
        lines,
        payments,
    })
}
