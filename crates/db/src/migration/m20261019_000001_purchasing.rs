//! Initial purchasing schema.
//!
//! Creates the purchase status enum, the supplier/product master tables the
//! engine adjusts, the purchase entry tables, the per-tenant code sequence
//! and the RLS policies keyed on `app.current_tenant_id`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: MASTER DATA
        // ============================================================
        db.execute_unprepared(SUPPLIERS_SQL).await?;
        db.execute_unprepared(PRODUCTS_SQL).await?;

        // ============================================================
        // PART 3: PURCHASE ENTRIES
        // ============================================================
        db.execute_unprepared(PURCHASE_ENTRIES_SQL).await?;
        db.execute_unprepared(PURCHASE_ENTRY_LINES_SQL).await?;
        db.execute_unprepared(PURCHASE_PAYMENTS_SQL).await?;
        db.execute_unprepared(PURCHASE_CODE_SEQUENCES_SQL).await?;

        // ============================================================
        // PART 4: ROW-LEVEL SECURITY
        // ============================================================
        db.execute_unprepared(RLS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE purchase_status AS ENUM (
    'DRAFT',
    'CONFIRMED',
    'PARTIALLY_RECEIVED',
    'RECEIVED',
    'CANCELLED'
);
";

const SUPPLIERS_SQL: &str = r"
CREATE TABLE suppliers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL,
    name VARCHAR(255) NOT NULL,
    outstanding_balance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_supplier_balance_non_negative CHECK (outstanding_balance >= 0)
);

CREATE INDEX idx_suppliers_tenant ON suppliers(tenant_id);
";

const PRODUCTS_SQL: &str = r"
CREATE TABLE products (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL,
    name VARCHAR(255) NOT NULL,
    on_hand BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_products_tenant ON products(tenant_id);
";

const PURCHASE_ENTRIES_SQL: &str = r"
CREATE TABLE purchase_entries (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    supplier_id UUID NOT NULL REFERENCES suppliers(id),
    code VARCHAR(50) NOT NULL,
    status purchase_status NOT NULL DEFAULT 'DRAFT',
    bill_date DATE NOT NULL,
    due_date DATE,
    reference VARCHAR(100),
    notes TEXT,
    currency CHAR(3) NOT NULL,
    subtotal NUMERIC(19, 2) NOT NULL DEFAULT 0,
    header_discount NUMERIC(19, 2) NOT NULL DEFAULT 0,
    discount_total NUMERIC(19, 2) NOT NULL DEFAULT 0,
    tax_total NUMERIC(19, 2) NOT NULL DEFAULT 0,
    supplier_expense NUMERIC(19, 2) NOT NULL DEFAULT 0,
    other_expense NUMERIC(19, 2) NOT NULL DEFAULT 0,
    grand_total NUMERIC(19, 2) NOT NULL DEFAULT 0,
    amount_paid NUMERIC(19, 2) NOT NULL DEFAULT 0,
    amount_due NUMERIC(19, 2) NOT NULL DEFAULT 0,
    version BIGINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (tenant_id, code),
    CONSTRAINT chk_entry_amounts_non_negative CHECK (
        grand_total >= 0 AND amount_paid >= 0 AND amount_due >= 0
    )
);

CREATE INDEX idx_pe_tenant_bill_date ON purchase_entries(tenant_id, bill_date DESC, created_at DESC);
CREATE INDEX idx_pe_tenant_status ON purchase_entries(tenant_id, status);
CREATE INDEX idx_pe_supplier ON purchase_entries(supplier_id);
";

const PURCHASE_ENTRY_LINES_SQL: &str = r"
CREATE TABLE purchase_entry_lines (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    purchase_entry_id UUID NOT NULL REFERENCES purchase_entries(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    product_id UUID NOT NULL REFERENCES products(id),
    description TEXT,
    qty_ordered BIGINT NOT NULL,
    qty_received BIGINT NOT NULL DEFAULT 0,
    unit_cost NUMERIC(19, 2) NOT NULL,
    discount_amount NUMERIC(19, 2) NOT NULL DEFAULT 0,
    tax_percent NUMERIC(9, 4) NOT NULL DEFAULT 0,
    line_total NUMERIC(19, 2) NOT NULL DEFAULT 0,
    CONSTRAINT chk_line_qty_ordered_positive CHECK (qty_ordered > 0),
    CONSTRAINT chk_line_qty_received_bounds CHECK (
        qty_received >= 0 AND qty_received <= qty_ordered
    ),
    CONSTRAINT chk_line_unit_cost_positive CHECK (unit_cost > 0)
);

CREATE INDEX idx_pel_entry ON purchase_entry_lines(purchase_entry_id, position);
";

const PURCHASE_PAYMENTS_SQL: &str = r"
CREATE TABLE purchase_payments (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    purchase_entry_id UUID NOT NULL REFERENCES purchase_entries(id) ON DELETE CASCADE,
    paid_at TIMESTAMPTZ NOT NULL,
    method VARCHAR(50) NOT NULL,
    amount NUMERIC(19, 2) NOT NULL,
    reference VARCHAR(100),
    note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_payment_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_pp_entry ON purchase_payments(purchase_entry_id, created_at);
";

const PURCHASE_CODE_SEQUENCES_SQL: &str = r"
CREATE TABLE purchase_code_sequences (
    tenant_id UUID PRIMARY KEY,
    last_value BIGINT NOT NULL DEFAULT 0
);
";

const RLS_SQL: &str = r"
-- Application sets context before queries: SET LOCAL app.current_tenant_id = 'tenant-uuid';

ALTER TABLE suppliers ENABLE ROW LEVEL SECURITY;
ALTER TABLE products ENABLE ROW LEVEL SECURITY;
ALTER TABLE purchase_entries ENABLE ROW LEVEL SECURITY;
ALTER TABLE purchase_entry_lines ENABLE ROW LEVEL SECURITY;
ALTER TABLE purchase_payments ENABLE ROW LEVEL SECURITY;
ALTER TABLE purchase_code_sequences ENABLE ROW LEVEL SECURITY;

ALTER TABLE suppliers FORCE ROW LEVEL SECURITY;
ALTER TABLE products FORCE ROW LEVEL SECURITY;
ALTER TABLE purchase_entries FORCE ROW LEVEL SECURITY;
ALTER TABLE purchase_entry_lines FORCE ROW LEVEL SECURITY;
ALTER TABLE purchase_payments FORCE ROW LEVEL SECURITY;
ALTER TABLE purchase_code_sequences FORCE ROW LEVEL SECURITY;

CREATE POLICY tenant_isolation ON suppliers
    USING (tenant_id = current_setting('app.current_tenant_id', true)::UUID);

CREATE POLICY tenant_isolation ON products
    USING (tenant_id = current_setting('app.current_tenant_id', true)::UUID);

CREATE POLICY tenant_isolation ON purchase_entries
    USING (tenant_id = current_setting('app.current_tenant_id', true)::UUID);

CREATE POLICY tenant_isolation ON purchase_entry_lines
    USING (tenant_id = current_setting('app.current_tenant_id', true)::UUID);

CREATE POLICY tenant_isolation ON purchase_payments
    USING (tenant_id = current_setting('app.current_tenant_id', true)::UUID);

CREATE POLICY tenant_isolation ON purchase_code_sequences
    USING (tenant_id = current_setting('app.current_tenant_id', true)::UUID);
";

const DROP_ALL_SQL: &str = r"
-- Order matters due to foreign key constraints
DROP TABLE IF EXISTS purchase_code_sequences;
DROP TABLE IF EXISTS purchase_payments;
DROP TABLE IF EXISTS purchase_entry_lines;
DROP TABLE IF EXISTS purchase_entries;
DROP TABLE IF EXISTS products;
DROP TABLE IF EXISTS suppliers;
DROP TYPE IF EXISTS purchase_status;
";
