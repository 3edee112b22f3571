//! Row-Level Security (RLS) context management.
//!
//! Every repository call runs inside a transaction whose
//! `app.current_tenant_id` setting scopes the RLS policies to one tenant.
//!
//! # Usage
//!
//! ```ignore
//! use procura_db::rls::RlsConnection;
//!
//! let rls = RlsConnection::new(&db, tenant_id).await?;
//! let entries = PurchaseEntries::find().all(rls.transaction()).await?;
//! rls.commit().await?;
//! ```

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};

use procura_shared::types::TenantId;

/// A database transaction with the tenant RLS context set.
pub struct RlsConnection {
    txn: DatabaseTransaction,
}

impl RlsConnection {
    /// Begins a transaction and sets `app.current_tenant_id` with `SET LOCAL`,
    /// so the setting ends with the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the RLS
    /// context cannot be set.
    pub async fn new(db: &DatabaseConnection, tenant_id: TenantId) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        set_rls_context(&txn, tenant_id).await?;
        Ok(Self { txn })
    }

    /// Returns the underlying transaction for executing queries.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction, discarding all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

/// Extension trait for `DatabaseConnection` to create RLS-enabled connections.
#[async_trait::async_trait]
pub trait RlsExt {
    /// Creates an RLS-enabled connection for the tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the RLS connection cannot be created.
    async fn with_rls(&self, tenant_id: TenantId) -> Result<RlsConnection, DbErr>;
}

#[async_trait::async_trait]
impl RlsExt for DatabaseConnection {
    async fn with_rls(&self, tenant_id: TenantId) -> Result<RlsConnection, DbErr> {
        RlsConnection::new(self, tenant_id).await
    }
}

/// Builds the statement that scopes a transaction to a tenant.
#[must_use]
pub fn rls_context_sql(tenant_id: TenantId) -> String {
    // TenantId wraps a Uuid, so its Display form is safe to inline.
    format!("SET LOCAL app.current_tenant_id = '{tenant_id}'")
}

/// Sets the RLS context on an existing transaction.
///
/// # Errors
///
/// Returns an error if the RLS context cannot be set.
pub async fn set_rls_context(txn: &DatabaseTransaction, tenant_id: TenantId) -> Result<(), DbErr> {
    txn.execute_unprepared(&rls_context_sql(tenant_id)).await?;
    Ok(())
}
