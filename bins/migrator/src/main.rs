//! Database migration runner for Procura.
//!
//! Applies the purchasing schema through the sea-orm-migration CLI. The
//! connection comes from `DATABASE_URL` (a `.env` file is honoured) or
//! `--database-url`.
//!
//! Usage:
//!   migrator up [-n N]    - Run pending migrations
//!   migrator down [-n N]  - Roll back applied migrations (default 1)
//!   migrator status       - Show migration status
//!   migrator fresh        - Drop all tables and re-run migrations
//!   migrator refresh      - Roll back all migrations, then re-run them
//!   migrator reset        - Roll back all migrations

use sea_orm_migration::prelude::*;

use procura_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    cli::run_cli(Migrator).await;
}
