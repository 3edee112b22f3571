//! `SeaORM` entity definitions.

pub mod prelude;

pub mod products;
pub mod purchase_code_sequences;
pub mod purchase_entries;
pub mod purchase_entry_lines;
pub mod purchase_payments;
pub mod sea_orm_active_enums;
pub mod suppliers;
