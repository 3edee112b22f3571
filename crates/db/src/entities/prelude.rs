//! Entity prelude.

pub use super::products::Entity as Products;
pub use super::purchase_code_sequences::Entity as PurchaseCodeSequences;
pub use super::purchase_entries::Entity as PurchaseEntries;
pub use super::purchase_entry_lines::Entity as PurchaseEntryLines;
pub use super::purchase_payments::Entity as PurchasePayments;
pub use super::suppliers::Entity as Suppliers;
