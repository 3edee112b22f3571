//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `SupplierId` where a `ProductId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(TenantId, "Unique identifier for a tenant (company).");
typed_id!(SupplierId, "Unique identifier for a supplier.");
typed_id!(ProductId, "Unique identifier for a product.");
typed_id!(PurchaseEntryId, "Unique identifier for a purchase entry.");
typed_id!(
    PurchaseLineId,
    "Unique identifier for a line of a purchase entry."
);
typed_id!(
    PurchasePaymentId,
    "Unique identifier for a payment recorded against a purchase entry."
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_ids_are_time_ordered() {
        let first = PurchaseEntryId::new();
        let second = PurchaseEntryId::new();
        assert_ne!(first, second);
        assert!(first <= second);
    }

    #[test]
    fn test_id_round_trips_through_string() {
        let id = SupplierId::new();
        let parsed = SupplierId::from_str(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
        assert!(SupplierId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let id = TenantId::from_uuid(uuid);
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"550e8400-e29b-41d4-a716-446655440000\""
        );
        assert_eq!(id.into_inner(), uuid);
    }
}
