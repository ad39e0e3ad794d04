use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from a raw database value.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the underlying numeric value.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_type! {
    /// Unique identifier for an order, assigned by the store on creation.
    ///
    /// Wraps the numeric key to prevent mixing order ids with other
    /// numeric identifiers.
    OrderId
}

id_type! {
    /// Opaque reference to a product owned by the catalog service.
    ProductId
}

id_type! {
    /// Opaque reference to the user that owns an order.
    UserId
}
