//! Data models
//!
//! Shared between the server and the web front end (via API).
//! Flat row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Catalog ids are snowflake `i64`; orders use UUIDs because their ids are
//! handed to customers for tracking.

pub mod additional;
pub mod cart;
pub mod category;
pub mod notification;
pub mod order;
pub mod product;
pub mod store;
pub mod store_config;

// Re-exports
pub use additional::*;
pub use cart::*;
pub use category::*;
pub use notification::*;
pub use order::*;
pub use product::*;
pub use store::*;
pub use store_config::*;

/// Serde adapter for nullable fields in update payloads
///
/// A missing key stays `None` (untouched); an explicit `null` becomes
/// `Some(None)` (cleared). Pair with `#[serde(default)]`.
pub(crate) mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, s: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(d: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(d).map(Some)
    }
}
