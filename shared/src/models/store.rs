//! Store (tenant) Model

use serde::{Deserialize, Serialize};

/// Store tenant. One admin account per store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Store {
    pub id: i64,
    /// Public storefront address segment, e.g. `acai-da-praia`
    pub slug: String,
    pub name: String,
    /// Admin login email (lowercase)
    pub email: String,
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub is_active: bool,
    pub created_at: i64,
}

/// New store payload (password already hashed)
#[derive(Debug, Clone)]
pub struct StoreCreate {
    pub slug: String,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
}

impl Store {
    pub fn new(id: i64, data: &StoreCreate, now: i64) -> Self {
        Self {
            id,
            slug: data.slug.clone(),
            name: data.name.clone(),
            email: data.email.clone(),
            hashed_password: data.hashed_password.clone(),
            is_active: true,
            created_at: now,
        }
    }
}

pub const SLUG_MIN_LEN: usize = 3;
pub const SLUG_MAX_LEN: usize = 40;

/// Slugs are lowercase ASCII letters, digits and inner hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    (SLUG_MIN_LEN..=SLUG_MAX_LEN).contains(&slug.len())
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        assert!(is_valid_slug("acai-da-praia"));
        assert!(is_valid_slug("sorveteria24"));
        assert!(is_valid_slug("abc"));
    }

    #[test]
    fn test_invalid_slugs() {
        assert!(!is_valid_slug("ab"));
        assert!(!is_valid_slug("Acai"));
        assert!(!is_valid_slug("-acai"));
        assert!(!is_valid_slug("acai-"));
        assert!(!is_valid_slug("acai--praia"));
        assert!(!is_valid_slug("açaí"));
        assert!(!is_valid_slug(&"a".repeat(41)));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let store = Store {
            id: 1,
            slug: "acai".into(),
            name: "Açaí".into(),
            email: "a@b.c".into(),
            hashed_password: "$argon2id$secret".into(),
            is_active: true,
            created_at: 0,
        };
        let json = serde_json::to_string(&store).unwrap();
        assert!(!json.contains("argon2"));
    }
}
