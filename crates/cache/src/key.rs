use std::fmt;

use serde::{Deserialize, Serialize};

/// Deterministic cache key.
///
/// Two constructors cover every key in the system:
/// - [`CacheKey::entity`] for single-entity reads, `"{entity}-{id}"`
/// - [`CacheKey::query`] for collection reads, `"{shape}-{p1}-{p2}..."`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for one entity, derived from its type tag and identity.
    pub fn entity(entity_type: &str, id: impl fmt::Display) -> Self {
        Self(format!("{entity_type}-{id}"))
    }

    /// Key for a query result. Parameters are joined in the order given;
    /// absent parameters should be passed as empty strings so positions stay stable.
    pub fn query<I, S>(shape: &str, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut key = shape.to_string();
        for param in params {
            key.push('-');
            key.push_str(param.as_ref());
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_key_is_deterministic() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(CacheKey::entity("Property", id), CacheKey::entity("Property", id));
        assert_eq!(
            CacheKey::entity("Property", id).as_str(),
            format!("Property-{id}")
        );
    }

    #[test]
    fn entity_keys_differ_by_type() {
        let id = uuid::Uuid::new_v4();
        assert_ne!(CacheKey::entity("Property", id), CacheKey::entity("Customer", id));
    }

    #[test]
    fn query_key_keeps_parameter_positions() {
        let key = CacheKey::query("GetAllCustomers", ["", "2", "10"]);
        assert_eq!(key.as_str(), "GetAllCustomers--2-10");
        assert_ne!(key, CacheKey::query("GetAllCustomers", ["2", "", "10"]));
    }

    #[test]
    fn query_key_without_parameters_is_shape() {
        let key = CacheKey::query("GetAllPropertyTypes", Vec::<String>::new());
        assert_eq!(key.to_string(), "GetAllPropertyTypes");
    }
}
