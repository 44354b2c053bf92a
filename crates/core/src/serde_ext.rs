//! Serde helpers for request types.

use serde::{Deserialize, Deserializer};

/// Deserializes an optional string, treating blank values as absent.
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Keeps an explicit `null` apart from a missing field.
///
/// Pair with `#[serde(default)]`: a missing field stays `None`, `null`
/// becomes `Some(None)`.
pub fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Query {
        #[serde(default, deserialize_with = "deserialize_optional_string")]
        code: Option<String>,
    }

    #[test]
    fn test_blank_is_none() {
        let q: Query = serde_json::from_str(r#"{"code": "  "}"#).unwrap();
        assert_eq!(q.code, None);
    }

    #[test]
    fn test_missing_is_none() {
        let q: Query = serde_json::from_str("{}").unwrap();
        assert_eq!(q.code, None);
    }

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "deserialize_nullable")]
        symbol: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_distinguishes_null_from_missing() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.symbol, None);

        let null: Patch = serde_json::from_str(r#"{"symbol": null}"#).unwrap();
        assert_eq!(null.symbol, Some(None));

        let set: Patch = serde_json::from_str(r#"{"symbol": "DH"}"#).unwrap();
        assert_eq!(set.symbol, Some(Some("DH".to_string())));
    }

    #[test]
    fn test_value_is_kept() {
        let q: Query = serde_json::from_str(r#"{"code": "MA"}"#).unwrap();
        assert_eq!(q.code.as_deref(), Some("MA"));
    }
}
