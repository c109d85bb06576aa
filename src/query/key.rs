//! Structured cache keys.
//!
//! A key is a resource name followed by parameter values. Keys order
//! lexicographically part by part, so every key that extends a prefix sorts
//! directly after it; the cache relies on that to invalidate a prefix with a
//! single range scan.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// One element of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyPart {
  Null,
  Bool(bool),
  Int(i64),
  /// A number outside the `i64` range or with a fraction, in textual form
  Number(String),
  Str(String),
  List(Vec<KeyPart>),
  /// A parameter object, members sorted by name, `null` members dropped
  Params(Vec<(String, KeyPart)>),
}

impl KeyPart {
  /// Key part from any serializable parameter object.
  ///
  /// Two objects with the same members compare equal regardless of field
  /// order or unset optional fields.
  pub fn params<T: Serialize + ?Sized>(value: &T) -> Self {
    serde_json::to_value(value)
      .map(Self::from)
      .unwrap_or(Self::Null)
  }
}

impl From<Value> for KeyPart {
  fn from(value: Value) -> Self {
    match value {
      Value::Null => Self::Null,
      Value::Bool(b) => Self::Bool(b),
      Value::Number(n) => match n.as_i64() {
        Some(i) => Self::Int(i),
        None => Self::Number(n.to_string()),
      },
      Value::String(s) => Self::Str(s),
      Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
      Value::Object(map) => {
        let mut members: Vec<(String, KeyPart)> = map
          .into_iter()
          .filter(|(_, v)| !v.is_null())
          .map(|(k, v)| (k, Self::from(v)))
          .collect();
        members.sort_by(|a, b| a.0.cmp(&b.0));
        Self::Params(members)
      }
    }
  }
}

impl From<&str> for KeyPart {
  fn from(s: &str) -> Self {
    Self::Str(s.to_string())
  }
}

impl From<String> for KeyPart {
  fn from(s: String) -> Self {
    Self::Str(s)
  }
}

impl From<bool> for KeyPart {
  fn from(b: bool) -> Self {
    Self::Bool(b)
  }
}

impl From<i64> for KeyPart {
  fn from(i: i64) -> Self {
    Self::Int(i)
  }
}

impl From<i32> for KeyPart {
  fn from(i: i32) -> Self {
    Self::Int(i64::from(i))
  }
}

impl From<u32> for KeyPart {
  fn from(i: u32) -> Self {
    Self::Int(i64::from(i))
  }
}

impl From<u64> for KeyPart {
  fn from(i: u64) -> Self {
    i64::try_from(i)
      .map(Self::Int)
      .unwrap_or_else(|_| Self::Number(i.to_string()))
  }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
  fn from(v: Option<T>) -> Self {
    v.map(Into::into).unwrap_or(Self::Null)
  }
}

impl fmt::Display for KeyPart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Null => write!(f, "null"),
      Self::Bool(b) => write!(f, "{}", b),
      Self::Int(i) => write!(f, "{}", i),
      Self::Number(n) => write!(f, "{}", n),
      Self::Str(s) => write!(f, "{:?}", s),
      Self::List(items) => {
        write!(f, "[")?;
        for (i, item) in items.iter().enumerate() {
          if i > 0 {
            write!(f, ",")?;
          }
          write!(f, "{}", item)?;
        }
        write!(f, "]")
      }
      Self::Params(members) => {
        write!(f, "{{")?;
        for (i, (name, value)) in members.iter().enumerate() {
          if i > 0 {
            write!(f, ",")?;
          }
          write!(f, "{}:{}", name, value)?;
        }
        write!(f, "}}")
      }
    }
  }
}

/// An ordered tuple identifying one cached query result.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
  /// A key holding only the resource name.
  pub fn new(resource: &str) -> Self {
    Self(vec![KeyPart::from(resource)])
  }

  pub fn from_parts(parts: Vec<KeyPart>) -> Self {
    Self(parts)
  }

  /// Extend with one more part.
  pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
    self.0.push(part.into());
    self
  }

  pub fn parts(&self) -> &[KeyPart] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// The leading resource name, if the key starts with a string.
  pub fn resource(&self) -> Option<&str> {
    match self.0.first() {
      Some(KeyPart::Str(s)) => Some(s),
      _ => None,
    }
  }

  /// Whether `prefix` matches the first parts of this key. A key is a
  /// prefix of itself; the empty key is a prefix of everything.
  pub fn starts_with(&self, prefix: &QueryKey) -> bool {
    self.0.starts_with(&prefix.0)
  }

  /// SHA-256 of the canonical JSON form, for persistent storage.
  pub fn stable_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.to_json().as_bytes());
    hex::encode(hasher.finalize())
  }

  pub fn to_json(&self) -> String {
    // Serializing plain enums and strings cannot fail
    serde_json::to_string(&self.0).unwrap_or_default()
  }

  pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(s).map(Self)
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[")?;
    for (i, part) in self.0.iter().enumerate() {
      if i > 0 {
        write!(f, ",")?;
      }
      write!(f, "{}", part)?;
    }
    write!(f, "]")
  }
}

/// Build a [`QueryKey`] from parts convertible into [`KeyPart`].
///
/// ```ignore
/// let key = query_key!["wallet", "transactions", KeyPart::params(&page)];
/// ```
#[macro_export]
macro_rules! query_key {
  ($($part:expr),* $(,)?) => {
    $crate::query::QueryKey::from_parts(vec![$($crate::query::KeyPart::from($part)),*])
  };
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::collections::BTreeMap;

  #[test]
  fn test_structural_equality() {
    let a = query_key!["address", KeyPart::params(&json!({"page": 1, "limit": 10}))];
    let b = query_key!["address", KeyPart::params(&json!({"limit": 10, "page": 1}))];
    assert_eq!(a, b);
    assert_eq!(a.stable_hash(), b.stable_hash());
  }

  #[test]
  fn test_null_members_ignored() {
    let a = KeyPart::params(&json!({"page": 1, "term": null}));
    let b = KeyPart::params(&json!({"page": 1}));
    assert_eq!(a, b);
  }

  #[test]
  fn test_order_matters() {
    assert_ne!(query_key!["wallet", "balance"], query_key!["balance", "wallet"]);
  }

  #[test]
  fn test_starts_with() {
    let key = query_key!["wallet", "transactions", KeyPart::params(&json!({"page": 2}))];
    assert!(key.starts_with(&query_key!["wallet"]));
    assert!(key.starts_with(&query_key!["wallet", "transactions"]));
    assert!(key.starts_with(&key));
    assert!(key.starts_with(&QueryKey::default()));
    assert!(!key.starts_with(&query_key!["wallet", "balance"]));
    assert!(!query_key!["wallet"].starts_with(&key));
  }

  #[test]
  fn test_prefix_extensions_are_contiguous() {
    let mut map = BTreeMap::new();
    for key in [
      query_key!["address"],
      query_key!["address", KeyPart::params(&json!({"page": 1}))],
      query_key!["address", "detail", 4u64],
      query_key!["addresses"],
      query_key!["banner"],
      query_key!["wallet", "balance"],
      query_key!["wallet", "transactions", 1],
      query_key!["wallet", "transactions", 2],
      query_key!["wallet", "zz"],
    ] {
      map.insert(key, ());
    }

    let prefix = query_key!["wallet", "transactions"];
    let matched: Vec<&QueryKey> = map
      .range(prefix.clone()..)
      .take_while(|(k, _)| k.starts_with(&prefix))
      .map(|(k, _)| k)
      .collect();
    assert_eq!(matched.len(), 2);

    let total = map.keys().filter(|k| k.starts_with(&prefix)).count();
    assert_eq!(total, matched.len());

    let prefix = query_key!["address"];
    let matched = map
      .range(prefix.clone()..)
      .take_while(|(k, _)| k.starts_with(&prefix))
      .count();
    assert_eq!(matched, 3);
  }

  #[test]
  fn test_json_roundtrip_preserves_key() {
    let key = query_key!["product", "list", KeyPart::params(&json!({"term": "tea", "priceMin": 2.5}))];
    assert_eq!(QueryKey::from_json(&key.to_json()).unwrap(), key);
  }

  #[test]
  fn test_numbers_distinct_from_strings() {
    let float = KeyPart::params(&json!({"priceMin": 2.5}));
    let text = KeyPart::params(&json!({"priceMin": "2.5"}));
    assert_ne!(float, text);
    assert_eq!(
      float,
      KeyPart::Params(vec![("priceMin".to_string(), KeyPart::Number("2.5".to_string()))])
    );
    assert_eq!(KeyPart::from(u64::MAX), KeyPart::Number(u64::MAX.to_string()));
    assert_eq!(float.to_string(), r#"{priceMin:2.5}"#);
  }

  #[test]
  fn test_display() {
    let key = query_key!["order", "detail", 12u64];
    assert_eq!(key.to_string(), r#"["order","detail",12]"#);
    assert_eq!(key.resource(), Some("order"));
  }

  #[test]
  fn test_option_parts() {
    let none: Option<u64> = None;
    assert_eq!(query_key!["order", none].parts()[1], KeyPart::Null);
    assert_eq!(query_key!["order", Some(3u64)].parts()[1], KeyPart::Int(3));
  }
}
