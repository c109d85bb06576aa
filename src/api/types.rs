//! Parameter objects shared by several resources.

use serde::{Deserialize, Serialize};

/// Page-based pagination as the backend expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pagination {
  pub page: u32,
  pub limit: u32,
}

impl Pagination {
  pub fn new(page: u32, limit: u32) -> Self {
    Self { page, limit }
  }
}

impl Default for Pagination {
  fn default() -> Self {
    Self { page: 1, limit: 10 }
  }
}

/// Pagination plus a free-text search term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchParams {
  #[serde(flatten)]
  pub page: Pagination,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub term: Option<String>,
}

impl SearchParams {
  pub fn new(page: Pagination) -> Self {
    Self { page, term: None }
  }

  pub fn term(mut self, term: impl Into<String>) -> Self {
    self.term = Some(term.into());
    self
  }
}

/// Inclusive date range, `YYYY-MM-DD` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub start_date: Option<chrono::NaiveDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_date: Option<chrono::NaiveDate>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_search_params_flatten() {
    let params = SearchParams::new(Pagination::new(2, 20)).term("shoes");
    assert_eq!(
      serde_json::to_value(&params).unwrap(),
      json!({"page": 2, "limit": 20, "term": "shoes"})
    );
  }

  #[test]
  fn test_date_range_format() {
    let range = DateRange {
      start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 31),
      end_date: None,
    };
    assert_eq!(serde_json::to_value(&range).unwrap(), json!({"startDate": "2024-01-31"}));
  }
}
