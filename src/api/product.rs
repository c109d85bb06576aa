use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

use super::client::{ApiClient, ApiRequest, ApiResponse};
use super::types::{Pagination, SearchParams};

/// Storefront product listing filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
  #[serde(flatten)]
  pub search: SearchParams,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category_id: Option<u64>,
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub brand_ids: Vec<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub price_min: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub price_max: Option<f64>,
  /// newest, oldest, price_asc, price_desc
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
  pub product_id: u64,
  pub rating: u8,
  pub title: String,
  pub description: String,
}

impl ApiClient {
  pub async fn list_products(&self, filter: &ProductFilter) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("product").query(filter)?).await
  }

  pub async fn get_product(&self, id: u64) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get(format!("product/{}", id))).await
  }

  /// Products owned by the signed-in seller.
  pub async fn seller_products(&self, params: &SearchParams) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("product/seller").query(params)?).await
  }

  pub async fn create_product(&self, product: &Value) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::post("product").json(product)?).await
  }

  pub async fn update_product(&self, id: u64, product: &Value) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::patch(format!("product/{}", id)).json(product)?)
      .await
  }

  pub async fn delete_product(&self, id: u64) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::delete(format!("product/{}", id))).await
  }

  pub async fn product_reviews(&self, product_id: u64, page: &Pagination) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::get(format!("product/{}/review", product_id)).query(page)?)
      .await
  }

  pub async fn add_review(&self, body: &ReviewRequest) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::post("product/review").json(body)?).await
  }
}
