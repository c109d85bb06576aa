use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;

use super::client::{ApiClient, ApiRequest, ApiResponse};
use super::types::{DateRange, SearchParams};

/// Order history filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
  #[serde(flatten)]
  pub search: SearchParams,
  /// PENDING, CONFIRMED, SHIPPED, DELIVERED, CANCELLED
  #[serde(skip_serializing_if = "Option::is_none")]
  pub order_status: Option<String>,
  #[serde(flatten)]
  pub dates: DateRange,
}

impl ApiClient {
  pub async fn list_orders(&self, filter: &OrderFilter) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("order").query(filter)?).await
  }

  pub async fn get_order(&self, id: u64) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get(format!("order/{}", id))).await
  }

  pub async fn create_order(&self, order: &Value) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::post("order").json(order)?).await
  }

  /// Checkout without an account. Public.
  pub async fn create_guest_order(&self, order: &Value) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::post("order/guest").json(order)?.public())
      .await
  }

  pub async fn update_order_status(&self, id: u64, status: &str) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::patch(format!("order/{}/status", id)).json(&json!({ "status": status }))?)
      .await
  }

  pub async fn cancel_order(&self, id: u64, reason: Option<&str>) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::patch(format!("order/{}/cancel", id)).json(&json!({ "reason": reason }))?)
      .await
  }

  /// Orders containing the signed-in seller's products.
  pub async fn seller_orders(&self, filter: &OrderFilter) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("order/seller").query(filter)?).await
  }
}
