use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;

use super::client::{ApiClient, ApiRequest, ApiResponse};
use super::types::{Pagination, SearchParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropshipProductRequest {
  pub product_id: u64,
  /// Percentage added on top of the supplier price
  pub margin: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub custom_title: Option<String>,
}

impl ApiClient {
  /// Products the signed-in seller is dropshipping.
  pub async fn dropship_products(&self, params: &SearchParams) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::get("dropship/product").query(params)?)
      .await
  }

  pub async fn add_dropship_product(&self, body: &DropshipProductRequest) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::post("dropship/product").json(body)?)
      .await
  }

  pub async fn remove_dropship_product(&self, id: u64) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::delete(format!("dropship/product/{}", id)))
      .await
  }

  pub async fn update_dropship_margin(&self, id: u64, margin: f64) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::patch(format!("dropship/product/{}", id)).json(&json!({ "margin": margin }))?)
      .await
  }

  pub async fn dropship_orders(&self, page: &Pagination) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("dropship/order").query(page)?).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::{body_of, client, FakeTransport};

  #[tokio::test]
  async fn test_margin_update() {
    let transport = FakeTransport::new();
    transport.respond("PATCH", "/api/v1/dropship/product/8", 200, json!({"status": true}));

    client(&transport).update_dropship_margin(8, 12.5).await.unwrap();

    assert_eq!(body_of(&transport.requests()[0]), json!({"margin": 12.5}));
  }
}
