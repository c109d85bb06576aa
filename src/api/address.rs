use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::client::{ApiClient, ApiRequest, ApiResponse};
use super::types::Pagination;

/// Body for creating or updating a shipping/billing address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
  pub first_name: String,
  pub last_name: String,
  pub phone_number: String,
  /// Dialing code, e.g. "+1"
  pub cc: String,
  pub address: String,
  pub town: Option<String>,
  pub city: String,
  pub province: String,
  pub post_code: String,
  pub country: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub address_type: Option<String>,
}

impl ApiClient {
  pub async fn list_addresses(&self, page: &Pagination) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("user/address").query(page)?).await
  }

  pub async fn get_address(&self, id: u64) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get(format!("user/address/{}", id))).await
  }

  pub async fn create_address(&self, body: &AddressRequest) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::post("user/address").json(body)?).await
  }

  pub async fn update_address(&self, id: u64, body: &AddressRequest) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::patch(format!("user/address/{}", id)).json(body)?)
      .await
  }

  pub async fn delete_address(&self, id: u64) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::delete(format!("user/address/{}", id))).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::{body_of, client, FakeTransport};
  use serde_json::json;

  #[tokio::test]
  async fn test_list_addresses_paginates() {
    let transport = FakeTransport::new();
    transport.respond("GET", "/api/v1/user/address", 200, json!({"status": true, "data": []}));

    client(&transport)
      .list_addresses(&Pagination::new(1, 10))
      .await
      .unwrap();

    let sent = transport.requests();
    assert_eq!(sent[0].url.query(), Some("limit=10&page=1"));
  }

  #[tokio::test]
  async fn test_update_address_patches_by_id() {
    let transport = FakeTransport::new();
    transport.respond("PATCH", "/api/v1/user/address/7", 200, json!({"status": true}));

    let body = AddressRequest {
      first_name: "Ada".into(),
      city: "London".into(),
      ..Default::default()
    };
    client(&transport).update_address(7, &body).await.unwrap();

    let sent = &transport.requests()[0];
    assert_eq!(body_of(sent)["firstName"], json!("Ada"));
    assert_eq!(body_of(sent)["city"], json!("London"));
    assert!(body_of(sent).get("addressType").is_none());
  }
}
