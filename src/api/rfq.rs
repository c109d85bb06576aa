use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

use super::client::{ApiClient, ApiRequest, ApiResponse};
use super::types::{Pagination, SearchParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfqCartItem {
  pub rfq_product_id: u64,
  pub quantity: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub offer_price: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub note: Option<String>,
}

impl ApiClient {
  /// Products open for request-for-quote.
  pub async fn rfq_products(&self, params: &SearchParams) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("rfq/product").query(params)?).await
  }

  /// Quote requests the signed-in buyer has raised.
  pub async fn rfq_quotes(&self, page: &Pagination) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("rfq/quote").query(page)?).await
  }

  pub async fn rfq_quote(&self, id: u64) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get(format!("rfq/quote/{}", id))).await
  }

  pub async fn create_rfq_quote(&self, quote: &Value) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::post("rfq/quote").json(quote)?).await
  }

  pub async fn rfq_cart(&self) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("rfq/cart")).await
  }

  pub async fn add_to_rfq_cart(&self, item: &RfqCartItem) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::post("rfq/cart").json(item)?).await
  }

  pub async fn remove_from_rfq_cart(&self, cart_item_id: u64) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::delete(format!("rfq/cart/{}", cart_item_id)))
      .await
  }

  /// Quote requests addressed to the signed-in seller.
  pub async fn seller_rfq_quotes(&self, page: &Pagination) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::get("rfq/seller-quote").query(page)?)
      .await
  }

  pub async fn respond_to_rfq_quote(&self, id: u64, response: &Value) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::post(format!("rfq/seller-quote/{}/respond", id)).json(response)?)
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::{body_of, client, FakeTransport};
  use serde_json::json;

  #[tokio::test]
  async fn test_add_to_cart_body() {
    let transport = FakeTransport::new();
    transport.respond("POST", "/api/v1/rfq/cart", 200, json!({"status": true}));

    client(&transport)
      .add_to_rfq_cart(&RfqCartItem {
        rfq_product_id: 5,
        quantity: 100,
        offer_price: Some(2.5),
        note: None,
      })
      .await
      .unwrap();

    assert_eq!(
      body_of(&transport.requests()[0]),
      json!({"rfqProductId": 5, "quantity": 100, "offerPrice": 2.5})
    );
  }
}
