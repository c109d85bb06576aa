//! Seller rewards and product share links.

use serde_json::{json, Value};

use crate::error::ApiError;

use super::client::{ApiClient, ApiRequest, ApiResponse};
use super::types::Pagination;

impl ApiClient {
  pub async fn seller_rewards(&self, page: &Pagination) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("seller-reward").query(page)?).await
  }

  pub async fn create_seller_reward(&self, reward: &Value) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::post("seller-reward").json(reward)?).await
  }

  pub async fn update_seller_reward_status(&self, id: u64, status: &str) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::patch(format!("seller-reward/{}/status", id)).json(&json!({ "status": status }))?)
      .await
  }

  pub async fn share_links(&self, page: &Pagination) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("share-link").query(page)?).await
  }

  pub async fn create_share_link(&self, link: &Value) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::post("share-link").json(link)?).await
  }
}
