use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::client::{ApiClient, ApiRequest, ApiResponse};
use super::types::Pagination;

/// Body for creating or updating a banner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerRequest {
  pub title: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub subtitle: Option<String>,
  pub image: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub link: Option<String>,
  /// MAIN, SIDE_TOP, SIDE_BOTTOM, FULL_WIDTH, POPUP
  pub position: String,
  pub priority: i32,
  pub is_active: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub start_date: Option<chrono::DateTime<chrono::Utc>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_date: Option<chrono::DateTime<chrono::Utc>>,
}

impl ApiClient {
  /// Active banners for the storefront. Public.
  pub async fn active_banners(&self) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("banner/active").public()).await
  }

  /// Every banner, for the admin list.
  pub async fn list_banners(&self, page: &Pagination) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("banner").query(page)?).await
  }

  pub async fn get_banner(&self, id: u64) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get(format!("banner/{}", id))).await
  }

  pub async fn create_banner(&self, body: &BannerRequest) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::post("banner").json(body)?).await
  }

  pub async fn update_banner(&self, id: u64, body: &BannerRequest) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::patch(format!("banner/{}", id)).json(body)?)
      .await
  }

  pub async fn delete_banner(&self, id: u64) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::delete(format!("banner/{}", id))).await
  }

  /// Count a click on a banner. Public.
  pub async fn track_banner_click(&self, id: u64) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::post(format!("banner/{}/click", id)).public())
      .await
  }
}
