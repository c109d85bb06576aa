use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::client::{ApiClient, ApiRequest, ApiResponse};
use super::types::Pagination;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationFilter {
  #[serde(flatten)]
  pub page: Pagination,
  /// ORDER, RFQ, WALLET, SYSTEM
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
  #[serde(rename = "unreadOnly", skip_serializing_if = "Option::is_none")]
  pub unread_only: Option<bool>,
}

impl ApiClient {
  pub async fn list_notifications(&self, filter: &NotificationFilter) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("notification").query(filter)?).await
  }

  pub async fn unread_notification_count(&self) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("notification/unread-count")).await
  }

  pub async fn mark_notification_read(&self, id: u64) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::patch(format!("notification/{}/read", id)))
      .await
  }

  pub async fn mark_all_notifications_read(&self) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::patch("notification/read-all")).await
  }

  pub async fn delete_notification(&self, id: u64) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::delete(format!("notification/{}", id)))
      .await
  }
}
