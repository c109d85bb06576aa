use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

use super::client::{ApiClient, ApiRequest, ApiResponse};
use super::types::{DateRange, Pagination};

/// Filters for the wallet transaction history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
  #[serde(flatten)]
  pub page: Pagination,
  /// DEPOSIT, WITHDRAWAL, TRANSFER, PAYMENT, REFUND
  #[serde(rename = "transactionType", skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
  #[serde(flatten)]
  pub dates: DateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
  pub amount: f64,
  pub payment_method: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
  pub amount: f64,
  pub bank_account_id: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
  pub receiver_id: u64,
  pub amount: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub remarks: Option<String>,
}

impl ApiClient {
  pub async fn wallet_balance(&self) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("wallet/balance")).await
  }

  pub async fn wallet_transactions(&self, filter: &TransactionFilter) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::get("wallet/transactions").query(filter)?)
      .await
  }

  pub async fn wallet_deposit(&self, body: &DepositRequest) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::post("wallet/deposit").json(body)?).await
  }

  pub async fn wallet_withdraw(&self, body: &WithdrawRequest) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::post("wallet/withdraw").json(body)?).await
  }

  pub async fn wallet_transfer(&self, body: &TransferRequest) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::post("wallet/transfer").json(body)?).await
  }

  pub async fn wallet_settings(&self) -> Result<ApiResponse, ApiError> {
    self.send(ApiRequest::get("wallet/settings")).await
  }

  pub async fn update_wallet_settings(&self, settings: &Value) -> Result<ApiResponse, ApiError> {
    self
      .send(ApiRequest::patch("wallet/settings").json(settings)?)
      .await
  }
}
