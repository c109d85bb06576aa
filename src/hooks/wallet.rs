use serde_json::Value;

use crate::api::{DepositRequest, TransactionFilter, TransferRequest, WithdrawRequest};
use crate::query::{Mutation, QueryObserver, QueryOptions};

use super::{keys, Market, WALLET_BALANCE_POLL};

impl Market {
  /// Balance of the signed-in user, refreshed while mounted.
  pub fn wallet_balance(&self) -> QueryObserver {
    self.query(
      keys::wallet::balance(),
      QueryOptions::new().refetch_interval(WALLET_BALANCE_POLL),
      |api| async move { api.wallet_balance().await },
    )
  }

  pub fn wallet_transactions(&self, filter: TransactionFilter) -> QueryObserver {
    self.query(keys::wallet::transactions(&filter), QueryOptions::new(), move |api| {
      let filter = filter.clone();
      async move { api.wallet_transactions(&filter).await }
    })
  }

  pub fn wallet_settings(&self) -> QueryObserver {
    self.query(keys::wallet::settings(), QueryOptions::new(), |api| async move {
      api.wallet_settings().await
    })
  }

  pub fn deposit(&self) -> Mutation<DepositRequest> {
    self
      .mutation(|api, body: DepositRequest| async move { api.wallet_deposit(&body).await })
      .invalidates(keys::wallet::balance())
      .invalidates(keys::wallet::transactions_all())
  }

  pub fn withdraw(&self) -> Mutation<WithdrawRequest> {
    self
      .mutation(|api, body: WithdrawRequest| async move { api.wallet_withdraw(&body).await })
      .invalidates(keys::wallet::balance())
      .invalidates(keys::wallet::transactions_all())
  }

  pub fn transfer(&self) -> Mutation<TransferRequest> {
    self
      .mutation(|api, body: TransferRequest| async move { api.wallet_transfer(&body).await })
      .invalidates(keys::wallet::balance())
      .invalidates(keys::wallet::transactions_all())
  }

  pub fn update_wallet_settings(&self) -> Mutation<Value> {
    self
      .mutation(|api, settings: Value| async move { api.update_wallet_settings(&settings).await })
      .invalidates(keys::wallet::settings())
  }
}
