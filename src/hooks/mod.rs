//! Cache-aware bindings for every marketplace resource.
//!
//! Reads return a mounted [`QueryObserver`] keyed from [`keys`]; writes
//! return a [`Mutation`] that invalidates the affected resource groups once
//! the backend confirms the change. Payloads are the raw response envelopes.

mod address;
mod banner;
mod dropship;
mod notification;
mod order;
mod product;
mod reward;
mod rfq;
mod wallet;

pub mod keys;

use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::api::{ApiClient, ApiResponse};
use crate::error::ApiError;
use crate::query::{fetcher, Fetcher, Mutation, QueryClient, QueryKey, QueryObserver, QueryOptions};

/// How often a mounted wallet balance refreshes.
pub const WALLET_BALANCE_POLL: Duration = Duration::from_secs(30);

/// How often a mounted unread-notification count refreshes.
pub const UNREAD_COUNT_POLL: Duration = Duration::from_secs(60);

/// An API client bound to a query cache.
#[derive(Debug, Clone)]
pub struct Market {
  api: ApiClient,
  queries: QueryClient,
}

impl Market {
  pub fn new(api: ApiClient, queries: QueryClient) -> Self {
    Self { api, queries }
  }

  pub fn api(&self) -> &ApiClient {
    &self.api
  }

  pub fn queries(&self) -> &QueryClient {
    &self.queries
  }

  fn bind<F, Fut>(&self, request: F) -> Fetcher
  where
    F: Fn(ApiClient) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ApiResponse, ApiError>> + Send + 'static,
  {
    let api = self.api.clone();
    fetcher(move || {
      let response = request(api.clone());
      async move { response.await.map(ApiResponse::into_body) }
    })
  }

  fn query<F, Fut>(&self, key: QueryKey, options: QueryOptions, request: F) -> QueryObserver
  where
    F: Fn(ApiClient) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ApiResponse, ApiError>> + Send + 'static,
  {
    self.queries.observe(key, self.bind(request), options)
  }

  /// Query whose request needs an id that may not be known yet. Stays
  /// disabled until it is.
  fn query_by_id<F, Fut>(&self, key: QueryKey, id: Option<u64>, request: F) -> QueryObserver
  where
    F: Fn(ApiClient, u64) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ApiResponse, ApiError>> + Send + 'static,
  {
    let options = QueryOptions::new().enabled(id.is_some());
    let api = self.api.clone();
    let fetch = fetcher(move || {
      let response = id.map(|id| request(api.clone(), id));
      async move {
        match response {
          Some(response) => response.await.map(ApiResponse::into_body),
          None => Err(ApiError::MissingParam("id")),
        }
      }
    });
    self.queries.observe(key, fetch, options)
  }

  fn mutation<P, F, Fut>(&self, request: F) -> Mutation<P>
  where
    P: Send + 'static,
    F: Fn(ApiClient, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ApiResponse, ApiError>> + Send + 'static,
  {
    let api = self.api.clone();
    Mutation::new(&self.queries, move |params: P| {
      let response = request(api.clone(), params);
      async move { response.await.map(ApiResponse::into_body) }
    })
  }

  /// One-shot read through the cache, for callers that don't stay mounted.
  pub async fn fetch<F, Fut>(&self, key: &QueryKey, request: F) -> Result<Value, ApiError>
  where
    F: Fn(ApiClient) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ApiResponse, ApiError>> + Send + 'static,
  {
    self
      .queries
      .fetch_query(key, self.bind(request), None)
      .await
      .map(|data| data.as_ref().clone())
      .map_err(|err| err.as_ref().clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::{self, FakeTransport};
  use crate::api::{AddressRequest, Pagination, ProductFilter, WithdrawRequest};
  use crate::query::{KeyPart, QueryDefaults};
  use crate::query_key;
  use serde_json::json;
  use std::sync::{Arc, Mutex};

  const ADDRESSES: &str = "/api/v1/user/address";

  fn market(transport: &Arc<FakeTransport>) -> Market {
    Market::new(testing::client(transport), QueryClient::new(QueryDefaults::default()))
  }

  fn home() -> AddressRequest {
    AddressRequest {
      first_name: "Ada".into(),
      last_name: "Lovelace".into(),
      phone_number: "5550100".into(),
      cc: "+1".into(),
      address: "12 Analytical Way".into(),
      city: "London".into(),
      province: "Greater London".into(),
      post_code: "N1".into(),
      country: "UK".into(),
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn test_identical_queries_share_one_request() {
    let transport = FakeTransport::new();
    transport.respond("GET", "/api/v1/product", 200, json!({"status": true, "data": []}));
    transport.set_delay(Duration::from_millis(20));
    let market = market(&transport);

    let mut a = market.products(ProductFilter::default());
    let mut b = market.products(ProductFilter::default());
    a.settled().await.unwrap();
    b.settled().await.unwrap();

    assert_eq!(transport.calls("GET", "/api/v1/product"), 1);
    assert_eq!(a.data(), b.data());
  }

  #[tokio::test]
  async fn test_order_without_id_stays_idle() {
    let transport = FakeTransport::new();
    let market = market(&transport);

    let observer = market.order(None);
    tokio::task::yield_now().await;

    assert!(!observer.is_enabled());
    assert!(observer.state().is_idle());
    assert!(transport.requests().is_empty());

    // Placing an order invalidates ["order"] but the detail stays put
    transport.respond("POST", "/api/v1/order", 200, json!({"status": true}));
    market.create_order().mutate(json!({"items": []})).await.unwrap();
    tokio::task::yield_now().await;

    assert_eq!(transport.requests().len(), 1);
    assert!(observer.state().is_idle());
    assert!(observer.state().is_invalidated);
  }

  #[tokio::test]
  async fn test_order_with_id_fetches() {
    let transport = FakeTransport::new();
    transport.respond("GET", "/api/v1/order/42", 200, json!({"status": true, "data": {"id": 42}}));
    let market = market(&transport);

    let mut observer = market.order(Some(42));
    let state = observer.settled().await.unwrap();

    assert_eq!(state.data().unwrap()["data"]["id"], json!(42));
    assert_eq!(observer.key(), &keys::order::detail(Some(42)));
  }

  #[tokio::test]
  async fn test_adding_address_refetches_mounted_list() {
    let transport = FakeTransport::new();
    transport.respond_with("GET", ADDRESSES, |n| {
      Ok((200, json!({"status": true, "data": vec![json!({"id": 1}); n]})))
    });
    transport.respond("POST", ADDRESSES, 201, json!({"status": true, "data": {"id": 1}}));
    let market = market(&transport);

    let mut list = market.addresses(Pagination::new(1, 10));
    assert_eq!(
      list.key(),
      &query_key!["address", KeyPart::params(&json!({"page": 1, "limit": 10}))]
    );
    let first = list.settled().await.unwrap();
    assert_eq!(first.data().unwrap()["data"], json!([]));

    market.add_address().mutate(home()).await.unwrap();
    assert!(list.state().is_loading());

    let refreshed = list.settled().await.unwrap();
    assert_eq!(transport.calls("GET", ADDRESSES), 2);
    assert_eq!(refreshed.data().unwrap()["data"], json!([{"id": 1}]));
    assert!(!refreshed.is_invalidated);

    let posted = transport
      .requests()
      .into_iter()
      .find(|r| r.method == reqwest::Method::POST)
      .unwrap();
    assert_eq!(testing::body_of(&posted)["firstName"], json!("Ada"));
  }

  #[tokio::test]
  async fn test_unmounted_query_only_marked_stale() {
    let transport = FakeTransport::new();
    transport.respond("GET", ADDRESSES, 200, json!({"status": true, "data": []}));
    transport.respond("DELETE", "/api/v1/user/address/3", 200, json!({"status": true}));
    let market = market(&transport);
    let key = keys::address::list(&Pagination::default());

    {
      let mut list = market.addresses(Pagination::default());
      list.settled().await.unwrap();
    }

    market.delete_address().mutate(3).await.unwrap();

    assert!(market.queries().state(&key).unwrap().is_invalidated);
    assert_eq!(transport.calls("GET", ADDRESSES), 1);

    // Remounting picks up the stale mark
    let mut list = market.addresses(Pagination::default());
    list.settled().await.unwrap();
    assert_eq!(transport.calls("GET", ADDRESSES), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_wallet_balance_polls_while_mounted() {
    let transport = FakeTransport::new();
    transport.respond("GET", "/api/v1/wallet/balance", 200, json!({"status": true, "data": {"balance": 0}}));
    let market = market(&transport);

    let mut balance = market.wallet_balance();
    balance.settled().await.unwrap();
    assert_eq!(transport.calls("GET", "/api/v1/wallet/balance"), 1);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(transport.calls("GET", "/api/v1/wallet/balance"), 3);

    drop(balance);
    tokio::time::sleep(Duration::from_secs(90)).await;
    assert_eq!(transport.calls("GET", "/api/v1/wallet/balance"), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_unread_count_polls_every_minute() {
    let transport = FakeTransport::new();
    transport.respond("GET", "/api/v1/notification/unread-count", 200, json!({"status": true, "data": {"count": 2}}));
    let market = market(&transport);

    let mut unread = market.unread_notifications();
    unread.settled().await.unwrap();

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(transport.calls("GET", "/api/v1/notification/unread-count"), 1);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(transport.calls("GET", "/api/v1/notification/unread-count"), 2);
  }

  #[tokio::test]
  async fn test_withdraw_error_message_reaches_callback() {
    let transport = FakeTransport::new();
    transport.respond(
      "POST",
      "/api/v1/wallet/withdraw",
      400,
      json!({"status": false, "message": "Insufficient balance"}),
    );
    let market = market(&transport);
    market.queries().set_query_data(&keys::wallet::balance(), json!({"data": {"balance": 1}}));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let withdraw = market.withdraw().on_error(move |err| sink.lock().unwrap().push(err.message()));

    let result = withdraw
      .mutate(WithdrawRequest {
        amount: 100.0,
        bank_account_id: 9,
        remarks: None,
      })
      .await;

    assert!(result.is_err());
    assert_eq!(*seen.lock().unwrap(), vec!["Insufficient balance".to_string()]);
    assert!(!market.queries().state(&keys::wallet::balance()).unwrap().is_invalidated);
  }

  #[tokio::test]
  async fn test_deposit_invalidates_balance_and_history() {
    let transport = FakeTransport::new();
    transport.respond("POST", "/api/v1/wallet/deposit", 200, json!({"status": true}));
    let market = market(&transport);
    let queries = market.queries();
    let history = keys::wallet::transactions(&Default::default());
    queries.set_query_data(&keys::wallet::balance(), json!({}));
    queries.set_query_data(&history, json!({}));
    queries.set_query_data(&keys::wallet::settings(), json!({}));

    market
      .deposit()
      .mutate(crate::api::DepositRequest {
        amount: 25.0,
        payment_method: "CARD".into(),
        reference: None,
      })
      .await
      .unwrap();

    assert!(queries.state(&keys::wallet::balance()).unwrap().is_invalidated);
    assert!(queries.state(&history).unwrap().is_invalidated);
    assert!(!queries.state(&keys::wallet::settings()).unwrap().is_invalidated);
  }

  #[tokio::test]
  async fn test_order_status_invalidates_buyer_and_seller_lists() {
    let transport = FakeTransport::new();
    transport.respond("PATCH", "/api/v1/order/5/status", 200, json!({"status": true}));
    let market = market(&transport);
    let queries = market.queries();
    let buyer = keys::order::list(&Default::default());
    let seller = keys::order::seller(&Default::default());
    queries.set_query_data(&buyer, json!({}));
    queries.set_query_data(&seller, json!({}));

    market
      .update_order_status()
      .mutate((5, "SHIPPED".to_string()))
      .await
      .unwrap();

    assert!(queries.state(&buyer).unwrap().is_invalidated);
    assert!(queries.state(&seller).unwrap().is_invalidated);
    assert_eq!(
      testing::body_of(&transport.requests()[0]),
      json!({"status": "SHIPPED"})
    );
  }

  #[tokio::test]
  async fn test_active_banners_are_public() {
    let transport = FakeTransport::new();
    transport.respond("GET", "/api/v1/banner/active", 200, json!({"status": true, "data": []}));
    let market = market(&transport);

    let mut banners = market.active_banners();
    banners.settled().await.unwrap();

    assert_eq!(transport.requests()[0].header("Authorization"), None);
  }

  #[tokio::test]
  async fn test_fetch_reads_through_cache() {
    let transport = FakeTransport::new();
    transport.respond("GET", "/api/v1/rfq/cart", 200, json!({"status": true, "data": []}));
    let market = market(&transport);

    let body = market
      .fetch(&keys::rfq::cart(), |api| async move { api.rfq_cart().await })
      .await
      .unwrap();

    assert_eq!(body["data"], json!([]));
    assert!(market.queries().get_query_data(&keys::rfq::cart()).is_some());
  }
}
