use serde_json::Value;

use crate::api::{Pagination, RfqCartItem, SearchParams};
use crate::query::{Mutation, QueryObserver, QueryOptions};

use super::{keys, Market};

impl Market {
  pub fn rfq_products(&self, params: SearchParams) -> QueryObserver {
    self.query(keys::rfq::products(&params), QueryOptions::new(), move |api| {
      let params = params.clone();
      async move { api.rfq_products(&params).await }
    })
  }

  pub fn rfq_quotes(&self, page: Pagination) -> QueryObserver {
    self.query(keys::rfq::quotes(&page), QueryOptions::new(), move |api| async move {
      api.rfq_quotes(&page).await
    })
  }

  pub fn rfq_quote(&self, id: Option<u64>) -> QueryObserver {
    self.query_by_id(keys::rfq::quote(id), id, |api, id| async move {
      api.rfq_quote(id).await
    })
  }

  pub fn rfq_cart(&self) -> QueryObserver {
    self.query(keys::rfq::cart(), QueryOptions::new(), |api| async move {
      api.rfq_cart().await
    })
  }

  pub fn seller_rfq_quotes(&self, page: Pagination) -> QueryObserver {
    self.query(keys::rfq::seller_quotes(&page), QueryOptions::new(), move |api| async move {
      api.seller_rfq_quotes(&page).await
    })
  }

  pub fn create_rfq_quote(&self) -> Mutation<Value> {
    self
      .mutation(|api, quote: Value| async move { api.create_rfq_quote(&quote).await })
      .invalidates(keys::rfq::quotes_all())
  }

  pub fn add_to_rfq_cart(&self) -> Mutation<RfqCartItem> {
    self
      .mutation(|api, item: RfqCartItem| async move { api.add_to_rfq_cart(&item).await })
      .invalidates(keys::rfq::cart())
  }

  pub fn remove_from_rfq_cart(&self) -> Mutation<u64> {
    self
      .mutation(|api, id: u64| async move { api.remove_from_rfq_cart(id).await })
      .invalidates(keys::rfq::cart())
  }

  pub fn respond_to_rfq_quote(&self) -> Mutation<(u64, Value)> {
    self
      .mutation(|api, (id, response): (u64, Value)| async move {
        api.respond_to_rfq_quote(id, &response).await
      })
      .invalidates(keys::rfq::seller_quotes_all())
  }
}
