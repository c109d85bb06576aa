use serde_json::Value;

use crate::api::OrderFilter;
use crate::query::{Mutation, QueryObserver, QueryOptions};

use super::{keys, Market};

impl Market {
  pub fn orders(&self, filter: OrderFilter) -> QueryObserver {
    self.query(keys::order::list(&filter), QueryOptions::new(), move |api| {
      let filter = filter.clone();
      async move { api.list_orders(&filter).await }
    })
  }

  /// Order detail. Disabled until `id` is known.
  pub fn order(&self, id: Option<u64>) -> QueryObserver {
    self.query_by_id(keys::order::detail(id), id, |api, id| async move {
      api.get_order(id).await
    })
  }

  pub fn seller_orders(&self, filter: OrderFilter) -> QueryObserver {
    self.query(keys::order::seller(&filter), QueryOptions::new(), move |api| {
      let filter = filter.clone();
      async move { api.seller_orders(&filter).await }
    })
  }

  pub fn create_order(&self) -> Mutation<Value> {
    self
      .mutation(|api, order: Value| async move { api.create_order(&order).await })
      .invalidates(keys::order::all())
  }

  /// Checkout without an account.
  pub fn create_guest_order(&self) -> Mutation<Value> {
    self
      .mutation(|api, order: Value| async move { api.create_guest_order(&order).await })
      .invalidates(keys::order::all())
  }

  pub fn update_order_status(&self) -> Mutation<(u64, String)> {
    self
      .mutation(|api, (id, status): (u64, String)| async move {
        api.update_order_status(id, &status).await
      })
      .invalidates(keys::order::all())
      .invalidates(keys::order::seller_all())
  }

  pub fn cancel_order(&self) -> Mutation<(u64, Option<String>)> {
    self
      .mutation(|api, (id, reason): (u64, Option<String>)| async move {
        api.cancel_order(id, reason.as_deref()).await
      })
      .invalidates(keys::order::all())
      .invalidates(keys::order::seller_all())
  }
}
