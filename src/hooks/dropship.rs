use crate::api::{DropshipProductRequest, Pagination, SearchParams};
use crate::query::{Mutation, QueryObserver, QueryOptions};

use super::{keys, Market};

impl Market {
  pub fn dropship_products(&self, params: SearchParams) -> QueryObserver {
    self.query(keys::dropship::products(&params), QueryOptions::new(), move |api| {
      let params = params.clone();
      async move { api.dropship_products(&params).await }
    })
  }

  pub fn dropship_orders(&self, page: Pagination) -> QueryObserver {
    self.query(keys::dropship::orders(&page), QueryOptions::new(), move |api| async move {
      api.dropship_orders(&page).await
    })
  }

  pub fn add_dropship_product(&self) -> Mutation<DropshipProductRequest> {
    self
      .mutation(|api, body: DropshipProductRequest| async move {
        api.add_dropship_product(&body).await
      })
      .invalidates(keys::dropship::all())
  }

  pub fn remove_dropship_product(&self) -> Mutation<u64> {
    self
      .mutation(|api, id: u64| async move { api.remove_dropship_product(id).await })
      .invalidates(keys::dropship::all())
  }

  pub fn update_dropship_margin(&self) -> Mutation<(u64, f64)> {
    self
      .mutation(|api, (id, margin): (u64, f64)| async move {
        api.update_dropship_margin(id, margin).await
      })
      .invalidates(keys::dropship::all())
  }
}
