use serde_json::Value;

use crate::api::{Pagination, ProductFilter, ReviewRequest, SearchParams};
use crate::query::{Mutation, QueryObserver, QueryOptions};

use super::{keys, Market};

impl Market {
  pub fn products(&self, filter: ProductFilter) -> QueryObserver {
    self.query(keys::product::list(&filter), QueryOptions::new(), move |api| {
      let filter = filter.clone();
      async move { api.list_products(&filter).await }
    })
  }

  pub fn product(&self, id: u64) -> QueryObserver {
    self.query(keys::product::detail(id), QueryOptions::new(), move |api| async move {
      api.get_product(id).await
    })
  }

  pub fn seller_products(&self, params: SearchParams) -> QueryObserver {
    self.query(keys::product::seller(&params), QueryOptions::new(), move |api| {
      let params = params.clone();
      async move { api.seller_products(&params).await }
    })
  }

  pub fn product_reviews(&self, product_id: u64, page: Pagination) -> QueryObserver {
    self.query(
      keys::product::reviews(product_id, &page),
      QueryOptions::new(),
      move |api| async move { api.product_reviews(product_id, &page).await },
    )
  }

  pub fn create_product(&self) -> Mutation<Value> {
    self
      .mutation(|api, product: Value| async move { api.create_product(&product).await })
      .invalidates(keys::product::all())
  }

  pub fn update_product(&self) -> Mutation<(u64, Value)> {
    self
      .mutation(|api, (id, product): (u64, Value)| async move {
        api.update_product(id, &product).await
      })
      .invalidates(keys::product::all())
  }

  pub fn delete_product(&self) -> Mutation<u64> {
    self
      .mutation(|api, id: u64| async move { api.delete_product(id).await })
      .invalidates(keys::product::all())
  }

  pub fn add_review(&self) -> Mutation<ReviewRequest> {
    self
      .mutation(|api, review: ReviewRequest| async move { api.add_review(&review).await })
      .invalidates(keys::product::reviews_all())
  }
}
