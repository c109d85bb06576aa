//! Cache keys and invalidation prefixes, one group per resource.
//!
//! Every list or detail key of a resource extends that resource's `all()`
//! prefix, so a write can mark the whole group stale in one call.

use crate::api::{
  NotificationFilter, OrderFilter, Pagination, ProductFilter, SearchParams, TransactionFilter,
};
use crate::query::{KeyPart, QueryKey};
use crate::query_key;

pub mod address {
  use super::*;

  pub fn all() -> QueryKey {
    query_key!["address"]
  }

  pub fn list(page: &Pagination) -> QueryKey {
    all().with(KeyPart::params(page))
  }

  pub fn detail(id: Option<u64>) -> QueryKey {
    all().with("detail").with(id)
  }
}

pub mod wallet {
  use super::*;

  pub fn all() -> QueryKey {
    query_key!["wallet"]
  }

  pub fn balance() -> QueryKey {
    query_key!["wallet", "balance"]
  }

  pub fn transactions_all() -> QueryKey {
    query_key!["wallet", "transactions"]
  }

  pub fn transactions(filter: &TransactionFilter) -> QueryKey {
    transactions_all().with(KeyPart::params(filter))
  }

  pub fn settings() -> QueryKey {
    query_key!["wallet", "settings"]
  }
}

pub mod banner {
  use super::*;

  pub fn all() -> QueryKey {
    query_key!["banner"]
  }

  pub fn active() -> QueryKey {
    query_key!["banner", "active"]
  }

  pub fn list(page: &Pagination) -> QueryKey {
    query_key!["banner", "list", KeyPart::params(page)]
  }

  pub fn detail(id: u64) -> QueryKey {
    query_key!["banner", "detail", id]
  }
}

pub mod product {
  use super::*;

  pub fn all() -> QueryKey {
    query_key!["product"]
  }

  pub fn list(filter: &ProductFilter) -> QueryKey {
    query_key!["product", "list", KeyPart::params(filter)]
  }

  pub fn detail(id: u64) -> QueryKey {
    query_key!["product", "detail", id]
  }

  pub fn seller(params: &SearchParams) -> QueryKey {
    query_key!["product", "seller", KeyPart::params(params)]
  }

  pub fn reviews_all() -> QueryKey {
    query_key!["product", "reviews"]
  }

  pub fn reviews(product_id: u64, page: &Pagination) -> QueryKey {
    reviews_all().with(product_id).with(KeyPart::params(page))
  }
}

pub mod rfq {
  use super::*;

  pub fn all() -> QueryKey {
    query_key!["rfq"]
  }

  pub fn products(params: &SearchParams) -> QueryKey {
    query_key!["rfq", "products", KeyPart::params(params)]
  }

  pub fn quotes_all() -> QueryKey {
    query_key!["rfq", "quotes"]
  }

  pub fn quotes(page: &Pagination) -> QueryKey {
    quotes_all().with(KeyPart::params(page))
  }

  pub fn quote(id: Option<u64>) -> QueryKey {
    quotes_all().with("detail").with(id)
  }

  pub fn cart() -> QueryKey {
    query_key!["rfq", "cart"]
  }

  pub fn seller_quotes_all() -> QueryKey {
    query_key!["rfq", "seller-quotes"]
  }

  pub fn seller_quotes(page: &Pagination) -> QueryKey {
    seller_quotes_all().with(KeyPart::params(page))
  }
}

pub mod order {
  use super::*;

  pub fn all() -> QueryKey {
    query_key!["order"]
  }

  pub fn list(filter: &OrderFilter) -> QueryKey {
    query_key!["order", "list", KeyPart::params(filter)]
  }

  pub fn detail(id: Option<u64>) -> QueryKey {
    query_key!["order", "detail", id]
  }

  /// Seller-side orders live under their own resource name
  pub fn seller_all() -> QueryKey {
    query_key!["seller-order"]
  }

  pub fn seller(filter: &OrderFilter) -> QueryKey {
    seller_all().with(KeyPart::params(filter))
  }
}

pub mod dropship {
  use super::*;

  pub fn all() -> QueryKey {
    query_key!["dropship"]
  }

  pub fn products(params: &SearchParams) -> QueryKey {
    query_key!["dropship", "products", KeyPart::params(params)]
  }

  pub fn orders(page: &Pagination) -> QueryKey {
    query_key!["dropship", "orders", KeyPart::params(page)]
  }
}

pub mod notification {
  use super::*;

  pub fn all() -> QueryKey {
    query_key!["notification"]
  }

  pub fn list(filter: &NotificationFilter) -> QueryKey {
    query_key!["notification", "list", KeyPart::params(filter)]
  }

  pub fn unread_count() -> QueryKey {
    query_key!["notification", "unread-count"]
  }
}

pub mod reward {
  use super::*;

  pub fn seller_rewards_all() -> QueryKey {
    query_key!["seller-reward"]
  }

  pub fn seller_rewards(page: &Pagination) -> QueryKey {
    seller_rewards_all().with(KeyPart::params(page))
  }

  pub fn share_links_all() -> QueryKey {
    query_key!["share-link"]
  }

  pub fn share_links(page: &Pagination) -> QueryKey {
    share_links_all().with(KeyPart::params(page))
  }
}
