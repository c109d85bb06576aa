use serde_json::Value;

use crate::api::Pagination;
use crate::query::{Mutation, QueryObserver, QueryOptions};

use super::{keys, Market};

impl Market {
  pub fn seller_rewards(&self, page: Pagination) -> QueryObserver {
    self.query(keys::reward::seller_rewards(&page), QueryOptions::new(), move |api| async move {
      api.seller_rewards(&page).await
    })
  }

  pub fn create_seller_reward(&self) -> Mutation<Value> {
    self
      .mutation(|api, reward: Value| async move { api.create_seller_reward(&reward).await })
      .invalidates(keys::reward::seller_rewards_all())
  }

  pub fn update_seller_reward_status(&self) -> Mutation<(u64, String)> {
    self
      .mutation(|api, (id, status): (u64, String)| async move {
        api.update_seller_reward_status(id, &status).await
      })
      .invalidates(keys::reward::seller_rewards_all())
  }

  pub fn share_links(&self, page: Pagination) -> QueryObserver {
    self.query(keys::reward::share_links(&page), QueryOptions::new(), move |api| async move {
      api.share_links(&page).await
    })
  }

  pub fn create_share_link(&self) -> Mutation<Value> {
    self
      .mutation(|api, link: Value| async move { api.create_share_link(&link).await })
      .invalidates(keys::reward::share_links_all())
  }
}
