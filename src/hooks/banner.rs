use crate::api::{BannerRequest, Pagination};
use crate::query::{Mutation, QueryObserver, QueryOptions};

use super::{keys, Market};

impl Market {
  /// Storefront banners; sent without credentials.
  pub fn active_banners(&self) -> QueryObserver {
    self.query(keys::banner::active(), QueryOptions::new(), |api| async move {
      api.active_banners().await
    })
  }

  pub fn banners(&self, page: Pagination) -> QueryObserver {
    self.query(keys::banner::list(&page), QueryOptions::new(), move |api| async move {
      api.list_banners(&page).await
    })
  }

  pub fn banner(&self, id: u64) -> QueryObserver {
    self.query(keys::banner::detail(id), QueryOptions::new(), move |api| async move {
      api.get_banner(id).await
    })
  }

  pub fn create_banner(&self) -> Mutation<BannerRequest> {
    self
      .mutation(|api, body: BannerRequest| async move { api.create_banner(&body).await })
      .invalidates(keys::banner::all())
  }

  pub fn update_banner(&self) -> Mutation<(u64, BannerRequest)> {
    self
      .mutation(|api, (id, body): (u64, BannerRequest)| async move {
        api.update_banner(id, &body).await
      })
      .invalidates(keys::banner::all())
  }

  pub fn delete_banner(&self) -> Mutation<u64> {
    self
      .mutation(|api, id: u64| async move { api.delete_banner(id).await })
      .invalidates(keys::banner::all())
  }

  /// Click tracking changes no cached view.
  pub fn track_banner_click(&self) -> Mutation<u64> {
    self.mutation(|api, id: u64| async move { api.track_banner_click(id).await })
  }
}
