use crate::api::{AddressRequest, Pagination};
use crate::query::{Mutation, QueryObserver, QueryOptions};

use super::{keys, Market};

impl Market {
  pub fn addresses(&self, page: Pagination) -> QueryObserver {
    self.query(keys::address::list(&page), QueryOptions::new(), move |api| async move {
      api.list_addresses(&page).await
    })
  }

  pub fn address(&self, id: Option<u64>) -> QueryObserver {
    self.query_by_id(keys::address::detail(id), id, |api, id| async move {
      api.get_address(id).await
    })
  }

  pub fn add_address(&self) -> Mutation<AddressRequest> {
    self
      .mutation(|api, body: AddressRequest| async move { api.create_address(&body).await })
      .invalidates(keys::address::all())
  }

  pub fn update_address(&self) -> Mutation<(u64, AddressRequest)> {
    self
      .mutation(|api, (id, body): (u64, AddressRequest)| async move {
        api.update_address(id, &body).await
      })
      .invalidates(keys::address::all())
  }

  pub fn delete_address(&self) -> Mutation<u64> {
    self
      .mutation(|api, id: u64| async move { api.delete_address(id).await })
      .invalidates(keys::address::all())
  }
}
