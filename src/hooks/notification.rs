use crate::api::NotificationFilter;
use crate::query::{Mutation, QueryObserver, QueryOptions};

use super::{keys, Market, UNREAD_COUNT_POLL};

impl Market {
  pub fn notifications(&self, filter: NotificationFilter) -> QueryObserver {
    self.query(keys::notification::list(&filter), QueryOptions::new(), move |api| {
      let filter = filter.clone();
      async move { api.list_notifications(&filter).await }
    })
  }

  /// Unread badge count, refreshed while mounted.
  pub fn unread_notifications(&self) -> QueryObserver {
    self.query(
      keys::notification::unread_count(),
      QueryOptions::new().refetch_interval(UNREAD_COUNT_POLL),
      |api| async move { api.unread_notification_count().await },
    )
  }

  pub fn mark_notification_read(&self) -> Mutation<u64> {
    self
      .mutation(|api, id: u64| async move { api.mark_notification_read(id).await })
      .invalidates(keys::notification::all())
  }

  pub fn mark_all_notifications_read(&self) -> Mutation<()> {
    self
      .mutation(|api, _: ()| async move { api.mark_all_notifications_read().await })
      .invalidates(keys::notification::all())
  }

  pub fn delete_notification(&self) -> Mutation<u64> {
    self
      .mutation(|api, id: u64| async move { api.delete_notification(id).await })
      .invalidates(keys::notification::all())
  }
}
