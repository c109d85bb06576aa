//! Request functions for the marketplace REST backend.
//!
//! One method on [`ApiClient`] per backend operation. Each builds exactly one
//! HTTP call and returns the raw response; no retries and no caching happen
//! here.

mod address;
mod banner;
mod client;
mod dropship;
mod notification;
mod order;
mod product;
mod reward;
mod rfq;
pub mod transport;
mod types;
mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use address::AddressRequest;
pub use banner::BannerRequest;
pub use client::{Access, ApiClient, ApiRequest, ApiResponse};
pub use dropship::DropshipProductRequest;
pub use notification::NotificationFilter;
pub use order::OrderFilter;
pub use product::{ProductFilter, ReviewRequest};
pub use rfq::RfqCartItem;
pub use types::{DateRange, Pagination, SearchParams};
pub use wallet::{DepositRequest, TransactionFilter, TransferRequest, WithdrawRequest};
