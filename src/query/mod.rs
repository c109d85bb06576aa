//! Client-side query cache.
//!
//! Reads go through [`QueryClient::fetch_query`] or a mounted
//! [`QueryObserver`]; writes go through a [`Mutation`] that invalidates key
//! prefixes once it succeeds. Concurrent reads of one key share a single
//! request, and entries nobody observes are dropped after the GC delay.

mod client;
mod key;
mod mutation;
mod observer;
mod state;

pub use client::{fetcher, FetchResult, Fetcher, QueryClient, QueryDefaults};
pub use key::{KeyPart, QueryKey};
pub use mutation::Mutation;
pub use observer::{QueryObserver, QueryOptions};
pub use state::{MutationState, QueryState, QueryStatus};
