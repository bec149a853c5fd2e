//! Price-list feed synchronization.
//!
//! Resolves the currently published snapshot, keeps a single-slot local cache
//! coherent with it, and exposes the decoded catalog for incremental search.

pub mod cache;
pub mod client;
pub mod debounce;
pub mod decode;
pub mod error;
pub mod rates;
pub mod search;
pub mod sync;
pub mod wire;

pub use cache::{CacheEntry, FileCache, MemoryCache, SnapshotCache};
pub use client::FeedClient;
pub use debounce::Debouncer;
pub use error::{ErrorKind, FeedError};
pub use rates::{format_sale_price, RateClient};
pub use search::{search, Query, SearchIndex};
pub use sync::{CatalogView, Freshness, SyncOrchestrator, SyncOutcome, SyncReport, SyncState};
pub use wire::{encode_catalog, parse_catalog};
