//! Admin-side client: a key-addressed resource cache over the HTTP API,
//! typed hooks on top of it, and write helpers that invalidate what they
//! change.

pub mod admin;
pub mod cache;
pub mod hooks;
pub mod keys;
pub mod singleflight;
pub mod transport;

pub use admin::AdminClient;
pub use cache::{EntrySnapshot, ResourceCache, ResourceHandle};
pub use hooks::{CollectionHook, CollectionState, EntityHook, EntityState};
pub use keys::ResourceKey;
pub use transport::{Fetcher, HttpTransport, TransportError};
