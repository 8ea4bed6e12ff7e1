// ── Response cache ──
//
// Last good upstream body per resource, with a TTL. Readers get `Arc`
// snapshots; the upstream client is the only writer.

pub mod backend;
pub mod entry;
pub mod store;

pub use backend::{CacheBackend, FileBackend, MemoryBackend};
pub use entry::CacheEntry;
pub use store::CacheStore;
