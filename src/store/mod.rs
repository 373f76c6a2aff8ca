//! Persistence layer: key-value store backends and helpers.

pub mod json;
pub mod lazy;
pub mod memory;
pub mod traits;
pub mod upstash;

pub use json::{get_json, set_json};
pub use lazy::{LazyStore, StoreEnvironment};
pub use memory::MemoryStore;
pub use traits::KvStore;
pub use upstash::UpstashStore;
