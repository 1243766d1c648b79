//! Session store — concurrency-safe, in-memory, process-lifetime only.
//!
//! Sessions live behind two locking levels: an `RwLock` map for
//! membership (insert/delete/sweep) and one `Mutex` per session for turn
//! mutation. Appends on different sessions never contend; appends on the
//! same session serialize. Nothing is persisted — a restart discards all
//! conversations, which is a stated trade-off of this design.

pub mod store;
pub mod sweeper;

pub use store::{SessionStats, SessionStore, StoreStats};
pub use sweeper::spawn_sweeper;
