//! omnium-store: canonical snapshot serialization, content-addressed
//! storage, the CID chain, and the fetch-and-compare sync state machine
//! (component C7).

mod address;
mod chain;
mod content_store;
mod snapshot;
mod sync;

pub use address::ContentAddress;
pub use chain::{append, height_of, resolve, walk, StatePointer};
pub use content_store::{ContentStore, FsContentStore};
pub use snapshot::{Snapshot, CURRENT_SNAPSHOT_VERSION};
pub use sync::{compare, sync_from, CompareResult, SyncOutcome};
