//! The CID chain: a singly-linked list of state pointers over snapshots.
//! Height is monotonic; genesis has height 1 and `previous = null`.

use crate::address::ContentAddress;
use crate::content_store::ContentStore;
use omnium_spec::{OmniumResult, TimestampMs};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePointer {
    pub snapshot_address: ContentAddress,
    pub height: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub previous: Option<ContentAddress>,
    pub timestamp: TimestampMs,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub origin: Option<String>,
}

impl StatePointer {
    fn to_bytes(&self) -> OmniumResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn from_bytes(bytes: &[u8]) -> OmniumResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Resolve a stored pointer by its address, if known.
pub fn resolve(
    store: &dyn ContentStore,
    address: &ContentAddress,
) -> OmniumResult<Option<StatePointer>> {
    match store.retrieve(address)? {
        Some(bytes) => Ok(Some(StatePointer::from_bytes(&bytes)?)),
        None => Ok(None),
    }
}

/// The height of the chain rooted at `head`, or 0 if `head` is `None`.
pub fn height_of(store: &dyn ContentStore, head: Option<&ContentAddress>) -> OmniumResult<u64> {
    match head {
        None => Ok(0),
        Some(address) => match resolve(store, address)? {
            Some(pointer) => Ok(pointer.height),
            None => Ok(0),
        },
    }
}

/// Append a new pointer for `snapshot_address` onto the chain whose current
/// head is `head` (or `None` at genesis), returning the new head address.
pub fn append(
    store: &dyn ContentStore,
    snapshot_address: ContentAddress,
    head: Option<&ContentAddress>,
    now: TimestampMs,
    origin: Option<String>,
) -> OmniumResult<ContentAddress> {
    let height = height_of(store, head)? + 1;
    let pointer = StatePointer {
        snapshot_address,
        height,
        previous: head.cloned(),
        timestamp: now,
        origin,
    };
    let bytes = pointer.to_bytes()?;
    let address = store.store(&bytes)?;
    tracing::info!(height, address = %address, "appended state pointer");
    Ok(address)
}

/// Walk the chain from `start` newest-first, resolving `previous` until
/// reaching `null`, `limit` pointers have been yielded (0 = unlimited), or
/// the current address equals `stop`.
pub fn walk(
    store: &dyn ContentStore,
    start: Option<&ContentAddress>,
    limit: usize,
    stop: Option<&ContentAddress>,
) -> OmniumResult<Vec<(ContentAddress, StatePointer)>> {
    let mut out = Vec::new();
    let mut current = start.cloned();
    loop {
        let Some(address) = current else { break };
        if let Some(stop) = stop {
            if &address == stop {
                break;
            }
        }
        let Some(pointer) = resolve(store, &address)? else {
            break;
        };
        let previous = pointer.previous.clone();
        out.push((address, pointer));
        if limit != 0 && out.len() >= limit {
            break;
        }
        current = previous;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_store::FsContentStore;
    use omnium_spec::LedgerConfig;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, FsContentStore) {
        let dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            root: dir.path().to_string_lossy().to_string(),
            ..LedgerConfig::default()
        };
        (dir, FsContentStore::open(&config).unwrap())
    }

    #[test]
    fn genesis_has_height_one_and_null_previous() {
        let (_dir, store) = open_tmp();
        let snapshot_addr = store.store(b"snapshot-1").unwrap();
        let head = append(&store, snapshot_addr, None, 1_000, None).unwrap();
        let pointer = resolve(&store, &head).unwrap().unwrap();
        assert_eq!(pointer.height, 1);
        assert_eq!(pointer.previous, None);
    }

    #[test]
    fn chain_of_three_walks_back_to_genesis() {
        let (_dir, store) = open_tmp();
        let mut head: Option<ContentAddress> = None;
        for i in 0..3u64 {
            let snapshot_addr = store.store(format!("snapshot-{i}").as_bytes()).unwrap();
            head = Some(append(&store, snapshot_addr, head.as_ref(), 1_000 + i as i64, None).unwrap());
        }
        let head = head.unwrap();
        let pointer = resolve(&store, &head).unwrap().unwrap();
        assert_eq!(pointer.height, 3);

        let all = walk(&store, Some(&head), 0, None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].1.height, 3);
        assert_eq!(all[2].1.height, 1);
        assert_eq!(all[2].1.previous, None);
    }

    #[test]
    fn walk_respects_limit_and_stop() {
        let (_dir, store) = open_tmp();
        let mut head: Option<ContentAddress> = None;
        let mut heads = Vec::new();
        for i in 0..4u64 {
            let snapshot_addr = store.store(format!("snapshot-{i}").as_bytes()).unwrap();
            head = Some(append(&store, snapshot_addr, head.as_ref(), 1_000 + i as i64, None).unwrap());
            heads.push(head.clone().unwrap());
        }
        let head = head.unwrap();

        let limited = walk(&store, Some(&head), 2, None).unwrap();
        assert_eq!(limited.len(), 2);

        // stop at height-2's pointer (heads[1]) should yield heights 4 and 3 only.
        let stopped = walk(&store, Some(&head), 0, Some(&heads[1])).unwrap();
        assert_eq!(stopped.len(), 2);
        assert_eq!(stopped[0].1.height, 4);
        assert_eq!(stopped[1].1.height, 3);
    }
}
