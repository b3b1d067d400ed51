//! The fetch-and-compare sync state machine.
//!
//! Synchronization here is peerless in the sense that it never negotiates
//! with a remote node directly: the caller hands over a `remote_head`
//! address that both sides' content stores already agree on, and everything
//! else is resolved by walking the shared, content-addressed chain.

use crate::address::ContentAddress;
use crate::chain::{resolve, walk, StatePointer};
use crate::content_store::ContentStore;
use crate::snapshot::Snapshot;
use omnium_spec::{OmniumError, OmniumResult};
use std::collections::HashSet;

/// The relationship of a local chain head to a remote one.
#[derive(Debug, Clone, PartialEq)]
pub enum CompareResult {
    Equal,
    Ahead,
    Behind {
        height_diff: u64,
        /// Newest-first, as returned by `walk`.
        missing: Vec<(ContentAddress, StatePointer)>,
    },
    Diverged,
}

/// The outcome of a successful `sync_from` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    NoChange,
    AlreadyAhead,
    Applied { states_applied: u64 },
}

fn height_of(store: &dyn ContentStore, head: Option<&ContentAddress>) -> OmniumResult<u64> {
    crate::chain::height_of(store, head)
}

/// Compare a local chain head against a remote one.
pub fn compare(
    store: &dyn ContentStore,
    local_head: Option<&ContentAddress>,
    remote_head: Option<&ContentAddress>,
) -> OmniumResult<CompareResult> {
    if local_head == remote_head {
        return Ok(CompareResult::Equal);
    }

    if local_head.is_none() {
        let missing = walk(store, remote_head, 0, None)?;
        let height_diff = height_of(store, remote_head)?;
        return Ok(CompareResult::Behind {
            height_diff,
            missing,
        });
    }

    let local_chain = walk(store, local_head, 0, None)?;
    let local_addresses: HashSet<ContentAddress> =
        local_chain.iter().map(|(addr, _)| addr.clone()).collect();
    let remote_chain = walk(store, remote_head, 0, None)?;

    let common_ancestor = remote_chain
        .iter()
        .find(|(addr, _)| local_addresses.contains(addr))
        .map(|(addr, _)| addr.clone());

    match common_ancestor {
        Some(ancestor) if Some(&ancestor) == local_head => {
            let missing = walk(store, remote_head, 0, local_head)?;
            let height_diff = height_of(store, remote_head)? - height_of(store, local_head)?;
            Ok(CompareResult::Behind {
                height_diff,
                missing,
            })
        }
        Some(ancestor) if Some(&ancestor) == remote_head => Ok(CompareResult::Ahead),
        _ => Ok(CompareResult::Diverged),
    }
}

/// Apply a remote chain's missing states onto the local ledger, oldest
/// first, advancing the local head only after every snapshot has been
/// applied successfully.
pub fn sync_from<F>(
    store: &dyn ContentStore,
    local_head: Option<ContentAddress>,
    remote_head: ContentAddress,
    mut apply_snapshot_fn: F,
) -> OmniumResult<SyncOutcome>
where
    F: FnMut(Snapshot) -> OmniumResult<()>,
{
    let remote_pointer = resolve(store, &remote_head)?;
    if remote_pointer.is_none() {
        return Err(OmniumError::UnknownCid(remote_head.to_string()));
    }

    let comparison = compare(store, local_head.as_ref(), Some(&remote_head))?;
    match comparison {
        CompareResult::Equal => Ok(SyncOutcome::NoChange),
        CompareResult::Ahead => Ok(SyncOutcome::AlreadyAhead),
        CompareResult::Diverged => {
            tracing::warn!(remote = %remote_head, "chains have diverged");
            Err(OmniumError::Diverged)
        }
        CompareResult::Behind { missing, .. } => {
            let mut applied = 0u64;
            for (_addr, pointer) in missing.into_iter().rev() {
                let bytes = store
                    .retrieve(&pointer.snapshot_address)?
                    .ok_or_else(|| OmniumError::UnknownCid(pointer.snapshot_address.to_string()))?;
                let snapshot = Snapshot::from_canonical_bytes(&bytes)?;
                apply_snapshot_fn(snapshot)?;
                applied += 1;
            }
            store.set_head(&remote_head)?;
            tracing::info!(states_applied = applied, "sync applied remote chain");
            Ok(SyncOutcome::Applied {
                states_applied: applied,
            })
        }
    }
}
