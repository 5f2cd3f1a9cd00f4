// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The producer side of the hand-off.
//!
//! The reconciler computes tree diffs on its own schedule and exposes the
//! newest committed batch per surface through [`MutationSource`]. It is not a
//! FIFO: a pull returns only the latest batch, and any batch committed but
//! never pulled is superseded.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::id::SurfaceId;
use crate::mutation::{Mutation, MutationBatch};

/// Hands over the most recently committed, not-yet-delivered batch.
pub trait MutationSource: Send + Sync {
    /// Takes the latest pending batch for `surface_id`.
    ///
    /// Returns an empty batch when nothing is pending. Called only from the
    /// thread currently applying transactions.
    fn pull_latest(&self, surface_id: SurfaceId) -> MutationBatch;
}

#[derive(Debug, Default)]
struct SlotState {
    pending: HashMap<SurfaceId, MutationBatch>,
    revisions: HashMap<SurfaceId, u64>,
}

/// A single-slot, latest-wins mailbox per surface.
///
/// [`commit`](Self::commit) stores a batch and assigns it the next revision
/// for its surface, replacing any batch that was not pulled yet.
#[derive(Debug, Default)]
pub struct LatestBatchSlot {
    state: Mutex<SlotState>,
}

impl LatestBatchSlot {
    /// Creates an empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits a batch for `surface_id` and returns its revision.
    ///
    /// Revisions start at 1 and increase by one per commit, whether or not
    /// earlier commits were ever pulled.
    pub fn commit(&self, surface_id: SurfaceId, mutations: Vec<Mutation>) -> u64 {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let revision = state.revisions.entry(surface_id).or_insert(0);
        *revision += 1;
        let revision = *revision;
        let superseded = state
            .pending
            .insert(surface_id, MutationBatch::new(surface_id, revision, mutations));
        if let Some(old) = superseded {
            tracing::trace!(
                ?surface_id,
                superseded = old.revision,
                revision,
                "undelivered batch replaced"
            );
        }
        revision
    }

    /// Returns `true` if a batch for `surface_id` is waiting to be pulled.
    #[must_use]
    pub fn has_pending(&self, surface_id: SurfaceId) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.pending.contains_key(&surface_id)
    }
}

impl MutationSource for LatestBatchSlot {
    fn pull_latest(&self, surface_id: SurfaceId) -> MutationBatch {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .pending
            .remove(&surface_id)
            .unwrap_or_else(|| MutationBatch::empty(surface_id))
    }
}
