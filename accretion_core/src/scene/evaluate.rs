// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene evaluation and change tracking.
//!
//! Evaluation follows a drain-recompute pattern for each dirty channel:
//!
//! 1. **FRAME** — Drain dirty indices (including descendants), recompute
//!    each layer's absolute frame as its local frame offset by the parent's
//!    absolute origin, and its effective hidden state as
//!    `parent_effective_hidden || hidden`.
//! 2. **PAINT** / **REDRAW** — Drain dirty indices. A layer in both lists is
//!    reported only as a redraw.
//! 3. **TOPOLOGY** — Drain and discard; the paint order was already rebuilt
//!    at the start of evaluation if needed.
//!
//! [`SceneChanges`] uses raw slot indices (`u32`) so presenters can index the
//! store through the `*_at()` accessors without generation checks.

use super::id::INVALID;
use super::store::SceneStore;
use crate::dirty;

/// The changes produced by a single [`SceneStore::evaluate`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneChanges {
    /// Layers created since the last evaluate.
    pub added: Vec<u32>,
    /// Layers destroyed since the last evaluate.
    pub removed: Vec<u32>,
    /// Live layers whose absolute frame was recomputed.
    pub frames: Vec<u32>,
    /// Layers that became effectively hidden.
    pub hidden: Vec<u32>,
    /// Layers that became visible again.
    pub unhidden: Vec<u32>,
    /// Layers needing a partial repaint.
    pub repaint: Vec<u32>,
    /// Layers needing a full redraw.
    pub redraw: Vec<u32>,
    /// Whether the paint order was rebuilt.
    pub topology_changed: bool,
}

impl SceneChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.added.clear();
        self.removed.clear();
        self.frames.clear();
        self.hidden.clear();
        self.unhidden.clear();
        self.repaint.clear();
        self.redraw.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.frames.is_empty()
            && self.hidden.is_empty()
            && self.unhidden.is_empty()
            && self.repaint.is_empty()
            && self.redraw.is_empty()
            && !self.topology_changed
    }
}

impl SceneStore {
    /// Evaluates the scene, recomputing dirty properties and returning the
    /// set of changes.
    pub fn evaluate(&mut self) -> SceneChanges {
        let mut changes = SceneChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer.
    pub fn evaluate_into(&mut self, changes: &mut SceneChanges) {
        changes.clear();

        if self.order_dirty {
            self.rebuild_paint_order();
            changes.topology_changed = true;
            self.order_dirty = false;
        }

        let dirty_frames: Vec<u32> = self
            .dirty
            .drain(dirty::FRAME)
            .affected()
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize])
            .collect();
        for &idx in &dirty_frames {
            let i = idx as usize;
            let parent_idx = self.parent[i];
            let (origin, parent_hidden) = if parent_idx == INVALID {
                (kurbo::Vec2::ZERO, false)
            } else {
                let p = parent_idx as usize;
                (
                    self.absolute_frame[p].origin().to_vec2(),
                    self.effective_hidden[p],
                )
            };
            self.absolute_frame[i] = self.frame[i] + origin;

            let new_hidden = parent_hidden || self.hidden[i];
            if new_hidden != self.effective_hidden[i] {
                if new_hidden {
                    changes.hidden.push(idx);
                } else {
                    changes.unhidden.push(idx);
                }
                self.effective_hidden[i] = new_hidden;
            }
        }
        changes.frames = dirty_frames;

        changes.redraw = self
            .dirty
            .drain(dirty::REDRAW)
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize])
            .collect();
        let redraw = &changes.redraw;
        changes.repaint = self
            .dirty
            .drain(dirty::PAINT)
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize] && !redraw.contains(&idx))
            .collect();

        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Returns the paint order: a depth-first pre-order walk from the root.
    ///
    /// Later entries paint over earlier ones. Detached layers are absent.
    /// Only valid after [`evaluate`](Self::evaluate).
    #[must_use]
    pub fn paint_order(&self) -> &[u32] {
        &self.paint_order
    }

    fn rebuild_paint_order(&mut self) {
        self.paint_order.clear();
        self.dfs_collect(self.root);
    }

    fn dfs_collect(&mut self, idx: u32) {
        self.paint_order.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.dfs_collect(child);
            child = self.next_sibling[child as usize];
        }
    }
}
