// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract for the bound on-screen target.
//!
//! The mounting manager never draws. After each applied batch it evaluates
//! the scene and hands the resulting [`SceneChanges`] to the bound
//! [`Surface`], which owns the platform-native presentation tree (a window's
//! compositor layers, a DOM subtree, a test recorder) and schedules paint
//! for the layers reported in [`repaint`](SceneChanges::repaint) and
//! [`redraw`](SceneChanges::redraw).
//!
//! # Transaction pseudocode
//!
//! ```rust,ignore
//! fn on_batch(batch: MutationBatch) {
//!     for mutation in &batch.mutations {
//!         apply(mutation); // registry + scene edits
//!     }
//!     let changes = scene.evaluate();
//!     if !changes.is_empty() {
//!         surface.present(&scene, &changes);
//!     }
//! }
//! ```

use crate::scene::{SceneChanges, SceneStore};

/// Applies evaluated scene changes to a platform-native presentation tree.
///
/// Bound once per manager with
/// [`bind_surface`](crate::manager::MountingManager::bind_surface), and
/// called from whichever thread is applying the current transaction.
pub trait Surface: Send {
    /// Applies `changes`, reading current layer state from `scene`.
    fn present(&mut self, scene: &SceneStore, changes: &SceneChanges);
}
