// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants for the scene graph.
//!
//! The scene uses multi-channel dirty tracking (via [`understory_dirty`]).
//! Each channel is an independent category of change:
//!
//! - [`FRAME`] propagates. Children carry dependency edges to their parent
//!   and are marked with [`EagerPolicy`](understory_dirty::EagerPolicy),
//!   because absolute frames and effective hidden state are inherited.
//! - [`PAINT`] and [`REDRAW`] are local. They record the invalidation level
//!   a component reported after a prop update.
//! - [`TOPOLOGY`] is marked on the parent of every structural edit and
//!   triggers a paint-order rebuild.
//!
//! [`SceneStore::evaluate`](crate::scene::SceneStore::evaluate) drains all
//! channels into [`SceneChanges`](crate::scene::SceneChanges).

use understory_dirty::Channel;

/// Layout frame or hidden flag changed.
pub const FRAME: Channel = Channel::new(0);

/// Part of the layer's content must be repainted.
pub const PAINT: Channel = Channel::new(1);

/// The layer's content must be redrawn from scratch.
pub const REDRAW: Channel = Channel::new(2);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(3);
