// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained scene graph.
//!
//! Every retained component owns one *layer*. A layer has:
//!
//! - An identity ([`LayerId`]), a generational handle that goes stale when
//!   the layer is destroyed.
//! - Topology: parent, first-child and sibling links forming an ordered
//!   tree. Sibling order is paint order (z-order = tree order).
//! - The owning component's [`Tag`](crate::id::Tag), so presenters can map
//!   raw slots back to components.
//! - **Local properties** written by the mounting manager: the layout frame
//!   (relative to the parent) and the hidden flag.
//! - **Computed properties** produced by [`evaluate`](SceneStore::evaluate):
//!   the absolute frame and the effective hidden state.
//!
//! The store owns a root layer that stands for the bound surface. Layers
//! that are not reachable from the root exist but are not painted.

mod evaluate;
mod id;
mod store;
mod traverse;

pub use evaluate::SceneChanges;
pub use id::{INVALID, LayerId};
pub use store::SceneStore;
pub use traverse::Children;
