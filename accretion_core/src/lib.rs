// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transactional mounting of reconciled component trees onto a retained
//! scene graph.
//!
//! `accretion_core` sits between a reconciler that computes UI trees and a
//! platform surface that draws them. The reconciler commits ordered batches
//! of mutations; a [`MountingManager`](manager::MountingManager) pulls the
//! newest batch, applies it to per-type retained components and a
//! struct-of-arrays layer tree, and hands the resulting changes to the bound
//! surface.
//!
//! # Architecture
//!
//! ```text
//!   Reconciler
//!       │ commit(batch)                  notify
//!       ▼                                   │
//!   MutationSource ◄── pull_latest() ── MountingManager::on_batch_ready()
//!                                           │   (coalesced, one at a time)
//!                 ┌─────────────────────────┘
//!                 ▼
//!   Applier ──► ComponentRegistry ──► Provider ──► ComponentDelegate
//!      │
//!      ▼
//!   SceneStore::evaluate() ──► SceneChanges ──► Surface::present()
//! ```
//!
//! **[`manager`]**: The manager, its configuration and counters. Notifications
//! may arrive from any thread at any rate; at most one batch is applied at a
//! time and notifications that arrive meanwhile collapse into a single
//! follow-up pull.
//!
//! **[`mutation`]**: The five mutation kinds and the batch envelope.
//!
//! **[`registry`]**: Maps component type names to [`Provider`](registry::Provider)s,
//! each owning the retained components of one type.
//!
//! **[`component`]**: The [`ComponentDelegate`](component::ComponentDelegate)
//! trait that instantiates drawables, and the retained per-node record.
//!
//! **[`scene`]**: Struct-of-arrays layer tree with generational handles,
//! sibling-ordered insertion and incremental evaluation.
//!
//! **[`dirty`]**: Dirty channels over `understory_dirty`.
//!
//! **[`source`]**: The pull side of the producer hand-off and a latest-wins
//! slot implementation.
//!
//! **[`delegate`]**: The callback trait a scheduler drives.
//!
//! **[`anomaly`]**: Recoverable protocol violations. None of them abort a
//! transaction.
//!
//! **[`trace`]**: [`MountTraceSink`](trace::MountTraceSink) and typed events
//! with a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! Log output goes through [`tracing`]; install any subscriber to see it.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-mutation
//!   events.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod anomaly;
pub mod component;
pub mod delegate;
pub mod descriptor;
pub mod dirty;
pub mod id;
pub mod manager;
pub mod mutation;
pub mod registry;
pub mod scene;
pub mod source;
pub mod surface;
pub mod trace;

#[cfg(test)]
mod testing;
