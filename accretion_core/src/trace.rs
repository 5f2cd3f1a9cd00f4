// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structured trace events for the transaction loop.
//!
//! This module provides a [`MountTraceSink`] trait with per-event methods
//! that the mounting manager calls at each stage of a transaction. All
//! method bodies default to no-ops, so implementing only the events you care
//! about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn MountTraceSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing. When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Timestamps are nanoseconds since the owning manager was created.
//!
//! This is separate from the `tracing` spans and log events the manager
//! emits unconditionally: sinks receive typed, fixed-size records suitable
//! for recording and offline export.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) gates [`MutationEvent`] and the
//!   corresponding [`MountTraceSink::on_mutation`] method.

use std::sync::{Arc, Mutex, PoisonError};

use crate::anomaly::Anomaly;
use crate::id::{SurfaceId, Tag};
#[cfg(feature = "trace-rich")]
use crate::mutation::MutationKind;
use crate::scene::SceneChanges;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a pulled batch is accepted for application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionBeginEvent {
    /// Per-manager transaction counter, starting at 1.
    pub transaction: u64,
    /// Surface the batch belongs to.
    pub surface_id: SurfaceId,
    /// Producer-assigned revision.
    pub revision: u64,
    /// Number of mutations in the batch.
    pub mutation_count: u32,
    /// Nanoseconds since the manager was created.
    pub at_nanos: u64,
}

/// Emitted for each mutation after it was applied or skipped.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutationEvent {
    /// Transaction counter.
    pub transaction: u64,
    /// Position in the batch.
    pub index: u32,
    /// Which instruction.
    pub kind: MutationKind,
    /// Target tag.
    pub tag: Tag,
    /// `false` if the mutation was skipped as an anomaly.
    pub applied: bool,
    /// Nanoseconds since the manager was created.
    pub at_nanos: u64,
}

/// Emitted for every recoverable protocol violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnomalyEvent {
    /// Transaction counter, or 0 outside a transaction (commands).
    pub transaction: u64,
    /// [`Anomaly::code`].
    pub code: u16,
    /// Tag the anomaly is about, if any.
    pub tag: Option<Tag>,
    /// Nanoseconds since the manager was created.
    pub at_nanos: u64,
}

impl AnomalyEvent {
    /// Builds the event for `anomaly`.
    #[must_use]
    pub fn new(transaction: u64, anomaly: &Anomaly, at_nanos: u64) -> Self {
        Self {
            transaction,
            code: anomaly.code(),
            tag: anomaly.tag(),
            at_nanos,
        }
    }
}

/// Emitted when a batch has been applied to completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionEndEvent {
    /// Transaction counter.
    pub transaction: u64,
    /// Mutations applied without anomaly.
    pub applied: u32,
    /// Mutations skipped.
    pub skipped: u32,
    /// Nanoseconds since the manager was created.
    pub at_nanos: u64,
}

/// Emitted when scene changes are handed to the bound surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresentEvent {
    /// Transaction counter, or 0 for out-of-band prop updates.
    pub transaction: u64,
    /// Layers created.
    pub added: u32,
    /// Layers destroyed.
    pub removed: u32,
    /// Layers whose absolute frame changed.
    pub frames: u32,
    /// Layers needing a partial repaint.
    pub repaint: u32,
    /// Layers needing a full redraw.
    pub redraw: u32,
    /// Whether the paint order was rebuilt.
    pub topology_changed: bool,
    /// Nanoseconds since the manager was created.
    pub at_nanos: u64,
}

impl PresentEvent {
    /// Summarizes `changes` as counts.
    #[must_use]
    pub fn new(transaction: u64, changes: &SceneChanges, at_nanos: u64) -> Self {
        Self {
            transaction,
            added: count(changes.added.len()),
            removed: count(changes.removed.len()),
            frames: count(changes.frames.len()),
            repaint: count(changes.repaint.len()),
            redraw: count(changes.redraw.len()),
            topology_changed: changes.topology_changed,
            at_nanos,
        }
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// MountTraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the mounting manager.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait MountTraceSink: Send {
    /// Called when a batch is accepted for application.
    fn on_transaction_begin(&mut self, e: &TransactionBeginEvent) {
        _ = e;
    }

    /// Called for each mutation (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_mutation(&mut self, e: &MutationEvent) {
        _ = e;
    }

    /// Called for each recoverable anomaly.
    fn on_anomaly(&mut self, e: &AnomalyEvent) {
        _ = e;
    }

    /// Called when a batch has been applied.
    fn on_transaction_end(&mut self, e: &TransactionEndEvent) {
        _ = e;
    }

    /// Called when changes are presented to the surface.
    fn on_present(&mut self, e: &PresentEvent) {
        _ = e;
    }
}

/// Shares a sink with the caller, who can inspect it while the manager
/// keeps emitting into it.
impl<S: MountTraceSink> MountTraceSink for Arc<Mutex<S>> {
    fn on_transaction_begin(&mut self, e: &TransactionBeginEvent) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_transaction_begin(e);
    }

    #[cfg(feature = "trace-rich")]
    fn on_mutation(&mut self, e: &MutationEvent) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_mutation(e);
    }

    fn on_anomaly(&mut self, e: &AnomalyEvent) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_anomaly(e);
    }

    fn on_transaction_end(&mut self, e: &TransactionEndEvent) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_transaction_end(e);
    }

    fn on_present(&mut self, e: &PresentEvent) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_present(e);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`MountTraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl MountTraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`MountTraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn MountTraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn MountTraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn MountTraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`TransactionBeginEvent`].
    #[inline]
    pub fn transaction_begin(&mut self, e: &TransactionBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_transaction_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`MutationEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn mutation(&mut self, e: &MutationEvent) {
        if let Some(s) = &mut self.sink {
            s.on_mutation(e);
        }
    }

    /// Emits an [`AnomalyEvent`].
    #[inline]
    pub fn anomaly(&mut self, e: &AnomalyEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_anomaly(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TransactionEndEvent`].
    #[inline]
    pub fn transaction_end(&mut self, e: &TransactionEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_transaction_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PresentEvent`].
    #[inline]
    pub fn present(&mut self, e: &PresentEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_present(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
