// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The mounting manager: coalesced, serialized transaction application.
//!
//! [`MountingManager::on_batch_ready`] is the only entry point that drives
//! structural work. It may be called from any thread at any rate. Two
//! atomic flags implement a latest-wins hand-off:
//!
//! - `in_flight` is claimed with a compare-and-swap by the one thread that
//!   applies transactions. Every other caller returns immediately.
//! - `follow_up` is raised by every notification before it tries to claim
//!   `in_flight`. The applying thread clears it before each pull and keeps
//!   pulling while it finds it raised, so `k` notifications arriving during
//!   one application cause exactly one more pull, which sees the newest
//!   batch.
//!
//! After releasing `in_flight` the applying thread checks `follow_up` once
//! more and, if a notification slipped in between its last pull and the
//! release, tries to claim `in_flight` again. That closes the lost-wakeup
//! window.
//!
//! Each accepted batch is applied in order to the [`ComponentRegistry`] and
//! the [`SceneStore`], the scene is evaluated, and any resulting
//! [`SceneChanges`](crate::scene::SceneChanges) are handed to the bound
//! [`Surface`].

mod apply;

use core::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Instant;

use serde_json::Value;

use self::apply::Applier;
use crate::anomaly::Anomaly;
use crate::delegate::SchedulerDelegate;
use crate::descriptor::{ComponentDescriptor, Props};
use crate::id::{SurfaceId, Tag};
use crate::mutation::MutationBatch;
use crate::registry::ComponentRegistry;
use crate::scene::SceneStore;
use crate::source::MutationSource;
use crate::surface::Surface;
#[cfg(feature = "trace-rich")]
use crate::trace::MutationEvent;
use crate::trace::{
    AnomalyEvent, MountTraceSink, NoopSink, PresentEvent, Tracer, TransactionBeginEvent,
    TransactionEndEvent,
};

/// Configuration for a [`MountingManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MountConfig {
    /// The surface this manager mounts into.
    pub surface_id: SurfaceId,
    /// Skip pulled batches tagged with another surface.
    pub reject_foreign_batches: bool,
    /// Call [`update_props`](crate::component::ComponentDelegate::update_props)
    /// with `force_update = true` on every update, even when the props are
    /// unchanged.
    pub force_prop_updates: bool,
}

impl MountConfig {
    /// Default configuration for `surface_id`.
    #[must_use]
    pub const fn new(surface_id: SurfaceId) -> Self {
        Self {
            surface_id,
            reject_foreign_batches: true,
            force_prop_updates: false,
        }
    }

    /// Returns `self` with [`reject_foreign_batches`](Self::reject_foreign_batches) set.
    #[must_use]
    pub const fn with_reject_foreign_batches(mut self, reject: bool) -> Self {
        self.reject_foreign_batches = reject;
        self
    }

    /// Returns `self` with [`force_prop_updates`](Self::force_prop_updates) set.
    #[must_use]
    pub const fn with_force_prop_updates(mut self, force: bool) -> Self {
        self.force_prop_updates = force;
        self
    }
}

impl Default for MountConfig {
    fn default() -> Self {
        Self::new(SurfaceId::default())
    }
}

/// Counter snapshot returned by [`MountingManager::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MountStats {
    /// Calls to [`on_batch_ready`](MountingManager::on_batch_ready).
    pub notifications: u64,
    /// Notifications that found a transaction in flight and returned.
    pub coalesced: u64,
    /// Batches accepted for application.
    pub transactions: u64,
    /// Mutations applied.
    pub mutations_applied: u64,
    /// Mutations skipped as anomalies.
    pub mutations_skipped: u64,
    /// Anomalies reported, including skipped batches and commands.
    pub anomalies: u64,
    /// Pulled batches skipped because they were not newer than the last one.
    pub stale_batches: u64,
    /// Preliminary allocation hints that created a component.
    pub preliminary_allocations: u64,
}

#[derive(Debug, Default)]
struct Counters {
    notifications: AtomicU64,
    coalesced: AtomicU64,
    transactions: AtomicU64,
    mutations_applied: AtomicU64,
    mutations_skipped: AtomicU64,
    anomalies: AtomicU64,
    stale_batches: AtomicU64,
    preliminary_allocations: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MountStats {
        MountStats {
            notifications: self.notifications.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            transactions: self.transactions.load(Ordering::Relaxed),
            mutations_applied: self.mutations_applied.load(Ordering::Relaxed),
            mutations_skipped: self.mutations_skipped.load(Ordering::Relaxed),
            anomalies: self.anomalies.load(Ordering::Relaxed),
            stale_batches: self.stale_batches.load(Ordering::Relaxed),
            preliminary_allocations: self.preliminary_allocations.load(Ordering::Relaxed),
        }
    }
}

/// The current pointer/focus responder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Responder {
    /// Surface the responder belongs to.
    pub surface_id: SurfaceId,
    /// Component that currently handles the gesture.
    pub tag: Tag,
    /// Component the gesture started on.
    pub initial_tag: Tag,
    /// Whether native gesture handling is suppressed meanwhile.
    pub block_native: bool,
}

struct MountState {
    registry: ComponentRegistry,
    scene: SceneStore,
    surface: Option<Box<dyn Surface>>,
    sink: Box<dyn MountTraceSink>,
    last_revision: u64,
    transaction: u64,
}

/// Clears `in_flight` when dropped, including during a panic.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Applies mutation batches from a [`MutationSource`] to a retained scene.
///
/// The manager is `Sync`; share it behind an `Arc` between the producer's
/// notification thread and whoever else calls it. All state except the two
/// coalescing flags, the responder slot and the counters sits behind one
/// mutex that only the applying thread holds for the length of a batch.
///
/// Callbacks made while that mutex is held (component delegates, the bound
/// surface, trace sinks) must not call back into the manager.
pub struct MountingManager {
    config: MountConfig,
    source: Arc<dyn MutationSource>,
    state: Mutex<MountState>,
    in_flight: AtomicBool,
    follow_up: AtomicBool,
    responder: Mutex<Option<Responder>>,
    counters: Counters,
    epoch: Instant,
}

impl fmt::Debug for MountingManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountingManager")
            .field("config", &self.config)
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl MountingManager {
    /// Creates a manager that pulls from `source` and edits `registry`.
    ///
    /// No transaction can run until a surface is bound with
    /// [`bind_surface`](Self::bind_surface).
    #[must_use]
    pub fn new(
        registry: ComponentRegistry,
        source: Arc<dyn MutationSource>,
        config: MountConfig,
    ) -> Self {
        Self {
            config,
            source,
            state: Mutex::new(MountState {
                registry,
                scene: SceneStore::new(config.surface_id.root_tag()),
                surface: None,
                sink: Box::new(NoopSink),
                last_revision: 0,
                transaction: 0,
            }),
            in_flight: AtomicBool::new(false),
            follow_up: AtomicBool::new(false),
            responder: Mutex::new(None),
            counters: Counters::default(),
            epoch: Instant::now(),
        }
    }

    /// Returns `self` emitting structured events into `sink`.
    ///
    /// Events are only delivered when the `trace` feature is enabled.
    #[must_use]
    pub fn with_trace_sink(mut self, sink: impl MountTraceSink + 'static) -> Self {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .sink = Box::new(sink);
        self
    }

    /// Associates the physical render target.
    ///
    /// # Panics
    ///
    /// Panics if a surface is already bound.
    pub fn bind_surface(&self, surface: impl Surface + 'static) {
        let mut state = self.lock_state();
        assert!(state.surface.is_none(), "surface already bound");
        state.surface = Some(Box::new(surface));
        tracing::debug!(surface_id = ?self.config.surface_id, "surface bound");
    }

    /// Signals that a new batch was committed.
    ///
    /// If no transaction is in flight, the calling thread pulls and applies
    /// batches until no notification is outstanding. Otherwise the call
    /// returns immediately and the thread already applying will pull once
    /// more when it finishes.
    ///
    /// The manager always pulls for its configured surface; `surface_id` is
    /// recorded for diagnostics.
    ///
    /// # Panics
    ///
    /// Panics if the calling thread starts a transaction and no surface has
    /// been bound.
    pub fn on_batch_ready(&self, surface_id: SurfaceId) {
        Counters::bump(&self.counters.notifications, 1);
        self.follow_up.store(true, Ordering::SeqCst);

        let mut first_attempt = true;
        loop {
            if self
                .in_flight
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                if first_attempt {
                    Counters::bump(&self.counters.coalesced, 1);
                    tracing::debug!(?surface_id, "transaction in flight, notification coalesced");
                }
                return;
            }
            first_attempt = false;
            {
                let _in_flight = InFlight(&self.in_flight);
                self.drain();
            }
            if !self.follow_up.load(Ordering::SeqCst) {
                return;
            }
        }
    }

    /// Hints that `descriptor` will soon be created.
    ///
    /// Allocates the component ahead of its Create when the manager is idle.
    /// The hint is dropped when a transaction holds the state, when the tag
    /// is already live, or when the type is unknown. A later Create for the
    /// same tag adopts the allocation.
    pub fn request_preliminary_allocation(
        &self,
        surface_id: SurfaceId,
        descriptor: &ComponentDescriptor,
    ) {
        if surface_id != self.config.surface_id {
            tracing::debug!(?surface_id, tag = %descriptor.tag, "hint for foreign surface dropped");
            return;
        }
        let mut state = match self.state.try_lock() {
            Ok(state) => state,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                tracing::debug!(tag = %descriptor.tag, "manager busy, hint dropped");
                return;
            }
        };
        let MountState {
            registry, scene, ..
        } = &mut *state;
        let mut applier = Applier::new(
            registry,
            scene,
            self.config.surface_id.root_tag(),
            self.config.force_prop_updates,
        );
        if applier.preallocate(descriptor) {
            Counters::bump(&self.counters.preliminary_allocations, 1);
        }
    }

    /// Routes an imperative command to the component tagged `tag`.
    ///
    /// Bypasses the mutation pipeline. Waits for an in-flight transaction to
    /// finish so the target's lifetime is settled.
    pub fn dispatch_command(&self, tag: Tag, command: &str, args: &Value) {
        let mut state = self.lock_state();
        let MountState { registry, sink, .. } = &mut *state;
        let delivered = registry
            .provider_of_mut(tag)
            .is_some_and(|provider| provider.dispatch_command(tag, command, args));
        if !delivered {
            let mut tracer = Tracer::new(&mut **sink);
            self.report(
                &mut tracer,
                0,
                Anomaly::UnknownCommandTarget {
                    tag,
                    operation: command.to_owned(),
                },
            );
        }
    }

    /// Replaces a component's props outside the mutation pipeline.
    ///
    /// The delegate's invalidation is presented immediately when a surface
    /// is bound, and otherwise with the next transaction.
    pub fn set_native_props(&self, tag: Tag, props: Props) {
        let mut state = self.lock_state();
        let MountState {
            registry,
            scene,
            surface,
            sink,
            ..
        } = &mut *state;
        let mut tracer = Tracer::new(&mut **sink);

        let Some(layer) = registry.get(tag).map(|c| c.layer) else {
            self.report(
                &mut tracer,
                0,
                Anomaly::UnknownCommandTarget {
                    tag,
                    operation: "setNativeProps".to_owned(),
                },
            );
            return;
        };
        let level = registry
            .provider_of_mut(tag)
            .and_then(|provider| provider.update_props(tag, props, self.config.force_prop_updates))
            .unwrap_or_default();
        scene.invalidate(layer, level);

        if let Some(surface) = surface.as_mut() {
            let changes = scene.evaluate();
            if !changes.is_empty() {
                surface.present(scene, &changes);
                tracer.present(&PresentEvent::new(0, &changes, self.now_nanos()));
            }
        }
    }

    /// Makes `tag` the current responder, replacing any previous one.
    pub fn set_responder(
        &self,
        surface_id: SurfaceId,
        tag: Tag,
        initial_tag: Tag,
        block_native: bool,
    ) {
        if self.config.reject_foreign_batches && surface_id != self.config.surface_id {
            tracing::debug!(?surface_id, %tag, "responder for foreign surface ignored");
            return;
        }
        let previous = self
            .responder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Responder {
                surface_id,
                tag,
                initial_tag,
                block_native,
            });
        tracing::debug!(
            %tag,
            %initial_tag,
            block_native,
            previous = ?previous.map(|r| r.tag),
            "responder set"
        );
    }

    /// Releases the current responder. A no-op when none is set.
    pub fn clear_responder(&self) {
        let previous = self
            .responder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(previous) = previous {
            tracing::debug!(tag = %previous.tag, "responder cleared");
        }
    }

    /// Returns the current responder.
    #[must_use]
    pub fn responder(&self) -> Option<Responder> {
        *self.responder.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with the registry.
    ///
    /// Waits for an in-flight transaction to finish.
    pub fn with_registry<R>(&self, f: impl FnOnce(&ComponentRegistry) -> R) -> R {
        f(&self.lock_state().registry)
    }

    /// Runs `f` with the scene.
    ///
    /// Waits for an in-flight transaction to finish.
    pub fn with_scene<R>(&self, f: impl FnOnce(&SceneStore) -> R) -> R {
        f(&self.lock_state().scene)
    }

    /// Returns the revision of the last applied batch, or 0.
    #[must_use]
    pub fn last_applied_revision(&self) -> u64 {
        self.lock_state().last_revision
    }

    /// Returns `true` while some thread is applying transactions.
    #[must_use]
    pub fn is_transaction_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Returns a snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> MountStats {
        self.counters.snapshot()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &MountConfig {
        &self.config
    }

    // -- Internals --

    fn lock_state(&self) -> MutexGuard<'_, MountState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now_nanos(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    /// Pulls and applies batches while notifications are outstanding.
    /// Caller holds `in_flight`.
    fn drain(&self) {
        let mut state = self.lock_state();
        assert!(
            state.surface.is_some(),
            "batch notification before a surface was bound"
        );
        while self.follow_up.swap(false, Ordering::SeqCst) {
            let batch = self.source.pull_latest(self.config.surface_id);
            self.run_transaction(&mut state, batch);
        }
    }

    fn run_transaction(&self, state: &mut MountState, batch: MutationBatch) {
        if batch.is_empty() {
            tracing::trace!(revision = batch.revision, "nothing pending");
            return;
        }
        let MountState {
            registry,
            scene,
            surface,
            sink,
            last_revision,
            transaction,
        } = state;
        let mut tracer = Tracer::new(&mut **sink);

        if self.config.reject_foreign_batches && batch.surface_id != self.config.surface_id {
            self.report(
                &mut tracer,
                0,
                Anomaly::ForeignSurface {
                    expected: self.config.surface_id,
                    actual: batch.surface_id,
                },
            );
            return;
        }
        if batch.revision <= *last_revision {
            Counters::bump(&self.counters.stale_batches, 1);
            self.report(
                &mut tracer,
                0,
                Anomaly::StaleBatch {
                    revision: batch.revision,
                    last_applied: *last_revision,
                },
            );
            return;
        }
        *last_revision = batch.revision;
        *transaction += 1;
        let transaction = *transaction;
        Counters::bump(&self.counters.transactions, 1);

        let span = tracing::debug_span!(
            "transaction",
            transaction,
            revision = batch.revision,
            mutations = batch.len()
        );
        let _entered = span.enter();

        tracer.transaction_begin(&TransactionBeginEvent {
            transaction,
            surface_id: batch.surface_id,
            revision: batch.revision,
            mutation_count: u32::try_from(batch.len()).unwrap_or(u32::MAX),
            at_nanos: self.now_nanos(),
        });

        let mut applier = Applier::new(
            registry,
            scene,
            self.config.surface_id.root_tag(),
            self.config.force_prop_updates,
        );
        let mut applied = 0_u32;
        let mut skipped = 0_u32;
        for (index, mutation) in batch.mutations.into_iter().enumerate() {
            let kind = mutation.kind();
            let tag = mutation.tag();
            tracing::trace!(index, %kind, %tag, "apply");
            let ok = applier.apply(mutation);
            if ok {
                applied += 1;
            } else {
                skipped += 1;
            }
            for anomaly in applier.anomalies.drain(..) {
                self.report(&mut tracer, transaction, anomaly);
            }
            #[cfg(feature = "trace-rich")]
            tracer.mutation(&MutationEvent {
                transaction,
                index: u32::try_from(index).unwrap_or(u32::MAX),
                kind,
                tag,
                applied: ok,
                at_nanos: self.now_nanos(),
            });
        }
        Counters::bump(&self.counters.mutations_applied, u64::from(applied));
        Counters::bump(&self.counters.mutations_skipped, u64::from(skipped));

        let changes = scene.evaluate();
        if !changes.is_empty() {
            if let Some(surface) = surface.as_mut() {
                surface.present(scene, &changes);
                tracer.present(&PresentEvent::new(transaction, &changes, self.now_nanos()));
            }
        }

        tracer.transaction_end(&TransactionEndEvent {
            transaction,
            applied,
            skipped,
            at_nanos: self.now_nanos(),
        });
        tracing::debug!(applied, skipped, "transaction applied");
    }

    fn report(&self, tracer: &mut Tracer<'_>, transaction: u64, anomaly: Anomaly) {
        Counters::bump(&self.counters.anomalies, 1);
        tracing::warn!(code = anomaly.code(), kind = anomaly.name(), "{anomaly}");
        tracer.anomaly(&AnomalyEvent::new(transaction, &anomaly, self.now_nanos()));
    }
}

impl SchedulerDelegate for MountingManager {
    fn did_finish_transaction(&self, surface_id: SurfaceId) {
        self.on_batch_ready(surface_id);
    }

    fn did_request_preliminary_allocation(
        &self,
        surface_id: SurfaceId,
        descriptor: &ComponentDescriptor,
    ) {
        self.request_preliminary_allocation(surface_id, descriptor);
    }

    fn did_dispatch_command(&self, tag: Tag, command: &str, args: &Value) {
        self.dispatch_command(tag, command, args);
    }

    fn did_set_native_props(&self, tag: Tag, props: Props) {
        self.set_native_props(tag, props);
    }

    fn did_set_responder(&self, surface_id: SurfaceId, tag: Tag, initial_tag: Tag, block_native: bool) {
        self.set_responder(surface_id, tag, initial_tag, block_native);
    }

    fn did_clear_responder(&self) {
        self.clear_responder();
    }
}
