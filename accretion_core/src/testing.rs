// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::Value;

use crate::component::{ComponentDelegate, CreateError, Invalidation};
use crate::descriptor::{ComponentDescriptor, Props};
use crate::id::{DrawableHandle, SurfaceId, Tag};
use crate::mutation::{Mutation, MutationBatch};
use crate::scene::{SceneChanges, SceneStore};
use crate::source::{LatestBatchSlot, MutationSource};
use crate::surface::Surface;

/// One call made on a [`RecordingDelegate`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DelegateCall {
    Create(Tag),
    UpdateProps(DrawableHandle, Props, bool),
    Destroy(DrawableHandle),
    Command(DrawableHandle, String, Value),
}

/// Call log shared between delegates and the test body.
#[derive(Clone, Debug, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<DelegateCall>>>);

impl CallLog {
    pub(crate) fn calls(&self) -> Vec<DelegateCall> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, call: DelegateCall) {
        self.0.lock().unwrap().push(call);
    }
}

/// Tracks how many threads are inside a probed section at once.
#[derive(Debug, Default)]
pub(crate) struct ConcurrencyProbe {
    active: AtomicUsize,
    max: AtomicUsize,
}

impl ConcurrencyProbe {
    pub(crate) fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }

    fn section(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        thread::yield_now();
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A delegate that logs every call and issues `DrawableHandle(tag)`.
#[derive(Debug)]
pub(crate) struct RecordingDelegate {
    log: CallLog,
    level: Invalidation,
    failing: Vec<Tag>,
    probe: Option<Arc<ConcurrencyProbe>>,
}

impl RecordingDelegate {
    /// Creates a delegate reporting [`Invalidation::Full`] on every update.
    pub(crate) fn new() -> (Self, CallLog) {
        let log = CallLog::default();
        (Self::with_log(log.clone()), log)
    }

    pub(crate) fn with_log(log: CallLog) -> Self {
        Self {
            log,
            level: Invalidation::Full,
            failing: Vec::new(),
            probe: None,
        }
    }

    pub(crate) fn returning(mut self, level: Invalidation) -> Self {
        self.level = level;
        self
    }

    pub(crate) fn failing(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.failing.extend(tags);
        self
    }

    pub(crate) fn probed(mut self, probe: Arc<ConcurrencyProbe>) -> Self {
        self.probe = Some(probe);
        self
    }
}

impl ComponentDelegate for RecordingDelegate {
    fn create_instance(
        &mut self,
        descriptor: &ComponentDescriptor,
    ) -> Result<DrawableHandle, CreateError> {
        if let Some(probe) = &self.probe {
            probe.section();
        }
        self.log.push(DelegateCall::Create(descriptor.tag));
        if self.failing.contains(&descriptor.tag) {
            return Err(CreateError::Exhausted);
        }
        Ok(DrawableHandle(descriptor.tag.0))
    }

    fn update_props(
        &mut self,
        handle: DrawableHandle,
        props: &Props,
        force_update: bool,
    ) -> Invalidation {
        self.log
            .push(DelegateCall::UpdateProps(handle, props.clone(), force_update));
        self.level
    }

    fn destroy_instance(&mut self, handle: DrawableHandle) {
        self.log.push(DelegateCall::Destroy(handle));
    }

    fn dispatch_command(&mut self, handle: DrawableHandle, command: &str, args: &Value) {
        self.log
            .push(DelegateCall::Command(handle, command.to_owned(), args.clone()));
    }
}

/// What a [`RecordingSurface`] saw in one `present` call, resolved to tags.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Presented {
    pub(crate) changes: SceneChanges,
    pub(crate) repaint: Vec<Tag>,
    pub(crate) redraw: Vec<Tag>,
    /// Tags of the root's children, in paint order.
    pub(crate) root_children: Vec<Tag>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct PresentLog(Arc<Mutex<Vec<Presented>>>);

impl PresentLog {
    pub(crate) fn presents(&self) -> Vec<Presented> {
        self.0.lock().unwrap().clone()
    }
}

/// A surface that records every presentation.
#[derive(Debug)]
pub(crate) struct RecordingSurface {
    log: PresentLog,
}

impl RecordingSurface {
    pub(crate) fn new() -> (Self, PresentLog) {
        let log = PresentLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl Surface for RecordingSurface {
    fn present(&mut self, scene: &SceneStore, changes: &SceneChanges) {
        let tags = |slots: &[u32]| -> Vec<Tag> {
            slots.iter().map(|&i| scene.tag_at(i)).collect()
        };
        let presented = Presented {
            changes: changes.clone(),
            repaint: tags(&changes.repaint),
            redraw: tags(&changes.redraw),
            root_children: scene.children(scene.root()).map(|l| scene.tag(l)).collect(),
        };
        self.log.0.lock().unwrap().push(presented);
    }
}

struct Gate {
    entered: Sender<()>,
    release: Receiver<()>,
}

/// A [`LatestBatchSlot`] that records pulled revisions and can hold the
/// next pull until the test releases it.
#[derive(Default)]
pub(crate) struct GatedSource {
    slot: LatestBatchSlot,
    pulled: Mutex<Vec<u64>>,
    gate: Mutex<Option<Gate>>,
}

impl GatedSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Blocks the next pull after it has taken its batch.
    ///
    /// Returns a receiver that fires when the pull is blocked and a sender
    /// that releases it.
    pub(crate) fn arm(&self) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some(Gate {
            entered: entered_tx,
            release: release_rx,
        });
        (entered_rx, release_tx)
    }

    pub(crate) fn commit(&self, surface_id: SurfaceId, mutations: Vec<Mutation>) -> u64 {
        self.slot.commit(surface_id, mutations)
    }

    /// Revisions returned by every pull so far; empty pulls record 0.
    pub(crate) fn pulled(&self) -> Vec<u64> {
        self.pulled.lock().unwrap().clone()
    }
}

impl MutationSource for GatedSource {
    fn pull_latest(&self, surface_id: SurfaceId) -> MutationBatch {
        let batch = self.slot.pull_latest(surface_id);
        self.pulled.lock().unwrap().push(batch.revision);
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.send(()).unwrap();
            gate.release.recv().unwrap();
        }
        batch
    }
}

/// A source that always returns the batch it was given.
pub(crate) struct FixedSource(pub(crate) MutationBatch);

impl MutationSource for FixedSource {
    fn pull_latest(&self, _surface_id: SurfaceId) -> MutationBatch {
        self.0.clone()
    }
}
