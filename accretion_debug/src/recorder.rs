// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`MountTraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use accretion_core::id::{SurfaceId, Tag};
use accretion_core::mutation::MutationKind;
use accretion_core::trace::{
    AnomalyEvent, MountTraceSink, MutationEvent, PresentEvent, TransactionBeginEvent,
    TransactionEndEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_TRANSACTION_BEGIN: u8 = 1;
const TAG_MUTATION: u8 = 2;
const TAG_ANOMALY: u8 = 3;
const TAG_TRANSACTION_END: u8 = 4;
const TAG_PRESENT: u8 = 5;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`MountTraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_option_u64(&mut self, v: Option<u64>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u64(val);
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
            }
        }
    }

    fn write_kind(&mut self, kind: MutationKind) {
        self.write_u8(match kind {
            MutationKind::Create => 0,
            MutationKind::Delete => 1,
            MutationKind::Insert => 2,
            MutationKind::Remove => 3,
            MutationKind::Update => 4,
        });
    }
}

impl MountTraceSink for RecorderSink {
    fn on_transaction_begin(&mut self, e: &TransactionBeginEvent) {
        self.write_u8(TAG_TRANSACTION_BEGIN);
        self.write_u64(e.transaction);
        self.write_u32(e.surface_id.0);
        self.write_u64(e.revision);
        self.write_u32(e.mutation_count);
        self.write_u64(e.at_nanos);
    }

    fn on_mutation(&mut self, e: &MutationEvent) {
        self.write_u8(TAG_MUTATION);
        self.write_u64(e.transaction);
        self.write_u32(e.index);
        self.write_kind(e.kind);
        self.write_u64(e.tag.0);
        self.write_u8(u8::from(e.applied));
        self.write_u64(e.at_nanos);
    }

    fn on_anomaly(&mut self, e: &AnomalyEvent) {
        self.write_u8(TAG_ANOMALY);
        self.write_u64(e.transaction);
        self.write_u16(e.code);
        self.write_option_u64(e.tag.map(|t| t.0));
        self.write_u64(e.at_nanos);
    }

    fn on_transaction_end(&mut self, e: &TransactionEndEvent) {
        self.write_u8(TAG_TRANSACTION_END);
        self.write_u64(e.transaction);
        self.write_u32(e.applied);
        self.write_u32(e.skipped);
        self.write_u64(e.at_nanos);
    }

    fn on_present(&mut self, e: &PresentEvent) {
        self.write_u8(TAG_PRESENT);
        self.write_u64(e.transaction);
        self.write_u32(e.added);
        self.write_u32(e.removed);
        self.write_u32(e.frames);
        self.write_u32(e.repaint);
        self.write_u32(e.redraw);
        self.write_u8(u8::from(e.topology_changed));
        self.write_u64(e.at_nanos);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`TransactionBeginEvent`].
    TransactionBegin(TransactionBeginEvent),
    /// A [`MutationEvent`].
    Mutation(MutationEvent),
    /// An [`AnomalyEvent`].
    Anomaly(AnomalyEvent),
    /// A [`TransactionEndEvent`].
    TransactionEnd(TransactionEndEvent),
    /// A [`PresentEvent`].
    Present(PresentEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first truncated or unrecognized record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u16(&mut self) -> Option<u16> {
        self.take().map(u16::from_le_bytes)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_option_u64(&mut self) -> Option<Option<u64>> {
        let present = self.read_u8()?;
        let val = self.read_u64()?;
        Some(if present != 0 { Some(val) } else { None })
    }

    fn read_kind(&mut self) -> Option<MutationKind> {
        Some(match self.read_u8()? {
            0 => MutationKind::Create,
            1 => MutationKind::Delete,
            2 => MutationKind::Insert,
            3 => MutationKind::Remove,
            4 => MutationKind::Update,
            _ => return None,
        })
    }

    fn decode_transaction_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TransactionBegin(TransactionBeginEvent {
            transaction: self.read_u64()?,
            surface_id: SurfaceId(self.read_u32()?),
            revision: self.read_u64()?,
            mutation_count: self.read_u32()?,
            at_nanos: self.read_u64()?,
        }))
    }

    fn decode_mutation(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Mutation(MutationEvent {
            transaction: self.read_u64()?,
            index: self.read_u32()?,
            kind: self.read_kind()?,
            tag: Tag(self.read_u64()?),
            applied: self.read_bool()?,
            at_nanos: self.read_u64()?,
        }))
    }

    fn decode_anomaly(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Anomaly(AnomalyEvent {
            transaction: self.read_u64()?,
            code: self.read_u16()?,
            tag: self.read_option_u64()?.map(Tag),
            at_nanos: self.read_u64()?,
        }))
    }

    fn decode_transaction_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TransactionEnd(TransactionEndEvent {
            transaction: self.read_u64()?,
            applied: self.read_u32()?,
            skipped: self.read_u32()?,
            at_nanos: self.read_u64()?,
        }))
    }

    fn decode_present(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Present(PresentEvent {
            transaction: self.read_u64()?,
            added: self.read_u32()?,
            removed: self.read_u32()?,
            frames: self.read_u32()?,
            repaint: self.read_u32()?,
            redraw: self.read_u32()?,
            topology_changed: self.read_bool()?,
            at_nanos: self.read_u64()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_TRANSACTION_BEGIN => self.decode_transaction_begin(),
            TAG_MUTATION => self.decode_mutation(),
            TAG_ANOMALY => self.decode_anomaly(),
            TAG_TRANSACTION_END => self.decode_transaction_end(),
            TAG_PRESENT => self.decode_present(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin() -> TransactionBeginEvent {
        TransactionBeginEvent {
            transaction: 3,
            surface_id: SurfaceId(1),
            revision: 12,
            mutation_count: 2,
            at_nanos: 1_000_000,
        }
    }

    fn sample_present() -> PresentEvent {
        PresentEvent {
            transaction: 3,
            added: 1,
            removed: 0,
            frames: 1,
            repaint: 0,
            redraw: 1,
            topology_changed: true,
            at_nanos: 1_004_000,
        }
    }

    #[test]
    fn records_a_whole_transaction_in_order() {
        let mut rec = RecorderSink::new();
        let begin = sample_begin();
        let mutation = MutationEvent {
            transaction: 3,
            index: 1,
            kind: MutationKind::Insert,
            tag: Tag(99),
            applied: false,
            at_nanos: 1_001_000,
        };
        let anomaly = AnomalyEvent {
            transaction: 3,
            code: 2,
            tag: Some(Tag(99)),
            at_nanos: 1_002_000,
        };
        let end = TransactionEndEvent {
            transaction: 3,
            applied: 1,
            skipped: 1,
            at_nanos: 1_005_000,
        };
        rec.on_transaction_begin(&begin);
        rec.on_mutation(&mutation);
        rec.on_anomaly(&anomaly);
        rec.on_present(&sample_present());
        rec.on_transaction_end(&end);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            vec![
                RecordedEvent::TransactionBegin(begin),
                RecordedEvent::Mutation(mutation),
                RecordedEvent::Anomaly(anomaly),
                RecordedEvent::Present(sample_present()),
                RecordedEvent::TransactionEnd(end),
            ]
        );
    }

    #[test]
    fn anomaly_without_tag_survives_recording() {
        let mut rec = RecorderSink::new();
        let stale = AnomalyEvent {
            transaction: 0,
            code: 13,
            tag: None,
            at_nanos: 77,
        };
        rec.on_anomaly(&stale);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events, vec![RecordedEvent::Anomaly(stale)]);
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_transaction_begin(&sample_begin());
        rec.on_present(&sample_present());
        let bytes = rec.into_bytes();

        let events: Vec<_> = decode(&bytes[..bytes.len() - 3]).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RecordedEvent::TransactionBegin(_)));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn records_a_live_manager() {
        use std::sync::{Arc, Mutex};

        use accretion_core::component::{ComponentDelegate, CreateError, Invalidation};
        use accretion_core::descriptor::{ComponentDescriptor, Props};
        use accretion_core::id::DrawableHandle;
        use accretion_core::manager::{MountConfig, MountingManager};
        use accretion_core::mutation::Mutation;
        use accretion_core::registry::ComponentRegistry;
        use accretion_core::scene::{SceneChanges, SceneStore};
        use accretion_core::source::LatestBatchSlot;
        use accretion_core::surface::Surface;

        struct Boxes;

        impl ComponentDelegate for Boxes {
            fn create_instance(
                &mut self,
                descriptor: &ComponentDescriptor,
            ) -> Result<DrawableHandle, CreateError> {
                Ok(DrawableHandle(descriptor.tag.0))
            }

            fn update_props(&mut self, _: DrawableHandle, _: &Props, _: bool) -> Invalidation {
                Invalidation::Partial
            }

            fn destroy_instance(&mut self, _: DrawableHandle) {}
        }

        struct Discard;

        impl Surface for Discard {
            fn present(&mut self, _: &SceneStore, _: &SceneChanges) {}
        }

        let surface = SurfaceId(1);
        let recorder = Arc::new(Mutex::new(RecorderSink::new()));
        let slot = Arc::new(LatestBatchSlot::new());
        let manager = MountingManager::new(
            ComponentRegistry::new().with("Box", Boxes),
            slot.clone(),
            MountConfig::new(surface),
        )
        .with_trace_sink(Arc::clone(&recorder));
        manager.bind_surface(Discard);

        let view = ComponentDescriptor::new("Box", Tag(5));
        slot.commit(
            surface,
            vec![
                Mutation::Create(view.clone()),
                Mutation::Insert(view.at(surface.root_tag(), 0)),
                Mutation::Delete(ComponentDescriptor::new("Box", Tag(6))),
            ],
        );
        manager.on_batch_ready(surface);

        let bytes = recorder.lock().unwrap().as_bytes().to_vec();
        let kinds: Vec<_> = decode(&bytes)
            .map(|event| match event {
                RecordedEvent::TransactionBegin(_) => "begin",
                RecordedEvent::Mutation(_) => "mutation",
                RecordedEvent::Anomaly(_) => "anomaly",
                RecordedEvent::TransactionEnd(_) => "end",
                RecordedEvent::Present(_) => "present",
            })
            .collect();
        assert_eq!(
            kinds,
            ["begin", "mutation", "mutation", "anomaly", "mutation", "present", "end"]
        );
    }

    #[test]
    fn unknown_discriminant_stops_decoding() {
        let events: Vec<_> = decode(&[0xFF, 0, 0, 0]).collect();
        assert!(events.is_empty());
    }
}
