// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`MountTraceSink`] and writes one line per
//! event to a [`Write`](std::io::Write) destination (default: stderr).
//! Timestamps are printed in microseconds since the manager was created.

use std::io::Write;

use accretion_core::anomaly::name_for_code;
use accretion_core::trace::{
    AnomalyEvent, MountTraceSink, MutationEvent, PresentEvent, TransactionBeginEvent,
    TransactionEndEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }
}

fn us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

impl<W: Write + Send> MountTraceSink for PrettyPrintSink<W> {
    fn on_transaction_begin(&mut self, e: &TransactionBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[begin] tx={} surface={} rev={} mutations={} at {:.1}µs",
            e.transaction,
            e.surface_id.0,
            e.revision,
            e.mutation_count,
            us(e.at_nanos),
        );
    }

    fn on_mutation(&mut self, e: &MutationEvent) {
        let outcome = if e.applied { "ok" } else { "SKIPPED" };
        let _ = writeln!(
            self.writer,
            "[mutation] tx={} #{} {} {} {outcome}",
            e.transaction, e.index, e.kind, e.tag,
        );
    }

    fn on_anomaly(&mut self, e: &AnomalyEvent) {
        let tag = e.tag.map_or_else(|| "-".to_owned(), |t| t.to_string());
        let _ = writeln!(
            self.writer,
            "[anomaly] tx={} {} tag={tag} at {:.1}µs",
            e.transaction,
            name_for_code(e.code),
            us(e.at_nanos),
        );
    }

    fn on_transaction_end(&mut self, e: &TransactionEndEvent) {
        let _ = writeln!(
            self.writer,
            "[end] tx={} applied={} skipped={} at {:.1}µs",
            e.transaction,
            e.applied,
            e.skipped,
            us(e.at_nanos),
        );
    }

    fn on_present(&mut self, e: &PresentEvent) {
        let _ = writeln!(
            self.writer,
            "[present] tx={} added={} removed={} frames={} repaint={} redraw={} \
             topology={}",
            e.transaction, e.added, e.removed, e.frames, e.repaint, e.redraw, e.topology_changed,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accretion_core::id::{SurfaceId, Tag};

    #[test]
    fn pretty_print_begin() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_transaction_begin(&TransactionBeginEvent {
            transaction: 1,
            surface_id: SurfaceId(2),
            revision: 5,
            mutation_count: 3,
            at_nanos: 1_500,
        });
        let output = String::from_utf8(sink.writer).unwrap();
        assert!(output.contains("[begin]"), "got: {output}");
        assert!(output.contains("rev=5"), "got: {output}");
        assert!(output.contains("1.5µs"), "got: {output}");
    }

    #[test]
    fn pretty_print_anomaly_names_the_class() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_anomaly(&AnomalyEvent {
            transaction: 4,
            code: 10,
            tag: Some(Tag(8)),
            at_nanos: 0,
        });
        sink.on_anomaly(&AnomalyEvent {
            transaction: 0,
            code: 13,
            tag: None,
            at_nanos: 0,
        });
        let output = String::from_utf8(sink.writer).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2, "got: {output}");
        assert!(lines[0].contains("delete-unknown tag=#8"), "got: {output}");
        assert!(lines[1].contains("stale-batch tag=-"), "got: {output}");
    }
}
