// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use accretion_core::anomaly::name_for_code;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Transactions become duration slices; mutations, anomalies and
/// presentations become instants inside them.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::TransactionBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": "Transaction",
                    "cat": "Mount",
                    "ts": nanos_to_us(e.at_nanos),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "transaction": e.transaction,
                        "surface_id": e.surface_id.0,
                        "revision": e.revision,
                        "mutations": e.mutation_count,
                    }
                }));
            }
            RecordedEvent::TransactionEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": "Transaction",
                    "cat": "Mount",
                    "ts": nanos_to_us(e.at_nanos),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "transaction": e.transaction,
                        "applied": e.applied,
                        "skipped": e.skipped,
                    }
                }));
            }
            RecordedEvent::Mutation(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": e.kind.as_str(),
                    "cat": "Rich",
                    "ts": nanos_to_us(e.at_nanos),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "transaction": e.transaction,
                        "index": e.index,
                        "tag": e.tag.0,
                        "applied": e.applied,
                    }
                }));
            }
            RecordedEvent::Anomaly(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": name_for_code(e.code),
                    "cat": "Anomaly",
                    "ts": nanos_to_us(e.at_nanos),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "transaction": e.transaction,
                        "code": e.code,
                        "tag": e.tag.map(|t| t.0),
                    }
                }));
            }
            RecordedEvent::Present(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Present",
                    "cat": "Surface",
                    "ts": nanos_to_us(e.at_nanos),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "transaction": e.transaction,
                        "added": e.added,
                        "removed": e.removed,
                        "frames": e.frames,
                        "repaint": e.repaint,
                        "redraw": e.redraw,
                        "topology_changed": e.topology_changed,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}
