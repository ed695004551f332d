//! JSON-lines event sink.
//!
//! Writes one JSON object per [`AppEvent`] to any `std::io::Write`, the
//! shape a pub/sub bridge publishes:
//!
//! ```text
//! {"event":"mode_changed","data":{"from":"off","to":"brew"}}
//! {"event":"telemetry","data":{"tick":3,"mode":"brew",...}}
//! ```
//!
//! Write failures are logged and counted, never propagated: telemetry
//! must not be able to stop the control loop.

use std::io::Write;

use log::warn;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

pub struct JsonEventSink<W: Write> {
    out: W,
    dropped: u32,
}

impl<W: Write> JsonEventSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, dropped: 0 }
    }

    /// Events that could not be written.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, event: &AppEvent) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write> EventSink for JsonEventSink<W> {
    fn emit(&mut self, event: &AppEvent) {
        if let Err(e) = self.write_line(event) {
            self.dropped = self.dropped.saturating_add(1);
            warn!("json sink: dropped event ({e})");
        }
    }
}
