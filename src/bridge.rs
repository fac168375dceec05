//! JSON-lines host bridge. The host writes one event object per line on
//! stdin and reads one effect object per line from stdout.
//!
//! Both directions run on dedicated OS threads: the reader blocks on input
//! and forwards into the driver's tokio channel; the writer drains an
//! unbounded crossbeam channel so the driver never waits on stdout.

use std::io::{self, BufRead, Write};
use std::thread::JoinHandle;

use crossbeam_channel as cb;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::event::{Effect, HostEvent};
use crate::scheduler::HostSurface;

/// Longest slice of a bad input line echoed into logs.
const LOG_LINE_LIMIT: usize = 200;

/// Effect sink backed by the writer thread.
pub struct JsonLinesHost {
    tx: cb::Sender<Effect>,
}

impl HostSurface for JsonLinesHost {
    fn apply(&self, effect: Effect) {
        if self.tx.send(effect).is_err() {
            warn!("effect writer has stopped, dropping effect");
        }
    }
}

/// Start the writer thread. It exits once the returned host is dropped.
pub fn spawn_writer<W>(out: W) -> io::Result<(JsonLinesHost, JoinHandle<()>)>
where
    W: Write + Send + 'static,
{
    let (tx, rx) = cb::unbounded();
    let handle = std::thread::Builder::new()
        .name("effect-writer".into())
        .spawn(move || write_effects(rx, out))?;
    Ok((JsonLinesHost { tx }, handle))
}

fn write_effects(rx: cb::Receiver<Effect>, mut out: impl Write) {
    for effect in rx.iter() {
        let line = match serde_json::to_string(&effect) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, ?effect, "effect not serializable");
                continue;
            }
        };
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            warn!(error = %e, "host output closed, effect writer exiting");
            return;
        }
    }
    debug!("effect channel closed, writer exiting");
}

/// Start the reader thread. It exits at end of input or when the driver
/// drops its receiver; either way the driver sees its channel close.
pub fn spawn_reader<R>(input: R, tx: mpsc::Sender<HostEvent>) -> io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    std::thread::Builder::new()
        .name("event-reader".into())
        .spawn(move || read_events(input, tx))
}

fn read_events(mut input: impl BufRead, tx: mpsc::Sender<HostEvent>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "host input failed");
                break;
            }
        }
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                let shown = String::from_utf8_lossy(&buf[..buf.len().min(LOG_LINE_LIMIT)]);
                warn!(error = %e, line = %shown.trim_end(), "host event is not utf-8");
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let Some(event) = parse_event(line) else {
            continue;
        };
        if tx.blocking_send(event).is_err() {
            debug!("driver gone, reader exiting");
            return;
        }
    }
    info!("host input ended");
}

/// Decode one input line. Malformed lines are logged and skipped.
pub fn parse_event(line: &str) -> Option<HostEvent> {
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            let shown: String = line.chars().take(LOG_LINE_LIMIT).collect();
            warn!(error = %e, line = %shown, "malformed host event");
            None
        }
    }
}
