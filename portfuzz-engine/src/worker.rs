//! The worker harness: privilege acquisition, the destructive-operation
//! banner, shared-RNG construction, thread spawning, and the per-worker
//! loop that ties a [`Fuzzer`] to a shared, file-locked log sink.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fs2::FileExt;
use portfuzz_common::arg::Arguments;
use portfuzz_common::ports::parse_ports;

use crate::dispatch::{self, DispatchError};
use crate::error::WorkerError;
use crate::fuzzer::Fuzzer;
use crate::privilege;
use crate::rng::RngService;

enum SinkInner {
    Stdout(io::Stdout),
    File(fs::File),
}

/// The shared log sink every worker writes its CSV lines to. Holding its
/// lock serializes both the write and the instruction it precedes, per
/// the harness's "log line flushed and fsynced before the instruction
/// that may never return" ordering.
pub struct LogSink {
    inner: Mutex<SinkInner>,
}

impl LogSink {
    pub fn stdout() -> Self {
        Self {
            inner: Mutex::new(SinkInner::Stdout(io::stdout())),
        }
    }

    pub fn open_append(path: &Path) -> Result<Self, WorkerError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| WorkerError::OpenLogSink {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self {
            inner: Mutex::new(SinkInner::File(file)),
        })
    }

    /// Locks the sink, writes and fsyncs `line`, then — while still
    /// holding the lock — calls `iterate`. The lock is released only
    /// after `iterate` returns, matching the harness's locking
    /// discipline (log-sink lock held across the instruction, not
    /// released before it).
    fn emit_and_iterate(&self, line: &str, iterate: impl FnOnce() -> Result<(), DispatchError>) -> Result<(), WorkerError> {
        let mut guard = self.inner.lock().unwrap();
        match &mut *guard {
            SinkInner::File(file) => {
                file.lock_exclusive().map_err(WorkerError::LockFailure)?;
                let result = Self::write_flush_sync(file, line);
                let _ = file.unlock();
                result?;
            }
            SinkInner::Stdout(out) => {
                out.write_all(line.as_bytes())
                    .and_then(|_| out.flush())
                    .map_err(WorkerError::FlushFailure)?;
            }
        }
        iterate().map_err(WorkerError::from)
    }

    fn write_flush_sync(file: &mut fs::File, line: &str) -> Result<(), WorkerError> {
        file.write_all(line.as_bytes()).map_err(WorkerError::FlushFailure)?;
        file.flush().map_err(WorkerError::FlushFailure)?;
        file.sync_all().map_err(WorkerError::FlushFailure)?;
        Ok(())
    }
}

/// Formats one CSV log line: `unix_seconds,ordinal,state,mnemonic,v1..v6`,
/// each variate printed `0x`-prefixed and truncated to 32 bits — the log
/// format is fixed width regardless of the variate tuple's machine-word
/// size, and that truncation is intentional.
fn format_log_line(ordinal: u32, state: [u8; 8], variates: &[u64; 7]) -> String {
    let unix_seconds = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    let state_u64 = u64::from_le_bytes(state);
    let mnemonic = dispatch::mnemonic_for(variates);
    format!(
        "{unix_seconds},{ordinal},{state_u64:#018x},{mnemonic},{:#010x},{:#010x},{:#010x},{:#010x},{:#010x},{:#010x}\n",
        variates[1] as u32,
        variates[2] as u32,
        variates[3] as u32,
        variates[4] as u32,
        variates[5] as u32,
        variates[6] as u32,
    )
}

/// Prints the destructive-operation warning and counts down three
/// seconds, unless `quiet` is set.
pub fn grace_banner(quiet: bool) {
    if quiet {
        return;
    }
    eprintln!("portfuzz is about to issue raw x86 port I/O instructions against live hardware.");
    eprintln!("This can corrupt device state, hang the kernel, or damage hardware. Ctrl-C to abort.");
    for remaining in (1..=3).rev() {
        eprint!("\rstarting in {remaining}...");
        let _ = io::stderr().flush();
        thread::sleep(Duration::from_secs(1));
    }
    eprintln!();
}

/// One worker's forever loop: construct its own [`Fuzzer`] over the
/// shared RNG and port list, then lock the sink, emit a line, flush and
/// fsync it, iterate the fuzzer, and unlock — forever.
pub fn worker_loop(ordinal: u32, rng: Arc<RngService>, ports: Option<Vec<u32>>, sink: Arc<LogSink>) -> Result<(), WorkerError> {
    let fuzzer = Fuzzer::new(rng, ports);
    loop {
        let variates = fuzzer.variates();
        let state = fuzzer.state();
        let line = format_log_line(ordinal, state, &variates);
        log::debug!("worker {ordinal}: {}", dispatch::mnemonic_for(&variates));
        sink.emit_and_iterate(&line, || fuzzer.iterate())?;
    }
}

/// Parses the `-p`/`--ports` spec into the engine's `Option<Vec<u32>>`
/// representation: a missing or empty spec means "no list".
fn resolve_ports(spec: &Option<String>) -> Result<Option<Vec<u32>>, WorkerError> {
    match spec {
        Some(s) if !s.trim().is_empty() => {
            let list = parse_ports(s).map_err(WorkerError::PortSpec)?;
            Ok(if list.is_empty() { None } else { Some(list) })
        }
        _ => Ok(None),
    }
}

/// Runs the complete harness: acquires I/O privilege, prints the grace
/// banner, builds the shared RNG and log sink, spawns `num_threads - 1`
/// detached workers, and runs worker 0 in-line on the calling thread.
/// Returns only if worker 0's loop hits an unrecoverable error; the
/// detached workers' failures are logged but do not stop the process.
pub fn run(args: &Arguments) -> Result<(), WorkerError> {
    privilege::acquire()?;
    grace_banner(args.quiet);

    let rng = Arc::new(RngService::new(args.state));
    let ports = resolve_ports(&args.ports)?;

    let sink = Arc::new(match &args.output {
        Some(path) => LogSink::open_append(path)?,
        None => LogSink::stdout(),
    });

    let num_threads = args.num_threads.max(1);

    for ordinal in 1..num_threads {
        let rng = Arc::clone(&rng);
        let ports = ports.clone();
        let sink = Arc::clone(&sink);

        let mut builder = thread::Builder::new().name(format!("portfuzz-worker-{ordinal}"));
        if let Some(stack_size) = args.stack_size {
            builder = builder.stack_size(stack_size);
        }
        builder
            .spawn(move || {
                if let Err(e) = worker_loop(ordinal as u32, rng, ports, sink) {
                    log::error!("worker {ordinal} exiting after unrecoverable error: {e}");
                }
            })
            .expect("failed to spawn worker thread");
    }

    worker_loop(0, rng, ports, sink)
}
