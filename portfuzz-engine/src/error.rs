use thiserror::Error;

/// Errors raised by the [`crate::fuzzer::Fuzzer`] accessors.
#[derive(Debug, Error)]
pub enum FuzzerError {
    #[error("port list must not be empty when explicitly set; pass None to draw the full 16-bit space")]
    EmptyPortList,
}

/// Errors raised by the instruction dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("port-I/O instructions are only implemented for x86/x86_64 hosts")]
    UnsupportedArch,
}

/// Errors raised by the worker harness.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to raise I/O privilege level: {0}")]
    PrivilegeFailure(#[source] std::io::Error),
    #[error("failed to open log sink {path}: {source}")]
    OpenLogSink { path: String, #[source] source: std::io::Error },
    #[error("failed to lock log sink: {0}")]
    LockFailure(#[source] std::io::Error),
    #[error("failed to flush or fsync log sink: {0}")]
    FlushFailure(#[source] std::io::Error),
    #[error("invalid port spec: {0}")]
    PortSpec(String),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
