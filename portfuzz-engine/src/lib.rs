//! Deterministic fuzzing engine for the twelve x86 port-I/O instructions.
//!
//! [`array`] and [`rng`] are the leaf building blocks; [`variate`] draws
//! the 7-slot operand tuple from the RNG; [`dispatch`] maps that tuple to
//! one of the twelve instructions and executes it; [`fuzzer`] ties the
//! three together into the per-worker iteration step; [`worker`] owns the
//! thread spawning, the shared log sink, and the privilege handshake.

pub mod array;
pub mod dispatch;
pub mod error;
pub mod fuzzer;
pub mod privilege;
pub mod rng;
pub mod variate;
pub mod worker;

pub use error::{DispatchError, FuzzerError, WorkerError};
pub use fuzzer::Fuzzer;
pub use rng::RngService;
pub use worker::{run, LogSink};
