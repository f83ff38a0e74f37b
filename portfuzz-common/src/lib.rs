//! Command-line argument parsing and port-range grammar shared by the
//! `portfuzz` binary and the `portfuzz-engine` crate.

pub mod arg;
pub mod ports;
