//! Privilege acquisition: raises the calling
//! thread's I/O privilege level so the dispatcher's port instructions do
//! not fault. Uses a raw unsafe `libc` syscall wrapper, since there is no
//! safe abstraction over `iopl(2)`.

use crate::error::WorkerError;

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        /// Raises the process's I/O privilege level to the maximum (`iopl(3)`).
        /// Fatal on failure: an unraised privilege level is treated as a reason
        /// to abort the run outright rather than run with faulting instructions.
        pub fn acquire() -> Result<(), WorkerError> {
            // SAFETY: `iopl` is a plain syscall wrapper with no preconditions
            // beyond running with sufficient capabilities; failure is reported
            // through `errno`, which we convert to an `io::Error` below.
            let rc = unsafe { libc::iopl(3) };
            if rc != 0 {
                return Err(WorkerError::PrivilegeFailure(std::io::Error::last_os_error()));
            }
            Ok(())
        }
    } else {
        pub fn acquire() -> Result<(), WorkerError> {
            Err(WorkerError::PrivilegeFailure(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "iopl(2) is only available on Linux",
            )))
        }
    }
}
