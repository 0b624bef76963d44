//! Persistence and execution of generated scripts
//!
//! Generated code is written to a fresh scratch directory and later run as a
//! child process with the configured interpreter.
//!
//! The only bound on a script is its wall-clock timeout. There is no
//! filesystem, network or syscall isolation; the child runs with the
//! function's own permissions.

pub mod runner;
pub mod store;

pub use runner::{execute_generated_code, ExecutionConfig, ExecutionResult};
pub use store::{save_generated_code, SCRIPT_FILE_NAME};
