//! Loxi VM: the stack interpreter that runs a compiled [`loxi_core::Chunk`].
//!
//! - `vm`: call frames, globals, upvalues, and the dispatch loop.
//! - `error`: `RuntimeError`/`InterpretResult`, mapped to process exit codes
//!   by the CLI.
//! - `natives`: host functions registered as globals (`clock`).

pub mod error;
pub mod natives;
pub mod vm;

pub use error::InterpretResult;
pub use vm::Vm;
