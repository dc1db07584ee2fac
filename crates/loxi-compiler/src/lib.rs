//! Loxi Compiler: scanner, single-pass Pratt compiler, and disassembler.
//!
//! - `scanner`: character stream to tokens, with the keyword trie and
//!   line tracking.
//! - `precedence`: the operator precedence ladder the Pratt parser climbs.
//! - `compiler`: the parser/code-generator itself — no intermediate AST,
//!   bytecode is emitted as each production is recognized.
//! - `disasm`: a read-only bytecode visitor for `--disassemble`/`--trace`.
//! - `error`: `CompileError`, the hand-rolled diagnostic type.

pub mod compiler;
pub mod disasm;
pub mod error;
pub mod precedence;
pub mod scanner;

pub use compiler::compile;
pub use error::CompileError;
