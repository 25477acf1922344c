//! VYPcode generator for the VYP compiler
//!
//! Takes the typed IR from `vypc-parser` and emits the textual program
//! for the target stack machine.

pub mod builtins;
pub mod codegen;
pub mod opcode;

pub use codegen::{attribute_offset, generate, object_size};
pub use opcode::Op;

use vypc_ir::CompileResult;

/// Compile one source file to VYPcode text: both frontend passes, then
/// code generation.
pub fn compile(source: &str, verbose: bool) -> CompileResult<String> {
    let (mut program, global) = vypc_parser::parse(source)?;
    generate(&mut program, &global, verbose)
}
