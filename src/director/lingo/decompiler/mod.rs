// Lingo bytecode decompiler: turns a handler's bytecode array back into an
// annotated AST and pretty-printed source text.

pub mod ast;
pub mod enums;
pub mod handler;
pub mod code_writer;

pub use handler::{decompile_handler, print_handler, DecompiledHandler, DecompiledLine};
