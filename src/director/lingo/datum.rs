//! A literal table entry (§3 "Literal table entry", §4.8 "Literal decoding").
//!
//! This is deliberately small: it mirrors exactly what a `LiteralStore`
//! (`chunks::literal::LiteralStore`) can decode from the container, not a
//! general-purpose scripting value. The decompiler's own `Datum` (in
//! `decompiler::ast`) is a different, richer type used for AST literals;
//! the two are kept distinct and converted explicitly where they meet.

#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    Int(i32),
    Float(f32),
    String(String),
    Symbol(String),
    List(Vec<Datum>),
    Void,
}
