//! Typed errors for the per-run fatal path (§7, "Format rejection" /
//! "Structural mismatch" / "End-of-stream"). Per-chunk and per-member
//! failures are deliberately *not* represented here — they stay
//! `Result<T, String>` + log-and-downgrade at their call sites, matching
//! the fail-open policy in §4.2/§7.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("unrecognized container magic {0:?}")]
    UnrecognizedMagic([u8; 4]),

    #[error("memory map (mmap/imap) not found in uncompressed container")]
    MemoryMapNotFound,

    #[error("read past end of stream at position {pos} (length {length})")]
    EndOfStream { pos: usize, length: usize },

    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),

    #[error("chunk {0} not found in container")]
    ChunkNotFound(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ContainerResult<T> = Result<T, ContainerError>;

#[derive(Debug, Error)]
pub enum DecompileError {
    #[error("unrecognized opcode {0:#x}")]
    UnknownOpcode(u16),

    #[error("handler stride probe failed: {0}")]
    StrideProbeFailed(String),

    #[error("schema detection failed: {0}")]
    SchemaDetection(String),
}
