//! Error taxonomy for the core.
//!
//! ROM loading is the only fallible public operation; everything else
//! either succeeds or represents a violated invariant, in which case the
//! core aborts with a diagnostic rather than returning a `Result`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("ROM too short or missing header: {0}")]
    InvalidRom(String),

    #[error("failed to read ROM file {path}: {source}")]
    RomIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unimplemented opcode 0x{opcode:02X} at PC={pc:#06X}")]
    UnimplementedOpcode { opcode: u8, pc: u16 },
}
