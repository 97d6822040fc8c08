use thiserror::Error;

use crate::cartridge::header::NES_HEADER_LEN;

/// Errors surfaced by the emulation core.
///
/// Loading errors are fatal to the session that tried to insert the image;
/// `IllegalOpcode` is fatal at run time (licensed software never executes an
/// undocumented opcode, so hitting one means the emulated machine is lost).
#[derive(Debug, Error)]
pub enum Error {
    /// Provided buffer is shorter than the 16-byte iNES header.
    #[error("ROM image shorter than the {NES_HEADER_LEN}-byte header (got {actual} bytes)")]
    RomTooShort { actual: usize },

    /// Magic number (`NES<EOF>`) is missing.
    #[error("missing NES magic bytes")]
    InvalidMagic,

    /// A ROM section (trainer/PRG/CHR) is shorter than the header advertises.
    #[error("{section} section expected {expected} bytes, got {actual}")]
    SectionTooShort {
        section: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The iNES mapper id has no implementation in the registry.
    #[error("mapper {0} is not supported")]
    UnsupportedMapper(u16),

    /// A mapper rejected the cartridge layout at construction time.
    #[error("mapper fault: {0}")]
    MapperFault(&'static str),

    /// The CPU fetched a byte with no documented instruction behind it.
    #[error("illegal opcode {opcode:#04X} at PC {pc:#06X}")]
    IllegalOpcode { pc: u16, opcode: u8 },

    /// Wrapper for I/O errors raised while reading ROMs from disk.
    #[error("i/o error while reading cartridge: {0}")]
    Io(#[from] std::io::Error),
}
