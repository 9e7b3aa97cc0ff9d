//! gb-core — a Game Boy (DMG) emulator core: the SM83 interpreter,
//! memory bus, timer, interrupt controller, OAM DMA engine, and a
//! read-only PPU state view, wired together by [`Machine`].
//!
//! PPU rendering, APU audio, and MBC banking are out of scope: this
//! crate runs "ROM only" cartridges correctly and loads larger ones
//! with only bank 0/1 visible.

pub mod cartridge;
pub mod cpu;
pub mod dma;
pub mod error;
pub mod interrupt;
pub mod machine;
pub mod memory;
pub mod ppu;
pub mod timer;

pub use cartridge::{Cartridge, CartridgeHeader, CartridgeKind};
pub use cpu::disasm::{disassemble, DisassembledInstruction};
pub use cpu::registers::{Cond, Flags, Reg, Registers};
pub use cpu::Cpu;
pub use error::CoreError;
pub use interrupt::Interrupt;
pub use machine::Machine;
pub use memory::{Bus, BusEvent};
pub use ppu::{OamEntry, TileBank};

/// SM83 clock speed in Hz, for embedders that want to convert a T-cycle
/// count into wall-clock time.
pub const CPU_HZ: u64 = 4_194_304;
