//! The SM83 CPU: registers, IME/HALT/STOP state, and the opcode interpreter.

mod cb;
pub mod disasm;
mod ops;
pub mod registers;

use crate::cartridge::CartridgeHeader;
use crate::error::CoreError;
use crate::memory::Bus;
use registers::{Cond, Flags, Reg, Registers};

/// 8-bit register operand order used by the `r8`/`r`/`r'` opcode fields
/// (`(opcode >> 3) & 7` or `opcode & 7`): B, C, D, E, H, L, (HL), A.
const R8_ORDER: [Reg; 8] = [Reg::B, Reg::C, Reg::D, Reg::E, Reg::H, Reg::L, Reg::HL, Reg::A];

/// 16-bit register operand order used by the `rr` field in the
/// 0x00-0x3F block: BC, DE, HL, SP.
const R16_SP_ORDER: [Reg; 4] = [Reg::BC, Reg::DE, Reg::HL, Reg::SP];

/// 16-bit register operand order used by PUSH/POP and the 0xC0-0xF0
/// block: BC, DE, HL, AF.
const R16_AF_ORDER: [Reg; 4] = [Reg::BC, Reg::DE, Reg::HL, Reg::AF];

const CONDITIONS: [Cond; 4] = [Cond::NZ, Cond::Z, Cond::NC, Cond::C];

pub struct Cpu {
    pub regs: Registers,
    pub ime: bool,
    /// Set by EI; realizes the one-instruction enable delay. Cleared
    /// either when IME is latched in or when an interrupt is serviced.
    pub ei_latch: bool,
    pub halted: bool,
    pub stopped: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Cpu {
            regs: Registers::default(),
            ime: false,
            ei_latch: false,
            halted: false,
            stopped: false,
        }
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post-boot reset state, seeded from the cartridge header checksum.
    pub fn reset(&mut self, header: &CartridgeHeader) {
        self.regs = Registers::default();
        self.regs.a = 0x01;
        self.regs.set_flag_z(true);
        self.regs.set_flag_n(false);
        let hc = header.header_checksum != 0;
        self.regs.set_flag_h(hc);
        self.regs.set_flag_c(hc);
        self.regs.set_bc(0x0013);
        self.regs.set_de(0x00D8);
        self.regs.set_hl(0x014D);
        self.regs.sp = 0xFFFE;
        self.regs.pc = 0x0100;
        self.ime = false;
        self.ei_latch = false;
        self.halted = false;
        self.stopped = false;
    }

    fn fetch8(&mut self, bus: &Bus) -> u8 {
        let v = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        v
    }

    fn fetch16(&mut self, bus: &Bus) -> u16 {
        let lo = self.fetch8(bus) as u16;
        let hi = self.fetch8(bus) as u16;
        lo | (hi << 8)
    }

    fn read_r8(&mut self, bus: &Bus, idx: u8) -> u8 {
        let reg = R8_ORDER[idx as usize];
        if reg == Reg::HL {
            bus.read(self.regs.hl())
        } else {
            self.regs.read(reg) as u8
        }
    }

    fn write_r8(&mut self, bus: &mut Bus, idx: u8, v: u8) {
        let reg = R8_ORDER[idx as usize];
        if reg == Reg::HL {
            bus.write(self.regs.hl(), v);
        } else {
            self.regs.write(reg, v as u16);
        }
    }

    fn push16(&mut self, bus: &mut Bus, v: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(2);
        bus.write16(self.regs.sp, v);
    }

    fn pop16(&mut self, bus: &Bus) -> u16 {
        let v = bus.read16(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(2);
        v
    }

    /// Pushes the current PC, for use by the interrupt service routine.
    pub(crate) fn push_for_interrupt(&mut self, bus: &mut Bus) {
        self.push16(bus, self.regs.pc);
    }

    /// Applies an EI scheduled by the *previous* instruction. Called
    /// before fetch so that EI's enable takes effect only starting
    /// with the instruction after it, never the EI instruction itself.
    pub(crate) fn apply_ei_latch(&mut self) {
        if self.ei_latch {
            self.ime = true;
            self.ei_latch = false;
        }
    }

    /// Executes one instruction at `pc`, advancing `pc` and returning
    /// the T-cycle cost. `halted`/`stopped` short-circuiting is the
    /// caller's (`Machine::step`) responsibility.
    pub fn step(&mut self, bus: &mut Bus) -> Result<u8, CoreError> {
        self.apply_ei_latch();
        let pc_at_fetch = self.regs.pc;
        let opcode = self.fetch8(bus);
        self.execute(bus, opcode, pc_at_fetch)
    }

    fn execute(&mut self, bus: &mut Bus, opcode: u8, pc_at_fetch: u16) -> Result<u8, CoreError> {
        match opcode {
            0x00 => Ok(4), // NOP

            0x01 | 0x11 | 0x21 | 0x31 => {
                // LD rr, d16
                let idx = (opcode >> 4) & 3;
                let v = self.fetch16(bus);
                self.regs.write(R16_SP_ORDER[idx as usize], v);
                Ok(12)
            }

            0x02 | 0x12 => {
                // LD (BC/DE), A
                let addr = if opcode == 0x02 { self.regs.bc() } else { self.regs.de() };
                bus.write(addr, self.regs.a);
                Ok(8)
            }
            0x0A | 0x1A => {
                // LD A, (BC/DE)
                let addr = if opcode == 0x0A { self.regs.bc() } else { self.regs.de() };
                self.regs.a = bus.read(addr);
                Ok(8)
            }

            0x22 => {
                // LD (HL+), A
                bus.write(self.regs.hl(), self.regs.a);
                self.regs.set_hl(self.regs.hl().wrapping_add(1));
                Ok(8)
            }
            0x32 => {
                // LD (HL-), A
                bus.write(self.regs.hl(), self.regs.a);
                self.regs.set_hl(self.regs.hl().wrapping_sub(1));
                Ok(8)
            }
            0x2A => {
                // LD A, (HL+)
                self.regs.a = bus.read(self.regs.hl());
                self.regs.set_hl(self.regs.hl().wrapping_add(1));
                Ok(8)
            }
            0x3A => {
                // LD A, (HL-)
                self.regs.a = bus.read(self.regs.hl());
                self.regs.set_hl(self.regs.hl().wrapping_sub(1));
                Ok(8)
            }

            0x03 | 0x13 | 0x23 | 0x33 => {
                let idx = (opcode >> 4) & 3;
                let reg = R16_SP_ORDER[idx as usize];
                let v = self.regs.read(reg).wrapping_add(1);
                self.regs.write(reg, v);
                Ok(8)
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let idx = (opcode >> 4) & 3;
                let reg = R16_SP_ORDER[idx as usize];
                let v = self.regs.read(reg).wrapping_sub(1);
                self.regs.write(reg, v);
                Ok(8)
            }

            0x34 => {
                let v = ops::inc8(&mut self.regs, bus.read(self.regs.hl()));
                bus.write(self.regs.hl(), v);
                Ok(12)
            }
            0x35 => {
                let v = ops::dec8(&mut self.regs, bus.read(self.regs.hl()));
                bus.write(self.regs.hl(), v);
                Ok(12)
            }
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x3C => {
                let idx = (opcode >> 3) & 7;
                let v = ops::inc8(&mut self.regs, self.read_r8(bus, idx));
                self.write_r8(bus, idx, v);
                Ok(4)
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x3D => {
                let idx = (opcode >> 3) & 7;
                let v = ops::dec8(&mut self.regs, self.read_r8(bus, idx));
                self.write_r8(bus, idx, v);
                Ok(4)
            }

            0x36 => {
                let v = self.fetch8(bus);
                bus.write(self.regs.hl(), v);
                Ok(12)
            }
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
                let idx = (opcode >> 3) & 7;
                let v = self.fetch8(bus);
                self.write_r8(bus, idx, v);
                Ok(8)
            }

            0x07 => {
                ops::rlca(&mut self.regs);
                Ok(4)
            }
            0x0F => {
                ops::rrca(&mut self.regs);
                Ok(4)
            }
            0x17 => {
                ops::rla(&mut self.regs);
                Ok(4)
            }
            0x1F => {
                ops::rra(&mut self.regs);
                Ok(4)
            }

            0x08 => {
                // LD (a16), SP
                let addr = self.fetch16(bus);
                bus.write16(addr, self.regs.sp);
                Ok(20)
            }

            0x09 | 0x19 | 0x29 | 0x39 => {
                let idx = (opcode >> 4) & 3;
                let rhs = self.regs.read(R16_SP_ORDER[idx as usize]);
                let v = ops::add_hl(&mut self.regs, rhs);
                self.regs.set_hl(v);
                Ok(8)
            }

            0x18 => {
                let off = self.fetch8(bus) as i8;
                self.regs.pc = self.regs.pc.wrapping_add(off as u16);
                Ok(12)
            }
            0x20 | 0x28 | 0x30 | 0x38 => {
                let idx = (opcode >> 3) & 3;
                let off = self.fetch8(bus) as i8;
                if self.regs.check_cond(CONDITIONS[idx as usize]) {
                    self.regs.pc = self.regs.pc.wrapping_add(off as u16);
                    Ok(12)
                } else {
                    Ok(8)
                }
            }

            0x27 => {
                ops::daa(&mut self.regs);
                Ok(4)
            }
            0x2F => {
                self.regs.a = !self.regs.a;
                self.regs.set_flag_n(true);
                self.regs.set_flag_h(true);
                Ok(4)
            }
            0x37 => {
                self.regs.set_flag_n(false);
                self.regs.set_flag_h(false);
                self.regs.set_flag_c(true);
                Ok(4)
            }
            0x3F => {
                self.regs.set_flag_n(false);
                self.regs.set_flag_h(false);
                let c = self.regs.flag_c();
                self.regs.set_flag_c(!c);
                Ok(4)
            }

            0x76 => {
                self.halted = true;
                Ok(4)
            }
            0x40..=0x7F => {
                // LD r, r' (0x76 handled above as HALT)
                let dst = (opcode >> 3) & 7;
                let src = opcode & 7;
                let v = self.read_r8(bus, src);
                self.write_r8(bus, dst, v);
                Ok(if dst == 6 || src == 6 { 8 } else { 4 })
            }

            0x80..=0xBF => {
                let op = (opcode >> 3) & 7;
                let src = opcode & 7;
                let v = self.read_r8(bus, src);
                ops::alu8(&mut self.regs, op, v);
                Ok(if src == 6 { 8 } else { 4 })
            }
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let op = (opcode >> 3) & 7;
                let v = self.fetch8(bus);
                ops::alu8(&mut self.regs, op, v);
                Ok(8)
            }

            0xC0 | 0xC8 | 0xD0 | 0xD8 => {
                let idx = (opcode >> 3) & 3;
                if self.regs.check_cond(CONDITIONS[idx as usize]) {
                    self.regs.pc = self.pop16(bus);
                    Ok(20)
                } else {
                    Ok(8)
                }
            }
            0xC9 => {
                self.regs.pc = self.pop16(bus);
                Ok(16)
            }
            0xD9 => {
                self.regs.pc = self.pop16(bus);
                self.ime = true;
                self.ei_latch = false;
                Ok(16)
            }

            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let idx = (opcode >> 4) & 3;
                let v = self.pop16(bus);
                self.regs.write(R16_AF_ORDER[idx as usize], v);
                Ok(12)
            }
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let idx = (opcode >> 4) & 3;
                let v = self.regs.read(R16_AF_ORDER[idx as usize]);
                self.push16(bus, v);
                Ok(16)
            }

            0xC2 | 0xCA | 0xD2 | 0xDA => {
                let idx = (opcode >> 3) & 3;
                let addr = self.fetch16(bus);
                if self.regs.check_cond(CONDITIONS[idx as usize]) {
                    self.regs.pc = addr;
                    Ok(16)
                } else {
                    Ok(12)
                }
            }
            0xC3 => {
                self.regs.pc = self.fetch16(bus);
                Ok(16)
            }
            0xE9 => {
                self.regs.pc = self.regs.hl();
                Ok(4)
            }

            0xC4 | 0xCC | 0xD4 | 0xDC => {
                let idx = (opcode >> 3) & 3;
                let addr = self.fetch16(bus);
                if self.regs.check_cond(CONDITIONS[idx as usize]) {
                    self.push16(bus, self.regs.pc);
                    self.regs.pc = addr;
                    Ok(24)
                } else {
                    Ok(12)
                }
            }
            0xCD => {
                let addr = self.fetch16(bus);
                self.push16(bus, self.regs.pc);
                self.regs.pc = addr;
                Ok(24)
            }

            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                let vector = (opcode & 0b0011_1000) as u16;
                self.push16(bus, self.regs.pc);
                self.regs.pc = vector;
                Ok(16)
            }

            0xCB => {
                let cb_opcode = self.fetch8(bus);
                let cycles = cb::execute(&mut self.regs, bus, cb_opcode);
                // cb::execute returns an M-cycle count; convert to T-cycles
                // and add the 4 T-cycles for the 0xCB prefix fetch itself.
                Ok(cycles * 4 + 4)
            }

            0xE0 => {
                let off = self.fetch8(bus) as u16;
                bus.write(0xFF00 + off, self.regs.a);
                Ok(12)
            }
            0xF0 => {
                let off = self.fetch8(bus) as u16;
                self.regs.a = bus.read(0xFF00 + off);
                Ok(12)
            }
            0xE2 => {
                bus.write(0xFF00 + self.regs.c as u16, self.regs.a);
                Ok(8)
            }
            0xF2 => {
                self.regs.a = bus.read(0xFF00 + self.regs.c as u16);
                Ok(8)
            }

            0xE8 => {
                let off = self.fetch8(bus) as i8;
                self.regs.sp = ops::add_sp_signed(&mut self.regs, self.regs.sp, off);
                Ok(16)
            }
            0xF8 => {
                let off = self.fetch8(bus) as i8;
                let v = ops::add_sp_signed(&mut self.regs, self.regs.sp, off);
                self.regs.set_hl(v);
                Ok(12)
            }
            0xF9 => {
                self.regs.sp = self.regs.hl();
                Ok(8)
            }

            0xEA => {
                let addr = self.fetch16(bus);
                bus.write(addr, self.regs.a);
                Ok(16)
            }
            0xFA => {
                let addr = self.fetch16(bus);
                self.regs.a = bus.read(addr);
                Ok(16)
            }

            0x10 => {
                // STOP: reads (and discards) one trailing byte.
                let _ = self.fetch8(bus);
                self.stopped = true;
                Ok(4)
            }

            0xF3 => {
                self.ime = false;
                self.ei_latch = false;
                Ok(4)
            }
            0xFB => {
                self.ei_latch = true;
                Ok(4)
            }

            0xD3 | 0xDB | 0xDD | 0xE3 | 0xE4 | 0xEB | 0xEC | 0xED | 0xF4 | 0xFC | 0xFD => {
                Err(CoreError::UnimplementedOpcode {
                    opcode,
                    pc: pc_at_fetch,
                })
            }
        }
    }
}
