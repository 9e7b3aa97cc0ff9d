//! A pure disassembly formatter: reads through the bus without
//! mutating CPU or bus state, so the test suite (or a future debugger)
//! can render any PC without cloning the machine.

use crate::memory::Bus;

#[derive(Debug, Clone)]
pub struct DisassembledInstruction {
    pub address: u16,
    pub bytes: Vec<u8>,
    pub mnemonic: String,
}

impl DisassembledInstruction {
    pub fn len(&self) -> u16 {
        self.bytes.len() as u16
    }
}

const R8_NAMES: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];
const R16_SP_NAMES: [&str; 4] = ["BC", "DE", "HL", "SP"];
const R16_AF_NAMES: [&str; 4] = ["BC", "DE", "HL", "AF"];
const ALU_NAMES: [&str; 8] = ["ADD A,", "ADC A,", "SUB", "SBC A,", "AND", "XOR", "OR", "CP"];
const COND_NAMES: [&str; 4] = ["NZ", "Z", "NC", "C"];
const CB_ROT_NAMES: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SWAP", "SRL"];

/// Disassembles the instruction at `pc`, reading operand bytes through
/// `bus` but never writing to it or to any CPU state.
pub fn disassemble(bus: &Bus, pc: u16) -> DisassembledInstruction {
    let opcode = bus.read(pc);
    let mut bytes = vec![opcode];
    let read_next = |offset: u16| -> u8 { bus.read(pc.wrapping_add(offset)) };

    let mnemonic = match opcode {
        0x00 => "NOP".to_string(),
        0x01 | 0x11 | 0x21 | 0x31 => {
            let lo = read_next(1);
            let hi = read_next(2);
            bytes.push(lo);
            bytes.push(hi);
            format!("LD {},${:02X}{:02X}", R16_SP_NAMES[((opcode >> 4) & 3) as usize], hi, lo)
        }
        0x02 => "LD (BC),A".to_string(),
        0x12 => "LD (DE),A".to_string(),
        0x0A => "LD A,(BC)".to_string(),
        0x1A => "LD A,(DE)".to_string(),
        0x22 => "LD (HL+),A".to_string(),
        0x32 => "LD (HL-),A".to_string(),
        0x2A => "LD A,(HL+)".to_string(),
        0x3A => "LD A,(HL-)".to_string(),
        0x03 | 0x13 | 0x23 | 0x33 => format!("INC {}", R16_SP_NAMES[((opcode >> 4) & 3) as usize]),
        0x0B | 0x1B | 0x2B | 0x3B => format!("DEC {}", R16_SP_NAMES[((opcode >> 4) & 3) as usize]),
        0x34 => "INC (HL)".to_string(),
        0x35 => "DEC (HL)".to_string(),
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x3C => {
            format!("INC {}", R8_NAMES[((opcode >> 3) & 7) as usize])
        }
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x3D => {
            format!("DEC {}", R8_NAMES[((opcode >> 3) & 7) as usize])
        }
        0x36 => {
            let d8 = read_next(1);
            bytes.push(d8);
            format!("LD (HL),${d8:02X}")
        }
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
            let d8 = read_next(1);
            bytes.push(d8);
            format!("LD {},${:02X}", R8_NAMES[((opcode >> 3) & 7) as usize], d8)
        }
        0x07 => "RLCA".to_string(),
        0x0F => "RRCA".to_string(),
        0x17 => "RLA".to_string(),
        0x1F => "RRA".to_string(),
        0x08 => {
            let lo = read_next(1);
            let hi = read_next(2);
            bytes.push(lo);
            bytes.push(hi);
            format!("LD (${hi:02X}{lo:02X}),SP")
        }
        0x09 | 0x19 | 0x29 | 0x39 => format!("ADD HL,{}", R16_SP_NAMES[((opcode >> 4) & 3) as usize]),
        0x18 => {
            let off = read_next(1) as i8;
            bytes.push(off as u8);
            format!("JR {off}")
        }
        0x20 | 0x28 | 0x30 | 0x38 => {
            let off = read_next(1) as i8;
            bytes.push(off as u8);
            format!("JR {},{off}", COND_NAMES[((opcode >> 3) & 3) as usize])
        }
        0x27 => "DAA".to_string(),
        0x2F => "CPL".to_string(),
        0x37 => "SCF".to_string(),
        0x3F => "CCF".to_string(),
        0x76 => "HALT".to_string(),
        0x40..=0x7F => {
            format!(
                "LD {},{}",
                R8_NAMES[((opcode >> 3) & 7) as usize],
                R8_NAMES[(opcode & 7) as usize]
            )
        }
        0x80..=0xBF => format!("{} {}", ALU_NAMES[((opcode >> 3) & 7) as usize], R8_NAMES[(opcode & 7) as usize]),
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
            let d8 = read_next(1);
            bytes.push(d8);
            format!("{} ${:02X}", ALU_NAMES[((opcode >> 3) & 7) as usize], d8)
        }
        0xC0 | 0xC8 | 0xD0 | 0xD8 => format!("RET {}", COND_NAMES[((opcode >> 3) & 3) as usize]),
        0xC9 => "RET".to_string(),
        0xD9 => "RETI".to_string(),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => format!("POP {}", R16_AF_NAMES[((opcode >> 4) & 3) as usize]),
        0xC5 | 0xD5 | 0xE5 | 0xF5 => format!("PUSH {}", R16_AF_NAMES[((opcode >> 4) & 3) as usize]),
        0xC2 | 0xCA | 0xD2 | 0xDA => {
            let lo = read_next(1);
            let hi = read_next(2);
            bytes.push(lo);
            bytes.push(hi);
            format!("JP {},${hi:02X}{lo:02X}", COND_NAMES[((opcode >> 3) & 3) as usize])
        }
        0xC3 => {
            let lo = read_next(1);
            let hi = read_next(2);
            bytes.push(lo);
            bytes.push(hi);
            format!("JP ${hi:02X}{lo:02X}")
        }
        0xE9 => "JP (HL)".to_string(),
        0xC4 | 0xCC | 0xD4 | 0xDC => {
            let lo = read_next(1);
            let hi = read_next(2);
            bytes.push(lo);
            bytes.push(hi);
            format!("CALL {},${hi:02X}{lo:02X}", COND_NAMES[((opcode >> 3) & 3) as usize])
        }
        0xCD => {
            let lo = read_next(1);
            let hi = read_next(2);
            bytes.push(lo);
            bytes.push(hi);
            format!("CALL ${hi:02X}{lo:02X}")
        }
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            format!("RST ${:02X}", opcode & 0b0011_1000)
        }
        0xCB => {
            let cb_opcode = read_next(1);
            bytes.push(cb_opcode);
            disassemble_cb(cb_opcode)
        }
        0xE0 => {
            let off = read_next(1);
            bytes.push(off);
            format!("LDH (${off:02X}),A")
        }
        0xF0 => {
            let off = read_next(1);
            bytes.push(off);
            format!("LDH A,(${off:02X})")
        }
        0xE2 => "LD (C),A".to_string(),
        0xF2 => "LD A,(C)".to_string(),
        0xE8 => {
            let off = read_next(1) as i8;
            bytes.push(off as u8);
            format!("ADD SP,{off}")
        }
        0xF8 => {
            let off = read_next(1) as i8;
            bytes.push(off as u8);
            format!("LD HL,SP{off:+}")
        }
        0xF9 => "LD SP,HL".to_string(),
        0xEA => {
            let lo = read_next(1);
            let hi = read_next(2);
            bytes.push(lo);
            bytes.push(hi);
            format!("LD (${hi:02X}{lo:02X}),A")
        }
        0xFA => {
            let lo = read_next(1);
            let hi = read_next(2);
            bytes.push(lo);
            bytes.push(hi);
            format!("LD A,(${hi:02X}{lo:02X})")
        }
        0x10 => {
            let d8 = read_next(1);
            bytes.push(d8);
            "STOP".to_string()
        }
        0xF3 => "DI".to_string(),
        0xFB => "EI".to_string(),
        0xD3 | 0xDB | 0xDD | 0xE3 | 0xE4 | 0xEB | 0xEC | 0xED | 0xF4 | 0xFC | 0xFD => {
            format!("DB ${opcode:02X} ; unimplemented")
        }
    };

    DisassembledInstruction {
        address: pc,
        bytes,
        mnemonic,
    }
}

fn disassemble_cb(opcode: u8) -> String {
    let group = opcode >> 6;
    let idx = (opcode & 7) as usize;
    let bit = (opcode >> 3) & 7;
    match group {
        0 => format!("{} {}", CB_ROT_NAMES[((opcode >> 3) & 7) as usize], R8_NAMES[idx]),
        1 => format!("BIT {},{}", bit, R8_NAMES[idx]),
        2 => format!("RES {},{}", bit, R8_NAMES[idx]),
        3 => format!("SET {},{}", bit, R8_NAMES[idx]),
        _ => unreachable!("2-bit group field"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus_with(bytes: &[u8]) -> Bus {
        let mut rom = vec![0u8; 0x8000];
        rom[0x100..0x100 + bytes.len()].copy_from_slice(bytes);
        Bus::new(rom)
    }

    #[test]
    fn disassembles_nop_jp() {
        let bus = bus_with(&[0x00, 0xC3, 0x50, 0x01]);
        let nop = disassemble(&bus, 0x100);
        assert_eq!(nop.mnemonic, "NOP");
        assert_eq!(nop.len(), 1);

        let jp = disassemble(&bus, 0x101);
        assert_eq!(jp.mnemonic, "JP $0150");
        assert_eq!(jp.len(), 3);
    }

    #[test]
    fn does_not_mutate_bus() {
        let bus = bus_with(&[0x3E, 0x42]);
        let before = bus.read(0x100);
        let _ = disassemble(&bus, 0x100);
        assert_eq!(bus.read(0x100), before);
    }

    #[test]
    fn disassembles_cb_prefixed() {
        let bus = bus_with(&[0xCB, 0x00]);
        let instr = disassemble(&bus, 0x100);
        assert_eq!(instr.mnemonic, "RLC B");
        assert_eq!(instr.len(), 2);
    }
}
