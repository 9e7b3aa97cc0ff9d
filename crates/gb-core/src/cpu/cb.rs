//! The CB-prefixed opcode table: four groups of 64 entries, indexed by
//! `(opcode >> 6)` for the group and `opcode & 7` for the target
//! operand (B, C, D, E, H, L, (HL), A).

use super::registers::{Reg, Registers};
use crate::memory::Bus;

const TARGET_ORDER: [Reg; 8] = [Reg::B, Reg::C, Reg::D, Reg::E, Reg::H, Reg::L, Reg::HL, Reg::A];

fn read_target(regs: &Registers, bus: &Bus, idx: u8) -> u8 {
    let reg = TARGET_ORDER[idx as usize];
    if reg == Reg::HL {
        bus.read(regs.hl())
    } else {
        regs.read(reg) as u8
    }
}

fn write_target(regs: &mut Registers, bus: &mut Bus, idx: u8, v: u8) {
    let reg = TARGET_ORDER[idx as usize];
    if reg == Reg::HL {
        bus.write(regs.hl(), v);
    } else {
        regs.write(reg, v as u16);
    }
}

/// Runs the shift/rotate ops of the first 64-entry group. All of these
/// set Z from the result (unlike the non-prefixed RLCA/RRCA/RLA/RRA).
fn rotate_shift(regs: &mut Registers, op: u8, v: u8) -> u8 {
    let (result, carry) = match op {
        0 => (v.rotate_left(1), v & 0x80 != 0), // RLC
        1 => (v.rotate_right(1), v & 0x01 != 0), // RRC
        2 => {
            // RL
            let carry_in = regs.flag_c() as u8;
            ((v << 1) | carry_in, v & 0x80 != 0)
        }
        3 => {
            // RR
            let carry_in = regs.flag_c() as u8;
            ((v >> 1) | (carry_in << 7), v & 0x01 != 0)
        }
        4 => (v << 1, v & 0x80 != 0),                  // SLA
        5 => ((v >> 1) | (v & 0x80), v & 0x01 != 0),   // SRA
        6 => (v.rotate_left(4), false),                // SWAP
        7 => (v >> 1, v & 0x01 != 0),                  // SRL
        _ => unreachable!("3-bit field"),
    };

    regs.set_flag_z(result == 0);
    regs.set_flag_n(false);
    regs.set_flag_h(false);
    if op == 6 {
        regs.set_flag_c(false); // SWAP clears carry
    } else {
        regs.set_flag_c(carry);
    }
    result
}

/// Executes one CB-prefixed opcode. Returns its M-cycle cost (not
/// including the 0xCB prefix fetch itself, which the caller charges).
pub fn execute(regs: &mut Registers, bus: &mut Bus, opcode: u8) -> u8 {
    let group = opcode >> 6;
    let idx = opcode & 7;
    let is_hl = idx == 6;

    match group {
        0 => {
            let op = (opcode >> 3) & 7;
            let v = read_target(regs, bus, idx);
            let result = rotate_shift(regs, op, v);
            write_target(regs, bus, idx, result);
            if is_hl {
                4
            } else {
                2
            }
        }
        1 => {
            // BIT n, x
            let bit = (opcode >> 3) & 7;
            let v = read_target(regs, bus, idx);
            regs.set_flag_z((v & (1 << bit)) == 0);
            regs.set_flag_n(false);
            regs.set_flag_h(true);
            if is_hl {
                3
            } else {
                2
            }
        }
        2 => {
            // RES n, x
            let bit = (opcode >> 3) & 7;
            let v = read_target(regs, bus, idx);
            write_target(regs, bus, idx, v & !(1 << bit));
            if is_hl {
                4
            } else {
                2
            }
        }
        3 => {
            // SET n, x
            let bit = (opcode >> 3) & 7;
            let v = read_target(regs, bus, idx);
            write_target(regs, bus, idx, v | (1 << bit));
            if is_hl {
                4
            } else {
                2
            }
        }
        _ => unreachable!("2-bit group field"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus() -> Bus {
        Bus::new(vec![0u8; 0x8000])
    }

    #[test]
    fn rlc_0x80_sets_z_for_result_zero_and_carry() {
        let mut regs = Registers::default();
        let mut bus = bus();
        regs.b = 0x80;
        // RLC B = 0x00
        let cycles = execute(&mut regs, &mut bus, 0x00);
        assert_eq!(regs.b, 0x01);
        assert!(!regs.flag_z());
        assert!(regs.flag_c());
        assert_eq!(cycles, 2);
    }

    #[test]
    fn rlc_0x00_sets_z() {
        let mut regs = Registers::default();
        let mut bus = bus();
        regs.b = 0x00;
        execute(&mut regs, &mut bus, 0x00);
        assert!(regs.flag_z());
        assert!(!regs.flag_c());
    }

    #[test]
    fn swap_round_trips() {
        let mut regs = Registers::default();
        let mut bus = bus();
        regs.a = 0x12;
        // SWAP A = opcode 0x37
        execute(&mut regs, &mut bus, 0x37);
        assert_eq!(regs.a, 0x21);
        execute(&mut regs, &mut bus, 0x37);
        assert_eq!(regs.a, 0x12);
    }

    #[test]
    fn bit_sets_z_when_clear_and_leaves_carry_untouched() {
        let mut regs = Registers::default();
        let mut bus = bus();
        regs.set_flag_c(true);
        regs.a = 0x00;
        // BIT 7, A = opcode 0x7F
        execute(&mut regs, &mut bus, 0x7F);
        assert!(regs.flag_z());
        assert!(regs.flag_h());
        assert!(regs.flag_c());
    }

    #[test]
    fn res_and_set_on_memory_operand_cost_four_cycles() {
        let mut regs = Registers::default();
        let mut bus = bus();
        regs.set_hl(0xC000);
        bus.write(0xC000, 0xFF);
        // RES 0, (HL) = opcode 0x86
        let cycles = execute(&mut regs, &mut bus, 0x86);
        assert_eq!(bus.read(0xC000), 0xFE);
        assert_eq!(cycles, 4);
        // SET 0, (HL) = opcode 0xC6
        execute(&mut regs, &mut bus, 0xC6);
        assert_eq!(bus.read(0xC000), 0xFF);
    }
}
