mod common;

use common::{exec, machine_executing_at_wram};
use proptest::prelude::*;

fn bcd_byte(tens: u8, ones: u8) -> u8 {
    (tens << 4) | ones
}

proptest! {
    #[test]
    fn push_pop_bc_de_roundtrip(value in any::<u16>()) {
        let mut machine = machine_executing_at_wram();
        let lo = (value & 0xFF) as u8;
        let hi = (value >> 8) as u8;
        exec(&mut machine, &[0x01, lo, hi]); // LD BC,d16
        let sp_before = machine.cpu.regs.sp;
        exec(&mut machine, &[0xC5]); // PUSH BC
        exec(&mut machine, &[0xD1]); // POP DE
        prop_assert_eq!(machine.cpu.regs.de(), value);
        prop_assert_eq!(machine.cpu.regs.sp, sp_before);
    }

    #[test]
    fn push_pop_af_masks_low_nibble_of_f(value in any::<u16>()) {
        let mut machine = machine_executing_at_wram();
        let lo = (value & 0xFF) as u8;
        let hi = (value >> 8) as u8;
        exec(&mut machine, &[0x21, lo, hi]); // LD HL,d16 (stand-in source for AF)
        exec(&mut machine, &[0xE5]); // PUSH HL
        exec(&mut machine, &[0xF1]); // POP AF
        prop_assert_eq!(machine.cpu.regs.f & 0x0F, 0);
        prop_assert_eq!(machine.cpu.regs.af(), value & 0xFFF0);
    }

    #[test]
    fn ld_r_r_prime_round_trips_the_byte(n in any::<u8>()) {
        let mut machine = machine_executing_at_wram();
        exec(&mut machine, &[0x06, n]); // LD B,n
        exec(&mut machine, &[0x48]); // LD C,B
        exec(&mut machine, &[0x06, 0x00]); // clobber B
        exec(&mut machine, &[0x41]); // LD B,C
        prop_assert_eq!(machine.cpu.regs.b, n);
    }

    #[test]
    fn cpl_twice_is_identity(n in any::<u8>()) {
        let mut machine = machine_executing_at_wram();
        exec(&mut machine, &[0x3E, n]); // LD A,n
        exec(&mut machine, &[0x2F]); // CPL
        exec(&mut machine, &[0x2F]); // CPL
        prop_assert_eq!(machine.cpu.regs.a, n);
    }

    #[test]
    fn swap_twice_is_identity(n in any::<u8>()) {
        let mut machine = machine_executing_at_wram();
        exec(&mut machine, &[0x3E, n]); // LD A,n
        exec(&mut machine, &[0xCB, 0x37]); // SWAP A
        exec(&mut machine, &[0xCB, 0x37]); // SWAP A
        prop_assert_eq!(machine.cpu.regs.a, n);
    }

    #[test]
    fn sub_then_add_back_is_identity(x in any::<u8>(), y in any::<u8>()) {
        let mut machine = machine_executing_at_wram();
        exec(&mut machine, &[0x3E, x]); // LD A,x
        exec(&mut machine, &[0xD6, y]); // SUB y
        let after_sub = machine.cpu.regs.a;
        exec(&mut machine, &[0xC6, y]); // ADD y
        prop_assert_eq!(machine.cpu.regs.a, x);
        prop_assert_eq!(after_sub.wrapping_add(y), x);
    }

    #[test]
    fn dec_then_inc_is_identity(x in any::<u8>()) {
        let mut machine = machine_executing_at_wram();
        exec(&mut machine, &[0x3E, x]); // LD A,x
        exec(&mut machine, &[0x3D]); // DEC A
        exec(&mut machine, &[0x3C]); // INC A
        prop_assert_eq!(machine.cpu.regs.a, x);
    }

    #[test]
    fn daa_corrects_bcd_addition(x_tens in 0u8..10, x_ones in 0u8..10, y_tens in 0u8..10, y_ones in 0u8..10) {
        let x = bcd_byte(x_tens, x_ones);
        let y = bcd_byte(y_tens, y_ones);
        let decimal_sum = (x_tens as u16 * 10 + x_ones as u16) + (y_tens as u16 * 10 + y_ones as u16);

        let mut machine = machine_executing_at_wram();
        exec(&mut machine, &[0x3E, x]); // LD A,x
        exec(&mut machine, &[0x06, y]); // LD B,y
        exec(&mut machine, &[0x80]); // ADD A,B
        exec(&mut machine, &[0x27]); // DAA

        let expected_digits = decimal_sum % 100;
        let expected = bcd_byte((expected_digits / 10) as u8, (expected_digits % 10) as u8);
        prop_assert_eq!(machine.cpu.regs.a, expected);
        prop_assert_eq!(machine.cpu.regs.flag_c(), decimal_sum >= 100);
    }
}
