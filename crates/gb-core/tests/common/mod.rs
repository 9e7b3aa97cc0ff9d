use gb_core::Machine;

pub fn minimal_rom() -> Vec<u8> {
    let mut rom = vec![0x00u8; 0x8000];
    for (i, b) in b"GBCORE_TEST".iter().enumerate() {
        rom[0x134 + i] = *b;
    }
    rom[0x147] = 0x00;
    rom[0x14D] = 0xE7;
    rom
}

pub fn machine_with_program(bytes: &[u8]) -> Machine {
    let mut rom = minimal_rom();
    rom[0x100..0x100 + bytes.len()].copy_from_slice(bytes);
    Machine::new(rom).expect("minimal ROM is valid")
}

/// A bare machine whose PC has been redirected into WRAM, so a test
/// can poke arbitrary opcode bytes for a single `step()` without
/// re-building a cartridge image each time.
pub fn machine_executing_at_wram() -> Machine {
    let mut machine = Machine::new(minimal_rom()).expect("minimal ROM is valid");
    machine.cpu.regs.pc = 0xC000;
    machine
}

/// Writes `bytes` at the current PC (assumed to be in WRAM) and runs
/// one CPU step directly, returning the T-cycle cost.
pub fn exec(machine: &mut Machine, bytes: &[u8]) -> u8 {
    let pc = machine.cpu.regs.pc;
    for (i, &b) in bytes.iter().enumerate() {
        machine.bus.write(pc.wrapping_add(i as u16), b);
    }
    machine.cpu.step(&mut machine.bus).expect("no undefined opcodes in these tests")
}
