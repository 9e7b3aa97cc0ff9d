//! The top-level machine: wires the CPU, bus, timer, DMA engine, and
//! interrupt controller together into the step loop of §4.7.

use std::path::Path;

use crate::cartridge::{Cartridge, CartridgeHeader};
use crate::cpu::disasm::{self, DisassembledInstruction};
use crate::cpu::Cpu;
use crate::dma::Dma;
use crate::error::CoreError;
use crate::interrupt;
use crate::memory::{Bus, BusEvent, SB, SC};
use crate::timer::Timer;

pub struct Machine {
    pub cpu: Cpu,
    pub bus: Bus,
    timer: Timer,
    dma: Dma,
    header: CartridgeHeader,
    serial_log: String,
    total_t_cycles: u64,
}

impl Machine {
    /// Builds a machine around `rom`, already reset to post-boot state.
    pub fn new(rom: Vec<u8>) -> Result<Self, CoreError> {
        let cartridge = Cartridge::from_bytes(rom)?;
        Ok(Self::from_cartridge(cartridge))
    }

    pub fn load_rom(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let cartridge = Cartridge::from_file(path)?;
        Ok(Self::from_cartridge(cartridge))
    }

    fn from_cartridge(cartridge: Cartridge) -> Self {
        let mut bus = Bus::new(cartridge.rom);
        bus.reset(&cartridge.header);
        let mut cpu = Cpu::new();
        cpu.reset(&cartridge.header);

        Machine {
            cpu,
            bus,
            timer: Timer::new(),
            dma: Dma::new(),
            header: cartridge.header,
            serial_log: String::new(),
            total_t_cycles: 0,
        }
    }

    /// Re-applies the post-boot reset to CPU and bus state without
    /// reloading the ROM image.
    pub fn reset(&mut self) {
        self.bus.reset(&self.header);
        self.cpu.reset(&self.header);
        self.timer.reset();
        self.serial_log.clear();
        self.total_t_cycles = 0;
    }

    /// Runs one machine step per §4.7: halted short-circuit, else
    /// fetch-execute; tick timer; tick DMA; service interrupts; serial
    /// stub check. Returns the total T-cycle cost of the step,
    /// including any interrupt dispatch.
    pub fn step(&mut self) -> Result<u8, CoreError> {
        let t_cycles = if self.cpu.halted {
            self.cpu.apply_ei_latch();
            if interrupt::pending(&self.bus) {
                self.cpu.halted = false;
            }
            4
        } else {
            let cycles = self.cpu.step(&mut self.bus).map_err(|err| {
                log::error!("{err}");
                err
            })?;
            if let Some(event) = self.bus.take_event() {
                match event {
                    BusEvent::DivReset => self.timer.reset_div(&mut self.bus),
                    BusEvent::DmaStart(page) => self.dma.start(page),
                    // Observational only: `check_serial` below still owns
                    // the actual serial log accumulation and SC clear.
                    BusEvent::Serial(byte) => log::trace!("serial byte requested: {byte:#04x}"),
                }
            }
            cycles
        };

        let m_cycles = t_cycles / 4;
        self.timer.tick(&mut self.bus, m_cycles);
        self.dma.tick(&mut self.bus, m_cycles);

        let interrupt_cycles = interrupt::service(&mut self.cpu, &mut self.bus);
        let total = t_cycles + interrupt_cycles * 4;
        self.total_t_cycles += total as u64;

        self.check_serial();

        Ok(total)
    }

    fn check_serial(&mut self) {
        if self.bus.io_byte(SC) == 0x81 {
            let byte = self.bus.io_byte(SB);
            self.serial_log.push(byte as char);
            self.bus.set_io_byte(SC, 0);
        }
    }

    pub fn serial_log(&self) -> &str {
        &self.serial_log
    }

    pub fn total_t_cycles(&self) -> u64 {
        self.total_t_cycles
    }

    pub fn disassemble_at(&self, pc: u16) -> DisassembledInstruction {
        disasm::disassemble(&self.bus, pc)
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    /// Starts the OAM DMA engine directly, bypassing instruction
    /// execution. Useful for tests and debugger-driven stepping that
    /// want to exercise the transfer without writing through a `LD`.
    pub fn start_dma(&mut self, source_page: u8) {
        self.dma.start(source_page);
    }
}
