//! DIV/TIMA/TMA/TAC, advanced by elapsed M-cycles (converted to
//! T-cycles internally, since DIV and TIMA tick at T-cycle-derived
//! frequencies).

use crate::interrupt::{self, Interrupt};
use crate::memory::{Bus, DIV, TAC, TIMA, TMA};

/// T-cycles per TIMA increment for TAC's low two bits: 00, 01, 10, 11.
const TIMA_PERIODS: [u32; 4] = [1024, 16, 64, 256];

#[derive(Debug, Default)]
pub struct Timer {
    div_prescaler: u32,
    tima_prescaler: u32,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.div_prescaler = 0;
        self.tima_prescaler = 0;
    }

    /// Zeros DIV and the internal prescaler. Called when the bus
    /// reports a write to 0xFF04.
    pub fn reset_div(&mut self, bus: &mut Bus) {
        self.div_prescaler = 0;
        bus.set_io_byte(DIV, 0);
    }

    /// Advances the timer by `m_cycles` executed M-cycles.
    pub fn tick(&mut self, bus: &mut Bus, m_cycles: u8) {
        let t_cycles = m_cycles as u32 * 4;

        self.div_prescaler += t_cycles;
        while self.div_prescaler >= 256 {
            self.div_prescaler -= 256;
            let div = bus.io_byte(DIV);
            bus.set_io_byte(DIV, div.wrapping_add(1));
        }

        let tac = bus.io_byte(TAC);
        if tac & 0b100 == 0 {
            return;
        }

        let period = TIMA_PERIODS[(tac & 0b11) as usize];
        self.tima_prescaler += t_cycles;
        while self.tima_prescaler >= period {
            self.tima_prescaler -= period;
            let tima = bus.io_byte(TIMA);
            let (next, overflowed) = tima.overflowing_add(1);
            if overflowed {
                let tma = bus.io_byte(TMA);
                bus.set_io_byte(TIMA, tma);
                log::trace!("TIMA overflow, reloading from TMA={tma:#04x}");
                interrupt::request(bus, Interrupt::Timer);
            } else {
                bus.set_io_byte(TIMA, next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus() -> Bus {
        Bus::new(vec![0u8; 0x8000])
    }

    #[test]
    fn div_increments_every_256_t_cycles() {
        let mut bus = bus();
        let mut timer = Timer::new();
        // 64 M-cycles * 4 = 256 T-cycles.
        timer.tick(&mut bus, 64);
        assert_eq!(bus.io_byte(DIV), 1);
    }

    #[test]
    fn tima_overflow_reloads_from_tma_and_requests_interrupt() {
        let mut bus = bus();
        let mut timer = Timer::new();
        bus.set_io_byte(TAC, 0x05); // enabled, 262144 Hz -> period 16 T-cycles
        bus.set_io_byte(TIMA, 0xFF);
        bus.set_io_byte(TMA, 0x42);

        // 4 M-cycles = 16 T-cycles = exactly one TIMA period.
        timer.tick(&mut bus, 4);

        assert_eq!(bus.io_byte(TIMA), 0x42);
        assert_eq!(bus.if_flag() & 0b100, 0b100);
    }

    #[test]
    fn disabled_timer_does_not_advance_tima() {
        let mut bus = bus();
        let mut timer = Timer::new();
        bus.set_io_byte(TAC, 0x01); // disabled (bit 2 clear)
        timer.tick(&mut bus, 100);
        assert_eq!(bus.io_byte(TIMA), 0);
    }

    #[test]
    fn div_write_resets_prescaler_and_register() {
        let mut bus = bus();
        let mut timer = Timer::new();
        timer.tick(&mut bus, 32); // 128 T-cycles, not yet an increment
        timer.reset_div(&mut bus);
        assert_eq!(bus.io_byte(DIV), 0);
        timer.tick(&mut bus, 32);
        assert_eq!(bus.io_byte(DIV), 0); // prescaler also reset, so no increment yet
    }
}
