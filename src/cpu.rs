//! Processor seam.
//!
//! The 68000 core itself is supplied by the caller through [`Processor`].
//! During a run it sees the machine only through [`CpuBus`], which keeps the
//! processor's cycle counter and converts it into the machine domain for
//! every access.

use crate::bus::Bus;
use crate::constants::CPU_FREQUENCY;
use crate::cycles::{to_domain, DeviceCycle, MachineCycle};

/// Memory interface a processor core executes against.
pub trait CpuMemory {
    /// Read a byte from memory.
    fn get_byte(&mut self, addr: u32) -> u8;

    /// Read a 16-bit word from memory (big-endian).
    fn get_word(&mut self, addr: u32) -> u16;

    /// Write a byte to memory.
    fn set_byte(&mut self, addr: u32, value: u8);

    /// Write a 16-bit word to memory (big-endian).
    fn set_word(&mut self, addr: u32, value: u16);
}

/// A processor the scheduler can run.
pub trait Processor {
    /// Short identifying name.
    fn name(&self) -> &'static str {
        "cpu"
    }

    /// Native clock in Hz.
    fn frequency(&self) -> u32;

    /// Return to power-on state.
    fn reset(&mut self);

    /// Run from `cycle` for about `slice` cycles of the processor's clock.
    ///
    /// Returns the cycles actually consumed. A run may overshoot by the
    /// remainder of the instruction in flight, and should stop early once
    /// [`CpuBus::deadline`] has passed or [`CpuBus::faulted`] is set.
    ///
    /// The deadline is the last whole processor cycle before the next event.
    /// When the event is less than one processor cycle away the slice is still
    /// one cycle long, so a processor clocked slower than the machine can end
    /// up to one of its cycles past the event.
    fn run(&mut self, bus: &mut CpuBus<'_>, cycle: DeviceCycle, slice: DeviceCycle) -> DeviceCycle;
}

/// The machine as seen from a running processor.
pub struct CpuBus<'a> {
    bus: &'a mut Bus,
    frequency: u32,
    /// Machine cycle the run started at
    origin: MachineCycle,
    /// Processor cycle the run started at
    start: DeviceCycle,
    cycle: DeviceCycle,
}

impl<'a> CpuBus<'a> {
    pub(crate) fn new(
        bus: &'a mut Bus,
        frequency: u32,
        origin: MachineCycle,
        start: DeviceCycle,
    ) -> Self {
        Self {
            bus,
            frequency,
            origin,
            start,
            cycle: start,
        }
    }

    /// Processor cycle of the next access.
    pub fn cycle(&self) -> DeviceCycle {
        self.cycle
    }

    /// Advance the processor's clock.
    pub fn advance(&mut self, cycles: DeviceCycle) {
        self.cycle += cycles;
    }

    /// Move the processor's clock to `cycle`; never backwards.
    pub fn advance_to(&mut self, cycle: DeviceCycle) {
        self.cycle = self.cycle.max(cycle);
    }

    // Cycles are converted relative to the start of the run, the same way
    // the scheduler converts the cycles consumed.
    fn machine_cycle(&self) -> MachineCycle {
        self.origin + to_domain(self.bus.frequency(), self.frequency, self.cycle - self.start)
    }

    /// Processor cycle by which the run should yield: the last whole cycle
    /// before the deadline, but never before the first cycle of the run.
    pub fn deadline(&self) -> DeviceCycle {
        match self.bus.deadline() {
            MachineCycle::MAX => DeviceCycle::MAX,
            deadline => {
                let ahead = deadline.saturating_sub(self.origin);
                let ticks = to_domain(self.frequency, self.bus.frequency(), ahead);
                self.start + ticks.max(1)
            }
        }
    }

    /// Whether an access of this run went unanswered.
    pub fn faulted(&self) -> bool {
        self.bus.fault().is_some()
    }

    /// Interrupt level presented on the IPL lines.
    pub fn interrupt_level(&self) -> u8 {
        self.bus.interrupt_level()
    }

    /// Run an interrupt acknowledge cycle; returns the vector number.
    pub fn acknowledge_interrupt(&mut self, level: u8) -> u8 {
        let cycle = self.machine_cycle();
        self.bus.acknowledge_interrupt(cycle, level)
    }

    /// Long read as two words.
    pub fn get_long(&mut self, addr: u32) -> u32 {
        let cycle = self.machine_cycle();
        self.bus.read_u32(cycle, addr)
    }

    /// Long write as two words.
    pub fn set_long(&mut self, addr: u32, value: u32) {
        let cycle = self.machine_cycle();
        self.bus.write_u32(cycle, addr, value);
    }
}

impl CpuMemory for CpuBus<'_> {
    fn get_byte(&mut self, addr: u32) -> u8 {
        let cycle = self.machine_cycle();
        self.bus.read_u8(cycle, addr)
    }

    fn get_word(&mut self, addr: u32) -> u16 {
        let cycle = self.machine_cycle();
        self.bus.read_u16(cycle, addr)
    }

    fn set_byte(&mut self, addr: u32, value: u8) {
        let cycle = self.machine_cycle();
        self.bus.write_u8(cycle, addr, value);
    }

    fn set_word(&mut self, addr: u32, value: u16) {
        let cycle = self.machine_cycle();
        self.bus.write_u16(cycle, addr, value);
    }
}

/// Cycles of an interrupt acknowledge and exception entry, plus the `RTE`
/// of an empty handler.
pub const INTERRUPT_CYCLES: DeviceCycle = 44 + 20;

/// A 68000 parked in `STOP`, as during SNDH playback between interrupts.
///
/// Each interrupt above the mask is acknowledged and its (empty) handler
/// returns at once; the vectors taken are counted.
#[derive(Debug, Clone)]
pub struct IdleCpu {
    frequency: u32,
    mask: u8,
    acknowledged: [u64; 256],
}

impl IdleCpu {
    /// Idle processor at the ST's 8 MHz with interrupt mask 3, so that VBL
    /// and MFP interrupts are taken and HBL is not.
    pub fn new() -> Self {
        Self::with_frequency(CPU_FREQUENCY)
    }

    /// Idle processor at `frequency` Hz.
    pub fn with_frequency(frequency: u32) -> Self {
        Self {
            frequency,
            mask: 3,
            acknowledged: [0; 256],
        }
    }

    /// Set the SR interrupt mask (0-7).
    pub fn with_interrupt_mask(mut self, mask: u8) -> Self {
        self.mask = mask & 7;
        self
    }

    /// Times `vector` was taken since reset.
    pub fn acknowledged(&self, vector: u8) -> u64 {
        self.acknowledged[usize::from(vector)]
    }

    /// Interrupts taken since reset.
    pub fn total_acknowledged(&self) -> u64 {
        self.acknowledged.iter().sum()
    }
}

impl Default for IdleCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for IdleCpu {
    fn name(&self) -> &'static str {
        "idle 68000"
    }

    fn frequency(&self) -> u32 {
        self.frequency
    }

    fn reset(&mut self) {
        self.acknowledged = [0; 256];
    }

    fn run(&mut self, bus: &mut CpuBus<'_>, cycle: DeviceCycle, slice: DeviceCycle) -> DeviceCycle {
        let end = cycle + slice;
        bus.advance_to(cycle);
        loop {
            let stop = end.min(bus.deadline());
            if bus.cycle() >= stop || bus.faulted() {
                break;
            }
            // Level 7 is not maskable.
            let level = bus.interrupt_level();
            if level > self.mask || level == 7 {
                let vector = bus.acknowledge_interrupt(level);
                self.acknowledged[usize::from(vector)] += 1;
                bus.advance(INTERRUPT_CYCLES);
            } else {
                bus.advance_to(stop);
            }
        }
        bus.cycle() - cycle
    }
}
