//! YM2149 register port.
//!
//! The PSG is reached through two ports that mirror every four bytes across
//! the window: writes to `0xFF8800` select a register, writes to `0xFF8802`
//! store into it. Reading the select port returns the selected register.
//! Sound synthesis is not modelled; the register file is what a replayer
//! samples.

use log::trace;

use crate::constants::{PSG_BASE, PSG_FREQUENCY, PSG_SIZE};
use crate::cycles::DeviceCycle;
use crate::device::{Device, DeviceDescriptor, Signals};

/// Number of PSG registers.
pub const PSG_REGISTERS: usize = 16;

// Unused bits of each register read back as 0.
const REG_MASK: [u8; PSG_REGISTERS] = [
    0xFF, 0x0F, 0xFF, 0x0F, 0xFF, 0x0F, // tone periods
    0x1F, 0xFF, // noise period, mixer
    0x1F, 0x1F, 0x1F, // amplitudes
    0xFF, 0xFF, 0x0F, // envelope period, shape
    0xFF, 0xFF, // I/O ports
];

/// YM2149 register file behind the ST's select / data ports.
#[derive(Debug, Clone)]
pub struct Psg {
    descriptor: DeviceDescriptor,
    registers: [u8; PSG_REGISTERS],
    selected: u8,
    writes: u64,
}

impl Psg {
    /// Create the PSG.
    pub fn new() -> Self {
        Self {
            descriptor: DeviceDescriptor {
                name: "psg",
                frequency: PSG_FREQUENCY,
                bus_address: PSG_BASE,
                bus_size: PSG_SIZE,
            },
            registers: [0; PSG_REGISTERS],
            selected: 0,
            writes: 0,
        }
    }

    /// Register file.
    pub fn registers(&self) -> &[u8; PSG_REGISTERS] {
        &self.registers
    }

    /// Currently selected register.
    pub fn selected(&self) -> u8 {
        self.selected
    }

    /// Data port writes since reset.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    fn write_port(&mut self, cycle: DeviceCycle, offset: u32, value: u8) {
        if offset & 2 == 0 {
            self.selected = value;
            return;
        }
        // Register numbers above 15 deselect the chip.
        let Some(slot) = self.registers.get_mut(usize::from(self.selected)) else {
            return;
        };
        *slot = value & REG_MASK[usize::from(self.selected)];
        self.writes += 1;
        trace!("psg: @{} r{} <- {:02x}", cycle, self.selected, value);
    }
}

impl Default for Psg {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for Psg {
    fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    fn reset(&mut self, _signals: &mut Signals) {
        self.registers = [0; PSG_REGISTERS];
        self.selected = 0;
        self.writes = 0;
    }

    fn read_u8(&mut self, _cycle: DeviceCycle, offset: u32, _signals: &mut Signals) -> u8 {
        if offset & 2 != 0 {
            return 0xFF;
        }
        self.registers
            .get(usize::from(self.selected))
            .copied()
            .unwrap_or(0xFF)
    }

    fn write_u8(&mut self, cycle: DeviceCycle, offset: u32, value: u8, _signals: &mut Signals) {
        self.write_port(cycle, offset, value);
    }

    // The PSG sits on the upper data lines: a word write delivers its high byte.
    fn write_u16(&mut self, cycle: DeviceCycle, offset: u32, value: u16, _signals: &mut Signals) {
        self.write_port(cycle, offset, (value >> 8) as u8);
    }

    fn diagnostic_name(&self, offset: u32) -> Option<&'static str> {
        Some(if offset & 2 == 0 { "select" } else { "data" })
    }
}
