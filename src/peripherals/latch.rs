//! Plain register latch.
//!
//! Stands in for chips whose registers only need to hold what was written:
//! the video shifter and the DMA controller.

use crate::constants::{DMA_BASE, DMA_SIZE, SHIFTER_BASE, SHIFTER_SIZE};
use crate::cycles::DeviceCycle;
use crate::device::{Device, DeviceDescriptor, Signals};

/// Byte-addressed register window with power-on presets.
#[derive(Debug, Clone)]
pub struct Latch {
    descriptor: DeviceDescriptor,
    data: Vec<u8>,
    presets: &'static [(u32, u8)],
}

impl Latch {
    /// Create a latch over `[bus_address, bus_address + bus_size)`.
    pub fn new(
        name: &'static str,
        bus_address: u32,
        bus_size: u32,
        presets: &'static [(u32, u8)],
    ) -> Self {
        let mut latch = Self {
            descriptor: DeviceDescriptor {
                name,
                frequency: 0,
                bus_address,
                bus_size,
            },
            data: vec![0; bus_size as usize],
            presets,
        };
        latch.load_presets();
        latch
    }

    /// Video shifter: PAL sync mode, low resolution.
    pub fn shifter() -> Self {
        Self::new("shifter", SHIFTER_BASE, SHIFTER_SIZE, &[(0x0A, 0x02), (0x60, 0x00)])
    }

    /// DMA / floppy controller.
    pub fn dma() -> Self {
        Self::new("dma", DMA_BASE, DMA_SIZE, &[])
    }

    /// Latched byte at `offset`.
    pub fn get(&self, offset: u32) -> u8 {
        self.data.get(offset as usize).copied().unwrap_or(0)
    }

    fn load_presets(&mut self) {
        self.data.fill(0);
        for &(offset, value) in self.presets {
            if let Some(byte) = self.data.get_mut(offset as usize) {
                *byte = value;
            }
        }
    }
}

impl Device for Latch {
    fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    fn reset(&mut self, _signals: &mut Signals) {
        self.load_presets();
    }

    fn read_u8(&mut self, _cycle: DeviceCycle, offset: u32, _signals: &mut Signals) -> u8 {
        self.get(offset)
    }

    fn write_u8(&mut self, _cycle: DeviceCycle, offset: u32, value: u8, _signals: &mut Signals) {
        if let Some(byte) = self.data.get_mut(offset as usize) {
            *byte = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shifter_powers_up_in_pal() {
        let shifter = Latch::shifter();
        assert_eq!(shifter.get(0x0A), 0x02);
        assert_eq!(shifter.get(0x60), 0x00);
    }

    #[test]
    fn test_reset_restores_presets() {
        let mut shifter = Latch::shifter();
        let mut s = Signals::default();
        shifter.write_u8(0, 0x0A, 0x00, &mut s);
        shifter.write_u8(0, 0x40, 0x77, &mut s);
        shifter.reset(&mut s);
        assert_eq!(shifter.get(0x0A), 0x02);
        assert_eq!(shifter.get(0x40), 0x00);
    }
}
