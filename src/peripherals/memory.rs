//! RAM, ROM and the bus-error responder.

use log::{debug, warn};

use crate::constants::{RAM_BASE, ROM_BASE, ROM_SIZE};
use crate::cycles::DeviceCycle;
use crate::device::{Access, BusFault, Device, DeviceDescriptor, Signals};

/// ST RAM, mapped from address 0.
#[derive(Debug, Clone)]
pub struct Ram {
    descriptor: DeviceDescriptor,
    data: Vec<u8>,
}

impl Ram {
    /// Create `size` bytes of zeroed RAM.
    pub fn new(size: u32) -> Self {
        Self {
            descriptor: DeviceDescriptor {
                name: "ram",
                frequency: 0,
                bus_address: RAM_BASE,
                bus_size: size,
            },
            data: vec![0; size as usize],
        }
    }

    /// RAM contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Copy `bytes` to `offset`. Returns false (and copies nothing) when the
    /// range does not fit.
    pub fn load(&mut self, offset: u32, bytes: &[u8]) -> bool {
        let start = offset as usize;
        match start
            .checked_add(bytes.len())
            .and_then(|end| self.data.get_mut(start..end))
        {
            Some(dst) => {
                dst.copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }
}

impl Device for Ram {
    fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    fn reset(&mut self, _signals: &mut Signals) {
        self.data.fill(0);
    }

    fn read_u8(&mut self, _cycle: DeviceCycle, offset: u32, _signals: &mut Signals) -> u8 {
        self.data.get(offset as usize).copied().unwrap_or(0)
    }

    fn read_u16(&mut self, _cycle: DeviceCycle, offset: u32, _signals: &mut Signals) -> u16 {
        let i = offset as usize;
        match self.data.get(i..i + 2) {
            Some(word) => u16::from_be_bytes([word[0], word[1]]),
            None => 0,
        }
    }

    fn write_u8(&mut self, _cycle: DeviceCycle, offset: u32, value: u8, _signals: &mut Signals) {
        if let Some(byte) = self.data.get_mut(offset as usize) {
            *byte = value;
        }
    }

    fn write_u16(&mut self, _cycle: DeviceCycle, offset: u32, value: u16, _signals: &mut Signals) {
        let i = offset as usize;
        if let Some(word) = self.data.get_mut(i..i + 2) {
            word.copy_from_slice(&value.to_be_bytes());
        }
    }
}

/// TOS ROM window. Without an image every byte reads 0.
#[derive(Debug, Clone)]
pub struct Rom {
    descriptor: DeviceDescriptor,
    image: Vec<u8>,
}

impl Rom {
    /// Create the ROM window from an optional image.
    pub fn new(mut image: Vec<u8>) -> Self {
        if image.len() > ROM_SIZE as usize {
            warn!(
                "rom: image of {} bytes truncated to {} bytes",
                image.len(),
                ROM_SIZE
            );
            image.truncate(ROM_SIZE as usize);
        }
        Self {
            descriptor: DeviceDescriptor {
                name: "rom",
                frequency: 0,
                bus_address: ROM_BASE,
                bus_size: ROM_SIZE,
            },
            image,
        }
    }

    /// Loaded image length.
    pub fn len(&self) -> usize {
        self.image.len()
    }

    /// Whether no image is loaded.
    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }
}

impl Device for Rom {
    fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    fn reset(&mut self, _signals: &mut Signals) {}

    fn read_u8(&mut self, _cycle: DeviceCycle, offset: u32, _signals: &mut Signals) -> u8 {
        self.image.get(offset as usize).copied().unwrap_or(0)
    }

    fn write_u8(&mut self, _cycle: DeviceCycle, offset: u32, value: u8, _signals: &mut Signals) {
        debug!(
            "rom: write {:02x} to 0x{:06X} ignored",
            value,
            ROM_BASE + offset
        );
    }

    fn write_u16(&mut self, _cycle: DeviceCycle, offset: u32, value: u16, _signals: &mut Signals) {
        debug!(
            "rom: write {:04x} to 0x{:06X} ignored",
            value,
            ROM_BASE + offset
        );
    }
}

/// Answers every access nobody else claims with a bus fault.
///
/// The bus hands it the full 24-bit address as the offset.
#[derive(Debug, Clone)]
pub struct BusErrorDevice {
    descriptor: DeviceDescriptor,
}

impl BusErrorDevice {
    /// Create the responder.
    pub fn new() -> Self {
        Self {
            descriptor: DeviceDescriptor::unmapped("bus error", 0),
        }
    }
}

impl Default for BusErrorDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for BusErrorDevice {
    fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    fn reset(&mut self, _signals: &mut Signals) {}

    fn read_u8(&mut self, _cycle: DeviceCycle, offset: u32, signals: &mut Signals) -> u8 {
        signals.bus_fault(BusFault {
            address: offset,
            access: Access::ReadByte,
        });
        0xFF
    }

    fn read_u16(&mut self, _cycle: DeviceCycle, offset: u32, signals: &mut Signals) -> u16 {
        signals.bus_fault(BusFault {
            address: offset,
            access: Access::ReadWord,
        });
        0xFFFF
    }

    fn write_u8(&mut self, _cycle: DeviceCycle, offset: u32, _value: u8, signals: &mut Signals) {
        signals.bus_fault(BusFault {
            address: offset,
            access: Access::WriteByte,
        });
    }

    fn write_u16(&mut self, _cycle: DeviceCycle, offset: u32, _value: u16, signals: &mut Signals) {
        signals.bus_fault(BusFault {
            address: offset,
            access: Access::WriteWord,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ram_is_big_endian() {
        let mut ram = Ram::new(0x100);
        let mut s = Signals::default();
        ram.write_u16(0, 0x10, 0x1234, &mut s);
        assert_eq!(ram.read_u8(0, 0x10, &mut s), 0x12);
        assert_eq!(ram.read_u8(0, 0x11, &mut s), 0x34);
        assert_eq!(ram.read_u16(0, 0x10, &mut s), 0x1234);
    }

    #[test]
    fn test_ram_load_bounds() {
        let mut ram = Ram::new(0x100);
        assert!(ram.load(0xFC, &[1, 2, 3, 4]));
        assert!(!ram.load(0xFD, &[1, 2, 3, 4]));
        assert_eq!(&ram.as_slice()[0xFC..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_rom_ignores_writes() {
        let mut rom = Rom::new(vec![0x60, 0x2E]);
        let mut s = Signals::default();
        rom.write_u8(0, 0, 0xFF, &mut s);
        assert_eq!(rom.read_u16(0, 0, &mut s), 0x602E);
        assert_eq!(rom.read_u8(0, 0x100, &mut s), 0);
    }

    #[test]
    fn test_bus_error_device_faults_every_access() {
        let mut dev = BusErrorDevice::new();
        let mut s = Signals::default();
        dev.write_u16(0, 0xFF8A00, 0, &mut s);
        assert_eq!(
            s.fault(),
            Some(BusFault {
                address: 0xFF8A00,
                access: Access::WriteWord
            })
        );
    }
}
