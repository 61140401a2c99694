//! Device Contract
//!
//! Every chip on the bus is reached only through [`Device`]. A chip sees the
//! rest of the machine through a [`Signals`] collector: it can ask to be woken
//! at a future cycle of its own clock, raise or drop an interrupt level on the
//! glue chip, or report a bus fault. The bus applies the collected signals
//! once the handler has returned, so a handler can never re-enter the
//! scheduler.

use std::fmt;

use crate::cycles::DeviceCycle;

/// Static description of one chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Short identifying name, unique within the machine.
    pub name: &'static str,
    /// Native clock in Hz; 0 when the chip only reacts to bus accesses.
    pub frequency: u32,
    /// First bus address of the register window.
    pub bus_address: u32,
    /// Window size in bytes; 0 when the chip is not bus-mapped.
    pub bus_size: u32,
}

impl DeviceDescriptor {
    /// A chip without a bus window.
    pub const fn unmapped(name: &'static str, frequency: u32) -> Self {
        Self {
            name,
            frequency,
            bus_address: 0,
            bus_size: 0,
        }
    }

    /// Whether `address` falls inside this chip's window.
    pub fn contains(&self, address: u32) -> bool {
        self.bus_size != 0
            && address >= self.bus_address
            && address - self.bus_address < self.bus_size
    }

    /// Whether the chip has its own clock (and may therefore request events).
    pub fn is_clocked(&self) -> bool {
        self.frequency != 0
    }
}

/// Kind of bus cycle, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Byte read
    ReadByte,
    /// Word read
    ReadWord,
    /// Byte write
    WriteByte,
    /// Word write
    WriteWord,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReadByte => "byte read",
            Self::ReadWord => "word read",
            Self::WriteByte => "byte write",
            Self::WriteWord => "word write",
        })
    }
}

/// An access nobody answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault {
    /// 24-bit bus address
    pub address: u32,
    /// What the processor tried to do
    pub access: Access,
}

/// Side effects requested by a device handler.
#[derive(Debug, Default)]
pub struct Signals {
    event: Option<DeviceCycle>,
    irq: [Option<bool>; 8],
    fault: Option<BusFault>,
}

impl Signals {
    /// Ask to be woken at `cycle` (device domain). The soonest request wins.
    pub fn request_event(&mut self, cycle: DeviceCycle) {
        self.event = Some(self.event.map_or(cycle, |pending| pending.min(cycle)));
    }

    /// Raise interrupt `level` (1-7) on the glue chip.
    pub fn set_irq(&mut self, level: u8) {
        self.irq[usize::from(level & 7)] = Some(true);
    }

    /// Drop interrupt `level` (1-7) on the glue chip.
    pub fn clear_irq(&mut self, level: u8) {
        self.irq[usize::from(level & 7)] = Some(false);
    }

    /// Report an unanswered bus cycle.
    pub fn bus_fault(&mut self, fault: BusFault) {
        self.fault.get_or_insert(fault);
    }

    pub(crate) fn event(&self) -> Option<DeviceCycle> {
        self.event
    }

    /// Level changes in ascending level order; the last request per level wins.
    pub(crate) fn irq_changes(&self) -> impl Iterator<Item = (u8, bool)> + '_ {
        self.irq
            .iter()
            .enumerate()
            .filter_map(|(level, state)| state.map(|raised| (level as u8, raised)))
    }

    pub(crate) fn fault(&self) -> Option<BusFault> {
        self.fault
    }
}

/// The capability table every bus chip provides.
///
/// Offsets are relative to the start of the chip's window; `cycle` is the
/// current time converted into the chip's own clock domain (always 0 for an
/// unclocked chip).
pub trait Device {
    /// The chip's descriptor.
    fn descriptor(&self) -> &DeviceDescriptor;

    /// Return to power-on state. A chip may arm its first event here; the
    /// machine is at cycle 0.
    fn reset(&mut self, signals: &mut Signals);

    /// Handle a previously requested event.
    fn event(&mut self, cycle: DeviceCycle, signals: &mut Signals) {
        let _ = (cycle, signals);
    }

    /// Byte read.
    fn read_u8(&mut self, cycle: DeviceCycle, offset: u32, signals: &mut Signals) -> u8;

    /// Word read, big-endian. Defaults to two byte reads.
    fn read_u16(&mut self, cycle: DeviceCycle, offset: u32, signals: &mut Signals) -> u16 {
        let hi = self.read_u8(cycle, offset, signals);
        let lo = self.read_u8(cycle, offset.wrapping_add(1), signals);
        u16::from_be_bytes([hi, lo])
    }

    /// Byte write.
    fn write_u8(&mut self, cycle: DeviceCycle, offset: u32, value: u8, signals: &mut Signals);

    /// Word write, big-endian. Defaults to two byte writes.
    fn write_u16(&mut self, cycle: DeviceCycle, offset: u32, value: u16, signals: &mut Signals) {
        let [hi, lo] = value.to_be_bytes();
        self.write_u8(cycle, offset, hi, signals);
        self.write_u8(cycle, offset.wrapping_add(1), lo, signals);
    }

    /// Register name at `offset`, for traces.
    fn diagnostic_name(&self, offset: u32) -> Option<&'static str> {
        let _ = offset;
        None
    }
}

/// Fixed registry order of the machine's chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceId {
    /// 68000 processor
    Cpu,
    /// ST RAM
    Ram,
    /// TOS ROM
    Rom,
    /// Interrupt aggregator and video timing
    Glue,
    /// MFP 68901
    Mfp,
    /// YM2149 sound generator
    Psg,
    /// DMA / floppy controller
    Dma,
    /// Video shifter
    Shifter,
}

impl DeviceId {
    /// Number of registry entries.
    pub const COUNT: usize = 8;

    /// Every chip, in registry order.
    pub const ALL: [DeviceId; Self::COUNT] = [
        DeviceId::Cpu,
        DeviceId::Ram,
        DeviceId::Rom,
        DeviceId::Glue,
        DeviceId::Mfp,
        DeviceId::Psg,
        DeviceId::Dma,
        DeviceId::Shifter,
    ];

    /// Slot index.
    pub const fn index(self) -> usize {
        self as usize
    }
}
