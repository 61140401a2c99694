//! Atari ST bus: device registry and address dispatch.
//!
//! The bus owns every chip except the processor, one scheduling slot per
//! registry entry, and the fault latch. A bus access is routed to the chip
//! whose window contains the address; anything else lands on the bus-error
//! responder.
//!
//! Memory map:
//! - 0x000000 - 0x3FFFFF: RAM (up to 4 MiB)
//! - 0xFC0000 - 0xFEFFFF: TOS ROM
//! - 0xFF8200 - 0xFF82FF: video shifter
//! - 0xFF8600 - 0xFF860F: DMA / floppy controller
//! - 0xFF8800 - 0xFF88FF: YM2149 PSG
//! - 0xFFFA00 - 0xFFFA3F: MFP 68901

use log::{error, trace, warn};

use crate::config::MachineConfig;
use crate::constants::ADDRESS_MASK;
use crate::cycles::{to_domain, to_domain_ceil, DeviceCycle, MachineCycle};
use crate::device::{Access, BusFault, Device, DeviceDescriptor, DeviceId, Signals};
use crate::error::{BusError, Result};
use crate::glue::{Acknowledge, Glue};
use crate::mfp::{Mfp68901, TimerId};
use crate::peripherals::{BusErrorDevice, Latch, Psg, Ram, Rom};

/// Target of an address lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapped {
    /// A registry entry owns the address.
    Device(DeviceId),
    /// Nobody answers.
    BusError,
}

/// Chips, scheduling slots and fault latch of one machine.
#[derive(Debug)]
pub struct Bus {
    /// Machine clock in Hz
    frequency: u32,
    cpu: DeviceDescriptor,
    ram: Ram,
    rom: Rom,
    glue: Glue,
    mfp: Mfp68901,
    psg: Psg,
    dma: Latch,
    shifter: Latch,
    bus_error: BusErrorDevice,
    slots: [Option<MachineCycle>; DeviceId::COUNT],
    /// Cycle of the access or event being handled
    now: MachineCycle,
    /// Processor run limit, pulled in by event requests
    deadline: MachineCycle,
    fault: Option<BusFault>,
}

impl Bus {
    /// Build the chip set described by `config`. `rom` may be empty.
    pub fn new(config: &MachineConfig, rom: Vec<u8>) -> Self {
        let frequency = config.cpu_frequency;
        Self {
            frequency,
            cpu: DeviceDescriptor::unmapped("cpu", frequency),
            ram: Ram::new(config.ram_size),
            rom: Rom::new(rom),
            glue: Glue::new(frequency, config.vbl_period),
            mfp: Mfp68901::new(config.mfp_frequency()),
            psg: Psg::new(),
            dma: Latch::dma(),
            shifter: Latch::shifter(),
            bus_error: BusErrorDevice::new(),
            slots: [None; DeviceId::COUNT],
            now: 0,
            deadline: MachineCycle::MAX,
            fault: None,
        }
    }

    /// Machine clock in Hz.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// MFP clock in Hz.
    pub fn mfp_frequency(&self) -> u32 {
        self.mfp.descriptor().frequency
    }

    /// Descriptor of a registry entry.
    pub fn descriptor(&self, id: DeviceId) -> &DeviceDescriptor {
        match id {
            DeviceId::Cpu => &self.cpu,
            DeviceId::Ram => self.ram.descriptor(),
            DeviceId::Rom => self.rom.descriptor(),
            DeviceId::Glue => self.glue.descriptor(),
            DeviceId::Mfp => self.mfp.descriptor(),
            DeviceId::Psg => self.psg.descriptor(),
            DeviceId::Dma => self.dma.descriptor(),
            DeviceId::Shifter => self.shifter.descriptor(),
        }
    }

    /// Registry entry named `name`.
    pub fn device_by_name(&self, name: &str) -> Result<DeviceId> {
        DeviceId::ALL
            .into_iter()
            .find(|&id| self.descriptor(id).name == name)
            .ok_or_else(|| BusError::UnknownDevice(name.to_string()))
    }

    /// Owner of a bus address: the first registry entry whose window
    /// contains it.
    pub fn device_for_address(&self, address: u32) -> Mapped {
        let address = address & ADDRESS_MASK;
        DeviceId::ALL
            .into_iter()
            .find(|&id| self.descriptor(id).contains(address))
            .map_or(Mapped::BusError, Mapped::Device)
    }

    /// The chip behind a registry entry; `None` for the processor, which the
    /// machine owns.
    pub fn device(&self, id: DeviceId) -> Option<&dyn Device> {
        match id {
            DeviceId::Cpu => None,
            DeviceId::Ram => Some(&self.ram),
            DeviceId::Rom => Some(&self.rom),
            DeviceId::Glue => Some(&self.glue),
            DeviceId::Mfp => Some(&self.mfp),
            DeviceId::Psg => Some(&self.psg),
            DeviceId::Dma => Some(&self.dma),
            DeviceId::Shifter => Some(&self.shifter),
        }
    }

    /// Mutable access to the chip behind a registry entry.
    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut dyn Device> {
        match id {
            DeviceId::Cpu => None,
            id => Some(self.target(Mapped::Device(id))),
        }
    }

    fn target(&mut self, mapped: Mapped) -> &mut dyn Device {
        match mapped {
            Mapped::Device(DeviceId::Ram) => &mut self.ram,
            Mapped::Device(DeviceId::Rom) => &mut self.rom,
            Mapped::Device(DeviceId::Glue) => &mut self.glue,
            Mapped::Device(DeviceId::Mfp) => &mut self.mfp,
            Mapped::Device(DeviceId::Psg) => &mut self.psg,
            Mapped::Device(DeviceId::Dma) => &mut self.dma,
            Mapped::Device(DeviceId::Shifter) => &mut self.shifter,
            Mapped::Device(DeviceId::Cpu) | Mapped::BusError => &mut self.bus_error,
        }
    }

    /// Machine cycle converted into a device's domain; 0 for unclocked chips.
    pub fn device_cycle(&self, id: DeviceId, cycle: MachineCycle) -> DeviceCycle {
        match self.descriptor(id).frequency {
            0 => 0,
            f => to_domain(f, self.frequency, cycle),
        }
    }

    fn access<T>(
        &mut self,
        cycle: MachineCycle,
        address: u32,
        access: Access,
        handler: impl FnOnce(&mut dyn Device, DeviceCycle, u32, &mut Signals) -> T,
    ) -> T {
        let address = address & ADDRESS_MASK;
        self.now = cycle;
        let mapped = self.device_for_address(address);
        let (id, local, offset) = match mapped {
            Mapped::Device(id) => (
                Some(id),
                self.device_cycle(id, cycle),
                address - self.descriptor(id).bus_address,
            ),
            Mapped::BusError => (None, 0, address),
        };
        if log::log_enabled!(log::Level::Trace) {
            if let Some(device) = id.and_then(|id| self.device(id)) {
                let descriptor = device.descriptor();
                if descriptor.is_clocked() {
                    trace!(
                        "{}: {} 0x{:06X} ({})",
                        descriptor.name,
                        access,
                        address,
                        device.diagnostic_name(offset).unwrap_or("-")
                    );
                }
            }
        }
        let mut signals = Signals::default();
        let value = handler(self.target(mapped), local, offset, &mut signals);
        self.apply(id, cycle, signals);
        value
    }

    /// Byte read at machine cycle `cycle`.
    pub fn read_u8(&mut self, cycle: MachineCycle, address: u32) -> u8 {
        self.access(cycle, address, Access::ReadByte, |dev, local, offset, signals| {
            dev.read_u8(local, offset, signals)
        })
    }

    /// Word read at machine cycle `cycle`.
    pub fn read_u16(&mut self, cycle: MachineCycle, address: u32) -> u16 {
        self.access(cycle, address, Access::ReadWord, |dev, local, offset, signals| {
            dev.read_u16(local, offset, signals)
        })
    }

    /// Long read as two word reads.
    pub fn read_u32(&mut self, cycle: MachineCycle, address: u32) -> u32 {
        let hi = self.read_u16(cycle, address);
        let lo = self.read_u16(cycle, address.wrapping_add(2));
        (u32::from(hi) << 16) | u32::from(lo)
    }

    /// Byte write at machine cycle `cycle`.
    pub fn write_u8(&mut self, cycle: MachineCycle, address: u32, value: u8) {
        self.access(cycle, address, Access::WriteByte, |dev, local, offset, signals| {
            dev.write_u8(local, offset, value, signals)
        })
    }

    /// Word write at machine cycle `cycle`.
    pub fn write_u16(&mut self, cycle: MachineCycle, address: u32, value: u16) {
        self.access(cycle, address, Access::WriteWord, |dev, local, offset, signals| {
            dev.write_u16(local, offset, value, signals)
        })
    }

    /// Long write as two word writes.
    pub fn write_u32(&mut self, cycle: MachineCycle, address: u32, value: u32) {
        self.write_u16(cycle, address, (value >> 16) as u16);
        self.write_u16(cycle, address.wrapping_add(2), value as u16);
    }

    /// Apply what a handler of `id` asked for. `None` is the bus-error
    /// responder, which can only fault.
    pub(crate) fn apply(&mut self, id: Option<DeviceId>, cycle: MachineCycle, signals: Signals) {
        if let (Some(id), Some(when)) = (id, signals.event()) {
            self.request_device_event(id, when);
        }
        for (level, raised) in signals.irq_changes() {
            match (level, raised) {
                (0, _) => {}
                (level, true) => self.glue.set(level),
                (level, false) => self.glue.clear(level),
            }
        }
        if let Some(fault) = signals.fault() {
            error!("{} at 0x{:06X}, cycle {}", fault.access, fault.address, cycle);
            self.fault.get_or_insert(fault);
            self.deadline = self.deadline.min(cycle);
        }
    }

    /// Arm `id`'s next event at `device_cycle` of its own clock.
    ///
    /// The cycle is rounded up into the machine domain so the chip is never
    /// woken early; an earlier pending request is kept.
    pub fn request_device_event(&mut self, id: DeviceId, device_cycle: DeviceCycle) {
        let frequency = self.descriptor(id).frequency;
        if frequency == 0 {
            warn!(
                "{}: event request from an unclocked device ignored",
                self.descriptor(id).name
            );
            return;
        }
        let when = to_domain_ceil(self.frequency, frequency, device_cycle).max(self.now);
        let slot = &mut self.slots[id.index()];
        *slot = Some(slot.map_or(when, |pending| pending.min(when)));
        self.deadline = self.deadline.min(when);
    }

    /// Pending event of a registry entry, in machine cycles.
    pub fn slot(&self, id: DeviceId) -> Option<MachineCycle> {
        self.slots[id.index()]
    }

    pub(crate) fn take_slot(&mut self, id: DeviceId) -> Option<MachineCycle> {
        self.slots[id.index()].take()
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = MachineCycle> + '_ {
        self.slots.iter().flatten().copied()
    }

    pub(crate) fn set_now(&mut self, cycle: MachineCycle) {
        self.now = cycle;
    }

    /// Machine cycle by which the running processor must yield.
    pub fn deadline(&self) -> MachineCycle {
        self.deadline
    }

    pub(crate) fn set_deadline(&mut self, deadline: MachineCycle) {
        self.deadline = deadline;
    }

    /// First unanswered access since the last [`take_fault`](Self::take_fault).
    pub fn fault(&self) -> Option<BusFault> {
        self.fault
    }

    /// Clear and return the fault latch.
    pub fn take_fault(&mut self) -> Option<BusFault> {
        self.fault.take()
    }

    /// Interrupt level the processor sees.
    pub fn interrupt_level(&self) -> u8 {
        self.glue.level()
    }

    /// Interrupt acknowledge cycle for `level`; returns the vector number.
    pub fn acknowledge_interrupt(&mut self, cycle: MachineCycle, level: u8) -> u8 {
        self.now = cycle;
        match self.glue.acknowledge(level) {
            Acknowledge::Vector(vector) => vector,
            Acknowledge::Mfp => {
                let mut signals = Signals::default();
                let vector = self.mfp.irq_vector(&mut signals);
                self.apply(Some(DeviceId::Mfp), cycle, signals);
                vector
            }
        }
    }

    /// Drive an MFP GPIP input line.
    pub fn set_mfp_input(&mut self, cycle: MachineCycle, line: u8, level: bool) {
        self.now = cycle;
        let local = self.device_cycle(DeviceId::Mfp, cycle);
        let mut signals = Signals::default();
        self.mfp.set_input(local, line, level, &mut signals);
        self.apply(Some(DeviceId::Mfp), cycle, signals);
    }

    /// Drive the TAI / TBI event input of MFP timer A or B.
    pub fn set_mfp_timer_input(&mut self, cycle: MachineCycle, timer: TimerId, level: bool) {
        self.now = cycle;
        let mut signals = Signals::default();
        self.mfp.set_timer_input(timer, level, &mut signals);
        self.apply(Some(DeviceId::Mfp), cycle, signals);
    }

    /// Return every chip to power-on state and drop all pending events.
    pub fn reset(&mut self) {
        self.slots = [None; DeviceId::COUNT];
        self.now = 0;
        self.deadline = MachineCycle::MAX;
        self.fault = None;
        for id in DeviceId::ALL {
            let mut signals = Signals::default();
            let Some(device) = self.device_mut(id) else {
                continue;
            };
            device.reset(&mut signals);
            self.apply(Some(id), 0, signals);
        }
    }

    /// RAM.
    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    /// RAM, mutable.
    pub fn ram_mut(&mut self) -> &mut Ram {
        &mut self.ram
    }

    /// ROM.
    pub fn rom(&self) -> &Rom {
        &self.rom
    }

    /// GLUE.
    pub fn glue(&self) -> &Glue {
        &self.glue
    }

    /// MFP.
    pub fn mfp(&self) -> &Mfp68901 {
        &self.mfp
    }

    /// PSG.
    pub fn psg(&self) -> &Psg {
        &self.psg
    }

    /// Video shifter.
    pub fn shifter(&self) -> &Latch {
        &self.shifter
    }

    /// DMA controller.
    pub fn dma(&self) -> &Latch {
        &self.dma
    }
}
