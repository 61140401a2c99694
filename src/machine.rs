//! Atari ST machine: the bus, a processor and the global cycle counter.
//!
//! The machine is the only owner of chip state. Callers drive it with
//! [`Machine::device_run`] (one bounded slice) or [`Machine::run`] (a fixed
//! number of machine cycles); the global cycle only moves forward.

use log::{debug, info};

use crate::bus::Bus;
use crate::config::MachineConfig;
use crate::cpu::{IdleCpu, Processor};
use crate::cycles::MachineCycle;
use crate::error::{BusError, Result};
use crate::scheduler;

/// Atari ST machine for SNDH playback.
#[derive(Debug)]
pub struct Machine<P: Processor = IdleCpu> {
    bus: Bus,
    cpu: P,
    cycle: MachineCycle,
}

impl Machine<IdleCpu> {
    /// Machine with an idle processor, for driving the chips directly.
    pub fn idle(config: &MachineConfig) -> Result<Self> {
        let cpu = IdleCpu::with_frequency(config.cpu_frequency);
        Self::new(config, cpu)
    }
}

impl<P: Processor> Machine<P> {
    /// Build and reset a machine.
    pub fn new(config: &MachineConfig, cpu: P) -> Result<Self> {
        config.validate()?;
        if cpu.frequency() == 0 {
            return Err(BusError::Config(format!(
                "{} reports a zero clock",
                cpu.name()
            )));
        }
        let rom = match &config.rom_image {
            Some(path) => {
                let image = std::fs::read(path)?;
                info!("rom: {} bytes from {}", image.len(), path.display());
                image
            }
            None => Vec::new(),
        };
        let mut machine = Self {
            bus: Bus::new(config, rom),
            cpu,
            cycle: 0,
        };
        machine.reset();
        Ok(machine)
    }

    /// Reset the machine to initial state.
    pub fn reset(&mut self) {
        self.cycle = 0;
        self.bus.reset();
        self.cpu.reset();
        debug!(
            "machine reset: {} at {} Hz, mfp at {} Hz",
            self.cpu.name(),
            self.cpu.frequency(),
            self.bus.mfp_frequency()
        );
    }

    /// Global cycle counter.
    pub fn cycle(&self) -> MachineCycle {
        self.cycle
    }

    /// Vertical blanks since reset.
    pub fn frames(&self) -> u64 {
        self.bus.glue().vbl_count()
    }

    /// The bus and its chips.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The bus and its chips, mutable.
    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// The processor.
    pub fn cpu(&self) -> &P {
        &self.cpu
    }

    /// The processor, mutable.
    pub fn cpu_mut(&mut self) -> &mut P {
        &mut self.cpu
    }

    /// Advance by one bounded slice of at most `slice` cycles; returns the
    /// cycles consumed.
    pub fn device_run(&mut self, slice: MachineCycle) -> Result<MachineCycle> {
        let consumed = scheduler::device_run(&mut self.bus, &mut self.cpu, self.cycle, slice)?;
        self.cycle += consumed;
        Ok(consumed)
    }

    /// Run for `cycles` machine cycles (the last slice may overshoot by the
    /// processor's instruction granularity).
    pub fn run(&mut self, cycles: MachineCycle) -> Result<()> {
        let end = self.cycle + cycles;
        while self.cycle < end {
            self.device_run(end - self.cycle)?;
        }
        // Events due exactly at the end are visible before the next run.
        self.bus.fire_due_events(self.cycle);
        Ok(())
    }

    /// Run for `frames` vertical blank periods.
    pub fn run_frames(&mut self, frames: u32) -> Result<()> {
        self.run(u64::from(frames) * self.bus.glue().vbl_period())
    }

    /// Upload data to RAM.
    pub fn upload(&mut self, data: &[u8], address: u32) -> Result<()> {
        if self.bus.ram_mut().load(address, data) {
            Ok(())
        } else {
            Err(BusError::Upload {
                address,
                len: data.len(),
            })
        }
    }

    fn check_fault(&mut self) -> Result<()> {
        match self.bus.take_fault() {
            Some(fault) => Err(fault.into()),
            None => Ok(()),
        }
    }

    /// Byte read at the current cycle.
    pub fn read_u8(&mut self, address: u32) -> Result<u8> {
        let value = self.bus.read_u8(self.cycle, address);
        self.check_fault().map(|()| value)
    }

    /// Word read at the current cycle.
    pub fn read_u16(&mut self, address: u32) -> Result<u16> {
        let value = self.bus.read_u16(self.cycle, address);
        self.check_fault().map(|()| value)
    }

    /// Byte write at the current cycle.
    pub fn write_u8(&mut self, address: u32, value: u8) -> Result<()> {
        self.bus.write_u8(self.cycle, address, value);
        self.check_fault()
    }

    /// Word write at the current cycle.
    pub fn write_u16(&mut self, address: u32, value: u16) -> Result<()> {
        self.bus.write_u16(self.cycle, address, value);
        self.check_fault()
    }
}
