//! Event scheduler.
//!
//! [`device_run`] advances the machine by one bounded slice:
//!
//! 1. every chip whose event is due is woken (its slot is cleared first, so
//!    the handler may re-arm itself);
//! 2. the slice is cut at the earliest event still pending;
//! 3. the processor runs for what is left.
//!
//! The processor therefore never runs past a cycle at which some chip's
//! state changes on its own.

use log::debug;

use crate::bus::Bus;
use crate::cpu::{CpuBus, Processor};
use crate::cycles::{to_domain, MachineCycle};
use crate::device::{DeviceId, Signals};
use crate::error::Result;

impl Bus {
    /// Wake every chip whose event is due at `cycle`.
    pub fn fire_due_events(&mut self, cycle: MachineCycle) {
        for id in DeviceId::ALL {
            match self.slot(id) {
                Some(due) if due <= cycle => {}
                _ => continue,
            }
            self.take_slot(id);
            self.set_now(cycle);
            let local = self.device_cycle(id, cycle);
            let mut signals = Signals::default();
            let Some(device) = self.device_mut(id) else {
                continue;
            };
            device.event(local, &mut signals);
            self.apply(Some(id), cycle, signals);
        }
    }

    /// `slice` cut at the earliest pending event; 0 if one is due now.
    pub fn bounded_slice(&self, cycle: MachineCycle, slice: MachineCycle) -> MachineCycle {
        self.slots()
            .fold(slice, |slice, due| slice.min(due.saturating_sub(cycle)))
    }
}

/// Fire due events at `cycle`, then run `cpu` for at most `slice` machine
/// cycles.
///
/// Returns the machine cycles consumed, 0 when an event was due (call again
/// at the same cycle). An access nobody answered ends the run with
/// [`BusError::BusFault`](crate::BusError::BusFault).
pub fn device_run<P: Processor + ?Sized>(
    bus: &mut Bus,
    cpu: &mut P,
    cycle: MachineCycle,
    slice: MachineCycle,
) -> Result<MachineCycle> {
    bus.fire_due_events(cycle);

    let slice = bus.bounded_slice(cycle, slice);
    if slice == 0 {
        return Ok(0);
    }

    let machine = bus.frequency();
    let frequency = cpu.frequency();
    bus.set_deadline(cycle + slice);
    let consumed = {
        let local = to_domain(frequency, machine, cycle);
        let local_slice = to_domain(frequency, machine, slice).max(1);
        let mut view = CpuBus::new(bus, frequency, cycle, local);
        cpu.run(&mut view, local, local_slice)
    };
    bus.set_deadline(MachineCycle::MAX);

    if let Some(fault) = bus.take_fault() {
        debug!("{}: run aborted at cycle {}", cpu.name(), cycle);
        return Err(fault.into());
    }
    Ok(to_domain(machine, frequency, consumed))
}
