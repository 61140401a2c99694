//! GLUE Interrupt Aggregation
//!
//! The ST's GLUE chip merges the horizontal blank, the vertical blank and the
//! MFP request into the three IPL lines of the 68000. Only the highest
//! pending level is visible to the processor.
//!
//! GLUE also derives the display timing, and with it the 50 Hz vertical
//! blank that most SNDH drivers use as their replay clock.

use log::trace;

use crate::constants::{AUTOVECTOR_BASE, HBL_LEVEL, HBL_VECTOR, MFP_LEVEL, VBL_LEVEL, VBL_VECTOR};
use crate::cycles::DeviceCycle;
use crate::device::{Device, DeviceDescriptor, Signals};

/// Outcome of an interrupt acknowledge cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledge {
    /// The level has a fixed vector.
    Vector(u8),
    /// The MFP supplies the vector.
    Mfp,
}

/// GLUE interrupt aggregator
#[derive(Debug, Clone)]
pub struct Glue {
    descriptor: DeviceDescriptor,
    /// Bit `n` set = level `n` pending
    pending: u8,
    /// Level currently asserted to the processor
    level: u8,
    vbl_period: u64,
    vbl_count: u64,
}

impl Glue {
    /// Create GLUE clocked at `frequency`, with a vertical blank every
    /// `vbl_period` of its cycles.
    pub fn new(frequency: u32, vbl_period: u64) -> Self {
        Glue {
            descriptor: DeviceDescriptor::unmapped("glue", frequency),
            pending: 0,
            level: 0,
            vbl_period,
            vbl_count: 0,
        }
    }

    /// Raise interrupt `level`.
    pub fn set(&mut self, level: u8) {
        debug_assert!((1..=7).contains(&level), "interrupt level {level}");
        self.pending |= 1 << level;
        if level > self.level {
            trace!("glue: ipl {} -> {}", self.level, level);
            self.level = level;
        }
    }

    /// Drop interrupt `level`.
    pub fn clear(&mut self, level: u8) {
        debug_assert!((1..=7).contains(&level), "interrupt level {level}");
        self.pending &= !(1 << level);
        if level == self.level {
            self.level = highest_level(self.pending);
            trace!("glue: ipl {} -> {}", level, self.level);
        }
    }

    /// Level asserted to the processor, 0 when idle.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Pending level bitmask (bit `n` = level `n`).
    pub fn pending(&self) -> u8 {
        self.pending
    }

    /// Acknowledge `level`: the level is dropped and its vector source named.
    pub fn acknowledge(&mut self, level: u8) -> Acknowledge {
        self.clear(level);
        match level {
            HBL_LEVEL => Acknowledge::Vector(HBL_VECTOR),
            VBL_LEVEL => Acknowledge::Vector(VBL_VECTOR),
            MFP_LEVEL => Acknowledge::Mfp,
            _ => Acknowledge::Vector(AUTOVECTOR_BASE + level),
        }
    }

    /// Vertical blanks generated since reset.
    pub fn vbl_count(&self) -> u64 {
        self.vbl_count
    }

    /// Vertical blank period in GLUE cycles.
    pub fn vbl_period(&self) -> u64 {
        self.vbl_period
    }
}

fn highest_level(pending: u8) -> u8 {
    match pending {
        0 => 0,
        mask => 7 - mask.leading_zeros() as u8,
    }
}

impl Device for Glue {
    fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    fn reset(&mut self, signals: &mut Signals) {
        self.pending = 0;
        self.level = 0;
        self.vbl_count = 0;
        signals.request_event(self.vbl_period);
    }

    fn event(&mut self, cycle: DeviceCycle, signals: &mut Signals) {
        self.vbl_count += 1;
        self.set(VBL_LEVEL);
        signals.request_event(cycle + self.vbl_period);
    }

    // GLUE has no bus window; the bus never routes accesses here.
    fn read_u8(&mut self, _cycle: DeviceCycle, _offset: u32, _signals: &mut Signals) -> u8 {
        0
    }

    fn write_u8(&mut self, _cycle: DeviceCycle, _offset: u32, _value: u8, _signals: &mut Signals) {}
}
