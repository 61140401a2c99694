//! Atari ST bus, event scheduler and MFP 68901 for SNDH playback
//!
//! A cycle-accurate model of the parts of an Atari ST that an SNDH music
//! driver depends on for timing: the MFP 68901 timers and interrupt
//! controller, the GLUE interrupt aggregator with its 50 Hz vertical blank,
//! and the bus and scheduler that tie them to a 68000.
//!
//! # Features
//! - Every chip behind one [`Device`] contract, dispatched by bus window
//! - Per-chip clock domains with overflow-free conversion
//! - Event-driven scheduling: chips wake only at their own timeouts, and the
//!   processor is never run past a pending event
//! - MFP timers A-D (delay and event-count modes), GPIP edge interrupts,
//!   16-channel priority resolution with automatic or software EOI
//! - Pluggable processor through [`Processor`]; [`IdleCpu`] models a 68000
//!   parked in `STOP`
//!
//! # Quick start
//! ```no_run
//! use st_sndh_bus::{Machine, MachineConfig, Register, MFP_BASE};
//!
//! let mut machine = Machine::idle(&MachineConfig::default()).unwrap();
//! // Timer A, /4 prescale, 10 counts, interrupt enabled and unmasked.
//! machine.write_u8(MFP_BASE + Register::Tadr.offset(), 10).unwrap();
//! machine.write_u8(MFP_BASE + Register::Iera.offset(), 0x20).unwrap();
//! machine.write_u8(MFP_BASE + Register::Imra.offset(), 0x20).unwrap();
//! machine.write_u8(MFP_BASE + Register::Tacr.offset(), 1).unwrap();
//! machine.run_frames(50).unwrap();
//! println!("timer A taken {} times", machine.cpu().acknowledged(0x0D));
//! ```

#![warn(missing_docs)]

pub mod bus;
pub mod config;
pub mod constants;
pub mod cpu;
pub mod cycles;
pub mod device;
pub mod error;
pub mod glue;
pub mod machine;
pub mod mfp;
pub mod peripherals;
pub mod scheduler;

pub use bus::{Bus, Mapped};
pub use config::{MachineConfig, MfpClock};
pub use constants::*;
pub use cpu::{CpuBus, CpuMemory, IdleCpu, Processor};
pub use cycles::{to_domain, to_domain_ceil, DeviceCycle, MachineCycle};
pub use device::{Access, BusFault, Device, DeviceDescriptor, DeviceId, Signals};
pub use error::{BusError, Result};
pub use glue::{Acknowledge, Glue};
pub use machine::Machine;
pub use mfp::{Channels, Mfp68901, Register, TimerId, TimerMode};
pub use scheduler::device_run;
