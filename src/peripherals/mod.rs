//! Bus chips other than the MFP and GLUE.
//!
//! SNDH drivers touch these only incidentally: RAM and ROM hold code and
//! data, the PSG receives register writes, and the shifter and DMA windows
//! must answer (with plausible values) so that probing code does not bus-error.

mod latch;
mod memory;
mod psg;

pub use latch::Latch;
pub use memory::{BusErrorDevice, Ram, Rom};
pub use psg::{Psg, PSG_REGISTERS};
