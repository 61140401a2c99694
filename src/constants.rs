//! Atari ST Hardware Constants
//!
//! Clock rates, bus map and interrupt numbering shared by the bus, the
//! scheduler and the chips.

/// 68000 / machine clock on a PAL Atari ST (8 MHz).
pub const CPU_FREQUENCY: u32 = 8_000_000;

/// MFP clock of the simplified model (4 MHz, half the processor clock).
pub const MFP_LEGACY_FREQUENCY: u32 = 4_000_000;

/// MFP clock of real hardware (2.4576 MHz crystal).
pub const MFP_HARDWARE_FREQUENCY: u32 = 2_457_600;

/// YM2149 master clock.
pub const PSG_FREQUENCY: u32 = 2_000_000;

/// Vertical blank period in glue cycles (313 lines of 512 cycles, PAL).
pub const VBL_PERIOD: u64 = 160_256;

/// The 68000 drives 24 address lines.
pub const ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// Default (and maximum) ST RAM size, 4 MiB.
pub const RAM_SIZE: u32 = 4 * 1024 * 1024;

/// RAM window start.
pub const RAM_BASE: u32 = 0x000000;
/// TOS ROM window start.
pub const ROM_BASE: u32 = 0xFC0000;
/// TOS ROM window size (192 KiB).
pub const ROM_SIZE: u32 = 0x30000;
/// Video shifter register window.
pub const SHIFTER_BASE: u32 = 0xFF8200;
/// Video shifter window size.
pub const SHIFTER_SIZE: u32 = 0x100;
/// DMA / floppy controller register window.
pub const DMA_BASE: u32 = 0xFF8600;
/// DMA window size.
pub const DMA_SIZE: u32 = 0x10;
/// YM2149 register select / data window.
pub const PSG_BASE: u32 = 0xFF8800;
/// PSG window size (ports mirror every 4 bytes).
pub const PSG_SIZE: u32 = 0x100;
/// MFP 68901 register window.
pub const MFP_BASE: u32 = 0xFFFA00;
/// MFP window size: 24 registers at odd offsets, padded to 64 bytes.
pub const MFP_SIZE: u32 = 0x40;

/// Horizontal blank interrupt level.
pub const HBL_LEVEL: u8 = 2;
/// Vertical blank interrupt level.
pub const VBL_LEVEL: u8 = 4;
/// Level on which the MFP requests service.
pub const MFP_LEVEL: u8 = 6;

/// First autovector; level `n` autovectors to `AUTOVECTOR_BASE + n`.
pub const AUTOVECTOR_BASE: u8 = 24;

/// Returned when an acknowledge finds nothing to service.
pub const SPURIOUS_VECTOR: u8 = 24;

/// Horizontal blank autovector.
pub const HBL_VECTOR: u8 = AUTOVECTOR_BASE + HBL_LEVEL;
/// Vertical blank autovector.
pub const VBL_VECTOR: u8 = AUTOVECTOR_BASE + VBL_LEVEL;
