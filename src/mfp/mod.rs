//! MFP 68901 (Multi-Function Peripheral)
//!
//! The MFP provides the ST's timers A-D, a 16-channel prioritised interrupt
//! controller and the GPIP input port. SNDH drivers use its timers as sample
//! and effect clocks, so counter values and interrupt timing must be exact.
//!
//! Registers sit at odd byte offsets (`2n + 1`) of a 64-byte window; even
//! offsets read 0 and ignore writes.
//!
//! Every register access first brings the timers up to the access cycle, so a
//! write always acts on a state that is current at the moment it happens.
//! Running timers are never ticked: each one records the MFP cycle of its
//! next timeout and asks the scheduler to wake the chip there.

pub mod timer;

use bitflags::bitflags;
use log::{trace, warn};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::constants::{MFP_BASE, MFP_LEVEL, MFP_SIZE, SPURIOUS_VECTOR};
use crate::cycles::DeviceCycle;
use crate::device::{Device, DeviceDescriptor, Signals};

pub use timer::{TimerId, TimerMode};
use timer::TimerState;

/// MFP registers, numbered by `offset >> 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[allow(missing_docs)]
pub enum Register {
    Gpip = 0,
    Aer,
    Ddr,
    Iera,
    Ierb,
    Ipra,
    Iprb,
    Isra,
    Isrb,
    Imra,
    Imrb,
    Vr,
    Tacr,
    Tbcr,
    Tcdcr,
    Tadr,
    Tbdr,
    Tcdr,
    Tddr,
    Scr,
    Ucr,
    Rsr,
    Tsr,
    Udr,
}

/// Number of MFP registers.
pub const REGISTER_COUNT: usize = 24;

const REGISTER_NAMES: [&str; REGISTER_COUNT] = [
    "GPIP", "AER", "DDR", "IERA", "IERB", "IPRA", "IPRB", "ISRA", "ISRB", "IMRA", "IMRB", "VR",
    "TACR", "TBCR", "TCDCR", "TADR", "TBDR", "TCDR", "TDDR", "SCR", "UCR", "RSR", "TSR", "UDR",
];

// Bits not wired on the chip read back as 0.
const REGISTER_MASK: [u8; REGISTER_COUNT] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xF8, // GPIP..VR
    0x0F, 0x0F, 0x77, // TACR, TBCR, TCDCR
    0xFF, 0xFF, 0xFF, 0xFF, // TxDR
    0xFF, 0xFE, 0xFF, 0xFF, 0xFF, // SCR..UDR
];

const _: () = assert!(Register::Udr as usize + 1 == REGISTER_COUNT);

/// VR bit 3: software end-of-interrupt (in-service bits are kept).
pub const VR_S: u8 = 0x08;

impl Register {
    /// Byte offset within the MFP window.
    pub const fn offset(self) -> u32 {
        (self as u32) * 2 + 1
    }

    /// Register at a window offset; `None` for even offsets and the padding.
    pub fn from_offset(offset: u32) -> Option<Self> {
        if offset & 1 == 0 {
            return None;
        }
        Self::from_u32(offset >> 1)
    }

    /// Datasheet mnemonic.
    pub fn name(self) -> &'static str {
        REGISTER_NAMES[self as usize]
    }

    /// Implemented bits.
    pub fn mask(self) -> u8 {
        REGISTER_MASK[self as usize]
    }
}

bitflags! {
    /// The 16 interrupt channels; a higher bit has higher priority.
    ///
    /// The A register of each IER/IPR/ISR/IMR pair holds the upper byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Channels: u16 {
        /// GPIP bit 0 (parallel port busy)
        const GPI0 = 1 << 0;
        /// GPIP bit 1 (RS-232 DCD)
        const GPI1 = 1 << 1;
        /// GPIP bit 2 (RS-232 CTS)
        const GPI2 = 1 << 2;
        /// GPIP bit 3 (blitter)
        const GPI3 = 1 << 3;
        /// Timer D
        const TIMER_D = 1 << 4;
        /// Timer C (200 Hz system tick)
        const TIMER_C = 1 << 5;
        /// GPIP bit 4 (ACIA)
        const GPI4 = 1 << 6;
        /// GPIP bit 5 (FDC / HDC)
        const GPI5 = 1 << 7;
        /// Timer B (display line counter)
        const TIMER_B = 1 << 8;
        /// USART transmit error
        const TX_ERROR = 1 << 9;
        /// USART transmit buffer empty
        const TX_EMPTY = 1 << 10;
        /// USART receive error
        const RX_ERROR = 1 << 11;
        /// USART receive buffer full
        const RX_FULL = 1 << 12;
        /// Timer A
        const TIMER_A = 1 << 13;
        /// GPIP bit 6 (RS-232 ring indicator)
        const GPI6 = 1 << 14;
        /// GPIP bit 7 (monochrome detect)
        const GPI7 = 1 << 15;
    }
}

const GPI_CHANNELS: [Channels; 8] = [
    Channels::GPI0,
    Channels::GPI1,
    Channels::GPI2,
    Channels::GPI3,
    Channels::GPI4,
    Channels::GPI5,
    Channels::GPI6,
    Channels::GPI7,
];

struct TimerLayout {
    data: Register,
    control: Register,
    shift: u8,
    mask: u8,
    channel: Channels,
}

static TIMERS: [TimerLayout; 4] = [
    TimerLayout {
        data: Register::Tadr,
        control: Register::Tacr,
        shift: 0,
        mask: 0x0F,
        channel: Channels::TIMER_A,
    },
    TimerLayout {
        data: Register::Tbdr,
        control: Register::Tbcr,
        shift: 0,
        mask: 0x0F,
        channel: Channels::TIMER_B,
    },
    TimerLayout {
        data: Register::Tcdr,
        control: Register::Tcdcr,
        shift: 4,
        mask: 0x07,
        channel: Channels::TIMER_C,
    },
    TimerLayout {
        data: Register::Tddr,
        control: Register::Tcdcr,
        shift: 0,
        mask: 0x07,
        channel: Channels::TIMER_D,
    },
];

/// MFP 68901
#[derive(Debug, Clone)]
pub struct Mfp68901 {
    descriptor: DeviceDescriptor,
    regs: [u8; REGISTER_COUNT],
    timers: [TimerState; 4],
    /// Level on the GPIP input pins
    inputs: u8,
    /// Level on TAI / TBI
    timer_inputs: [bool; 2],
    warned_pulse_width: bool,
    warned_spurious: bool,
}

impl Mfp68901 {
    /// Create an MFP clocked at `frequency` Hz.
    pub fn new(frequency: u32) -> Self {
        let mut mfp = Mfp68901 {
            descriptor: DeviceDescriptor {
                name: "mfp",
                frequency,
                bus_address: MFP_BASE,
                bus_size: MFP_SIZE,
            },
            regs: [0; REGISTER_COUNT],
            timers: [TimerState::default(); 4],
            inputs: 0xFF,
            timer_inputs: [true; 2],
            warned_pulse_width: false,
            warned_spurious: false,
        };
        mfp.reset_registers();
        mfp
    }

    fn reset_registers(&mut self) {
        self.regs = [0; REGISTER_COUNT];
        for timer in &mut self.timers {
            timer.reset();
        }
        self.inputs = 0xFF;
        self.timer_inputs = [true; 2];
    }

    /// Raw register content, without side effects.
    ///
    /// For the timer data registers this is the reload value, not the counter.
    pub fn register(&self, reg: Register) -> u8 {
        self.regs[reg as usize]
    }

    fn pair(&self, hi: Register) -> Channels {
        let hi = hi as usize;
        Channels::from_bits_retain(u16::from_be_bytes([self.regs[hi], self.regs[hi + 1]]))
    }

    fn set_pair(&mut self, hi: Register, channels: Channels) {
        let [a, b] = channels.bits().to_be_bytes();
        self.regs[hi as usize] = a;
        self.regs[hi as usize + 1] = b;
    }

    /// Interrupt enable (IERA:IERB).
    pub fn ier(&self) -> Channels {
        self.pair(Register::Iera)
    }

    /// Interrupt pending (IPRA:IPRB).
    pub fn ipr(&self) -> Channels {
        self.pair(Register::Ipra)
    }

    /// Interrupt in service (ISRA:ISRB).
    pub fn isr(&self) -> Channels {
        self.pair(Register::Isra)
    }

    /// Interrupt mask (IMRA:IMRB).
    pub fn imr(&self) -> Channels {
        self.pair(Register::Imra)
    }

    /// Whether software end-of-interrupt mode (VR bit S) is on.
    pub fn software_eoi(&self) -> bool {
        self.regs[Register::Vr as usize] & VR_S != 0
    }

    /// Mode selected by a timer's control field.
    pub fn timer_mode(&self, id: TimerId) -> TimerMode {
        let layout = &TIMERS[id.index()];
        let field = (self.regs[layout.control as usize] >> layout.shift) & layout.mask;
        TimerMode::from_control(field)
    }

    /// Counter value a processor read of the timer's data register returns
    /// at MFP cycle `now`.
    pub fn timer_counter(&self, id: TimerId, now: DeviceCycle) -> u8 {
        let data = self.regs[TIMERS[id.index()].data as usize];
        // 256 reads back as 0.
        self.timers[id.index()].count(self.timer_mode(id), data, now) as u8
    }

    /// MFP cycle of the timer's next timeout, 0 when it is not counting.
    pub fn timer_timeout(&self, id: TimerId) -> DeviceCycle {
        self.timers[id.index()].timeout()
    }

    /// Highest pending, unmasked channel not blocked by an in-service one.
    pub fn next_interrupt(&self) -> Option<u8> {
        let candidates = (self.ipr() & self.imr()).bits();
        if candidates == 0 {
            return None;
        }
        let top = 15 - candidates.leading_zeros() as u8;
        let in_service = self.isr().bits();
        if in_service != 0 && top <= 15 - in_service.leading_zeros() as u8 {
            return None;
        }
        Some(top)
    }

    /// Interrupt acknowledge cycle: supply the vector for the winning channel.
    ///
    /// The channel's pending bit is cleared, and with VR bit S set its
    /// in-service bit is set until software clears it. When nothing can be
    /// serviced the spurious vector is returned and no state changes.
    pub fn irq_vector(&mut self, signals: &mut Signals) -> u8 {
        let vector = match self.next_interrupt() {
            Some(channel) => {
                let bit = Channels::from_bits_retain(1 << channel);
                self.set_pair(Register::Ipra, self.ipr() - bit);
                if self.software_eoi() {
                    self.set_pair(Register::Isra, self.isr() | bit);
                }
                let vector = (self.regs[Register::Vr as usize] & 0xF0) | channel;
                trace!("mfp: acknowledge channel {} vector {:#04x}", channel, vector);
                vector
            }
            None => {
                if !self.warned_spurious {
                    warn!("mfp: spurious interrupt acknowledge");
                    self.warned_spurious = true;
                }
                return SPURIOUS_VECTOR;
            }
        };
        self.update_irq_output(signals);
        vector
    }

    /// Register read at MFP cycle `now`.
    pub fn read_register(&self, now: DeviceCycle, reg: Register) -> u8 {
        match reg {
            Register::Gpip => {
                let ddr = self.regs[Register::Ddr as usize];
                (self.regs[Register::Gpip as usize] & ddr) | (self.inputs & !ddr)
            }
            Register::Tadr => self.timer_counter(TimerId::A, now),
            Register::Tbdr => self.timer_counter(TimerId::B, now),
            Register::Tcdr => self.timer_counter(TimerId::C, now),
            Register::Tddr => self.timer_counter(TimerId::D, now),
            _ => self.regs[reg as usize],
        }
    }

    /// Register write at MFP cycle `now`.
    pub fn write_register(&mut self, now: DeviceCycle, reg: Register, value: u8, signals: &mut Signals) {
        trace!("mfp: {} <- {:02x}", reg.name(), value);
        self.update_timers(now, signals);

        let lines = self.edge_lines();
        let modes = TimerId::ALL.map(|id| self.timer_mode(id));
        let value = value & reg.mask();
        let i = reg as usize;
        match reg {
            // Writing 0 clears a bit, writing 1 leaves it.
            Register::Ipra | Register::Iprb | Register::Isra | Register::Isrb => {
                self.regs[i] &= value;
            }
            // Disabling a channel also drops its pending request.
            Register::Iera | Register::Ierb => {
                self.regs[i] = value;
                self.regs[i + 2] &= value;
            }
            Register::Vr => {
                let was_software_eoi = self.software_eoi();
                self.regs[i] = value;
                if was_software_eoi && !self.software_eoi() {
                    self.set_pair(Register::Isra, Channels::empty());
                }
            }
            _ => self.regs[i] = value,
        }

        for id in TimerId::ALL {
            let mode = self.timer_mode(id);
            let old = modes[id.index()];
            if mode == old {
                continue;
            }
            if matches!(mode, TimerMode::PulseWidth { .. }) && !self.warned_pulse_width {
                warn!("mfp: timer {:?} pulse width mode is not supported", id);
                self.warned_pulse_width = true;
            }
            let data = self.regs[TIMERS[id.index()].data as usize];
            self.timers[id.index()].reconfigure(old, mode, data, now);
        }

        self.detect_edges(lines, self.edge_lines());
        self.update_timers(now, signals);
        self.update_irq_output(signals);
    }

    /// Drive GPIP input `line` (0-7) at MFP cycle `now`.
    pub fn set_input(&mut self, now: DeviceCycle, line: u8, level: bool, signals: &mut Signals) {
        self.update_timers(now, signals);
        let lines = self.edge_lines();
        let bit = 1 << (line & 7);
        if level {
            self.inputs |= bit;
        } else {
            self.inputs &= !bit;
        }
        self.detect_edges(lines, self.edge_lines());
        self.update_irq_output(signals);
    }

    /// Drive the TAI / TBI event input of timer A or B.
    ///
    /// An active edge (falling, or rising when the timer's AER bit is set)
    /// counts one event in event-count mode.
    pub fn set_timer_input(&mut self, id: TimerId, level: bool, signals: &mut Signals) {
        let (slot, aer_bit) = match id {
            TimerId::A => (0, 4),
            TimerId::B => (1, 3),
            _ => return,
        };
        let rising = self.regs[Register::Aer as usize] & (1 << aer_bit) != 0;
        let before = self.timer_inputs[slot] ^ rising;
        let after = level ^ rising;
        self.timer_inputs[slot] = level;
        if !(before && !after) || self.timer_mode(id) != TimerMode::EventCount {
            return;
        }
        let layout = &TIMERS[id.index()];
        let data = self.regs[layout.data as usize];
        if self.timers[id.index()].count_event(data) {
            self.pend(layout.channel);
        }
        self.update_irq_output(signals);
    }

    /// GPIP lines as seen by the edge detector: input level XOR edge select.
    fn edge_lines(&self) -> u8 {
        let ddr = self.regs[Register::Ddr as usize];
        ((self.inputs ^ self.regs[Register::Aer as usize]) & !ddr) | ddr
    }

    /// Falling edge on `before -> after` sets the line's pending bit.
    fn detect_edges(&mut self, before: u8, after: u8) {
        let fired = before & !after;
        for (line, &channel) in GPI_CHANNELS.iter().enumerate() {
            if fired & (1 << line) != 0 {
                self.pend(channel);
            }
        }
    }

    fn pend(&mut self, channel: Channels) {
        if self.ier().contains(channel) {
            self.set_pair(Register::Ipra, self.ipr() | channel);
        }
    }

    fn update_timers(&mut self, now: DeviceCycle, signals: &mut Signals) {
        for id in TimerId::ALL {
            let TimerMode::Delay { prescale } = self.timer_mode(id) else {
                continue;
            };
            let layout = &TIMERS[id.index()];
            let enabled = self.ier().contains(layout.channel);
            let data = self.regs[layout.data as usize];
            let result = self.timers[id.index()].recompute(prescale, data, enabled, now);
            if result.expired {
                self.pend(layout.channel);
            }
            if let Some(next) = result.next {
                signals.request_event(next);
            }
        }
    }

    fn update_irq_output(&self, signals: &mut Signals) {
        if self.next_interrupt().is_some() {
            signals.set_irq(MFP_LEVEL);
        } else {
            signals.clear_irq(MFP_LEVEL);
        }
    }
}

impl Device for Mfp68901 {
    fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    fn reset(&mut self, signals: &mut Signals) {
        self.reset_registers();
        signals.clear_irq(MFP_LEVEL);
    }

    fn event(&mut self, cycle: DeviceCycle, signals: &mut Signals) {
        self.update_timers(cycle, signals);
        self.update_irq_output(signals);
    }

    fn read_u8(&mut self, cycle: DeviceCycle, offset: u32, _signals: &mut Signals) -> u8 {
        Register::from_offset(offset).map_or(0, |reg| self.read_register(cycle, reg))
    }

    fn write_u8(&mut self, cycle: DeviceCycle, offset: u32, value: u8, signals: &mut Signals) {
        if let Some(reg) = Register::from_offset(offset) {
            self.write_register(cycle, reg, value, signals);
        }
    }

    fn diagnostic_name(&self, offset: u32) -> Option<&'static str> {
        Register::from_offset(offset).map(Register::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MFP_LEGACY_FREQUENCY;

    fn mfp() -> Mfp68901 {
        let mut mfp = Mfp68901::new(MFP_LEGACY_FREQUENCY);
        mfp.reset(&mut Signals::default());
        mfp
    }

    fn write(mfp: &mut Mfp68901, now: DeviceCycle, reg: Register, value: u8) -> Signals {
        let mut signals = Signals::default();
        mfp.write_register(now, reg, value, &mut signals);
        signals
    }

    fn irq(signals: &Signals) -> Option<bool> {
        signals
            .irq_changes()
            .find(|&(level, _)| level == MFP_LEVEL)
            .map(|(_, raised)| raised)
    }

    /// Timer A at /4 with data 10, enabled and unmasked.
    fn timer_a(mfp: &mut Mfp68901, now: DeviceCycle) {
        write(mfp, now, Register::Tadr, 10);
        write(mfp, now, Register::Iera, 0x20);
        write(mfp, now, Register::Imra, 0x20);
        write(mfp, now, Register::Tacr, 1);
    }

    #[test]
    fn test_register_offsets() {
        assert_eq!(Register::Gpip.offset(), 0x01);
        assert_eq!(Register::Vr.offset(), 0x17);
        assert_eq!(Register::Tadr.offset(), 0x1F);
        assert_eq!(Register::Udr.offset(), 0x2F);
        assert_eq!(Register::from_offset(0x19), Some(Register::Tacr));
        assert_eq!(Register::from_offset(0x18), None);
        assert_eq!(Register::from_offset(0x31), None);
        assert_eq!(mfp().diagnostic_name(0x07), Some("IERA"));
    }

    #[test]
    fn test_even_offsets_are_dead() {
        let mut m = mfp();
        let mut signals = Signals::default();
        m.write_u8(0, 0x1E, 0x55, &mut signals);
        assert_eq!(m.read_u8(0, 0x1E, &mut signals), 0);
        assert_eq!(m.register(Register::Tacr), 0);
        assert_eq!(m.register(Register::Tadr), 0);
    }

    #[test]
    fn test_hardwired_bits_read_zero() {
        let mut m = mfp();
        write(&mut m, 0, Register::Vr, 0xFF);
        write(&mut m, 0, Register::Tcdcr, 0xFF);
        write(&mut m, 0, Register::Ucr, 0xFF);
        assert_eq!(m.read_register(0, Register::Vr), 0xF8);
        assert_eq!(m.read_register(0, Register::Tcdcr), 0x77);
        assert_eq!(m.read_register(0, Register::Ucr), 0xFE);
        write(&mut m, 0, Register::Tacr, 0xFF);
        assert_eq!(m.read_register(0, Register::Tacr), 0x0F);
    }

    #[test]
    fn test_stopped_timer_reads_data() {
        let mut m = mfp();
        write(&mut m, 0, Register::Tbdr, 200);
        for now in [0, 10, 99_999] {
            assert_eq!(m.read_register(now, Register::Tbdr), 200);
        }
    }

    #[test]
    fn test_running_counter() {
        let mut m = mfp();
        timer_a(&mut m, 100);
        assert_eq!(m.timer_timeout(TimerId::A), 140);
        assert_eq!(m.read_register(100, Register::Tadr), 10);
        assert_eq!(m.read_register(120, Register::Tadr), 5);
        assert_eq!(m.read_register(140, Register::Tadr), 10);
    }

    #[test]
    fn test_timer_requests_wake_up_and_pends() {
        let mut m = mfp();
        write(&mut m, 0, Register::Tadr, 10);
        write(&mut m, 0, Register::Iera, 0x20);
        write(&mut m, 0, Register::Imra, 0x20);
        let signals = write(&mut m, 0, Register::Tacr, 1);
        assert_eq!(signals.event(), Some(40));
        assert_eq!(irq(&signals), Some(false));

        let mut signals = Signals::default();
        m.event(40, &mut signals);
        assert!(m.ipr().contains(Channels::TIMER_A));
        assert_eq!(m.read_register(40, Register::Ipra), 0x20);
        assert_eq!(signals.event(), Some(80));
        assert_eq!(irq(&signals), Some(true));
    }

    #[test]
    fn test_disabled_timer_never_pends() {
        let mut m = mfp();
        write(&mut m, 0, Register::Tadr, 10);
        let signals = write(&mut m, 0, Register::Tacr, 1);
        assert_eq!(signals.event(), None);

        // Enabling later does not replay the missed timeouts.
        write(&mut m, 1000, Register::Iera, 0x20);
        assert!(m.ipr().is_empty());
    }

    #[test]
    fn test_stop_timer() {
        let mut m = mfp();
        timer_a(&mut m, 0);
        write(&mut m, 20, Register::Tacr, 0);
        assert_eq!(m.timer_mode(TimerId::A), TimerMode::Stopped);
        assert_eq!(m.timer_timeout(TimerId::A), 0);
        let mut signals = Signals::default();
        m.event(40, &mut signals);
        assert!(m.ipr().is_empty());
        assert_eq!(signals.event(), None);
    }

    #[test]
    fn test_timers_c_and_d_share_control() {
        let mut m = mfp();
        write(&mut m, 0, Register::Tcdcr, 0x51);
        assert_eq!(m.timer_mode(TimerId::C), TimerMode::Delay { prescale: 64 });
        assert_eq!(m.timer_mode(TimerId::D), TimerMode::Delay { prescale: 4 });
        assert_eq!(m.timer_mode(TimerId::A), TimerMode::Stopped);
    }

    #[test]
    fn test_vector_in_hardware_eoi_mode() {
        let mut m = mfp();
        write(&mut m, 0, Register::Vr, 0x40);
        timer_a(&mut m, 0);
        m.event(40, &mut Signals::default());

        let mut signals = Signals::default();
        assert_eq!(m.irq_vector(&mut signals), 0x4D);
        assert!(m.ipr().is_empty());
        assert!(m.isr().is_empty());
        assert_eq!(irq(&signals), Some(false));
    }

    #[test]
    fn test_vector_in_software_eoi_mode() {
        let mut m = mfp();
        write(&mut m, 0, Register::Vr, 0x40 | VR_S);
        timer_a(&mut m, 0);
        m.event(40, &mut Signals::default());
        assert_eq!(m.irq_vector(&mut Signals::default()), 0x4D);
        assert_eq!(m.isr(), Channels::TIMER_A);

        // Next timeout is pending but blocked by its own in-service bit.
        m.event(80, &mut Signals::default());
        assert_eq!(m.next_interrupt(), None);

        write(&mut m, 80, Register::Isra, !0x20);
        assert_eq!(m.next_interrupt(), Some(13));
    }

    #[test]
    fn test_priority_against_in_service() {
        let mut m = mfp();
        write(&mut m, 0, Register::Vr, 0x40 | VR_S);
        for reg in [Register::Iera, Register::Ierb, Register::Imra, Register::Imrb] {
            write(&mut m, 0, reg, 0xFF);
        }
        let mut signals = Signals::default();
        for line in [4, 6, 7] {
            m.set_input(0, line, false, &mut signals);
        }
        assert_eq!(m.ipr(), Channels::GPI4 | Channels::GPI6 | Channels::GPI7);
        assert_eq!(irq(&signals), Some(true));

        assert_eq!(m.irq_vector(&mut signals), 0x4F);
        assert_eq!(m.irq_vector(&mut signals), SPURIOUS_VECTOR);
        assert_eq!(m.ipr(), Channels::GPI4 | Channels::GPI6);
        assert_eq!(m.isr(), Channels::GPI7);

        write(&mut m, 0, Register::Isra, 0x7F);
        assert_eq!(m.irq_vector(&mut signals), 0x4E);
    }

    #[test]
    fn test_spurious_acknowledge_changes_nothing() {
        let mut m = mfp();
        write(&mut m, 0, Register::Vr, 0x40 | VR_S);
        let mut signals = Signals::default();
        assert_eq!(m.irq_vector(&mut signals), SPURIOUS_VECTOR);
        assert!(m.ipr().is_empty());
        assert!(m.isr().is_empty());
        assert_eq!(signals.irq_changes().count(), 0);
    }

    #[test]
    fn test_masked_channel_stays_pending() {
        let mut m = mfp();
        write(&mut m, 0, Register::Iera, 0x20);
        write(&mut m, 0, Register::Tadr, 10);
        write(&mut m, 0, Register::Tacr, 1);
        let mut signals = Signals::default();
        m.event(40, &mut signals);
        assert!(m.ipr().contains(Channels::TIMER_A));
        assert_eq!(irq(&signals), Some(false));

        let signals = write(&mut m, 50, Register::Imra, 0x20);
        assert_eq!(irq(&signals), Some(true));
    }

    #[test]
    fn test_pending_write_zero_clears() {
        let mut m = mfp();
        timer_a(&mut m, 0);
        m.event(40, &mut Signals::default());
        write(&mut m, 41, Register::Ipra, 0xFF);
        assert!(m.ipr().contains(Channels::TIMER_A));
        let signals = write(&mut m, 42, Register::Ipra, !0x20);
        assert!(m.ipr().is_empty());
        assert_eq!(irq(&signals), Some(false));
    }

    #[test]
    fn test_disable_clears_pending_not_in_service() {
        let mut m = mfp();
        write(&mut m, 0, Register::Vr, 0x40 | VR_S);
        timer_a(&mut m, 0);
        m.event(40, &mut Signals::default());
        m.irq_vector(&mut Signals::default());
        m.event(80, &mut Signals::default());
        assert_eq!(m.ipr(), Channels::TIMER_A);

        write(&mut m, 80, Register::Iera, 0);
        assert!(m.ipr().is_empty());
        assert_eq!(m.isr(), Channels::TIMER_A);
    }

    #[test]
    fn test_leaving_software_eoi_flushes_in_service() {
        let mut m = mfp();
        write(&mut m, 0, Register::Vr, 0x40 | VR_S);
        timer_a(&mut m, 0);
        m.event(40, &mut Signals::default());
        m.irq_vector(&mut Signals::default());
        assert_eq!(m.isr(), Channels::TIMER_A);

        write(&mut m, 50, Register::Vr, 0x40);
        assert!(m.isr().is_empty());
    }

    #[test]
    fn test_gpip_edges_follow_aer() {
        let mut m = mfp();
        write(&mut m, 0, Register::Ierb, 0x40);
        let mut signals = Signals::default();

        // AER = 0: falling edge.
        m.set_input(0, 4, true, &mut signals);
        assert!(m.ipr().is_empty());
        m.set_input(0, 4, false, &mut signals);
        assert_eq!(m.ipr(), Channels::GPI4);
        write(&mut m, 0, Register::Iprb, 0);

        // AER = 1: rising edge. Flipping AER on a low line is itself an edge
        // of the XOR, but a rising one.
        write(&mut m, 0, Register::Aer, 0x10);
        assert!(m.ipr().is_empty());
        m.set_input(0, 4, true, &mut signals);
        assert_eq!(m.ipr(), Channels::GPI4);
        assert_eq!(m.read_register(0, Register::Gpip) & 0x10, 0x10);
    }

    #[test]
    fn test_gpip_output_bits_read_back() {
        let mut m = mfp();
        write(&mut m, 0, Register::Ddr, 0x0F);
        write(&mut m, 0, Register::Gpip, 0x05);
        let mut signals = Signals::default();
        m.set_input(0, 7, false, &mut signals);
        assert_eq!(m.read_register(0, Register::Gpip), 0x75);
    }

    #[test]
    fn test_event_count_mode() {
        let mut m = mfp();
        write(&mut m, 0, Register::Iera, 0x20);
        write(&mut m, 0, Register::Tadr, 2);
        write(&mut m, 0, Register::Tacr, 8);
        assert_eq!(m.timer_mode(TimerId::A), TimerMode::EventCount);

        let mut signals = Signals::default();
        m.set_timer_input(TimerId::A, false, &mut signals);
        assert_eq!(m.read_register(0, Register::Tadr), 1);
        m.set_timer_input(TimerId::A, true, &mut signals);
        m.set_timer_input(TimerId::A, false, &mut signals);
        assert_eq!(m.ipr(), Channels::TIMER_A);
        assert_eq!(m.read_register(0, Register::Tadr), 2);
    }

    #[test]
    fn test_pulse_width_mode_is_inert() {
        let mut m = mfp();
        write(&mut m, 0, Register::Iera, 0x20);
        write(&mut m, 0, Register::Tadr, 10);
        let signals = write(&mut m, 0, Register::Tacr, 9);
        assert_eq!(signals.event(), None);
        m.event(1000, &mut Signals::default());
        assert!(m.ipr().is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut m = mfp();
        timer_a(&mut m, 0);
        m.event(40, &mut Signals::default());
        let mut signals = Signals::default();
        m.reset(&mut signals);
        assert!(m.ipr().is_empty());
        assert!(m.ier().is_empty());
        assert_eq!(m.timer_timeout(TimerId::A), 0);
        assert_eq!(m.read_register(0, Register::Gpip), 0xFF);
        assert_eq!(irq(&signals), Some(false));
    }
}
