//! MFP Timer Channels
//!
//! A running timer is modelled by the MFP cycle of its next timeout rather
//! than by ticking a counter: the counter value is derived from the distance
//! to that timeout whenever the processor reads the data register.

use crate::cycles::DeviceCycle;

/// Prescaler divisors, indexed by the low three bits of the control field.
pub(crate) const PRESCALE: [u64; 8] = [0, 4, 10, 16, 50, 64, 100, 200];

/// The four MFP timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Timer A (channel 13)
    A,
    /// Timer B (channel 8)
    B,
    /// Timer C (channel 5)
    C,
    /// Timer D (channel 4)
    D,
}

impl TimerId {
    /// All timers in register order.
    pub const ALL: [TimerId; 4] = [TimerId::A, TimerId::B, TimerId::C, TimerId::D];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Operating mode selected by a timer's control field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Counter frozen
    Stopped,
    /// Counts down on the prescaled MFP clock
    Delay {
        /// MFP cycles per count
        prescale: u64,
    },
    /// Counts active edges on TAI/TBI
    EventCount,
    /// Delay mode gated by TAI/TBI; not modelled
    PulseWidth {
        /// MFP cycles per count
        prescale: u64,
    },
}

impl TimerMode {
    /// Decode a control field (4 bits for timers A/B, 3 bits for C/D).
    pub fn from_control(field: u8) -> Self {
        let field = field & 0x0F;
        match field {
            0 => TimerMode::Stopped,
            1..=7 => TimerMode::Delay {
                prescale: PRESCALE[usize::from(field)],
            },
            8 => TimerMode::EventCount,
            _ => TimerMode::PulseWidth {
                prescale: PRESCALE[usize::from(field & 7)],
            },
        }
    }
}

/// Reload value of a data register; 0 counts 256.
pub(crate) fn period(data: u8) -> u64 {
    match data {
        0 => 256,
        n => u64::from(n),
    }
}

/// Outcome of a timeout recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Recompute {
    /// A timeout passed and the channel is enabled: set its pending bit.
    pub expired: bool,
    /// Wake-up to request, if the channel is enabled.
    pub next: Option<DeviceCycle>,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TimerState {
    /// Next timeout in MFP cycles, 0 when not counting on the clock
    timeout: DeviceCycle,
    /// Event-count mode counter
    events: u64,
}

impl TimerState {
    pub fn reset(&mut self) {
        *self = TimerState::default();
    }

    pub fn timeout(&self) -> DeviceCycle {
        self.timeout
    }

    /// Current counter value, 1..=256 (256 reads back as 0).
    ///
    /// A stopped timer reads its data register unchanged.
    pub fn count(&self, mode: TimerMode, data: u8, now: DeviceCycle) -> u64 {
        match mode {
            TimerMode::Delay { prescale } if self.timeout != 0 => {
                if now < self.timeout {
                    (self.timeout - now).div_ceil(prescale)
                } else {
                    let p = period(data);
                    let elapsed = (now - self.timeout) / prescale;
                    p - elapsed % p
                }
            }
            TimerMode::EventCount => self.events,
            _ => u64::from(data),
        }
    }

    /// Apply a control field change made at `now`.
    pub fn reconfigure(&mut self, old: TimerMode, new: TimerMode, data: u8, now: DeviceCycle) {
        if old == new {
            return;
        }
        match (old, new) {
            // A prescale change carries on from the current count.
            (TimerMode::Delay { .. }, TimerMode::Delay { prescale }) => {
                let remaining = self.count(old, data, now);
                self.timeout = now + remaining * prescale;
            }
            (_, TimerMode::Delay { prescale }) => {
                self.timeout = now + period(data) * prescale;
            }
            (_, TimerMode::EventCount) => {
                self.timeout = 0;
                self.events = period(data);
            }
            _ => self.timeout = 0,
        }
    }

    /// Bring a delay-mode timer up to `now`.
    ///
    /// A disabled channel still advances its timeout so that counter reads
    /// stay free-running, but it never reports an expiry or a wake-up.
    pub fn recompute(
        &mut self,
        prescale: u64,
        data: u8,
        enabled: bool,
        now: DeviceCycle,
    ) -> Recompute {
        let wrap = period(data) * prescale;
        let mut expired = false;
        if self.timeout == 0 {
            self.timeout = now + wrap;
        } else if self.timeout <= now {
            let elapsed = now - self.timeout;
            self.timeout = now + wrap - elapsed % wrap;
            expired = true;
        }
        Recompute {
            expired: expired && enabled,
            next: enabled.then_some(self.timeout),
        }
    }

    /// Count one active input edge. Returns true when the counter wraps.
    pub fn count_event(&mut self, data: u8) -> bool {
        self.events = self.events.saturating_sub(1);
        if self.events == 0 {
            self.events = period(data);
            true
        } else {
            false
        }
    }
}
