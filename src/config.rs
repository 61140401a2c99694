//! Machine configuration.
//!
//! The defaults describe a 4 MiB PAL Atari ST with the MFP clocked at 4 MHz.
//! A configuration can be loaded from JSON; missing fields keep their default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{CPU_FREQUENCY, MFP_HARDWARE_FREQUENCY, RAM_SIZE, VBL_PERIOD};
use crate::error::{BusError, Result};

/// MFP clock choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MfpClock {
    /// Half the processor clock (4 MHz on an 8 MHz machine). Timer periods
    /// match existing SNDH replay timing.
    #[default]
    Legacy,
    /// 2.4576 MHz, the crystal fitted to real machines.
    Hardware,
}

impl MfpClock {
    /// Clock rate in Hz on a machine clocked at `cpu_frequency`.
    pub fn frequency(self, cpu_frequency: u32) -> u32 {
        match self {
            MfpClock::Legacy => cpu_frequency / 2,
            MfpClock::Hardware => MFP_HARDWARE_FREQUENCY,
        }
    }
}

/// Static machine parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Processor (machine) clock in Hz.
    pub cpu_frequency: u32,
    /// MFP clock.
    pub mfp_clock: MfpClock,
    /// Vertical blank period in machine cycles.
    pub vbl_period: u64,
    /// RAM size in bytes.
    pub ram_size: u32,
    /// Optional TOS image mapped at the ROM window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rom_image: Option<PathBuf>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            cpu_frequency: CPU_FREQUENCY,
            mfp_clock: MfpClock::Legacy,
            vbl_period: VBL_PERIOD,
            ram_size: RAM_SIZE,
            rom_image: None,
        }
    }
}

impl MachineConfig {
    /// Select the MFP clock.
    pub fn with_mfp_clock(mut self, clock: MfpClock) -> Self {
        self.mfp_clock = clock;
        self
    }

    /// MFP clock rate in Hz.
    pub fn mfp_frequency(&self) -> u32 {
        self.mfp_clock.frequency(self.cpu_frequency)
    }

    /// Reject parameters the machine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cpu_frequency == 0 {
            return Err(BusError::Config("cpu_frequency must be non-zero".into()));
        }
        if self.mfp_frequency() == 0 {
            return Err(BusError::Config(format!(
                "cpu_frequency {} leaves the mfp without a clock",
                self.cpu_frequency
            )));
        }
        if self.vbl_period == 0 {
            return Err(BusError::Config("vbl_period must be non-zero".into()));
        }
        if self.ram_size == 0 || self.ram_size > RAM_SIZE {
            return Err(BusError::Config(format!(
                "ram_size {} outside 1..={}",
                self.ram_size, RAM_SIZE
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MachineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
