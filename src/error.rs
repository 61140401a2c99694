//! Error handling for the bus and the machine.

use thiserror::Error;

use crate::device::{Access, BusFault};

/// Convenient result alias for bus and machine operations.
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors that may occur while configuring or running the machine.
#[derive(Debug, Error)]
pub enum BusError {
    /// An access hit an address no chip answers.
    #[error("bus error: {access} at 0x{address:06X}")]
    BusFault {
        /// 24-bit address of the faulting access.
        address: u32,
        /// Kind of access.
        access: Access,
    },
    /// `device_by_name` found no chip with that name.
    #[error("unknown device '{0}'")]
    UnknownDevice(String),
    /// An upload would run past the end of RAM.
    #[error("upload of {len} bytes at 0x{address:06X} does not fit in RAM")]
    Upload {
        /// Destination address.
        address: u32,
        /// Payload length.
        len: usize,
    },
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Configuration file could not be parsed.
    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// IO error while reading a configuration file or ROM image.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BusFault> for BusError {
    fn from(fault: BusFault) -> Self {
        BusError::BusFault {
            address: fault.address,
            access: fault.access,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_fault_message() {
        let err = BusError::BusFault {
            address: 0xFF8A00,
            access: Access::WriteWord,
        };
        assert_eq!(err.to_string(), "bus error: word write at 0xFF8A00");
    }
}
