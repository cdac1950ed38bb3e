// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unit identifiers

use std::fmt;

use crate::frame::tcp::UnitId;

/// A single byte for addressing a logical device behind a connection.
///
/// Sent as the unit identifier of every frame and expected to be echoed
/// by every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slave(pub UnitId);

impl Slave {
    /// The minimum address of a single device.
    #[must_use]
    pub const fn min_device() -> Self {
        Slave(1)
    }

    /// The maximum address of a single device.
    #[must_use]
    pub const fn max_device() -> Self {
        Slave(247)
    }

    /// The reserved unit identifier of a directly connected TCP device,
    /// i.e. if the request is not forwarded by a gateway.
    #[must_use]
    pub const fn tcp_device() -> Self {
        Slave(255)
    }

    #[must_use]
    pub fn is_single_device(self) -> bool {
        self >= Self::min_device() && self <= Self::max_device()
    }
}

impl From<UnitId> for Slave {
    fn from(from: UnitId) -> Self {
        Slave(from)
    }
}

impl From<Slave> for UnitId {
    fn from(from: Slave) -> Self {
        from.0
    }
}

impl fmt::Display for Slave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:0>2X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format() {
        assert_eq!(Slave(0).to_string(), "0x00");
        assert_eq!(Slave(9).to_string(), "0x09");
        assert_eq!(Slave::tcp_device().to_string(), "0xFF");
    }

    #[test]
    fn device_ranges() {
        assert!(!Slave(0).is_single_device());
        assert!(Slave::min_device().is_single_device());
        assert!(Slave::max_device().is_single_device());
        assert!(!Slave::tcp_device().is_single_device());
        assert_eq!(UnitId::from(Slave::from(17)), 17);
    }
}
