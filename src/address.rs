// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolved addresses of the addressable resources of a device.

use std::{fmt, str::FromStr};

use crate::{
    frame::{Address, Word},
    Error, Result,
};

/// The kind of addressable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Single-bit, read/write.
    Coil,
    /// Single-bit, read-only.
    DiscreteInput,
    /// 16-bit word, read/write.
    HoldingRegister,
    /// 16-bit word, read-only.
    InputRegister,
    /// A holding register updated through an AND and an OR mask.
    MaskWriteRegister,
}

impl ResourceKind {
    /// Whether the resource is addressed bit by bit.
    #[must_use]
    pub const fn is_bit(self) -> bool {
        matches!(self, Self::Coil | Self::DiscreteInput)
    }

    const fn prefix(self) -> &'static str {
        match self {
            Self::Coil => "coil",
            Self::DiscreteInput => "readdiscreteinputs",
            Self::HoldingRegister => "readholdingregisters",
            Self::InputRegister => "readinputregisters",
            Self::MaskWriteRegister => "maskwrite",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Coil => "coil",
            Self::DiscreteInput => "discrete input",
            Self::HoldingRegister => "holding register",
            Self::InputRegister => "input register",
            Self::MaskWriteRegister => "mask write register",
        };
        f.write_str(name)
    }
}

/// An already resolved address.
///
/// Immutable once constructed. Only [`ResourceKind::MaskWriteRegister`]
/// addresses carry the AND and OR masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedAddress {
    kind: ResourceKind,
    start: Address,
    masks: Option<(Word, Word)>,
}

impl ResolvedAddress {
    #[must_use]
    pub const fn coil(start: Address) -> Self {
        Self::simple(ResourceKind::Coil, start)
    }

    #[must_use]
    pub const fn discrete_input(start: Address) -> Self {
        Self::simple(ResourceKind::DiscreteInput, start)
    }

    #[must_use]
    pub const fn holding_register(start: Address) -> Self {
        Self::simple(ResourceKind::HoldingRegister, start)
    }

    #[must_use]
    pub const fn input_register(start: Address) -> Self {
        Self::simple(ResourceKind::InputRegister, start)
    }

    #[must_use]
    pub const fn mask_write_register(start: Address, and_mask: Word, or_mask: Word) -> Self {
        Self {
            kind: ResourceKind::MaskWriteRegister,
            start,
            masks: Some((and_mask, or_mask)),
        }
    }

    const fn simple(kind: ResourceKind, start: Address) -> Self {
        Self {
            kind,
            start,
            masks: None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The 0-based protocol address of the first item.
    #[must_use]
    pub const fn start(&self) -> Address {
        self.start
    }

    /// The AND and OR masks of a mask write register.
    #[must_use]
    pub const fn masks(&self) -> Option<(Word, Word)> {
        self.masks
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.prefix(), self.start)?;
        if let Some((and_mask, or_mask)) = self.masks {
            write!(f, "/{and_mask}/{or_mask}")?;
        }
        Ok(())
    }
}

/// Parses `<kind>:<start>` or `maskwrite:<start>/<and>/<or>`.
impl FromStr for ResolvedAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidAddress(s.to_owned());
        let (prefix, rest) = s.split_once(':').ok_or_else(invalid)?;
        let number = |field: &str| field.trim().parse::<u16>().map_err(|_| invalid());
        let kind = match prefix.trim().to_ascii_lowercase().as_str() {
            "coil" | "coils" => ResourceKind::Coil,
            "readdiscreteinputs" | "discreteinput" | "discreteinputs" => {
                ResourceKind::DiscreteInput
            }
            "readholdingregisters" | "holdingregister" | "holdingregisters" | "register" => {
                ResourceKind::HoldingRegister
            }
            "readinputregisters" | "inputregister" | "inputregisters" => {
                ResourceKind::InputRegister
            }
            "maskwrite" | "maskwriteregister" => {
                let mut fields = rest.split('/');
                let (Some(start), Some(and_mask), Some(or_mask), None) =
                    (fields.next(), fields.next(), fields.next(), fields.next())
                else {
                    return Err(invalid());
                };
                return Ok(Self::mask_write_register(
                    number(start)?,
                    number(and_mask)?,
                    number(or_mask)?,
                ));
            }
            _ => return Err(invalid()),
        };
        Ok(Self::simple(kind, number(rest)?))
    }
}
