// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod tcp;

use std::{error, fmt};

/// Declares a one-byte protocol code with named values and a fallback
/// variant named in parentheses.
macro_rules! byte_code {
    (
        $(#[$meta:meta])*
        pub enum $name:ident($other:ident) {
            $($(#[$doc:meta])* $variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$doc])* $variant,)+
            /// Any other value.
            $other(u8),
        }

        impl $name {
            #[must_use]
            pub const fn new(value: u8) -> Self {
                match value {
                    $($value => Self::$variant,)+
                    value => Self::$other(value),
                }
            }

            #[must_use]
            pub const fn value(self) -> u8 {
                match self {
                    $(Self::$variant => $value,)+
                    Self::$other(value) => value,
                }
            }
        }

        impl From<u8> for $name {
            fn from(value: u8) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for u8 {
            fn from(code: $name) -> Self {
                code.value()
            }
        }
    };
}

byte_code! {
    /// A Modbus function code.
    ///
    /// Only the data access functions are named.
    pub enum FunctionCode(Custom) {
        /// `0x01`
        ReadCoils = 0x01,
        /// `0x02`
        ReadDiscreteInputs = 0x02,
        /// `0x03`
        ReadHoldingRegisters = 0x03,
        /// `0x04`
        ReadInputRegisters = 0x04,
        /// `0x05`
        WriteSingleCoil = 0x05,
        /// `0x06`
        WriteSingleRegister = 0x06,
        /// `0x0F`
        WriteMultipleCoils = 0x0F,
        /// `0x10`
        WriteMultipleRegisters = 0x10,
        /// `0x16`
        MaskWriteRegister = 0x16,
    }
}

impl fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

byte_code! {
    /// The reason a device gives for rejecting a request.
    pub enum ExceptionCode(Custom) {
        IllegalFunction = 0x01,
        IllegalDataAddress = 0x02,
        IllegalDataValue = 0x03,
        ServerDeviceFailure = 0x04,
        Acknowledge = 0x05,
        ServerDeviceBusy = 0x06,
        MemoryParityError = 0x08,
        GatewayPathUnavailable = 0x0A,
        GatewayTargetDevice = 0x0B,
    }
}

impl ExceptionCode {
    pub(crate) const fn description(self) -> &'static str {
        match self {
            Self::IllegalFunction => "Illegal function",
            Self::IllegalDataAddress => "Illegal data address",
            Self::IllegalDataValue => "Illegal data value",
            Self::ServerDeviceFailure => "Server device failure",
            Self::Acknowledge => "Acknowledge",
            Self::ServerDeviceBusy => "Server device busy",
            Self::MemoryParityError => "Memory parity error",
            Self::GatewayPathUnavailable => "Gateway path unavailable",
            Self::GatewayTargetDevice => "Gateway target device failed to respond",
            Self::Custom(_) => "Custom",
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl error::Error for ExceptionCode {}

/// Zero-based protocol address of a coil, input or register.
pub type Address = u16;

/// A single bit. `true` is sent as `0xFF00` by single coil writes.
pub type Coil = bool;

/// A big-endian 16 bit register.
pub type Word = u16;

/// Number of bits or registers covered by a request.
pub type Quantity = u16;

/// The wire operation selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireOperation {
    ReadCoils,
    ReadDiscreteInputs,
    ReadHoldingRegisters,
    ReadInputRegisters,
    WriteSingleCoil,
    WriteMultipleCoils,
    WriteSingleRegister,
    WriteMultipleRegisters,
    MaskWriteRegister,
}

impl WireOperation {
    #[must_use]
    pub const fn function_code(self) -> FunctionCode {
        match self {
            Self::ReadCoils => FunctionCode::ReadCoils,
            Self::ReadDiscreteInputs => FunctionCode::ReadDiscreteInputs,
            Self::ReadHoldingRegisters => FunctionCode::ReadHoldingRegisters,
            Self::ReadInputRegisters => FunctionCode::ReadInputRegisters,
            Self::WriteSingleCoil => FunctionCode::WriteSingleCoil,
            Self::WriteMultipleCoils => FunctionCode::WriteMultipleCoils,
            Self::WriteSingleRegister => FunctionCode::WriteSingleRegister,
            Self::WriteMultipleRegisters => FunctionCode::WriteMultipleRegisters,
            Self::MaskWriteRegister => FunctionCode::MaskWriteRegister,
        }
    }
}

/// A request PDU. Every variant starts with the target address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireRequest {
    /// Number of coils to read.
    ReadCoils(Address, Quantity),
    /// Number of discrete inputs to read.
    ReadDiscreteInputs(Address, Quantity),
    /// Number of registers to read.
    ReadHoldingRegisters(Address, Quantity),
    /// Number of registers to read.
    ReadInputRegisters(Address, Quantity),
    WriteSingleCoil(Address, Coil),
    WriteMultipleCoils(Address, Vec<Coil>),
    WriteSingleRegister(Address, Word),
    WriteMultipleRegisters(Address, Vec<Word>),
    /// AND mask followed by OR mask.
    MaskWriteRegister(Address, Word, Word),
}

impl WireRequest {
    #[must_use]
    pub const fn operation(&self) -> WireOperation {
        match self {
            Self::ReadCoils(..) => WireOperation::ReadCoils,
            Self::ReadDiscreteInputs(..) => WireOperation::ReadDiscreteInputs,
            Self::ReadHoldingRegisters(..) => WireOperation::ReadHoldingRegisters,
            Self::ReadInputRegisters(..) => WireOperation::ReadInputRegisters,
            Self::WriteSingleCoil(..) => WireOperation::WriteSingleCoil,
            Self::WriteMultipleCoils(..) => WireOperation::WriteMultipleCoils,
            Self::WriteSingleRegister(..) => WireOperation::WriteSingleRegister,
            Self::WriteMultipleRegisters(..) => WireOperation::WriteMultipleRegisters,
            Self::MaskWriteRegister(..) => WireOperation::MaskWriteRegister,
        }
    }

    #[must_use]
    pub const fn function_code(&self) -> FunctionCode {
        self.operation().function_code()
    }

    /// The first address the request refers to.
    #[must_use]
    pub const fn address(&self) -> Address {
        match self {
            Self::ReadCoils(address, _)
            | Self::ReadDiscreteInputs(address, _)
            | Self::ReadHoldingRegisters(address, _)
            | Self::ReadInputRegisters(address, _)
            | Self::WriteSingleCoil(address, _)
            | Self::WriteMultipleCoils(address, _)
            | Self::WriteSingleRegister(address, _)
            | Self::WriteMultipleRegisters(address, _)
            | Self::MaskWriteRegister(address, _, _) => *address,
        }
    }
}

/// A successful response PDU.
///
/// Bit reads contain every bit of the received bytes, so their length is
/// a multiple of 8 and only the requested prefix is meaningful. Write
/// acknowledgements keep the raw echoed fields for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireResponse {
    ReadCoils(Vec<Coil>),
    ReadDiscreteInputs(Vec<Coil>),
    ReadHoldingRegisters(Vec<Word>),
    ReadInputRegisters(Vec<Word>),
    /// Echoed address and raw coil word.
    WriteSingleCoil(Address, Word),
    /// Echoed start address and quantity.
    WriteMultipleCoils(Address, Quantity),
    WriteSingleRegister(Address, Word),
    /// Echoed start address and quantity.
    WriteMultipleRegisters(Address, Quantity),
    MaskWriteRegister(Address, Word, Word),
    /// Uninterpreted payload following an unknown function code.
    Custom(u8, Vec<u8>),
}

impl WireResponse {
    #[must_use]
    pub const fn function_code(&self) -> FunctionCode {
        match self {
            Self::ReadCoils(_) => FunctionCode::ReadCoils,
            Self::ReadDiscreteInputs(_) => FunctionCode::ReadDiscreteInputs,
            Self::ReadHoldingRegisters(_) => FunctionCode::ReadHoldingRegisters,
            Self::ReadInputRegisters(_) => FunctionCode::ReadInputRegisters,
            Self::WriteSingleCoil(..) => FunctionCode::WriteSingleCoil,
            Self::WriteMultipleCoils(..) => FunctionCode::WriteMultipleCoils,
            Self::WriteSingleRegister(..) => FunctionCode::WriteSingleRegister,
            Self::WriteMultipleRegisters(..) => FunctionCode::WriteMultipleRegisters,
            Self::MaskWriteRegister(..) => FunctionCode::MaskWriteRegister,
            Self::Custom(code, _) => FunctionCode::Custom(*code),
        }
    }
}

/// A device rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionResponse {
    pub function: FunctionCode,
    pub exception: ExceptionCode,
}

impl fmt::Display for ExceptionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modbus function {}: {}", self.function, self.exception)
    }
}

impl error::Error for ExceptionResponse {}

/// A decoded response PDU, either data or an exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResponsePdu(pub(crate) Result<WireResponse, ExceptionResponse>);

impl From<WireResponse> for ResponsePdu {
    fn from(from: WireResponse) -> Self {
        Self(Ok(from))
    }
}

impl From<ExceptionResponse> for ResponsePdu {
    fn from(from: ExceptionResponse) -> Self {
        Self(Err(from))
    }
}
