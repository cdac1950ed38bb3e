// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vendor-neutral read/write requests and their typed results.

use std::fmt;

use crate::{
    frame::{ExceptionCode, FunctionCode, Quantity},
    Datatype, ResolvedAddress, Value,
};

/// Read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Read,
    Write,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Read `count` consecutive items of `datatype`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadRequest {
    pub address: ResolvedAddress,
    pub datatype: Datatype,
    pub count: Quantity,
}

/// Write one or more values of `datatype`.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    pub address: ResolvedAddress,
    pub datatype: Datatype,
    pub values: Vec<Value>,
}

/// A request carrying exactly one addressed item.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Read(ReadRequest),
    Write(WriteRequest),
}

impl Request {
    /// Read a single item.
    #[must_use]
    pub fn read(address: ResolvedAddress, datatype: Datatype) -> Self {
        Self::read_many(address, datatype, 1)
    }

    /// Read `count` consecutive items.
    #[must_use]
    pub fn read_many(address: ResolvedAddress, datatype: Datatype, count: Quantity) -> Self {
        Self::Read(ReadRequest {
            address,
            datatype,
            count,
        })
    }

    /// Write `values`, which are expected to be of `datatype`.
    #[must_use]
    pub fn write(
        address: ResolvedAddress,
        datatype: Datatype,
        values: impl Into<Vec<Value>>,
    ) -> Self {
        Self::Write(WriteRequest {
            address,
            datatype,
            values: values.into(),
        })
    }

    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Read(_) => OperationKind::Read,
            Self::Write(_) => OperationKind::Write,
        }
    }

    #[must_use]
    pub const fn address(&self) -> &ResolvedAddress {
        match self {
            Self::Read(read) => &read.address,
            Self::Write(write) => &write.address,
        }
    }

    #[must_use]
    pub const fn datatype(&self) -> Datatype {
        match self {
            Self::Read(read) => read.datatype,
            Self::Write(write) => write.datatype,
        }
    }

    /// Number of items to read or to write.
    #[must_use]
    pub fn item_count(&self) -> usize {
        match self {
            Self::Read(read) => read.count.into(),
            Self::Write(write) => write.values.len(),
        }
    }
}

/// Outcome status of a request that reached the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Ok,
    /// A write acknowledgement did not echo the written address or parameters.
    EchoMismatch,
    /// The device answered with a different function.
    UnexpectedFunction(FunctionCode),
    /// The device answered with an exception response.
    Exception(ExceptionCode),
}

impl ResponseCode {
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Values read in request order.
///
/// On success `values` holds exactly the requested number of items,
/// otherwise it is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResult {
    pub code: ResponseCode,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    pub code: ResponseCode,
}

/// The decoded result delivered to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Read(ReadResult),
    Write(WriteResult),
}

impl Response {
    pub(crate) fn failed(request: &Request, code: ResponseCode) -> Self {
        match request {
            Request::Read(_) => Self::Read(ReadResult {
                code,
                values: Vec::new(),
            }),
            Request::Write(_) => Self::Write(WriteResult { code }),
        }
    }

    #[must_use]
    pub const fn code(&self) -> ResponseCode {
        match self {
            Self::Read(read) => read.code,
            Self::Write(write) => write.code,
        }
    }
}
