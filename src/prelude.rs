// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types and traits

///////////////////////////////////////////////////////////////////
/// Modules
///////////////////////////////////////////////////////////////////
#[cfg(feature = "tcp")]
pub use crate::client;

#[allow(missing_docs)]
#[cfg(feature = "tcp")]
pub mod tcp {
    pub use crate::client::tcp::*;
}

///////////////////////////////////////////////////////////////////
/// Types
///////////////////////////////////////////////////////////////////
pub use crate::{
    Datatype, Error, ReadResult, Request, ResolvedAddress, ResourceKind, Response, ResponseCode,
    Result, Slave, Value, WriteResult,
};

///////////////////////////////////////////////////////////////////
/// Traits
///////////////////////////////////////////////////////////////////
#[cfg(feature = "tcp")]
pub use crate::client::{Client, Reader, Writer};
