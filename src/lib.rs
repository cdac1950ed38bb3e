// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed read/write requests for PLCs that speak
//! [Modbus](https://en.wikipedia.org/wiki/Modbus) over TCP.
//!
//! A [`Request`] addresses a resource with a [`ResolvedAddress`] and
//! declares the [`Datatype`] of its values. It is translated into the
//! matching Modbus function, sent over a shared connection and completed
//! with decoded [`Value`]s when the response with the same transaction id
//! arrives. Multiple requests may be in flight at the same time.
//!
//! ```rust,no_run
//! # #[cfg(feature = "tcp")]
//! # async fn read() -> Result<(), Box<dyn std::error::Error>> {
//! use plc_modbus::prelude::*;
//!
//! let stream = tokio::net::TcpStream::connect("192.168.0.222:502").await?;
//! let ctx = tcp::attach_slave(stream, Slave(1));
//! let address: ResolvedAddress = "holdingregister:1".parse()?;
//! let result = ctx.read_values(address, Datatype::Int32, 1).await?;
//! println!("{:?}", result.values);
//! # Ok(())
//! # }
//! ```

#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(unreachable_pub)]
#![warn(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod prelude;

pub mod address;
pub use self::address::{ResolvedAddress, ResourceKind};

#[cfg(feature = "tcp")]
pub mod client;

pub mod correlation;
pub use self::correlation::{Correlator, Delivery, ResultHandle, Sequential, TransactionIds};

pub mod mapper;

pub mod request;
pub use self::request::{
    OperationKind, ReadRequest, ReadResult, Request, Response, ResponseCode, WriteRequest,
    WriteResult,
};

pub mod value;
pub use self::value::{Datatype, Value};

mod codec;

mod error;
pub use self::error::Error;

mod frame;
pub use self::frame::{
    tcp::{Header, RequestAdu, ResponseAdu, TransactionId, UnitId},
    Address, Coil, ExceptionCode, ExceptionResponse, FunctionCode, Quantity, WireOperation,
    WireRequest, WireResponse, Word,
};

mod service;

mod slave;
pub use self::slave::Slave;

/// Specialized [`std::result::Result`] type
pub type Result<T> = std::result::Result<T, Error>;

pub(crate) mod bytes {
    pub(crate) use ::bytes::*;
}
