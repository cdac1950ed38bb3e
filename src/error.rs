// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types.

use std::{io, string::FromUtf8Error};

use thiserror::Error;

use crate::{address::ResourceKind, frame::tcp::TransactionId, request::OperationKind, Datatype};

/// Errors of the request/response translation and correlation layer.
///
/// Exception responses sent by the remote device are not errors. They are
/// reported through [`crate::ResponseCode::Exception`] on the result.
#[derive(Debug, Error)]
pub enum Error {
    /// The datatype is not one of the fixed set supported by the protocol,
    /// or it cannot be represented on the addressed resource.
    #[error("unsupported datatype: {0}")]
    UnsupportedDatatype(String),

    /// A value does not match the datatype declared on the request.
    #[error("datatype mismatch: expected {expected}, actual {actual}")]
    DatatypeMismatch { expected: Datatype, actual: Datatype },

    /// No wire operation exists for this combination.
    #[error("unsupported operation: {operation} on {resource}")]
    UnsupportedOperation {
        operation: OperationKind,
        resource: ResourceKind,
    },

    /// A write request without any value.
    #[error("missing value")]
    MissingValue,

    /// The number of items is zero or exceeds the protocol limit.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(usize),

    /// A single register write with a value wider than one register.
    #[error("{datatype} value does not fit into a single register")]
    ValueTooWide { datatype: Datatype },

    /// The encoded request PDU exceeds the protocol maximum.
    #[error("request PDU size exceeded: {0} bytes")]
    PduSizeExceeded(usize),

    /// Fewer bytes are available than the declared datatype and count require.
    #[error("short buffer: expected {expected} bytes, actual {actual}")]
    ShortBuffer { expected: usize, actual: usize },

    /// Text bytes are not valid UTF-8.
    #[error("invalid text: {0}")]
    InvalidText(#[from] FromUtf8Error),

    /// Text to be written contains the zero terminator byte.
    #[error("text contains a terminator byte at {0}")]
    TerminatorInText(usize),

    /// The response payload is inconsistent with the originating request.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A frame arrived for a transaction that is not pending.
    ///
    /// Only recorded for observability, never returned to a caller.
    #[error("unmatched response: transaction {0}")]
    UnmatchedResponse(TransactionId),

    /// An address string does not follow the address grammar.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Every transaction id is occupied by a pending request.
    #[error("no free transaction id")]
    TransactionIdsExhausted,

    /// No response arrived within the configured timeout.
    #[error("response timeout")]
    Timeout,

    /// The connection was closed before the response arrived.
    #[error("connection closed")]
    ConnectionClosed,

    /// Error of the underlying transport.
    #[error(transparent)]
    Transport(#[from] io::Error),
}

impl Error {
    /// Reports insufficient payload as a malformed response.
    pub(crate) fn into_malformed(self) -> Self {
        match self {
            Self::ShortBuffer { .. } | Self::InvalidText(_) => {
                Self::MalformedResponse(self.to_string())
            }
            err => err,
        }
    }
}
