// SPDX-FileCopyrightText: Copyright (c) 2017-2023 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;

use crate::bytes::Bytes;

pub type TransactionId = u16;
pub type UnitId = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub transaction_id: TransactionId,
    pub unit_id: UnitId,
}

/// An outgoing frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAdu {
    pub hdr: Header,
    pub pdu: WireRequest,
}

/// An incoming frame.
///
/// The PDU stays undecoded until it can be interpreted in the context
/// of the originating request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseAdu {
    pub hdr: Header,
    pub pdu: Bytes,
}

impl ResponseAdu {
    #[must_use]
    pub fn new(transaction_id: TransactionId, unit_id: UnitId, pdu: impl Into<Bytes>) -> Self {
        Self {
            hdr: Header {
                transaction_id,
                unit_id,
            },
            pdu: pdu.into(),
        }
    }
}
