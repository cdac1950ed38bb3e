// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation between typed requests and wire PDUs.
//!
//! Registers are 16 bit words. A value with an odd encoded width occupies
//! the next even number of bytes: numbers are zero-padded on the left and
//! text is padded after its terminator. The same layout applies when
//! reading registers.
//!
//! The quantity of a register read is the number of requested items, not
//! the number of registers they occupy. A device that answers with only
//! `quantity` registers for multi-word items yields a malformed response.
//!
//! A single register write of an `int32` or `timestamp` value is narrowed
//! to one register when the value fits into 16 bits, either signed or
//! unsigned.

use byteorder::{BigEndian, ByteOrder as _};

use crate::{
    address::ResourceKind,
    bytes::{BufMut as _, Bytes, BytesMut},
    codec::{bool_to_coil, request_pdu_size, MAX_PDU_SIZE},
    frame::{
        ExceptionResponse, Quantity, ResponsePdu, WireOperation, WireRequest, WireResponse, Word,
    },
    request::{
        OperationKind, ReadRequest, ReadResult, Request, Response, ResponseCode, WriteResult,
    },
    value::{self, unsupported_on_bits},
    Datatype, Error, ResolvedAddress, Result, Value,
};

/// Maximum number of coils or discrete inputs per read request.
const MAX_READ_BITS: usize = 2000;

/// Maximum number of registers per read request.
const MAX_READ_WORDS: usize = 125;

/// Selects the wire operation for an operation on `address`.
pub fn classify(
    address: &ResolvedAddress,
    operation: OperationKind,
    item_count: usize,
) -> Result<WireOperation> {
    use ResourceKind::*;

    let wire_operation = match (operation, address.kind()) {
        (OperationKind::Read, Coil) => WireOperation::ReadCoils,
        (OperationKind::Read, DiscreteInput) => WireOperation::ReadDiscreteInputs,
        (OperationKind::Read, HoldingRegister) => WireOperation::ReadHoldingRegisters,
        (OperationKind::Read, InputRegister) => WireOperation::ReadInputRegisters,
        (OperationKind::Write, Coil) if item_count > 1 => WireOperation::WriteMultipleCoils,
        (OperationKind::Write, Coil) => WireOperation::WriteSingleCoil,
        (OperationKind::Write, HoldingRegister) if item_count > 1 => {
            WireOperation::WriteMultipleRegisters
        }
        (OperationKind::Write, HoldingRegister) => WireOperation::WriteSingleRegister,
        (OperationKind::Write, MaskWriteRegister) => WireOperation::MaskWriteRegister,
        (operation, resource) => {
            return Err(Error::UnsupportedOperation {
                operation,
                resource,
            })
        }
    };
    Ok(wire_operation)
}

/// Builds the request PDU for `request`.
pub fn build_pdu(request: &Request) -> Result<WireRequest> {
    if let Request::Write(write) = request {
        if write.values.is_empty() {
            return Err(Error::MissingValue);
        }
    }
    let address = request.address();
    let start = address.start();
    let datatype = request.datatype();
    let operation = classify(address, request.kind(), request.item_count())?;

    let pdu = match (operation, request) {
        (_, Request::Read(read)) => {
            let count = read_quantity(read)?;
            match operation {
                WireOperation::ReadCoils => WireRequest::ReadCoils(start, count),
                WireOperation::ReadDiscreteInputs => WireRequest::ReadDiscreteInputs(start, count),
                WireOperation::ReadHoldingRegisters => {
                    WireRequest::ReadHoldingRegisters(start, count)
                }
                _ => WireRequest::ReadInputRegisters(start, count),
            }
        }
        (WireOperation::WriteSingleCoil, Request::Write(write)) => {
            WireRequest::WriteSingleCoil(start, write.values[0].to_bit()?)
        }
        (WireOperation::WriteMultipleCoils, Request::Write(write)) => {
            let coils = write
                .values
                .iter()
                .map(Value::to_bit)
                .collect::<Result<Vec<_>>>()?;
            WireRequest::WriteMultipleCoils(start, coils)
        }
        (WireOperation::WriteSingleRegister, Request::Write(write)) => {
            let word = single_register_word(&write.values[0], datatype)?;
            WireRequest::WriteSingleRegister(start, word)
        }
        (WireOperation::WriteMultipleRegisters, Request::Write(write)) => {
            WireRequest::WriteMultipleRegisters(start, register_words(&write.values, datatype)?)
        }
        (_, Request::Write(_)) => {
            // The value is required but never transmitted.
            let Some((and_mask, or_mask)) = address.masks() else {
                return Err(Error::InvalidAddress(address.to_string()));
            };
            WireRequest::MaskWriteRegister(start, and_mask, or_mask)
        }
    };

    let size = request_pdu_size(&pdu);
    if size > MAX_PDU_SIZE {
        return Err(Error::PduSizeExceeded(size));
    }
    Ok(pdu)
}

/// Interprets a response PDU in the context of the originating `request`.
///
/// Exception responses and unexpected functions are reported through the
/// [`ResponseCode`] of the result. A payload that is inconsistent with the
/// request fails with [`Error::MalformedResponse`].
pub fn parse_pdu(pdu: Bytes, request: &Request) -> Result<Response> {
    let expected = build_pdu(request)?;
    let ResponsePdu(pdu) =
        ResponsePdu::try_from(pdu).map_err(|err| Error::MalformedResponse(err.to_string()))?;
    let rsp = match pdu {
        Ok(rsp) => rsp,
        Err(ExceptionResponse { function, .. }) if function != expected.function_code() => {
            return Ok(Response::failed(
                request,
                ResponseCode::UnexpectedFunction(function),
            ));
        }
        Err(ExceptionResponse { exception, .. }) => {
            return Ok(Response::failed(request, ResponseCode::Exception(exception)));
        }
    };
    if rsp.function_code() != expected.function_code() {
        return Ok(Response::failed(
            request,
            ResponseCode::UnexpectedFunction(rsp.function_code()),
        ));
    }

    let response = match request {
        Request::Read(read) => Response::Read(ReadResult {
            code: ResponseCode::Ok,
            values: read_values(rsp, read)?,
        }),
        Request::Write(_) => {
            let code = if echoes(&expected, &rsp) {
                ResponseCode::Ok
            } else {
                ResponseCode::EchoMismatch
            };
            Response::Write(WriteResult { code })
        }
    };
    Ok(response)
}

fn read_quantity(read: &ReadRequest) -> Result<Quantity> {
    let count = usize::from(read.count);
    if count == 0 {
        return Err(Error::InvalidQuantity(count));
    }
    if read.address.kind().is_bit() {
        if read.datatype == Datatype::Text {
            return Err(unsupported_on_bits(read.datatype));
        }
        if count > MAX_READ_BITS {
            return Err(Error::InvalidQuantity(count));
        }
    } else if count > MAX_READ_WORDS {
        return Err(Error::InvalidQuantity(count));
    }
    Ok(read.count)
}

const fn slot_size(width: usize) -> usize {
    width + width % 2
}

fn register_words(values: &[Value], datatype: Datatype) -> Result<Vec<Word>> {
    let mut buf = BytesMut::new();
    for value in values {
        let encoded = value::encode(value, datatype)?;
        if encoded.len() % 2 == 0 {
            buf.put_slice(&encoded);
        } else if datatype == Datatype::Text {
            buf.put_slice(&encoded);
            buf.put_u8(0);
        } else {
            buf.put_u8(0);
            buf.put_slice(&encoded);
        }
    }
    Ok(buf.chunks_exact(2).map(BigEndian::read_u16).collect())
}

fn single_register_word(value: &Value, datatype: Datatype) -> Result<Word> {
    let words = register_words(std::slice::from_ref(value), datatype)?;
    if let [word] = words.as_slice() {
        return Ok(*word);
    }
    let wide = match value {
        Value::Int32(v) => i64::from(*v),
        Value::Timestamp(v) => *v,
        _ => return Err(Error::ValueTooWide { datatype }),
    };
    Word::try_from(wide)
        .or_else(|_| i16::try_from(wide).map(|v| Word::from_be_bytes(v.to_be_bytes())))
        .map_err(|_| Error::ValueTooWide { datatype })
}

fn read_values(rsp: WireResponse, read: &ReadRequest) -> Result<Vec<Value>> {
    let count = usize::from(read.count);
    match rsp {
        WireResponse::ReadCoils(bits) | WireResponse::ReadDiscreteInputs(bits) => {
            if bits.len() < count {
                return Err(Error::MalformedResponse(format!(
                    "expected {count} bits, received {}",
                    bits.len()
                )));
            }
            bits.into_iter()
                .take(count)
                .map(|bit| Value::from_bit(bit, read.datatype))
                .collect()
        }
        WireResponse::ReadHoldingRegisters(words) | WireResponse::ReadInputRegisters(words) => {
            let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_be_bytes()).collect();
            decode_registers(&bytes, read.datatype, count).map_err(Error::into_malformed)
        }
        rsp => Err(Error::MalformedResponse(format!(
            "no values in response of function {}",
            rsp.function_code()
        ))),
    }
}

fn decode_registers(bytes: &[u8], datatype: Datatype, count: usize) -> Result<Vec<Value>> {
    let Some(width) = datatype.width() else {
        let mut values = Vec::with_capacity(count);
        let mut offset = 0;
        for _ in 0..count {
            let rest = bytes.get(offset..).unwrap_or_default();
            let mut decoded = value::decode(rest, datatype, 1)?;
            if let Some(Value::Text(text)) = decoded.first() {
                offset += slot_size(text.len() + 1);
            }
            values.append(&mut decoded);
        }
        return Ok(values);
    };

    let slot = slot_size(width);
    let expected = slot * count;
    if bytes.len() < expected {
        return Err(Error::ShortBuffer {
            expected,
            actual: bytes.len(),
        });
    }
    let mut values = Vec::with_capacity(count);
    for chunk in bytes.chunks_exact(slot).take(count) {
        values.append(&mut value::decode(&chunk[slot - width..], datatype, 1)?);
    }
    Ok(values)
}

fn echoes(expected: &WireRequest, ack: &WireResponse) -> bool {
    match (expected, ack) {
        (WireRequest::WriteSingleCoil(a, state), WireResponse::WriteSingleCoil(b, raw)) => {
            a == b && bool_to_coil(*state) == *raw
        }
        (WireRequest::WriteMultipleCoils(a, coils), WireResponse::WriteMultipleCoils(b, n)) => {
            a == b && coils.len() == usize::from(*n)
        }
        (WireRequest::WriteSingleRegister(a, v), WireResponse::WriteSingleRegister(b, w)) => {
            a == b && v == w
        }
        (
            WireRequest::WriteMultipleRegisters(a, words),
            WireResponse::WriteMultipleRegisters(b, n),
        ) => a == b && words.len() == usize::from(*n),
        (
            WireRequest::MaskWriteRegister(a, and_a, or_a),
            WireResponse::MaskWriteRegister(b, and_b, or_b),
        ) => a == b && and_a == and_b && or_a == or_b,
        _ => false,
    }
}
