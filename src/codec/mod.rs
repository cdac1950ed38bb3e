// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::io::{Error, ErrorKind, Result};

use crate::{
    bytes::{Buf as _, BufMut as _, Bytes, BytesMut},
    frame::{
        Coil, ExceptionCode, ExceptionResponse, FunctionCode, ResponsePdu, WireRequest,
        WireResponse, Word,
    },
};

pub(crate) mod tcp;

/// Maximum request/response PDU size.
///
/// As defined by the Modbus application protocol.
pub(crate) const MAX_PDU_SIZE: usize = 253;

/// Set in the function code of exception responses.
const EXCEPTION_FLAG: u8 = 0x80;

#[allow(clippy::cast_possible_truncation)]
fn u16_len(len: usize) -> u16 {
    // Only called with lengths bounded by the PDU size.
    debug_assert!(len <= u16::MAX.into());
    len as u16
}

#[allow(clippy::cast_possible_truncation)]
fn u8_len(len: usize) -> u8 {
    debug_assert!(len <= u8::MAX.into());
    len as u8
}

fn invalid_data(msg: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidData, msg.into())
}

pub(crate) fn bool_to_coil(state: bool) -> Word {
    if state {
        0xFF00
    } else {
        0x0000
    }
}

/// Packs coils into bytes, least significant bit first.
fn pack_coils(coils: &[Coil]) -> Vec<u8> {
    coils
        .chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (bit, &on)| byte | (u8::from(on) << bit))
        })
        .collect()
}

/// Unpacks every bit of `bytes`, least significant bit first.
fn unpack_coils(bytes: &[u8]) -> Vec<Coil> {
    bytes
        .iter()
        .flat_map(|byte| (0..8).map(move |bit| byte & (1 << bit) != 0))
        .collect()
}

fn packed_len(coil_count: usize) -> usize {
    (coil_count + 7) / 8
}

pub(crate) fn request_pdu_size(request: &WireRequest) -> usize {
    use crate::frame::WireRequest::*;

    // function code, address and one 16 bit field
    const FIXED: usize = 5;
    match request {
        WriteMultipleCoils(_, coils) => FIXED + 1 + packed_len(coils.len()),
        WriteMultipleRegisters(_, words) => FIXED + 1 + 2 * words.len(),
        MaskWriteRegister(_, _, _) => FIXED + 2,
        _ => FIXED,
    }
}

pub(crate) fn encode_request_pdu(buf: &mut BytesMut, request: &WireRequest) {
    use crate::frame::WireRequest::*;

    buf.reserve(request_pdu_size(request));
    buf.put_u8(request.function_code().value());
    buf.put_u16(request.address());
    match request {
        ReadCoils(_, quantity)
        | ReadDiscreteInputs(_, quantity)
        | ReadHoldingRegisters(_, quantity)
        | ReadInputRegisters(_, quantity) => buf.put_u16(*quantity),
        WriteSingleCoil(_, state) => buf.put_u16(bool_to_coil(*state)),
        WriteSingleRegister(_, word) => buf.put_u16(*word),
        WriteMultipleCoils(_, coils) => {
            let packed = pack_coils(coils);
            buf.put_u16(u16_len(coils.len()));
            buf.put_u8(u8_len(packed.len()));
            buf.put_slice(&packed);
        }
        WriteMultipleRegisters(_, words) => {
            buf.put_u16(u16_len(words.len()));
            buf.put_u8(u8_len(2 * words.len()));
            words.iter().for_each(|word| buf.put_u16(*word));
        }
        MaskWriteRegister(_, and_mask, or_mask) => {
            buf.put_u16(*and_mask);
            buf.put_u16(*or_mask);
        }
    }
}

fn get_u8(buf: &mut Bytes) -> Result<u8> {
    if buf.remaining() < 1 {
        return Err(invalid_data("response too short"));
    }
    Ok(buf.get_u8())
}

fn get_u16(buf: &mut Bytes) -> Result<u16> {
    if buf.remaining() < 2 {
        return Err(invalid_data("response too short"));
    }
    Ok(buf.get_u16())
}

/// Splits off a payload that is prefixed by its byte count.
fn get_counted(buf: &mut Bytes) -> Result<Bytes> {
    let byte_count = usize::from(get_u8(buf)?);
    if buf.remaining() < byte_count {
        return Err(invalid_data(format!(
            "byte count {byte_count} exceeds remaining {} bytes",
            buf.remaining()
        )));
    }
    Ok(buf.split_to(byte_count))
}

fn get_words(buf: &mut Bytes) -> Result<Vec<Word>> {
    let mut data = get_counted(buf)?;
    if data.len() % 2 != 0 {
        return Err(invalid_data("odd register byte count"));
    }
    let mut words = Vec::with_capacity(data.len() / 2);
    while data.has_remaining() {
        words.push(data.get_u16());
    }
    Ok(words)
}

fn decode_response(function: u8, buf: &mut Bytes) -> Result<WireResponse> {
    use crate::frame::WireResponse::*;

    let rsp = match FunctionCode::new(function) {
        FunctionCode::ReadCoils => ReadCoils(unpack_coils(&get_counted(buf)?)),
        FunctionCode::ReadDiscreteInputs => ReadDiscreteInputs(unpack_coils(&get_counted(buf)?)),
        FunctionCode::ReadHoldingRegisters => ReadHoldingRegisters(get_words(buf)?),
        FunctionCode::ReadInputRegisters => ReadInputRegisters(get_words(buf)?),
        FunctionCode::WriteSingleCoil => WriteSingleCoil(get_u16(buf)?, get_u16(buf)?),
        FunctionCode::WriteSingleRegister => WriteSingleRegister(get_u16(buf)?, get_u16(buf)?),
        FunctionCode::WriteMultipleCoils => WriteMultipleCoils(get_u16(buf)?, get_u16(buf)?),
        FunctionCode::WriteMultipleRegisters => {
            WriteMultipleRegisters(get_u16(buf)?, get_u16(buf)?)
        }
        FunctionCode::MaskWriteRegister => {
            MaskWriteRegister(get_u16(buf)?, get_u16(buf)?, get_u16(buf)?)
        }
        FunctionCode::Custom(code) => Custom(code, buf.split_off(0).to_vec()),
    };
    if buf.has_remaining() {
        return Err(invalid_data(format!(
            "{} undecoded bytes in response",
            buf.remaining()
        )));
    }
    Ok(rsp)
}

impl TryFrom<Bytes> for ResponsePdu {
    type Error = Error;

    fn try_from(mut bytes: Bytes) -> Result<Self> {
        if bytes.len() > MAX_PDU_SIZE {
            return Err(invalid_data("response PDU size exceeded"));
        }
        let function = get_u8(&mut bytes)?;
        if function & EXCEPTION_FLAG == 0 {
            return decode_response(function, &mut bytes).map(Into::into);
        }
        let exception = ExceptionResponse {
            function: FunctionCode::new(function & !EXCEPTION_FLAG),
            exception: ExceptionCode::new(get_u8(&mut bytes)?),
        };
        Ok(exception.into())
    }
}
