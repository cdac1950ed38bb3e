// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed scalar values and their wire encoding.
//!
//! All fixed-width numbers are transmitted big-endian. Text is transmitted as
//! UTF-8 followed by a single zero terminator byte.

use std::{
    fmt,
    io::{Cursor, Read as _},
    str::FromStr,
};

use byteorder::{BigEndian, ReadBytesExt as _};

use crate::{
    bytes::{BufMut as _, Bytes, BytesMut},
    Error, Result,
};

const TEXT_TERMINATOR: u8 = 0x00;

/// The datatypes a field-bus device exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    Bool,
    Int8,
    Int16,
    Int32,
    Float32,
    /// Milliseconds since the Unix epoch.
    Timestamp,
    Text,
}

impl Datatype {
    /// Number of bytes of a single encoded value.
    ///
    /// `None` for variable-width text.
    #[must_use]
    pub const fn width(self) -> Option<usize> {
        match self {
            Self::Bool | Self::Int8 => Some(1),
            Self::Int16 => Some(2),
            Self::Int32 | Self::Float32 => Some(4),
            Self::Timestamp => Some(8),
            Self::Text => None,
        }
    }

    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Float32 => "float32",
            Self::Timestamp => "timestamp",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Datatype {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let datatype = match s.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Self::Bool,
            "byte" | "int8" => Self::Int8,
            "short" | "int16" => Self::Int16,
            "int" | "integer" | "int32" => Self::Int32,
            "float" | "float32" => Self::Float32,
            "timestamp" | "calendar" => Self::Timestamp,
            "string" | "text" => Self::Text,
            _ => return Err(Error::UnsupportedDatatype(s.to_owned())),
        };
        Ok(datatype)
    }
}

/// A single typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Float32(f32),
    Timestamp(i64),
    Text(String),
}

impl Value {
    /// The datatype of this value.
    #[must_use]
    pub const fn datatype(&self) -> Datatype {
        match self {
            Self::Bool(_) => Datatype::Bool,
            Self::Int8(_) => Datatype::Int8,
            Self::Int16(_) => Datatype::Int16,
            Self::Int32(_) => Datatype::Int32,
            Self::Float32(_) => Datatype::Float32,
            Self::Timestamp(_) => Datatype::Timestamp,
            Self::Text(_) => Datatype::Text,
        }
    }

    /// Coerces the value into the state of a single bit.
    ///
    /// Any non-zero number is `true`. Text has no bit representation.
    pub fn to_bit(&self) -> Result<bool> {
        let bit = match self {
            Self::Bool(v) => *v,
            Self::Int8(v) => *v != 0,
            Self::Int16(v) => *v != 0,
            Self::Int32(v) => *v != 0,
            Self::Float32(v) => *v != 0.0,
            Self::Timestamp(v) => *v != 0,
            Self::Text(_) => return Err(unsupported_on_bits(Datatype::Text)),
        };
        Ok(bit)
    }

    /// Widens the state of a single bit into a value of `datatype`.
    pub fn from_bit(bit: bool, datatype: Datatype) -> Result<Self> {
        let value = match datatype {
            Datatype::Bool => Self::Bool(bit),
            Datatype::Int8 => Self::Int8(i8::from(bit)),
            Datatype::Int16 => Self::Int16(i16::from(bit)),
            Datatype::Int32 => Self::Int32(i32::from(bit)),
            Datatype::Float32 => Self::Float32(f32::from(u8::from(bit))),
            Datatype::Timestamp => Self::Timestamp(i64::from(bit)),
            Datatype::Text => return Err(unsupported_on_bits(datatype)),
        };
        Ok(value)
    }
}

pub(crate) fn unsupported_on_bits(datatype: Datatype) -> Error {
    Error::UnsupportedDatatype(format!("{datatype} on a bit resource"))
}

impl From<bool> for Value {
    fn from(from: bool) -> Self {
        Self::Bool(from)
    }
}

impl From<i8> for Value {
    fn from(from: i8) -> Self {
        Self::Int8(from)
    }
}

impl From<i16> for Value {
    fn from(from: i16) -> Self {
        Self::Int16(from)
    }
}

impl From<i32> for Value {
    fn from(from: i32) -> Self {
        Self::Int32(from)
    }
}

impl From<f32> for Value {
    fn from(from: f32) -> Self {
        Self::Float32(from)
    }
}

impl From<&str> for Value {
    fn from(from: &str) -> Self {
        Self::Text(from.to_owned())
    }
}

impl From<String> for Value {
    fn from(from: String) -> Self {
        Self::Text(from)
    }
}

/// Encodes `value` as declared `datatype`.
pub fn encode(value: &Value, datatype: Datatype) -> Result<Bytes> {
    if value.datatype() != datatype {
        return Err(Error::DatatypeMismatch {
            expected: datatype,
            actual: value.datatype(),
        });
    }
    let mut buf = BytesMut::with_capacity(datatype.width().unwrap_or(16));
    match value {
        Value::Bool(v) => buf.put_u8(u8::from(*v)),
        Value::Int8(v) => buf.put_i8(*v),
        Value::Int16(v) => buf.put_i16(*v),
        Value::Int32(v) => buf.put_i32(*v),
        Value::Float32(v) => buf.put_f32(*v),
        Value::Timestamp(v) => buf.put_i64(*v),
        Value::Text(v) => {
            if let Some(pos) = v.bytes().position(|b| b == TEXT_TERMINATOR) {
                return Err(Error::TerminatorInText(pos));
            }
            buf.put_slice(v.as_bytes());
            buf.put_u8(TEXT_TERMINATOR);
        }
    }
    Ok(buf.freeze())
}

/// Decodes `count` consecutive values of `datatype` from the start of `bytes`.
///
/// Trailing bytes beyond the decoded values are ignored.
pub fn decode(bytes: &[u8], datatype: Datatype, count: usize) -> Result<Vec<Value>> {
    if let Some(width) = datatype.width() {
        let expected = width * count;
        if bytes.len() < expected {
            return Err(Error::ShortBuffer {
                expected,
                actual: bytes.len(),
            });
        }
    }
    let rdr = &mut Cursor::new(bytes);
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(decode_one(rdr, datatype)?);
    }
    Ok(values)
}

fn decode_one(rdr: &mut Cursor<&[u8]>, datatype: Datatype) -> Result<Value> {
    let value = match datatype {
        Datatype::Bool => Value::Bool(rdr.read_u8()? != 0),
        Datatype::Int8 => Value::Int8(rdr.read_i8()?),
        Datatype::Int16 => Value::Int16(rdr.read_i16::<BigEndian>()?),
        Datatype::Int32 => Value::Int32(rdr.read_i32::<BigEndian>()?),
        Datatype::Float32 => Value::Float32(rdr.read_f32::<BigEndian>()?),
        Datatype::Timestamp => Value::Timestamp(rdr.read_i64::<BigEndian>()?),
        Datatype::Text => {
            let mut text = Vec::new();
            let mut byte = [0u8];
            loop {
                if rdr.read(&mut byte)? == 0 {
                    return Err(Error::ShortBuffer {
                        expected: text.len() + 1,
                        actual: text.len(),
                    });
                }
                if byte[0] == TEXT_TERMINATOR {
                    break;
                }
                text.push(byte[0]);
            }
            Value::Text(String::from_utf8(text)?)
        }
    };
    Ok(value)
}
