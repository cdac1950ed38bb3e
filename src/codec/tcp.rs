// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::io::{Error, ErrorKind, Result};

use byteorder::{BigEndian, ByteOrder as _};

use crate::{
    bytes::{Buf as _, BufMut as _, BytesMut},
    frame::tcp::{RequestAdu, ResponseAdu},
};

use super::{encode_request_pdu, request_pdu_size, u16_len, MAX_PDU_SIZE};

const HEADER_LEN: usize = 7;

const PROTOCOL_ID: u16 = 0x0000; // TCP

impl RequestAdu {
    /// Appends the encoded frame to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        let pdu_size = request_pdu_size(&self.pdu);
        buf.reserve(HEADER_LEN + pdu_size);
        buf.put_u16(self.hdr.transaction_id);
        buf.put_u16(PROTOCOL_ID);
        buf.put_u16(u16_len(pdu_size + 1));
        buf.put_u8(self.hdr.unit_id);
        encode_request_pdu(buf, &self.pdu);
    }
}

impl ResponseAdu {
    /// Splits the next complete frame off the front of `buf`.
    ///
    /// Returns `Ok(None)` and leaves `buf` untouched while the frame is
    /// still incomplete.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>> {
        if buf.len() < HEADER_LEN {
            return Ok(None);
        }

        // The length field counts the unit id and the PDU.
        let len = usize::from(BigEndian::read_u16(&buf[4..6]));
        let pdu_len = match len.checked_sub(1) {
            Some(pdu_len) if (1..=MAX_PDU_SIZE).contains(&pdu_len) => pdu_len,
            _ => {
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    format!("Invalid MBAP length field: {len}"),
                ))
            }
        };
        if buf.len() < HEADER_LEN + pdu_len {
            return Ok(None);
        }

        let mut header = buf.split_to(HEADER_LEN);
        let pdu = buf.split_to(pdu_len).freeze();
        let transaction_id = header.get_u16();
        let protocol_id = header.get_u16();
        header.advance(2);
        let unit_id = header.get_u8();
        if protocol_id != PROTOCOL_ID {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("Unsupported protocol id {protocol_id:#06X} in frame {transaction_id}"),
            ));
        }

        log::trace!("Received frame {}: {:02X?}", transaction_id, &pdu[..]);
        Ok(Some(Self::new(transaction_id, unit_id, pdu)))
    }
}

#[cfg(feature = "tcp")]
#[derive(Debug, Default)]
pub(crate) struct ClientCodec;

#[cfg(feature = "tcp")]
impl tokio_util::codec::Decoder for ClientCodec {
    type Item = ResponseAdu;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<ResponseAdu>> {
        ResponseAdu::decode(buf)
    }
}

#[cfg(feature = "tcp")]
impl tokio_util::codec::Encoder<RequestAdu> for ClientCodec {
    type Error = Error;

    fn encode(&mut self, adu: RequestAdu, buf: &mut BytesMut) -> Result<()> {
        adu.encode(buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        bytes::Bytes,
        frame::{tcp::Header, WireRequest},
    };

    fn decode(raw: &[u8]) -> (Result<Option<ResponseAdu>>, usize) {
        let mut buf = BytesMut::from(raw);
        let res = ResponseAdu::decode(&mut buf);
        (res, buf.len())
    }

    #[test]
    fn incomplete_frames_stay_buffered() {
        // header fragment
        let (res, left) = decode(&[0x00, 0x11, 0x00, 0x00, 0x00, 0x00]);
        assert!(res.unwrap().is_none());
        assert_eq!(left, 6);

        // length announces two PDU bytes, only one arrived
        let (res, left) = decode(&[0x00, 0x11, 0x00, 0x00, 0x00, 0x03, 0x66, 0x02]);
        assert!(res.unwrap().is_none());
        assert_eq!(left, 8);
    }

    #[test]
    fn frame_is_split_off_the_buffer() {
        let mut buf = BytesMut::from(
            &[
                0x00, 0x05, 0x00, 0x00, 0x00, 0x03, 0x66, 0x82, 0x03, //
                0x00, // start of the next frame
            ][..],
        );
        let adu = ResponseAdu::decode(&mut buf).unwrap().unwrap();
        assert_eq!(adu, ResponseAdu::new(5, 0x66, Bytes::from_static(&[0x82, 0x03])));
        assert_eq!(&buf[..], &[0x00]);
    }

    #[test]
    fn consecutive_frames() {
        let mut buf = BytesMut::from(
            &[
                0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x01, 0x83, 0x02, //
                0x00, 0x02, 0x00, 0x00, 0x00, 0x03, 0x01, 0x84, 0x02,
            ][..],
        );
        let first = ResponseAdu::decode(&mut buf).unwrap().unwrap();
        let second = ResponseAdu::decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.hdr.transaction_id, 1);
        assert_eq!(second.hdr.transaction_id, 2);
        assert!(buf.is_empty());
        assert!(ResponseAdu::decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn reject_foreign_protocol() {
        let (res, _) = decode(&[0x00, 0x00, 0x33, 0x12, 0x00, 0x03, 0x66, 0x82, 0x03]);
        assert_eq!(res.unwrap_err().kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn reject_impossible_lengths() {
        // unit id only
        let (res, _) = decode(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x66]);
        assert_eq!(res.unwrap_err().kind(), ErrorKind::InvalidData);

        // larger than any PDU
        let (res, _) = decode(&[0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x66]);
        assert_eq!(res.unwrap_err().kind(), ErrorKind::InvalidData);
    }

    fn encode(transaction_id: u16, unit_id: u8, pdu: WireRequest) -> BytesMut {
        let mut buf = BytesMut::new();
        RequestAdu {
            hdr: Header {
                transaction_id,
                unit_id,
            },
            pdu,
        }
        .encode(&mut buf);
        buf
    }

    #[test]
    fn encode_mbap_header() {
        let buf = encode(0x1234, 0x2A, WireRequest::ReadInputRegisters(0x23, 5));
        assert_eq!(
            &buf[..],
            &[0x12, 0x34, 0x00, 0x00, 0x00, 0x06, 0x2A, 0x04, 0x00, 0x23, 0x00, 0x05]
        );
    }

    #[test]
    fn length_field_counts_unit_id_and_pdu() {
        let buf = encode(1, 0xFF, WireRequest::WriteMultipleCoils(1, vec![true; 3]));
        assert_eq!(&buf[4..6], &[0x00, 0x08]);
        assert_eq!(&buf[7..], &[0x0F, 0x00, 0x01, 0x00, 0x03, 0x01, 0b111]);
    }
}
