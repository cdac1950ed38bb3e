// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A scripted device on the remote end of an in-memory connection.

#![allow(dead_code)]

use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _, DuplexStream};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub transaction_id: u16,
    pub unit_id: u8,
    pub pdu: Vec<u8>,
}

impl Frame {
    /// Start address field of a request PDU.
    pub fn address(&self) -> u16 {
        u16::from_be_bytes([self.pdu[1], self.pdu[2]])
    }

    /// A response to this request with the given PDU.
    pub fn reply(&self, pdu: impl Into<Vec<u8>>) -> Frame {
        Frame {
            transaction_id: self.transaction_id,
            unit_id: self.unit_id,
            pdu: pdu.into(),
        }
    }
}

#[derive(Debug)]
pub struct Device {
    stream: DuplexStream,
}

impl Device {
    pub fn new(stream: DuplexStream) -> Self {
        Self { stream }
    }

    pub async fn receive(&mut self) -> anyhow::Result<Frame> {
        let mut hdr = [0u8; 7];
        self.stream.read_exact(&mut hdr).await?;
        anyhow::ensure!(hdr[2..4] == [0, 0], "invalid protocol id");
        let len = usize::from(u16::from_be_bytes([hdr[4], hdr[5]]));
        let mut pdu = vec![0; len - 1];
        self.stream.read_exact(&mut pdu).await?;
        Ok(Frame {
            transaction_id: u16::from_be_bytes([hdr[0], hdr[1]]),
            unit_id: hdr[6],
            pdu,
        })
    }

    pub async fn send(&mut self, frame: &Frame) -> anyhow::Result<()> {
        let mut buf = Vec::with_capacity(7 + frame.pdu.len());
        buf.extend_from_slice(&frame.transaction_id.to_be_bytes());
        buf.extend_from_slice(&[0, 0]);
        buf.extend_from_slice(&u16::try_from(frame.pdu.len() + 1)?.to_be_bytes());
        buf.push(frame.unit_id);
        buf.extend_from_slice(&frame.pdu);
        self.send_raw(&buf).await
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.stream.write_all(bytes).await?;
        Ok(())
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
