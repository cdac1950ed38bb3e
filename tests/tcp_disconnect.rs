// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending requests fail when the connection goes away

#![cfg(feature = "tcp")]

mod device;

use plc_modbus::prelude::*;
use tokio::{io::duplex, sync::oneshot};

use device::{init_logging, Device};

#[tokio::test]
async fn disconnect_fails_pending_and_later_calls() -> anyhow::Result<()> {
    init_logging();
    let (local, remote) = duplex(1024);
    let ctx = tcp::attach_slave(local, Slave(1));
    let (received_tx, received_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let mut device = Device::new(remote);
        let req = device.receive().await?;
        let _ = received_tx.send(req);
        Ok::<_, anyhow::Error>(device)
    });

    let pending = tokio::spawn({
        let ctx = ctx.clone();
        async move {
            ctx.read_values(ResolvedAddress::coil(0), Datatype::Bool, 8)
                .await
        }
    });
    let req = received_rx.await?;
    assert_eq!(req.pdu, [0x01, 0x00, 0x00, 0x00, 0x08]);

    ctx.disconnect().await?;
    assert!(matches!(pending.await?, Err(Error::ConnectionClosed)));
    assert!(matches!(
        ctx.read_values(ResolvedAddress::coil(0), Datatype::Bool, 1)
            .await,
        Err(Error::ConnectionClosed)
    ));

    let _device = server.await??;
    Ok(())
}

#[tokio::test]
async fn remote_close_fails_pending_calls() -> anyhow::Result<()> {
    init_logging();
    let (local, remote) = duplex(1024);
    let ctx = tcp::attach_slave(local, Slave(1));

    let server = tokio::spawn(async move {
        let mut device = Device::new(remote);
        device.receive().await?;
        // Dropping the device closes the connection.
        Ok::<_, anyhow::Error>(())
    });

    let result = ctx
        .read_values(ResolvedAddress::holding_register(0), Datatype::Int16, 1)
        .await;
    assert!(matches!(result, Err(Error::ConnectionClosed)));

    server.await??;
    Ok(())
}

#[tokio::test]
async fn garbage_from_remote_fails_pending_calls() -> anyhow::Result<()> {
    init_logging();
    let (local, remote) = duplex(1024);
    let ctx = tcp::attach_slave(local, Slave(1));

    let server = tokio::spawn(async move {
        let mut device = Device::new(remote);
        device.receive().await?;
        // Protocol id must be zero.
        device
            .send_raw(&[0x00, 0x00, 0x12, 0x34, 0x00, 0x03, 0x01, 0x83, 0x02])
            .await?;
        Ok::<_, anyhow::Error>(device)
    });

    let result = ctx
        .read_values(ResolvedAddress::holding_register(0), Datatype::Int16, 1)
        .await;
    assert!(matches!(result, Err(Error::ConnectionClosed)));

    let _device = server.await??;
    Ok(())
}
