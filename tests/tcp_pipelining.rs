// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multiple requests in flight over a single connection

#![cfg(feature = "tcp")]

mod device;

use std::{collections::HashSet, time::Duration};

use plc_modbus::prelude::{tcp::Options, *};
use tokio::io::duplex;

use device::{init_logging, Device};

#[tokio::test]
async fn out_of_order_responses_reach_their_callers() -> anyhow::Result<()> {
    init_logging();
    let (local, remote) = duplex(1024);
    let ctx = tcp::attach_slave(local, Slave(1));

    let server = tokio::spawn(async move {
        let mut device = Device::new(remote);
        let mut requests = Vec::new();
        for _ in 0..3 {
            requests.push(device.receive().await?);
        }
        let ids: HashSet<_> = requests.iter().map(|req| req.transaction_id).collect();
        anyhow::ensure!(ids.len() == 3, "transaction ids are not distinct");
        for req in requests.iter().rev() {
            anyhow::ensure!(req.unit_id == 1);
            let [hi, lo] = (req.address() * 10).to_be_bytes();
            device.send(&req.reply([0x03, 0x02, hi, lo])).await?;
        }
        Ok::<_, anyhow::Error>(device)
    });

    let read = |start| {
        let ctx = ctx.clone();
        async move {
            ctx.read_values(
                ResolvedAddress::holding_register(start),
                Datatype::Int16,
                1,
            )
            .await
        }
    };
    let (a, b, c) = tokio::join!(read(1), read(2), read(3));
    assert_eq!(a?.values, vec![Value::Int16(10)]);
    assert_eq!(b?.values, vec![Value::Int16(20)]);
    assert_eq!(c?.values, vec![Value::Int16(30)]);

    let _device = server.await??;
    Ok(())
}

#[tokio::test]
async fn read_int32_from_holding_register() -> anyhow::Result<()> {
    init_logging();
    let (local, remote) = duplex(1024);
    let ctx = tcp::attach(local);

    let server = tokio::spawn(async move {
        let mut device = Device::new(remote);
        let req = device.receive().await?;
        anyhow::ensure!(req.unit_id == 0xFF);
        anyhow::ensure!(req.pdu == [0x03, 0x00, 0x01, 0x00, 0x01]);
        device
            .send(&req.reply([0x03, 0x04, 0x00, 0x00, 0x00, 0x01]))
            .await?;
        Ok::<_, anyhow::Error>(device)
    });

    let address: ResolvedAddress = "holdingregister:1".parse()?;
    let result = ctx.read_values(address, Datatype::Int32, 1).await?;
    assert_eq!(result.code, ResponseCode::Ok);
    assert_eq!(result.values, vec![Value::Int32(1)]);

    let _device = server.await??;
    Ok(())
}

#[tokio::test]
async fn write_coil_and_mask_register() -> anyhow::Result<()> {
    init_logging();
    let (local, remote) = duplex(1024);
    let ctx = tcp::attach_slave(local, Slave(7));

    let server = tokio::spawn(async move {
        let mut device = Device::new(remote);
        let coil = device.receive().await?;
        anyhow::ensure!(coil.pdu == [0x05, 0x00, 0x01, 0xFF, 0x00]);
        device.send(&coil.reply(coil.pdu.clone())).await?;

        let mask = device.receive().await?;
        anyhow::ensure!(mask.pdu == [0x16, 0x00, 0x01, 0x00, 0x01, 0x00, 0x02]);
        device.send(&mask.reply(mask.pdu.clone())).await?;
        Ok::<_, anyhow::Error>(device)
    });

    let result = ctx
        .write_values("coil:1".parse()?, Datatype::Bool, vec![true.into()])
        .await?;
    assert_eq!(result.code, ResponseCode::Ok);

    let result = ctx
        .write_values("maskwrite:1/1/2".parse()?, Datatype::Int16, vec![0i16.into()])
        .await?;
    assert_eq!(result.code, ResponseCode::Ok);

    let _device = server.await??;
    Ok(())
}

#[tokio::test]
async fn late_response_after_timeout_is_dropped() -> anyhow::Result<()> {
    init_logging();
    let (local, remote) = duplex(1024);
    let ctx = tcp::attach_with_options(
        local,
        Options {
            slave: Slave(1),
            response_timeout: Some(Duration::from_millis(50)),
        },
    );

    let server = tokio::spawn(async move {
        let mut device = Device::new(remote);
        let first = device.receive().await?;
        // Only arrives after the first call gave up.
        let second = device.receive().await?;
        device.send(&first.reply([0x03, 0x02, 0x00, 0x01])).await?;
        device.send(&second.reply([0x03, 0x02, 0x00, 0x02])).await?;
        Ok::<_, anyhow::Error>(device)
    });

    let address = ResolvedAddress::input_register(0);
    let err = ctx
        .read_values(address, Datatype::Int16, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout));

    let address = ResolvedAddress::holding_register(0);
    let result = ctx.read_values(address, Datatype::Int16, 1).await?;
    assert_eq!(result.values, vec![Value::Int16(2)]);

    let _device = server.await??;
    Ok(())
}
