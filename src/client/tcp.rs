// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TCP client connections

use std::{sync::Arc, time::Duration};

use tokio::io::{AsyncRead, AsyncWrite};

use super::*;

use crate::{
    correlation::{Sequential, TransactionIds},
    service,
    slave::Slave,
};

/// Connection options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Unit identifier of all requests.
    pub slave: Slave,

    /// Maximum time to wait for each response.
    ///
    /// Waits forever if `None`.
    pub response_timeout: Option<Duration>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            slave: Slave::tcp_device(),
            response_timeout: None,
        }
    }
}

/// Attach a new client context to a transport connection.
///
/// The unit identifier of a directly connected TCP device is used.
pub fn attach<T>(transport: T) -> Context
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    attach_with_options(transport, Options::default())
}

/// Attach a new client context to a transport connection
/// of a particular slave device.
pub fn attach_slave<T>(transport: T, slave: Slave) -> Context
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    attach_with_options(
        transport,
        Options {
            slave,
            ..Default::default()
        },
    )
}

pub fn attach_with_options<T>(transport: T, options: Options) -> Context
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    attach_with_ids(transport, options, Box::<Sequential>::default())
}

/// Attach with a custom transaction id allocation policy.
pub fn attach_with_ids<T>(
    transport: T,
    options: Options,
    ids: Box<dyn TransactionIds>,
) -> Context
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let Options {
        slave,
        response_timeout,
    } = options;
    let client = service::tcp::Client::new(transport, slave.into(), ids, response_timeout);
    Context {
        client: Arc::new(client),
    }
}
