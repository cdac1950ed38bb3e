// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{fmt, io, sync::Arc, time::Duration};

use futures_util::{stream::SplitSink, SinkExt as _, Stream, StreamExt as _};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::Mutex,
    task::JoinHandle,
};
use tokio_util::codec::Framed;

use crate::{
    codec::tcp::ClientCodec,
    correlation::{Correlator, TransactionIds},
    frame::tcp::{RequestAdu, ResponseAdu, UnitId},
    Error, Request, Response, Result,
};

type FramedSink<T> = SplitSink<Framed<T, ClientCodec>, RequestAdu>;

/// Pipelined Modbus TCP client
///
/// Requests are written as soon as they are submitted. A background task
/// reads the responses and hands them over to the [`Correlator`].
pub(crate) struct Client<T> {
    sink: Mutex<FramedSink<T>>,
    correlator: Arc<Correlator>,
    reader: JoinHandle<()>,
    response_timeout: Option<Duration>,
}

impl<T> Client<T>
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    pub(crate) fn new(
        transport: T,
        unit_id: UnitId,
        ids: Box<dyn TransactionIds>,
        response_timeout: Option<Duration>,
    ) -> Self {
        let (sink, stream) = Framed::new(transport, ClientCodec).split();
        let correlator = Arc::new(Correlator::with_ids(unit_id, ids));
        let reader = tokio::spawn(read_frames(stream, Arc::clone(&correlator)));
        Self {
            sink: Mutex::new(sink),
            correlator,
            reader,
            response_timeout,
        }
    }

    pub(crate) async fn call(&self, request: Request) -> Result<Response> {
        log::debug!("Call {:?}", request);
        let (adu, handle) = self.correlator.submit(request)?;
        let transaction_id = adu.hdr.transaction_id;

        // On failure the dropped handle abandons the transaction.
        self.sink.lock().await.send(adu).await?;

        let Some(response_timeout) = self.response_timeout else {
            return handle.await;
        };
        tokio::time::timeout(response_timeout, handle)
            .await
            .unwrap_or_else(|_| {
                log::debug!("Transaction {transaction_id} timed out");
                Err(Error::Timeout)
            })
    }

    pub(crate) async fn disconnect(&self) -> Result<()> {
        self.correlator.close();
        self.sink.lock().await.close().await?;
        Ok(())
    }
}

impl<T> Drop for Client<T> {
    fn drop(&mut self) {
        self.reader.abort();
        self.correlator.close();
    }
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("correlator", &self.correlator)
            .field("response_timeout", &self.response_timeout)
            .finish_non_exhaustive()
    }
}

async fn read_frames<S>(mut stream: S, correlator: Arc<Correlator>)
where
    S: Stream<Item = io::Result<ResponseAdu>> + Unpin,
{
    while let Some(next) = stream.next().await {
        match next {
            Ok(adu) => {
                correlator.on_frame(adu);
            }
            Err(err) => {
                log::warn!("Failed to decode response frame: {err}");
                break;
            }
        }
    }
    log::debug!("Connection closed");
    correlator.close();
}

#[async_trait::async_trait]
impl<T> crate::client::Client for Client<T>
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    async fn call(&self, request: Request) -> Result<Response> {
        Client::call(self, request).await
    }

    async fn disconnect(&self) -> Result<()> {
        Client::disconnect(self).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{duplex, AsyncReadExt as _, AsyncWriteExt as _};

    use super::*;

    use crate::{correlation::Sequential, Datatype, ResolvedAddress, ResponseCode};

    fn client<T>(transport: T, response_timeout: Option<Duration>) -> Client<T>
    where
        T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        Client::new(
            transport,
            1,
            Box::new(Sequential::starting_at(0x10)),
            response_timeout,
        )
    }

    #[tokio::test]
    async fn write_request_frame_and_read_response() {
        let (local, mut remote) = duplex(64);
        let client = client(local, None);

        let server = tokio::spawn(async move {
            let mut req = [0u8; 12];
            remote.read_exact(&mut req).await.unwrap();
            remote
                .write_all(&[0x00, 0x10, 0x00, 0x00, 0x00, 0x05, 0x01, 0x03, 0x02, 0x00, 0x2A])
                .await
                .unwrap();
            (req, remote)
        });

        let request = Request::read(ResolvedAddress::holding_register(7), Datatype::Int16);
        let response = client.call(request).await.unwrap();
        assert_eq!(response.code(), ResponseCode::Ok);

        let (req, _remote) = server.await.unwrap();
        assert_eq!(
            req,
            [0x00, 0x10, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x07, 0x00, 0x01]
        );
    }

    #[tokio::test]
    async fn timeout_abandons_transaction() {
        let (local, _remote) = duplex(64);
        let client = client(local, Some(Duration::from_millis(10)));

        let request = Request::read(ResolvedAddress::coil(0), Datatype::Bool);
        let err = client.call(request).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
        assert_eq!(client.correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn closed_connection_fails_pending_calls() {
        let (local, remote) = duplex(64);
        let client = client(local, None);
        let request = Request::read(ResolvedAddress::coil(0), Datatype::Bool);
        let (result, ()) = tokio::join!(client.call(request), async move {
            tokio::task::yield_now().await;
            drop(remote);
        });
        assert!(matches!(
            result,
            Err(Error::ConnectionClosed | Error::Transport(_))
        ));
    }
}
