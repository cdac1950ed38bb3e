// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clients for typed PLC requests

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;

use crate::{
    frame::Quantity, Datatype, Error, ReadResult, Request, ResolvedAddress, Response, Result,
    Value, WriteResult,
};

pub mod tcp;

/// Transport independent asynchronous client trait
///
/// Implementations accept concurrent calls through a shared reference.
#[async_trait]
pub trait Client: Send + Sync + Debug {
    /// Submits a request and waits for its decoded response.
    async fn call(&self, request: Request) -> Result<Response>;

    /// Disconnects the client.
    ///
    /// All requests that are still waiting for their response fail
    /// with [`Error::ConnectionClosed`].
    async fn disconnect(&self) -> Result<()>;
}

/// Asynchronous reader of typed values
#[async_trait]
pub trait Reader: Client {
    /// Read `count` consecutive values of `datatype` starting at `address`.
    async fn read_values(
        &self,
        address: ResolvedAddress,
        datatype: Datatype,
        count: Quantity,
    ) -> Result<ReadResult>;
}

/// Asynchronous writer of typed values
#[async_trait]
pub trait Writer: Client {
    /// Write `values` of `datatype` starting at `address`.
    async fn write_values(
        &self,
        address: ResolvedAddress,
        datatype: Datatype,
        values: Vec<Value>,
    ) -> Result<WriteResult>;
}

/// Asynchronous client context
///
/// Clones share the same connection.
#[derive(Debug, Clone)]
pub struct Context {
    client: Arc<dyn Client>,
}

impl From<Arc<dyn Client>> for Context {
    fn from(client: Arc<dyn Client>) -> Self {
        Self { client }
    }
}

impl From<Context> for Arc<dyn Client> {
    fn from(val: Context) -> Self {
        val.client
    }
}

#[async_trait]
impl Client for Context {
    async fn call(&self, request: Request) -> Result<Response> {
        self.client.call(request).await
    }

    async fn disconnect(&self) -> Result<()> {
        self.client.disconnect().await
    }
}

#[async_trait]
impl Reader for Context {
    async fn read_values(
        &self,
        address: ResolvedAddress,
        datatype: Datatype,
        count: Quantity,
    ) -> Result<ReadResult> {
        let rsp = self
            .client
            .call(Request::read_many(address, datatype, count))
            .await?;
        match rsp {
            Response::Read(result) => Ok(result),
            Response::Write(_) => Err(Error::MalformedResponse(
                "write result for read request".to_owned(),
            )),
        }
    }
}

#[async_trait]
impl Writer for Context {
    async fn write_values(
        &self,
        address: ResolvedAddress,
        datatype: Datatype,
        values: Vec<Value>,
    ) -> Result<WriteResult> {
        let rsp = self
            .client
            .call(Request::write(address, datatype, values))
            .await?;
        match rsp {
            Response::Write(result) => Ok(result),
            Response::Read(_) => Err(Error::MalformedResponse(
                "read result for write request".to_owned(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    use crate::ResponseCode;

    #[derive(Default, Debug)]
    pub(crate) struct ClientMock {
        last_request: Mutex<Option<Request>>,
        next_response: Mutex<Option<Result<Response>>>,
    }

    impl ClientMock {
        pub(crate) fn with_next_response(next_response: Result<Response>) -> Self {
            Self {
                next_response: Mutex::new(Some(next_response)),
                ..Default::default()
            }
        }

        pub(crate) fn last_request(&self) -> Option<Request> {
            self.last_request.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Client for ClientMock {
        async fn call(&self, request: Request) -> Result<Response> {
            *self.last_request.lock().unwrap() = Some(request);
            self.next_response.lock().unwrap().take().unwrap()
        }

        async fn disconnect(&self) -> Result<()> {
            Ok(())
        }
    }

    fn context(mock: &Arc<ClientMock>) -> Context {
        let client: Arc<dyn Client> = Arc::clone(mock) as _;
        Context::from(client)
    }

    #[test]
    fn read_some_values() {
        let values = vec![Value::Int32(1), Value::Int32(-2)];
        let mock = Arc::new(ClientMock::with_next_response(Ok(Response::Read(
            ReadResult {
                code: ResponseCode::Ok,
                values: values.clone(),
            },
        ))));
        let address = ResolvedAddress::holding_register(4);

        let result = futures::executor::block_on(context(&mock).read_values(
            address,
            Datatype::Int32,
            2,
        ))
        .unwrap();
        assert_eq!(result.values, values);
        assert_eq!(
            mock.last_request(),
            Some(Request::read_many(address, Datatype::Int32, 2))
        );
    }

    #[test]
    fn write_some_values() {
        let mock = Arc::new(ClientMock::with_next_response(Ok(Response::Write(
            WriteResult {
                code: ResponseCode::Ok,
            },
        ))));
        let address = ResolvedAddress::coil(1);

        let result = futures::executor::block_on(context(&mock).write_values(
            address,
            Datatype::Bool,
            vec![Value::Bool(true)],
        ))
        .unwrap();
        assert!(result.code.is_ok());
        assert_eq!(
            mock.last_request(),
            Some(Request::write(address, Datatype::Bool, vec![Value::Bool(true)]))
        );
    }

    #[test]
    fn reject_mismatching_result_kind() {
        let mock = Arc::new(ClientMock::with_next_response(Ok(Response::Write(
            WriteResult {
                code: ResponseCode::Ok,
            },
        ))));
        let err = futures::executor::block_on(context(&mock).read_values(
            ResolvedAddress::coil(1),
            Datatype::Bool,
            1,
        ))
        .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn pass_through_errors() {
        let mock = Arc::new(ClientMock::with_next_response(Err(Error::Timeout)));
        let err = futures::executor::block_on(context(&mock).read_values(
            ResolvedAddress::coil(1),
            Datatype::Bool,
            1,
        ))
        .unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }
}
