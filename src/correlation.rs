// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Matching of incoming frames to pending requests.
//!
//! Every submitted request is tagged with a transaction id that is unique
//! among all pending requests. The response frame carrying the same id
//! completes the request exactly once: the pending entry is removed from the
//! table before its result is delivered.

use std::{
    collections::HashMap,
    fmt,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU16, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    task::{ready, Context, Poll},
};

use tokio::sync::oneshot;

use crate::{
    frame::tcp::{Header, RequestAdu, ResponseAdu, TransactionId, UnitId},
    mapper, Error, Request, Response, Result,
};

/// Allocation policy for transaction ids.
pub trait TransactionIds: Send + Sync + fmt::Debug {
    /// The next candidate id.
    ///
    /// Candidates that are still occupied by a pending request are skipped.
    fn next_id(&self) -> TransactionId;
}

/// Strictly increasing ids that wrap around after [`u16::MAX`].
#[derive(Debug, Default)]
pub struct Sequential {
    next: AtomicU16,
}

impl Sequential {
    #[must_use]
    pub const fn starting_at(first: TransactionId) -> Self {
        Self {
            next: AtomicU16::new(first),
        }
    }
}

impl TransactionIds for Sequential {
    fn next_id(&self) -> TransactionId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct Pending {
    request: Request,
    generation: u64,
    tx: oneshot::Sender<Result<Response>>,
}

#[derive(Debug, Default)]
struct Table {
    pending: HashMap<TransactionId, Pending>,
    generation: u64,
    closed: bool,
}

fn lock(table: &Mutex<Table>) -> MutexGuard<'_, Table> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What happened to an incoming frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The pending request with this id has been completed.
    Completed(TransactionId),
    /// No request with this id is pending. The frame has been dropped.
    Unmatched(TransactionId),
}

/// Correlation state of a single connection.
///
/// Closing or dropping the correlator fails all pending requests with
/// [`Error::ConnectionClosed`].
#[derive(Debug)]
pub struct Correlator {
    unit_id: UnitId,
    ids: Box<dyn TransactionIds>,
    table: Arc<Mutex<Table>>,
    unmatched: AtomicU64,
}

impl Correlator {
    /// Create a correlator with [`Sequential`] ids starting at 0.
    #[must_use]
    pub fn new(unit_id: UnitId) -> Self {
        Self::with_ids(unit_id, Box::<Sequential>::default())
    }

    #[must_use]
    pub fn with_ids(unit_id: UnitId, ids: Box<dyn TransactionIds>) -> Self {
        Self {
            unit_id,
            ids,
            table: Default::default(),
            unmatched: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub const fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    /// Registers `request` as pending.
    ///
    /// Returns the frame that must be sent and the handle that resolves
    /// with the decoded response.
    pub fn submit(&self, request: Request) -> Result<(RequestAdu, ResultHandle)> {
        let pdu = mapper::build_pdu(&request)?;
        let (tx, rx) = oneshot::channel();

        let mut table = lock(&self.table);
        if table.closed {
            return Err(Error::ConnectionClosed);
        }
        let transaction_id = self.allocate(&table)?;
        table.generation += 1;
        let generation = table.generation;
        table.pending.insert(
            transaction_id,
            Pending {
                request,
                generation,
                tx,
            },
        );
        drop(table);

        let adu = RequestAdu {
            hdr: Header {
                transaction_id,
                unit_id: self.unit_id,
            },
            pdu,
        };
        let handle = ResultHandle {
            transaction_id,
            generation,
            rx,
            table: Arc::clone(&self.table),
            done: false,
        };
        Ok((adu, handle))
    }

    fn allocate(&self, table: &Table) -> Result<TransactionId> {
        for _ in 0..=u16::MAX {
            let transaction_id = self.ids.next_id();
            if !table.pending.contains_key(&transaction_id) {
                return Ok(transaction_id);
            }
        }
        Err(Error::TransactionIdsExhausted)
    }

    /// Completes the pending request that matches `adu`.
    ///
    /// Frames without a pending request are logged and counted, but never
    /// reported to a caller.
    pub fn on_frame(&self, adu: ResponseAdu) -> Delivery {
        let ResponseAdu { hdr, pdu } = adu;
        let transaction_id = hdr.transaction_id;
        let pending = lock(&self.table).pending.remove(&transaction_id);
        let Some(pending) = pending else {
            self.unmatched.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "Dropping frame: {}",
                Error::UnmatchedResponse(transaction_id)
            );
            return Delivery::Unmatched(transaction_id);
        };

        let result = if hdr.unit_id == self.unit_id {
            mapper::parse_pdu(pdu, &pending.request)
        } else {
            Err(Error::MalformedResponse(format!(
                "unexpected unit id: expected = {}, actual = {}",
                self.unit_id, hdr.unit_id
            )))
        };
        match &result {
            Ok(rsp) => log::debug!("Transaction {transaction_id} completed: {:?}", rsp.code()),
            Err(err) => log::debug!("Transaction {transaction_id} failed: {err}"),
        }
        // The caller may have stopped waiting.
        let _ = pending.tx.send(result);
        Delivery::Completed(transaction_id)
    }

    /// Abandons all pending requests and rejects further submissions.
    pub fn close(&self) {
        let pending = {
            let mut table = lock(&self.table);
            table.closed = true;
            std::mem::take(&mut table.pending)
        };
        if !pending.is_empty() {
            log::debug!("Abandoning {} pending transaction(s)", pending.len());
        }
        for (_, pending) in pending {
            let _ = pending.tx.send(Err(Error::ConnectionClosed));
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        lock(&self.table).closed
    }

    /// Number of requests that are waiting for their response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock(&self.table).pending.len()
    }

    /// Number of frames dropped since creation because no request was pending.
    #[must_use]
    pub fn unmatched_count(&self) -> u64 {
        self.unmatched.load(Ordering::Relaxed)
    }
}

impl Drop for Correlator {
    fn drop(&mut self) {
        self.close();
    }
}

/// Resolves with the response of a submitted request.
///
/// Dropping the handle before it resolved abandons the request. A frame
/// that arrives later is treated as unmatched.
#[derive(Debug)]
pub struct ResultHandle {
    transaction_id: TransactionId,
    generation: u64,
    rx: oneshot::Receiver<Result<Response>>,
    table: Arc<Mutex<Table>>,
    done: bool,
}

impl ResultHandle {
    #[must_use]
    pub const fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }
}

impl Future for ResultHandle {
    type Output = Result<Response>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let received = ready!(Pin::new(&mut self.rx).poll(cx));
        self.done = true;
        Poll::Ready(match received {
            Ok(result) => result,
            Err(_) => Err(Error::ConnectionClosed),
        })
    }
}

impl Drop for ResultHandle {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut table = lock(&self.table);
        let owned = table
            .pending
            .get(&self.transaction_id)
            .map_or(false, |pending| pending.generation == self.generation);
        if owned {
            table.pending.remove(&self.transaction_id);
            log::debug!("Transaction {} abandoned", self.transaction_id);
        }
    }
}
