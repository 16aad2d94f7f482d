//! Pending-query table matching replies to the queries that asked for them.
//!
//! # How a reply finds its query
//!
//! Each query is sent with a fresh non-zero header sequence and registers a
//! waiter under the reply kind it expects.  When a reply arrives:
//!
//! 1. If its header sequence is non-zero and equals a waiter's sequence, that
//!    waiter gets the reply.
//! 2. Otherwise the oldest waiter of that kind gets it.
//!
//! The compositor currently leaves the sequence at 0, so rule 2 is what runs
//! in practice.  Waiters of one kind form a FIFO queue, so a second query of
//! the same kind no longer overwrites the first one.  It still relies on the
//! server answering same-kind queries in the order they were sent; if it ever
//! answers out of order, the replies are handed to the wrong queries.
//!
//! Waiters whose receiver has been dropped are skipped.  Closing the table
//! fails every waiter with [`ReplyError::ConnectionClosed`], and any waiter
//! registered afterwards fails immediately.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

use crate::dispatch::event::Reply;
use crate::protocol::codec::ProtocolError;
use crate::protocol::messages::ReplyKind;

/// Why a query finished without a reply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplyError {
    #[error("connection closed before the reply arrived")]
    ConnectionClosed,

    #[error("reply could not be decoded: {0}")]
    Decode(#[from] ProtocolError),
}

pub type ReplyResult = Result<Reply, ReplyError>;

/// Receiving end handed back to the code that issued a query.
pub type ReplyReceiver = oneshot::Receiver<ReplyResult>;

struct Waiter {
    sequence: u32,
    tx: oneshot::Sender<ReplyResult>,
}

#[derive(Default)]
pub struct Correlator {
    pending: HashMap<ReplyKind, VecDeque<Waiter>>,
    closed: bool,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a waiter for the next reply of `kind`.
    pub fn register(&mut self, kind: ReplyKind, sequence: u32) -> ReplyReceiver {
        let (tx, rx) = oneshot::channel();
        if self.closed {
            let _ = tx.send(Err(ReplyError::ConnectionClosed));
            return rx;
        }
        self.pending
            .entry(kind)
            .or_default()
            .push_back(Waiter { sequence, tx });
        rx
    }

    /// Hands `reply` to one waiter.  Returns `false` when nobody was waiting.
    pub fn resolve(&mut self, reply: Reply, sequence: u32) -> bool {
        let kind = reply.kind();
        self.deliver(kind, sequence, Ok(reply))
    }

    /// Fails one waiter of `kind` with `err`, picked by the same rule as
    /// [`Correlator::resolve`]: the echoed `sequence` if it matches, else the
    /// oldest.
    pub fn fail(&mut self, kind: ReplyKind, sequence: u32, err: ReplyError) -> bool {
        self.deliver(kind, sequence, Err(err))
    }

    /// Fails every waiter with [`ReplyError::ConnectionClosed`] and refuses
    /// new ones.  Returns how many live waiters were failed.
    pub fn close(&mut self) -> usize {
        self.closed = true;
        let mut failed = 0;
        for (_, queue) in self.pending.drain() {
            for waiter in queue {
                if waiter.tx.send(Err(ReplyError::ConnectionClosed)).is_ok() {
                    failed += 1;
                }
            }
        }
        failed
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of live waiters for `kind`.
    pub fn pending(&self, kind: ReplyKind) -> usize {
        self.pending
            .get(&kind)
            .map(|q| q.iter().filter(|w| !w.tx.is_closed()).count())
            .unwrap_or(0)
    }

    fn deliver(&mut self, kind: ReplyKind, sequence: u32, mut result: ReplyResult) -> bool {
        let Some(queue) = self.pending.get_mut(&kind) else {
            return false;
        };
        queue.retain(|w| !w.tx.is_closed());

        while !queue.is_empty() {
            let index = if sequence != 0 {
                queue
                    .iter()
                    .position(|w| w.sequence == sequence)
                    .unwrap_or(0)
            } else {
                0
            };
            let Some(waiter) = queue.remove(index) else {
                break;
            };
            match waiter.tx.send(result) {
                Ok(()) => {
                    debug!(?kind, sequence = waiter.sequence, "reply delivered");
                    return true;
                }
                // Receiver dropped between the retain and the send.
                Err(back) => result = back,
            }
        }
        false
    }
}
