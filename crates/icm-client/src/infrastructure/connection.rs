//! Socket plumbing for the compositor connection.
//!
//! Architecture:
//! - `Connection` owns the write side through an unbounded channel; callers
//!   never touch the socket directly.
//! - A reader task owns the read half and the [`FrameDecoder`].  It dispatches
//!   every complete frame, in arrival order, through the shared [`Dispatcher`].
//! - A writer task drains the outbound channel into the write half.
//!
//! # Shutdown (for beginners)
//!
//! There are three ways a connection ends:
//!
//! | trigger                  | notifications                        |
//! |--------------------------|--------------------------------------|
//! | server closes the socket | `Closed`                             |
//! | read or write error      | `TransportError`, then `Closed`      |
//! | header with length < 16  | `ProtocolViolation`, then `Closed`   |
//!
//! In every case pending queries fail with `ConnectionClosed` and later sends
//! fail too.  Whichever task hits the end first sends the notifications; the
//! other one finds them already sent.  [`Connection::close`] only queues a
//! half-close behind the frames already waiting to be written; the reader keeps
//! running until the server hangs up.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use icm_core::protocol::codec::encode_frame;
use icm_core::{
    Dispatcher, Event, Frame, FrameDecoder, IcmMessage, ProtocolError, ReplyReceiver,
    SequenceCounter,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::ClientError;

/// Read buffer size for the socket.
const READ_CHUNK: usize = 64 * 1024;

/// Item on the outbound channel.
#[derive(Debug)]
enum Outbound {
    Frame(Vec<u8>),
    /// Half-close the write side once everything before it is written.
    Shutdown,
}

/// Locks the dispatcher, recovering it if a subscriber callback panicked
/// while it was held.
pub(crate) fn lock(dispatcher: &Mutex<Dispatcher>) -> MutexGuard<'_, Dispatcher> {
    dispatcher.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One live connection to the compositor.
pub struct Connection {
    outbound: mpsc::UnboundedSender<Outbound>,
    dispatcher: Arc<Mutex<Dispatcher>>,
    sequence: SequenceCounter,
    closed: Arc<AtomicBool>,
}

impl Connection {
    /// Connects to the Unix socket at `path`.
    pub async fn open(
        path: &Path,
        dispatcher: Arc<Mutex<Dispatcher>>,
    ) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(path)
            .await
            .map_err(|source| ClientError::Connect {
                path: path.to_path_buf(),
                source,
            })?;
        info!("connected to compositor at {}", path.display());
        Ok(Self::start(stream, dispatcher))
    }

    /// Starts the reader and writer tasks on an already-open stream and emits
    /// [`Event::Connected`].  Must be called inside a Tokio runtime.
    pub fn start<S>(stream: S, dispatcher: Arc<Mutex<Dispatcher>>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let (tx, rx) = mpsc::unbounded_channel();
        let teardown = Teardown::new(Arc::clone(&dispatcher));
        let closed = Arc::clone(&teardown.closed);

        // Connected goes out before the reader can dispatch anything.
        lock(&dispatcher).emit(&Event::Connected);

        tokio::spawn(write_loop(writer, rx, teardown.clone()));
        tokio::spawn(read_loop(reader, teardown, tx.clone()));

        Self {
            outbound: tx,
            dispatcher,
            sequence: SequenceCounter::new(),
            closed,
        }
    }

    /// Queues a command frame.  Commands carry sequence 0.
    pub fn send(&self, msg: &IcmMessage) -> Result<(), ClientError> {
        self.enqueue(encode_frame(msg, 0))
    }

    /// Registers a waiter for `msg`'s reply, then queues the query with a
    /// fresh sequence number.
    pub fn query(&self, msg: &IcmMessage) -> Result<ReplyReceiver, ClientError> {
        let kind = msg
            .expected_reply()
            .ok_or(ClientError::NotAQuery(msg.message_type()))?;
        if self.is_closed() {
            return Err(ClientError::ConnectionClosed);
        }
        let sequence = self.sequence.next();
        let rx = lock(&self.dispatcher).register_query(kind, sequence);
        self.enqueue(encode_frame(msg, sequence))?;
        Ok(rx)
    }

    /// Requests a graceful half-close of the write side.  Frames queued
    /// earlier are still written.  Does not wait for the flush.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("closing compositor connection");
            let _ = self.outbound.send(Outbound::Shutdown);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn enqueue(&self, bytes: Vec<u8>) -> Result<(), ClientError> {
        if self.is_closed() {
            return Err(ClientError::ConnectionClosed);
        }
        self.outbound
            .send(Outbound::Frame(bytes))
            .map_err(|_| ClientError::ConnectionClosed)
    }
}

// ── Teardown ──────────────────────────────────────────────────────────────────

/// End-of-connection handling shared by the reader and writer tasks.
#[derive(Clone)]
struct Teardown {
    dispatcher: Arc<Mutex<Dispatcher>>,
    /// Refuses further sends.  Also set by [`Connection::close`].
    closed: Arc<AtomicBool>,
    /// Set once the terminal notifications have gone out.
    finished: Arc<AtomicBool>,
}

impl Teardown {
    fn new(dispatcher: Arc<Mutex<Dispatcher>>) -> Self {
        Self {
            dispatcher,
            closed: Arc::new(AtomicBool::new(false)),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Marks the connection closed, emits `terminal` (if any) and `Closed`,
    /// then fails every pending query.  Only the first call notifies.
    fn run(&self, terminal: Option<Event>) {
        self.closed.store(true, Ordering::SeqCst);
        if self.finished.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut d = lock(&self.dispatcher);
        if let Some(event) = terminal {
            d.emit(&event);
        }
        d.emit(&Event::Closed);
        d.close();
    }
}

// ── Tasks ─────────────────────────────────────────────────────────────────────

async fn write_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Outbound>, teardown: Teardown)
where
    W: AsyncWrite + Unpin,
{
    while let Some(item) = rx.recv().await {
        match item {
            Outbound::Frame(bytes) => {
                if let Err(e) = writer.write_all(&bytes).await {
                    error!("failed to send frame: {e}");
                    teardown.run(Some(Event::TransportError(e.to_string())));
                    return;
                }
            }
            Outbound::Shutdown => break,
        }
    }
    if let Err(e) = writer.shutdown().await {
        debug!("write half shutdown: {e}");
    }
}

async fn read_loop<R>(mut reader: R, teardown: Teardown, outbound: mpsc::UnboundedSender<Outbound>)
where
    R: AsyncRead + Unpin,
{
    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; READ_CHUNK];

    let terminal = loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => {
                info!("compositor closed the connection");
                break None;
            }
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!("read error on compositor socket: {e}");
                break Some(Event::TransportError(e.to_string()));
            }
        };

        decoder.feed(&buf[..n]);
        if let Some(err) = drain_frames(&mut decoder, &teardown.dispatcher) {
            error!("tearing down connection: {err}");
            break Some(Event::ProtocolViolation(err));
        }
    };

    let _ = outbound.send(Outbound::Shutdown);
    teardown.run(terminal);
}

/// Dispatches every complete frame in `decoder`.  Returns the fatal framing
/// error, if one was hit.
fn drain_frames(
    decoder: &mut FrameDecoder,
    dispatcher: &Mutex<Dispatcher>,
) -> Option<ProtocolError> {
    for result in decoder.take_frames() {
        match result {
            Ok(frame) => dispatch_one(dispatcher, &frame),
            Err(err) => return Some(err),
        }
    }
    None
}

fn dispatch_one(dispatcher: &Mutex<Dispatcher>, frame: &Frame) {
    let result = lock(dispatcher).dispatch_frame(frame);
    match result {
        Ok(delivery) => debug!(
            message_type = frame.header.message_type,
            sequence = frame.header.sequence,
            ?delivery,
            "frame dispatched"
        ),
        Err(ProtocolError::UnknownMessageType(code)) => {
            warn!(code, "skipping frame with unknown message type");
        }
        Err(e) => warn!("skipping undecodable frame: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
