use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use crate::client::Shared;
use crate::protocol::{DecodeResult, Frame, FrameDecoder, FrameSerialize};
use crate::{Address, Error, Result};

/// Receives payloads sent to us by other radios.
///
/// Called from the dispatcher's thread, in arrival order, and never
/// re-entrantly.
pub trait ReceiveHandler {
    fn on_receive(&mut self, source: Address, payload: &[u8]);
}

impl<F> ReceiveHandler for F
where
    F: FnMut(Address, &[u8]),
{
    fn on_receive(&mut self, source: Address, payload: &[u8]) {
        self(source, payload)
    }
}

/// A received payload, for use with channels.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Received {
    pub source: Address,
    pub data: Vec<u8>,
}

impl ReceiveHandler for mpsc::Sender<Received> {
    fn on_receive(&mut self, source: Address, payload: &[u8]) {
        let received = Received {
            source,
            data: payload.to_vec(),
        };
        if self.send(received).is_err() {
            tracing::debug!(%source, "receiver gone, payload dropped");
        }
    }
}

/// Stops a running [Dispatcher].
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters kept by a [Dispatcher].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DispatchStats {
    pub frames: u64,
    pub checksum_errors: u64,
    pub parse_errors: u64,
    pub delivered: u64,
    pub resolved: u64,
    pub dropped: u64,
    pub read_errors: u64,
}

/// Longest wait between reads of a port that keeps failing.
const MAX_BACKOFF: Duration = Duration::from_millis(500);

/// Reads the port, decodes frames, and routes them: responses to
/// waiting requests, received payloads to the handler.
#[derive(Debug)]
pub struct Dispatcher<R, H> {
    port: R,
    handler: H,
    shared: Arc<Shared>,
    decoder: FrameDecoder,
    buffer: Vec<u8>,
    stop: StopHandle,
    stats: DispatchStats,
}

/// Read errors that only mean "nothing yet".
fn is_transient(kind: embedded_io::ErrorKind) -> bool {
    matches!(
        kind,
        embedded_io::ErrorKind::TimedOut | embedded_io::ErrorKind::Interrupted
    )
}

impl<R, H> Dispatcher<R, H>
where
    R: embedded_io::Read,
    H: ReceiveHandler,
{
    pub(crate) fn new(port: R, handler: H, shared: Arc<Shared>) -> Self {
        Self {
            port,
            handler,
            decoder: FrameDecoder::with_max_len(shared.config.max_frame_len),
            buffer: vec![0; shared.config.read_buffer.max(1)],
            shared,
            stop: StopHandle::default(),
            stats: DispatchStats::default(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Release the port and handler.
    pub fn free(self) -> (R, H) {
        (self.port, self.handler)
    }

    /// Poll until stopped. Errors are logged, never fatal.
    ///
    /// A port that keeps failing is retried with a doubling delay, up
    /// to half a second, and only the first failure is a warning.
    pub fn run(&mut self) {
        let poll_interval = self.shared.config.poll_interval;
        let mut backoff = poll_interval;
        let mut failing = false;
        while !self.stop.is_stopped() {
            match self.poll() {
                Ok(_) => {
                    if failing {
                        tracing::info!("port readable again");
                        failing = false;
                        backoff = poll_interval;
                    }
                }
                Err(e) => {
                    self.stats.read_errors += 1;
                    if failing {
                        tracing::debug!("read failed again: {}", e);
                    } else {
                        tracing::warn!("read failed: {}", e);
                        failing = true;
                    }
                    std::thread::sleep(backoff);
                    backoff = (backoff * 2).min(MAX_BACKOFF).max(poll_interval);
                }
            }
        }
        tracing::debug!(stats = ?self.stats, "dispatcher stopped");
    }

    /// Do one read, and process whatever it returned.
    ///
    /// Returns the number of bytes read. Nothing available is not an
    /// error, it just waits one poll interval.
    pub fn poll(&mut self) -> Result<usize> {
        let amt = match self.port.read(&mut self.buffer) {
            Ok(amt) => amt,
            Err(e) if is_transient(embedded_io::Error::kind(&e)) => 0,
            Err(e) => return Err(Error::transport(e)),
        };

        if amt == 0 {
            std::thread::sleep(self.shared.config.poll_interval);
            return Ok(0);
        }

        let data = self.buffer[..amt].to_vec();
        self.process(&data);
        Ok(amt)
    }

    /// Feed bytes to the decoder and route everything it produces.
    pub fn process(&mut self, data: &[u8]) {
        tracing::trace!("read {:02x?}", data);

        let Self {
            decoder,
            handler,
            shared,
            stats,
            ..
        } = self;

        for result in decoder.feed(data) {
            match result {
                DecodeResult::Ok(frame) => {
                    stats.frames += 1;
                    route(frame, handler, shared, stats);
                }
                DecodeResult::ChecksumErr(raw) => {
                    stats.checksum_errors += 1;
                    tracing::warn!(len = raw.len(), "checksum mismatch, resyncing");
                }
                DecodeResult::ParseErr(raw, kind) => {
                    stats.parse_errors += 1;
                    tracing::warn!(
                        frame_type = raw.first().copied(),
                        ?kind,
                        "unparseable frame dropped"
                    );
                }
            }
        }

        let discarded = decoder.take_discarded();
        if !discarded.is_empty() {
            shared.replies.push(&discarded);
        }
    }
}

fn route<H>(frame: Frame, handler: &mut H, shared: &Shared, stats: &mut DispatchStats)
where
    H: ReceiveHandler,
{
    tracing::debug!(?frame, "decoded");

    if let Some(frame_id) = frame.response_frame_id() {
        if frame_id == 0 {
            tracing::debug!("response with frame id 0 dropped");
            stats.dropped += 1;
        } else if shared.pending.resolve(frame_id, frame) {
            stats.resolved += 1;
        } else {
            stats.dropped += 1;
        }
        return;
    }

    match frame {
        Frame::ReceivePacket(packet) => {
            stats.delivered += 1;
            handler.on_receive(packet.source, &packet.data);
        }
        Frame::ModemStatus(status) => {
            tracing::info!(%status, "modem status");
        }
        other => {
            tracing::debug!(frame_type = other.frame_type(), "ignoring request frame");
        }
    }
}
