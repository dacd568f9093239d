//! An in-memory fake radio, for exercising the client and dispatcher.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::protocol::{DecodeResult, Frame, FrameDecoder};

/// Host side of the wire, for writing.
#[derive(Debug)]
pub struct HostTx {
    to_radio: mpsc::Sender<Vec<u8>>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl embedded_io::ErrorType for HostTx {
    type Error = Infallible;
}

impl embedded_io::Write for HostTx {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.written.lock().unwrap().extend_from_slice(buf);
        // radio may already be gone, which is fine
        let _ = self.to_radio.send(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Host side of the wire, for reading.
#[derive(Debug)]
pub struct HostRx {
    from_radio: mpsc::Receiver<Vec<u8>>,
    leftover: Vec<u8>,
}

impl embedded_io::ErrorType for HostRx {
    type Error = Infallible;
}

impl embedded_io::Read for HostRx {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.leftover.is_empty() {
            match self.from_radio.recv_timeout(Duration::from_millis(1)) {
                Ok(chunk) => self.leftover = chunk,
                Err(_) => return Ok(0),
            }
        }
        let amt = buf.len().min(self.leftover.len());
        buf[..amt].copy_from_slice(&self.leftover[..amt]);
        self.leftover.drain(..amt);
        Ok(amt)
    }
}

/// A fake radio on its own thread.
///
/// Frames written by the host go to `on_frame`, and bytes outside any
/// frame go to `on_text`. Whatever they return is sent back.
pub struct Radio {
    to_host: mpsc::Sender<Vec<u8>>,
    written: Arc<Mutex<Vec<u8>>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Radio {
    pub fn spawn<F, T>(mut on_frame: F, mut on_text: T) -> (Self, HostTx, HostRx)
    where
        F: FnMut(&Frame) -> Vec<Vec<u8>> + Send + 'static,
        T: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        let (host_tx, from_host) = mpsc::channel::<Vec<u8>>();
        let (to_host, host_rx) = mpsc::channel::<Vec<u8>>();
        let written = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let to_host = to_host.clone();
            let stop = stop.clone();
            std::thread::spawn(move || {
                let mut decoder = FrameDecoder::new();
                while !stop.load(Ordering::Relaxed) {
                    let chunk = match from_host.recv_timeout(Duration::from_millis(1)) {
                        Ok(chunk) => chunk,
                        Err(mpsc::RecvTimeoutError::Timeout) => continue,
                        Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    };
                    let frames: Vec<Frame> = decoder.feed(&chunk).filter_map(DecodeResult::ok).collect();
                    for frame in frames {
                        for reply in on_frame(&frame) {
                            let _ = to_host.send(reply);
                        }
                    }
                    let text = decoder.take_discarded();
                    if !text.is_empty() {
                        let reply = on_text(&text);
                        if !reply.is_empty() {
                            let _ = to_host.send(reply);
                        }
                    }
                }
            })
        };

        let radio = Self {
            to_host,
            written: written.clone(),
            stop,
            handle: Some(handle),
        };
        let tx = HostTx {
            to_radio: host_tx,
            written,
        };
        let rx = HostRx {
            from_radio: host_rx,
            leftover: Vec::new(),
        };
        (radio, tx, rx)
    }

    /// A radio that answers frames, and ignores text.
    pub fn frames<F>(on_frame: F) -> (Self, HostTx, HostRx)
    where
        F: FnMut(&Frame) -> Vec<Vec<u8>> + Send + 'static,
    {
        Self::spawn(on_frame, |_| Vec::new())
    }

    /// Send bytes to the host, unprompted.
    pub fn inject(&self, bytes: Vec<u8>) {
        let _ = self.to_host.send(bytes);
    }

    /// Everything the host has written so far.
    pub fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }
}

impl Drop for Radio {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
