//! Putting a freshly powered radio into API mode.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

use crate::{Client, Error, Result};

/// A [DelayNs] that sleeps the current thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns.into()))
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms.into()))
    }
}

#[derive(Debug, Default)]
struct Replies {
    armed: bool,
    text: Vec<u8>,
}

/// Collects command-mode text replies, which arrive outside of any
/// frame.
#[derive(Debug, Default)]
pub(crate) struct ReplyBuffer {
    inner: Mutex<Replies>,
    ready: Condvar,
}

impl ReplyBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Replies> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start collecting, dropping anything left over.
    pub(crate) fn arm(&self) {
        let mut inner = self.lock();
        inner.armed = true;
        inner.text.clear();
    }

    pub(crate) fn disarm(&self) {
        let mut inner = self.lock();
        inner.armed = false;
        inner.text.clear();
    }

    /// Offer bytes seen outside any frame. Ignored unless armed.
    pub(crate) fn push(&self, bytes: &[u8]) {
        let mut inner = self.lock();
        if inner.armed {
            inner.text.extend_from_slice(bytes);
            self.ready.notify_all();
        } else {
            tracing::debug!("ignoring {} bytes outside any frame", bytes.len());
        }
    }

    /// Wait for the next non-empty `\r`-terminated line.
    pub(crate) fn wait_line(&self, timeout: Duration) -> Result<String> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.lock();
        loop {
            while let Some(end) = inner.text.iter().position(|b| *b == b'\r') {
                let line: Vec<u8> = inner.text.drain(..=end).collect();
                let line = String::from_utf8_lossy(&line[..end]).trim().to_owned();
                if !line.is_empty() {
                    return Ok(line);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(Error::Timeout { frame_id: None });
            }
            inner = self
                .ready
                .wait_timeout(inner, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

fn expect_ok(line: String) -> Result<()> {
    if line == "OK" {
        Ok(())
    } else {
        Err(Error::CommandMode(line))
    }
}

impl<W> Client<W>
where
    W: embedded_io::Write,
{
    /// Switch the radio into API mode using the `+++` escape.
    ///
    /// Most modules only honour this shortly after power-on. The
    /// dispatcher must be running, since it collects the text replies.
    pub fn initialize<D>(&self, delay: &mut D) -> Result<()>
    where
        D: DelayNs,
    {
        self.shared.replies.arm();
        let result = self.command_mode(delay);
        self.shared.replies.disarm();
        result?;

        let ap = self.at_command(*b"AP", &[])?;
        if ap != [1] {
            return Err(Error::CommandMode(format!(
                "API mode not enabled, AP is {:02x?}",
                ap
            )));
        }
        tracing::info!("radio in API mode");
        Ok(())
    }

    fn command_mode<D>(&self, delay: &mut D) -> Result<()>
    where
        D: DelayNs,
    {
        let config = self.config();
        let replies = &self.shared.replies;
        let guard_ms = u32::try_from(config.guard_time.as_millis()).unwrap_or(u32::MAX);

        tracing::info!("entering command mode");
        delay.delay_ms(guard_ms);
        self.write_raw(b"+++")?;
        delay.delay_ms(guard_ms);
        expect_ok(replies.wait_line(config.command_mode_timeout)?)?;

        for command in [&b"ATAP1\r"[..], &b"ATCN\r"[..]] {
            tracing::debug!("command mode: {}", String::from_utf8_lossy(command).trim());
            self.write_raw(command)?;
            expect_ok(replies.wait_line(config.command_mode_timeout)?)?;
        }
        Ok(())
    }
}
