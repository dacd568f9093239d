use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::protocol::Frame;
use crate::sequence::FrameIdSequence;
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Inner {
    sequence: FrameIdSequence,
    // None until resolved
    slots: HashMap<u8, Option<Frame>>,
}

/// Requests waiting on a response, keyed by frame id.
///
/// Registration, resolution, and timeout removal all happen under one
/// lock, so a request is either resolved or timed out, never both.
#[derive(Debug, Default)]
pub struct PendingTable {
    inner: Mutex<Inner>,
    ready: Condvar,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // slot maps stay consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a free frame id and register it.
    pub fn allocate(&self) -> Result<Ticket<'_>> {
        let mut inner = self.lock();
        let Inner { sequence, slots } = &mut *inner;
        let frame_id = sequence
            .allocate(|id| slots.contains_key(&id))
            .ok_or(Error::NoFreeFrameId)?;
        slots.insert(frame_id, None);
        Ok(Ticket::new(self, frame_id))
    }

    /// Register a specific frame id.
    pub fn register(&self, frame_id: u8) -> Result<Ticket<'_>> {
        if frame_id == 0 {
            return Err(Error::InvalidArgument(
                "frame id 0 never gets a response".to_owned(),
            ));
        }
        let mut inner = self.lock();
        if inner.slots.contains_key(&frame_id) {
            return Err(Error::FrameIdInUse(frame_id));
        }
        inner.slots.insert(frame_id, None);
        Ok(Ticket::new(self, frame_id))
    }

    /// Hand a response to whoever is waiting on `frame_id`.
    ///
    /// Returns false, and drops the frame, if nobody is.
    pub fn resolve(&self, frame_id: u8, frame: Frame) -> bool {
        let mut inner = self.lock();
        match inner.slots.get_mut(&frame_id) {
            Some(slot @ None) => {
                *slot = Some(frame);
                self.ready.notify_all();
                true
            }
            Some(Some(_)) => {
                tracing::debug!(frame_id, "duplicate response dropped");
                false
            }
            None => {
                tracing::debug!(frame_id, "late or unexpected response dropped");
                false
            }
        }
    }

    /// Number of registered, unfinished requests.
    pub fn outstanding(&self) -> usize {
        self.lock().slots.len()
    }

    fn cancel(&self, frame_id: u8) {
        self.lock().slots.remove(&frame_id);
    }

    fn wait(&self, frame_id: u8, timeout: Duration) -> Result<Frame> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.lock();
        loop {
            match inner.slots.get(&frame_id).map(Option::is_some) {
                Some(true) => {
                    if let Some(Some(frame)) = inner.slots.remove(&frame_id) {
                        return Ok(frame);
                    }
                }
                Some(false) => {}
                // cancelled out from under us
                None => {
                    return Err(Error::Timeout {
                        frame_id: Some(frame_id),
                    })
                }
            }

            let now = Instant::now();
            if now >= deadline {
                inner.slots.remove(&frame_id);
                return Err(Error::Timeout {
                    frame_id: Some(frame_id),
                });
            }

            inner = self
                .ready
                .wait_timeout(inner, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

/// A registered request. Dropping it unwaited frees the frame id.
#[derive(Debug)]
#[must_use = "dropping a ticket cancels the request"]
pub struct Ticket<'a> {
    table: &'a PendingTable,
    frame_id: u8,
    done: bool,
}

impl<'a> Ticket<'a> {
    fn new(table: &'a PendingTable, frame_id: u8) -> Self {
        Self {
            table,
            frame_id,
            done: false,
        }
    }

    pub fn frame_id(&self) -> u8 {
        self.frame_id
    }

    /// Block until the response arrives, or `timeout` passes.
    ///
    /// Either way, the frame id is free again afterwards.
    pub fn wait(mut self, timeout: Duration) -> Result<Frame> {
        self.done = true;
        self.table.wait(self.frame_id, timeout)
    }
}

impl<'a> Drop for Ticket<'a> {
    fn drop(&mut self) {
        if !self.done {
            self.table.cancel(self.frame_id);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::protocol::{DeliveryStatus, ModemStatus, TransmitStatus};

    fn status(frame_id: u8, code: u8) -> Frame {
        Frame::TransmitStatus(TransmitStatus {
            frame_id,
            destination_16: 0xfffe,
            retry_count: 0,
            delivery: DeliveryStatus(code),
            discovery: 0,
        })
    }

    #[test]
    fn resolve_before_wait() {
        let table = PendingTable::new();
        let ticket = table.allocate().unwrap();
        let id = ticket.frame_id();
        assert_eq!(id, 1);
        assert!(table.resolve(id, status(id, 0)));
        assert_eq!(ticket.wait(Duration::from_millis(10)).unwrap(), status(id, 0));
        assert_eq!(table.outstanding(), 0);
    }

    #[test]
    fn timeout_then_late_resolve() {
        let table = PendingTable::new();
        let ticket = table.allocate().unwrap();
        let id = ticket.frame_id();
        assert_eq!(
            ticket.wait(Duration::from_millis(10)),
            Err(Error::Timeout { frame_id: Some(id) })
        );
        assert_eq!(table.outstanding(), 0);
        assert!(!table.resolve(id, status(id, 0)));

        // and the id can be registered again
        let again = table.register(id).unwrap();
        assert_eq!(again.frame_id(), id);
    }

    #[test]
    fn duplicate_resolve() {
        let table = PendingTable::new();
        let ticket = table.allocate().unwrap();
        let id = ticket.frame_id();
        assert!(table.resolve(id, status(id, 0)));
        assert!(!table.resolve(id, status(id, 0x21)));
        assert_eq!(ticket.wait(Duration::ZERO).unwrap(), status(id, 0));
    }

    #[test]
    fn drop_cancels() {
        let table = PendingTable::new();
        let ticket = table.allocate().unwrap();
        assert_eq!(table.outstanding(), 1);
        drop(ticket);
        assert_eq!(table.outstanding(), 0);
    }

    #[test]
    fn register_rejects() {
        let table = PendingTable::new();
        let _ticket = table.register(9).unwrap();
        assert_eq!(table.register(9).unwrap_err(), Error::FrameIdInUse(9));
        assert!(matches!(
            table.register(0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn allocate_skips_outstanding() {
        let table = PendingTable::new();
        let _two = table.register(2).unwrap();
        let one = table.allocate().unwrap();
        let three = table.allocate().unwrap();
        assert_eq!(one.frame_id(), 1);
        assert_eq!(three.frame_id(), 3);
    }

    #[test]
    fn table_full() {
        let table = PendingTable::new();
        let tickets: Vec<_> = (0..255).map(|_| table.allocate().unwrap()).collect();
        assert_eq!(table.allocate().unwrap_err(), Error::NoFreeFrameId);
        drop(tickets);
        assert!(table.allocate().is_ok());
    }

    #[test]
    fn out_of_order_responses() {
        let table = PendingTable::new();
        let a = table.allocate().unwrap();
        let b = table.allocate().unwrap();
        let (id_a, id_b) = (a.frame_id(), b.frame_id());
        assert_ne!(id_a, id_b);

        std::thread::scope(|s| {
            let wait_a = s.spawn(move || a.wait(Duration::from_secs(5)));
            let wait_b = s.spawn(move || b.wait(Duration::from_secs(5)));

            std::thread::sleep(Duration::from_millis(10));
            assert!(table.resolve(id_b, status(id_b, 0x21)));
            assert!(table.resolve(id_a, status(id_a, 0)));

            assert_eq!(wait_a.join().unwrap().unwrap(), status(id_a, 0));
            assert_eq!(wait_b.join().unwrap().unwrap(), status(id_b, 0x21));
        });
    }

    #[test]
    fn unknown_frame_dropped() {
        let table = PendingTable::new();
        assert!(!table.resolve(
            42,
            Frame::ModemStatus(ModemStatus { status: 0 })
        ));
    }
}
