//! Talk to Digi XBee radios in API mode.
//!
//! Build a [Client] around the write half of a serial port, and run
//! its [Dispatcher] on another thread with the read half. Frame
//! encoding and decoding live in [protocol], and can be used on their
//! own.

mod address;
pub use address::*;

mod client;
pub use client::*;

mod config;
pub use config::*;

mod dispatch;
pub use dispatch::*;

mod error;
pub use error::*;

mod init;
pub use init::StdDelay;

pub mod pending;

pub mod protocol;

mod sequence;
pub use sequence::*;

#[cfg(test)]
mod testing;
