#![deny(missing_docs)]

//! Stress-test a serial (UART) link with a self-describing byte pattern.
//!
//! The transmitter pushes an endlessly repeating `0x00..=0xFF` counter
//! pattern onto the line.
//! The receiver checks that every byte equals its predecessor plus one,
//! modulo 256.
//! When the stream breaks, the last three bytes seen are enough to tell
//! whether a byte was inserted into the stream, corrupted in flight, or
//! dropped, and the receiver resynchronizes without any framing or
//! checksums.
//!
//! Throughput for both directions is reported once per second.

/// The command line interface.
pub mod cli;

/// Configuration file handling.
pub mod config;

/// Possible errors in this crate.
pub mod error;

/// Serial line speed resolution and port opening.
pub mod line;

/// Logging setup.
pub mod logging;

/// The reference byte pattern both directions agree on.
pub mod pattern;

/// Periodic throughput reporting.
pub mod report;

/// The readiness loop driving one link under test.
pub mod session;

/// The transmit side: push pattern bytes without blocking.
pub mod transmit;

/// The receive side: verify the pattern and resynchronize on breaks.
pub mod verify;
