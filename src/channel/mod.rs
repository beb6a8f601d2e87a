//! Byte channels and the suspension primitive.
//!
//! The streaming side of the substrate:
//! - [`Suspension`]: a reusable single-occupancy wait slot
//! - [`byte_channel`]: bounded, backpressured SPSC byte transfer with
//!   flush visibility and close-with-cause
//! - [`tasks`]: dedicated reader/writer task builders

pub mod bytechannel;
pub mod suspension;
pub mod tasks;

pub use bytechannel::{byte_channel, copy_and_close, ByteReadChannel, ByteWriteChannel};
pub use suspension::Suspension;
