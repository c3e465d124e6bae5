//! Segmentation and reassembly for logical-connection data.
//!
//! Outbound payloads are cut by [`Fragmenter`] at the negotiated payload size;
//! inbound segments are collected by [`RxQueue`]. Credit accounting and
//! delivery to owners live in the engine, which owns the control blocks.

mod fragmenter;
mod reassembly;

pub use fragmenter::{Fragmenter, Segment};
pub use reassembly::{Delivery, RxPush, RxQueue};

#[cfg(test)]
mod tests;
