//! Unit tests for data segmentation and reassembly.
//!
//! Tests are split into focused submodules to keep each file short and easy
//! to navigate.

mod fragmenter_tests;
mod reassembly_tests;
