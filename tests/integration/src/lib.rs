//! Integration test utilities for the relay gateway
//!
//! Provides an in-process multi-node cluster where the broker is
//! replaced by a local channel, so cross-node behavior is testable
//! without external infrastructure.

pub mod helpers;

pub use helpers::*;
