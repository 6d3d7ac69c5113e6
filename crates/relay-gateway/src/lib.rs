//! # relay-gateway
//!
//! Real-time client-messaging gateway: persistent bidirectional
//! connections, named broadcast rooms, reconnection grace windows, and
//! cross-instance fan-out over a shared broker.

pub mod auth;
pub mod broadcast;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod session;

pub use server::run;
