//! Error taxonomy

mod gateway_error;

pub use gateway_error::{ErrorAck, GatewayError, GatewayResult};
