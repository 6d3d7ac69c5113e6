//! Room keys
//!
//! A room is not a stored entity; it is a validated string key used as a
//! grouping tag. Cluster-wide membership is the implicit union of each
//! node's local view.

use relay_common::{GatewayError, GatewayResult};
use std::fmt;

/// Maximum length of a room key in characters
pub const MAX_ROOM_KEY_LEN: usize = 100;

/// A validated room key
///
/// Allowed characters are letters, digits, `_`, `-` and the `:`
/// namespace separator used by conversation rooms such as `chat:1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomKey(String);

impl RoomKey {
    /// Validate and wrap a raw room key
    ///
    /// Rejection happens before any state change; a bad key never
    /// touches the registry.
    pub fn parse(raw: &str) -> GatewayResult<Self> {
        if raw.is_empty() {
            return Err(GatewayError::validation("room key must not be empty"));
        }
        if raw.chars().count() > MAX_ROOM_KEY_LEN {
            return Err(GatewayError::validation(format!(
                "room key exceeds {MAX_ROOM_KEY_LEN} characters"
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ':')
        {
            return Err(GatewayError::validation(
                "room key may only contain letters, digits, '_', '-' and ':'",
            ));
        }

        Ok(Self(raw.to_string()))
    }

    /// Get the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the underlying string
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoomKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
