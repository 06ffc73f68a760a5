//! Traits for the robot links and the UI observer.

mod links;
mod observer;

pub use links::{RelayLink, StateLink};
pub use observer::{BotObserver, NoopObserver};

use thiserror::Error;

/// Error type for link operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    /// Link is not connected
    #[error("Device not connected")]
    NotConnected,

    /// Command send failed (channel closed, etc.)
    #[error("Send failed: {0}")]
    SendFailed(String),
}
