//! Connection state aggregation for the telemetry and command links.

use tracing::{debug, info, warn};

use crate::components::DeviceState;
use crate::traits::RelayLink;

/// Tracks the up/down flag of both links and derives the device state.
///
/// Every update returns the new externally visible state only when it differs
/// from the last one reported, so observers see each transition exactly once.
#[derive(Debug, Clone, Default)]
pub struct ConnectionAggregator {
    telemetry: bool,
    command: bool,
    reported: DeviceState,
}

impl ConnectionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a telemetry link transition.
    pub fn update_telemetry(
        &mut self,
        connected: bool,
        relay: &mut dyn RelayLink,
    ) -> Option<DeviceState> {
        if self.telemetry == connected {
            return None;
        }
        info!("Telemetry link {}", if connected { "up" } else { "down" });
        self.telemetry = connected;
        self.settle(relay)
    }

    /// Record a command link transition.
    pub fn update_command(
        &mut self,
        connected: bool,
        relay: &mut dyn RelayLink,
    ) -> Option<DeviceState> {
        if self.command == connected {
            return None;
        }
        info!("Command link {}", if connected { "up" } else { "down" });
        self.command = connected;
        self.settle(relay)
    }

    fn settle(&mut self, relay: &mut dyn RelayLink) -> Option<DeviceState> {
        // Motions without pose feedback are not allowed.
        if !self.telemetry && self.command {
            warn!("Telemetry lost while command link is up, dropping command link");
            relay.disconnect();
            self.command = false;
        }

        let health = self.health();
        debug!(?health, telemetry = self.telemetry, command = self.command, "Link health");

        let external = health.external();
        if external == self.reported {
            return None;
        }
        self.reported = external;
        Some(external)
    }

    /// Detailed state, including `Degraded`.
    pub fn health(&self) -> DeviceState {
        DeviceState::derive(self.telemetry, self.command)
    }

    /// Last state reported to observers.
    pub fn state(&self) -> DeviceState {
        self.reported
    }

    pub fn is_ready(&self) -> bool {
        self.reported.is_ready()
    }
}
