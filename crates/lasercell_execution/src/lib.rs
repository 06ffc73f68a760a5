//! Task execution and calibration for the laser cell robot.
//!
//! [`BotSocket`] is the runtime: a single tokio task that owns the task queue
//! and reacts to operator commands, link events and its own timers. The
//! pieces it is built from are usable on their own:
//!
//! - [`TaskRunner`]: the queue state machine, driven synchronously
//! - [`ConnectionAggregator`]: telemetry/command link health
//! - [`CalibrationWorkflow`]: snapshot, polling and correction parsing
//! - [`exec_calibration`]: one-shot part calibration from point pairs
//!
//! The UI side is a [`BotObserver`]; the robot side is a [`StateLink`] and a
//! [`RelayLink`].

#![deny(trivial_casts, trivial_numeric_casts, unused_import_braces)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

pub mod calibration;
pub mod components;
pub mod config;
pub mod connection;
pub mod orchestrator;
pub mod scheduler;
pub mod shape;
pub mod socket;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use calibration::{CalibrationArtifact, CalibrationPoll, CalibrationWorkflow, CorrectionResult};
pub use components::{
    CalibPoint, CalibResult, DeviceState, HomePoint, PrepareResult, ShapeType, TaskBuffer,
    TaskPoint, WorkResult,
};
pub use config::{ConfigError, LasercellConfig};
pub use connection::ConnectionAggregator;
pub use orchestrator::{RunState, RunnerContext, RunnerSettings, TaskRunner};
pub use scheduler::{Scheduler, TokioScheduler, Wakeup, WakeupKind};
pub use shape::exec_calibration;
pub use socket::{
    socket_channel, BotSocket, BotSocketHandle, LinkEvent, LinkSender, SocketCommand, SocketInbox,
};
pub use traits::{BotObserver, DeviceError, NoopObserver, RelayLink, StateLink};
