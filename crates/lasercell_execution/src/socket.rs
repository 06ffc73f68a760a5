//! BotSocket - the tokio task that owns the run.
//!
//! All state lives in one task. Operator commands and link events share a
//! single ordered channel; timer wakeups arrive on a second one and are only
//! taken when no command or link event is waiting. Handlers run to completion
//! one at a time, so the queue, the flags and the retry counter need no
//! locking.

use std::sync::Arc;

use lasercell_robotics::{to_operator_position, KabschSolver, NativePose, PointPairSolver};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::components::{CalibPoint, CalibResult, HomePoint, PrepareResult, TaskPoint};
use crate::connection::ConnectionAggregator;
use crate::orchestrator::{RunnerContext, RunnerSettings, TaskRunner};
use crate::scheduler::{Scheduler, TokioScheduler, Wakeup};
use crate::shape::exec_calibration;
use crate::traits::{BotObserver, DeviceError, NoopObserver, RelayLink, StateLink};

/// Operator requests.
pub enum SocketCommand {
    Prepare(Vec<TaskPoint>),
    StartTasks {
        home_points: Vec<HomePoint>,
        task_points: Vec<TaskPoint>,
    },
    StopTasks,
    ExecCalibration {
        points: Vec<CalibPoint>,
        reply: oneshot::Sender<CalibResult>,
    },
    SetObserver(Arc<dyn BotObserver>),
    Shutdown,
}

/// Events pushed by the link drivers.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Telemetry pose in the controller frame
    PoseReceived(NativePose),
    StateConnectionChanged(bool),
    RelayConnectionChanged(bool),
    /// The outstanding motion was accepted by the controller
    PointEnqueued,
    PointEnqueueFailed,
}

enum Inbound {
    Command(SocketCommand),
    Link(LinkEvent),
}

fn stopped() -> DeviceError {
    DeviceError::SendFailed("bot socket stopped".to_string())
}

/// Sender side handed to link drivers.
#[derive(Clone)]
pub struct LinkSender {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl LinkSender {
    pub fn send(&self, event: LinkEvent) -> Result<(), DeviceError> {
        self.tx.send(Inbound::Link(event)).map_err(|_| stopped())
    }
}

/// Receiving end of a socket's channel, consumed by [`BotSocket::new`].
pub struct SocketInbox {
    rx: mpsc::UnboundedReceiver<Inbound>,
}

/// Create the channel for one socket.
pub fn socket_channel() -> (BotSocketHandle, SocketInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (BotSocketHandle { tx }, SocketInbox { rx })
}

/// Cloneable front end for the socket task.
#[derive(Clone)]
pub struct BotSocketHandle {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl BotSocketHandle {
    fn send(&self, command: SocketCommand) -> Result<(), DeviceError> {
        self.tx.send(Inbound::Command(command)).map_err(|_| stopped())
    }

    pub fn prepare(&self, points: Vec<TaskPoint>) -> Result<(), DeviceError> {
        self.send(SocketCommand::Prepare(points))
    }

    pub fn start_tasks(
        &self,
        home_points: Vec<HomePoint>,
        task_points: Vec<TaskPoint>,
    ) -> Result<(), DeviceError> {
        self.send(SocketCommand::StartTasks {
            home_points,
            task_points,
        })
    }

    pub fn stop_tasks(&self) -> Result<(), DeviceError> {
        self.send(SocketCommand::StopTasks)
    }

    /// Fit the part pose from correspondences. Does not touch the queue.
    pub async fn exec_calibration(
        &self,
        points: Vec<CalibPoint>,
    ) -> Result<CalibResult, DeviceError> {
        let (reply, rx) = oneshot::channel();
        self.send(SocketCommand::ExecCalibration { points, reply })?;
        rx.await.map_err(|_| {
            DeviceError::SendFailed("bot socket dropped calibration request".to_string())
        })
    }

    pub fn set_observer(&self, observer: Arc<dyn BotObserver>) -> Result<(), DeviceError> {
        self.send(SocketCommand::SetObserver(observer))
    }

    /// Sender for link drivers to report into this socket.
    pub fn link_sender(&self) -> LinkSender {
        LinkSender {
            tx: self.tx.clone(),
        }
    }

    pub fn shutdown(&self) -> Result<(), DeviceError> {
        self.send(SocketCommand::Shutdown)
    }
}

pub struct BotSocket<S, R> {
    state_link: S,
    relay: R,
    observer: Arc<dyn BotObserver>,
    solver: Box<dyn PointPairSolver + Send>,
    links: ConnectionAggregator,
    runner: TaskRunner,
    scheduler: TokioScheduler,
    inbox: SocketInbox,
    wakeups: mpsc::UnboundedReceiver<Wakeup>,
}

impl<S, R> BotSocket<S, R>
where
    S: StateLink + 'static,
    R: RelayLink + 'static,
{
    pub fn new(settings: RunnerSettings, state_link: S, relay: R, inbox: SocketInbox) -> Self {
        let (wakeup_tx, wakeup_rx) = mpsc::unbounded_channel();
        Self {
            state_link,
            relay,
            observer: Arc::new(NoopObserver),
            solver: Box::new(KabschSolver),
            links: ConnectionAggregator::new(),
            runner: TaskRunner::new(settings),
            scheduler: TokioScheduler::new(wakeup_tx),
            inbox,
            wakeups: wakeup_rx,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn BotObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_solver(mut self, solver: Box<dyn PointPairSolver + Send>) -> Self {
        self.solver = solver;
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        info!("Bot socket running");
        let telemetry = self.state_link.connected();
        let command = self.relay.connected();
        self.on_state_connection(telemetry);
        self.on_relay_connection(command);

        loop {
            tokio::select! {
                biased;
                inbound = self.inbox.rx.recv() => match inbound {
                    Some(Inbound::Command(SocketCommand::Shutdown)) | None => break,
                    Some(Inbound::Command(command)) => self.handle_command(command),
                    Some(Inbound::Link(event)) => self.handle_link_event(event),
                },
                Some(wakeup) = self.wakeups.recv() => {
                    let (runner, mut ctx) = self.split();
                    runner.on_wakeup(wakeup, &mut ctx);
                }
            }
        }

        self.scheduler.cancel_all();
        info!("Bot socket stopped");
    }

    fn split(&mut self) -> (&mut TaskRunner, RunnerContext<'_>) {
        let link_ready = self.links.is_ready();
        (
            &mut self.runner,
            RunnerContext {
                relay: &mut self.relay,
                observer: self.observer.as_ref(),
                scheduler: &mut self.scheduler,
                link_ready,
            },
        )
    }

    fn handle_command(&mut self, command: SocketCommand) {
        match command {
            SocketCommand::Prepare(points) => {
                debug!("Prepare {} points", points.len());
                self.observer.prepare_complete(PrepareResult::Ok);
            }
            SocketCommand::StartTasks {
                home_points,
                task_points,
            } => {
                let (runner, mut ctx) = self.split();
                runner.start_tasks(home_points, task_points, &mut ctx);
            }
            SocketCommand::StopTasks => {
                let (runner, mut ctx) = self.split();
                runner.stop_tasks(&mut ctx);
            }
            SocketCommand::ExecCalibration { points, reply } => {
                let result =
                    exec_calibration(&points, self.solver.as_ref(), self.observer.as_ref());
                // Caller may have given up waiting.
                let _ = reply.send(result);
            }
            SocketCommand::SetObserver(observer) => {
                debug!("Observer replaced");
                self.observer = observer;
            }
            // Handled by the run loop.
            SocketCommand::Shutdown => {}
        }
    }

    fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::PoseReceived(pose) => {
                let world_to_user = self.runner.settings().frames.world_to_user();
                let position = to_operator_position(&pose, world_to_user);
                self.observer.laser_head_position_changed(&position);
            }
            LinkEvent::StateConnectionChanged(connected) => self.on_state_connection(connected),
            LinkEvent::RelayConnectionChanged(connected) => self.on_relay_connection(connected),
            LinkEvent::PointEnqueued => {
                let (runner, mut ctx) = self.split();
                runner.on_ack(true, &mut ctx);
            }
            LinkEvent::PointEnqueueFailed => {
                let (runner, mut ctx) = self.split();
                runner.on_ack(false, &mut ctx);
            }
        }
    }

    fn on_state_connection(&mut self, connected: bool) {
        if let Some(state) = self.links.update_telemetry(connected, &mut self.relay) {
            info!(?state, "Device state changed");
            self.observer.connection_state_changed(state);
        }
    }

    fn on_relay_connection(&mut self, connected: bool) {
        if let Some(state) = self.links.update_command(connected, &mut self.relay) {
            info!(?state, "Device state changed");
            self.observer.connection_state_changed(state);
        }
    }
}
