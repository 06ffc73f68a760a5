//! Laser cell server
//!
//! Loads the cell configuration, runs the bot socket against simulated links
//! and works through a short demo queue. Usage: `lasercell_server [config.toml]`.

mod observer;
mod sim;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use lasercell_execution::{
    socket_channel, BotSocket, CalibPoint, HomePoint, LasercellConfig, TaskPoint, WorkResult,
};
use nalgebra::Vector3;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::observer::LoggingObserver;
use crate::sim::{SimCamera, SimRobot};

const DEFAULT_CONFIG: &str = "lasercell.toml";

fn demo_queue() -> (Vec<HomePoint>, Vec<TaskPoint>) {
    let home = vec![HomePoint::new(Vector3::new(0.0, 0.0, 400.0), Vector3::z())];
    let tasks = vec![
        TaskPoint::new(Vector3::new(250.0, 0.0, 50.0), Vector3::z())
            .with_home_point()
            .with_calibration(),
        TaskPoint::new(Vector3::new(250.0, 100.0, 50.0), Vector3::z()).with_task_type(1),
        TaskPoint::new(Vector3::new(300.0, 100.0, 80.0), Vector3::new(0.0, -1.0, 1.0))
            .with_angle(Vector3::new(0.0, 0.0, 45.0))
            .with_task_type(1)
            .with_delay(1.5),
    ];
    (home, tasks)
}

fn demo_part_points() -> Vec<CalibPoint> {
    let offset = Vector3::new(500.0, -200.0, 10.0);
    [
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(120.0, 0.0, 0.0),
        Vector3::new(0.0, 80.0, 0.0),
        Vector3::new(60.0, 40.0, 25.0),
    ]
    .into_iter()
    .map(|p| CalibPoint::new(p, p + offset))
    .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = LasercellConfig::load(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path))?;
    info!("Configuration loaded from {}", config_path);

    let (handle, inbox) = socket_channel();
    let robot = SimRobot::new(handle.link_sender());
    let camera = SimCamera {
        result_path: config.calib_result_path.clone(),
        line: "0.5;-0.25;0;0".to_string(),
    };
    let (finished_tx, mut finished_rx) = mpsc::unbounded_channel();

    let settings = config.runner_settings();
    let socket = BotSocket::new(settings, robot.state_link(), robot.relay_link(), inbox)
        .with_observer(Arc::new(LoggingObserver::new(finished_tx, camera)))
        .spawn();
    let telemetry = robot.spawn_telemetry();

    let part = handle.exec_calibration(demo_part_points()).await?;
    info!(?part, "Part calibration");

    let (home_points, task_points) = demo_queue();
    handle.prepare(task_points.clone())?;
    handle.start_tasks(home_points, task_points)?;

    let result = finished_rx
        .recv()
        .await
        .context("bot socket stopped before the run finished")?;

    handle.shutdown()?;
    socket.await.context("bot socket task panicked")?;
    telemetry.abort();

    if result != WorkResult::Ok {
        bail!("demo run failed");
    }
    info!("Demo run finished");
    Ok(())
}
