use crate::client::TelemetrySource;
use crate::dashboard::SensorDashboardClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Runs fetch-and-render cycles on a fixed period until stopped.
pub struct Poller;

pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl Poller {
    /// Spawns the loop. The first cycle runs immediately.
    pub fn start<S: TelemetrySource>(
        client: Arc<SensorDashboardClient<S>>,
        period: Duration,
    ) -> PollerHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(run_poller(client, period, rx));
        PollerHandle { shutdown, task }
    }
}

impl PollerHandle {
    /// Signals the loop and waits for it to exit. An in-flight cycle is
    /// abandoned. Returns the number of cycles started.
    pub async fn stop(self) -> u64 {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(cycles) => cycles,
            Err(e) => {
                error!("Poller task failed: {}", e);
                0
            }
        }
    }
}

async fn run_poller<S: TelemetrySource>(
    client: Arc<SensorDashboardClient<S>>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    info!("Starting poller with period={:?}", period);

    // first tick completes immediately
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycles = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                cycles += 1;
                // a slow fetch delays the next tick instead of overlapping it
                tokio::select! {
                    _ = client.fetch_and_render() => {}
                    _ = shutdown.changed() => break,
                }
            }

            // stop requested, or the handle was dropped
            _ = shutdown.changed() => break,
        }
    }

    info!("Poller stopped after {} cycles", cycles);
    cycles
}
