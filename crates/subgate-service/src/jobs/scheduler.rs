//! Fixed-period background job runner.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Spawn a job that runs every `period`, starting one period from now.
///
/// Runs never overlap: the next tick is waited out only after the current
/// run finishes, and a run that outlasts its period delays the following
/// one instead of piling up. A failing run is logged and the schedule keeps
/// going.
pub fn spawn_repeating<F, Fut, E>(name: &'static str, period: Duration, mut job: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send,
    E: Display,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the first run
        // lands a full period after startup.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            tracing::debug!(job = name, "Running scheduled job");
            if let Err(e) = job().await {
                tracing::error!(job = name, error = %e, "Scheduled job failed");
            }
        }
    })
}
