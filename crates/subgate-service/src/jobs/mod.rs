//! Background maintenance jobs.
//!
//! Three sweeps run on fixed periods: a daily expiry check, a weekly
//! disengagement nudge and a biweekly broadcast. [`spawn_all`] wires them
//! to the shared [`AppState`] and hands back their task handles.

pub mod scheduler;
pub mod sweeps;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::state::AppState;

use scheduler::spawn_repeating;

/// Spawn every maintenance sweep on its configured period.
pub fn spawn_all(state: Arc<AppState>) -> Vec<JoinHandle<()>> {
    let expiry = {
        let state = state.clone();
        let period = Duration::from_secs(state.config.expiry_sweep_secs);
        spawn_repeating("expiry-sweep", period, move || {
            let state = state.clone();
            async move { sweeps::expiry_sweep(&state).await }
        })
    };

    let disengagement = {
        let state = state.clone();
        let period = Duration::from_secs(state.config.disengagement_sweep_secs);
        spawn_repeating("disengagement-sweep", period, move || {
            let state = state.clone();
            async move { sweeps::disengagement_sweep(&state).await }
        })
    };

    let broadcast = {
        let period = Duration::from_secs(state.config.broadcast_sweep_secs);
        spawn_repeating("broadcast", period, move || {
            let state = state.clone();
            async move { sweeps::broadcast_sweep(&state).await }
        })
    };

    vec![expiry, disengagement, broadcast]
}
