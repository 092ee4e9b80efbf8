// Scan controller — start a scan job, then poll until it settles.
//
// A completed scan asks the surface for a reload after a short delay. A
// failed scan leaves the trigger disabled; only a start error re-enables it.
// Nothing is retried automatically.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::schedule::PollSchedule;
use super::{
    ScanState, ScanSurface, MSG_COMPLETED, MSG_FAILED, MSG_RUNNING, MSG_STARTING,
    MSG_STATUS_CHECK_FAILED, MSG_TIMED_OUT,
};
use crate::client::DashboardApi;
use crate::report::model::JobState;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_RELOAD_DELAY: Duration = Duration::from_millis(1000);

/// Timing for the scan flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub poll_interval: Duration,
    pub reload_delay: Duration,
    /// Give up after this many status checks. `None` polls until a terminal status.
    pub max_polls: Option<u32>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            reload_delay: DEFAULT_RELOAD_DELAY,
            max_polls: None,
        }
    }
}

pub struct ScanController<'a, A: DashboardApi + ?Sized, S: ScanSurface + ?Sized> {
    api: &'a A,
    surface: &'a mut S,
    config: ScanConfig,
    state: ScanState,
}

impl<'a, A: DashboardApi + ?Sized, S: ScanSurface + ?Sized> ScanController<'a, A, S> {
    pub fn new(api: &'a A, surface: &'a mut S, config: ScanConfig) -> Self {
        Self {
            api,
            surface,
            config,
            state: ScanState::Idle,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Drive one scan from the trigger to a terminal state and return it.
    ///
    /// Calling this again after a terminal state starts a fresh scan, the
    /// way a second click on a re-enabled trigger would.
    pub async fn run(&mut self) -> ScanState {
        self.start().await;
        if self.state == ScanState::Polling {
            self.poll().await;
        }
        if self.state == ScanState::Completed {
            tokio::time::sleep(self.config.reload_delay).await;
            debug!("Requesting dashboard reload");
            self.surface.request_reload();
        }
        self.state
    }

    async fn start(&mut self) {
        self.transition(ScanState::Starting);
        self.surface.set_trigger_enabled(false);
        self.surface.set_scan_status(MSG_STARTING);

        match self.api.start_scan().await {
            Ok(()) => self.transition(ScanState::Polling),
            Err(e) => {
                warn!(error = %e, "Scan start failed");
                self.surface.set_scan_status(&format!("Error: {e}"));
                self.surface.set_trigger_enabled(true);
                self.transition(ScanState::Error);
            }
        }
    }

    async fn poll(&mut self) {
        let mut schedule = PollSchedule::start(self.config.poll_interval, self.config.max_polls);

        while let Some(tick) = schedule.next_tick().await {
            let status = match self.api.scan_status().await {
                Ok(status) => status,
                Err(e) => {
                    warn!(error = %e, tick, "Scan status check failed");
                    schedule.stop();
                    self.surface.set_scan_status(MSG_STATUS_CHECK_FAILED);
                    self.transition(ScanState::Error);
                    return;
                }
            };

            match status.status {
                JobState::Running => self.surface.set_scan_status(MSG_RUNNING),
                JobState::Completed => {
                    schedule.stop();
                    self.surface.set_scan_status(MSG_COMPLETED);
                    self.transition(ScanState::Completed);
                    return;
                }
                JobState::Failed => {
                    schedule.stop();
                    self.surface.set_scan_status(MSG_FAILED);
                    self.transition(ScanState::Failed);
                    return;
                }
                other => {
                    debug!(?other, error = ?status.error, tick, "Ignoring non-terminal job status");
                }
            }
        }

        // Only reachable when the tick limit ran out.
        warn!(polls = schedule.ticks(), "Giving up on scan status");
        self.surface.set_scan_status(MSG_TIMED_OUT);
        self.transition(ScanState::Error);
    }

    fn transition(&mut self, next: ScanState) {
        info!(from = %self.state, to = %next, "Scan state change");
        self.state = next;
    }
}
