// Scan controller tests on tokio's paused clock.
//
// A scripted fake backend answers start and status calls; MemorySurface
// records every message, the trigger state, and reload requests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use cisdash::client::{DashboardApi, FetchError, ScanError};
use cisdash::render::memory::MemorySurface;
use cisdash::report::model::{JobState, ScanStatusResponse};
use cisdash::report::{FetchedReport, Report};
use cisdash::scan::{
    ScanConfig, ScanController, ScanState, MSG_COMPLETED, MSG_FAILED, MSG_RUNNING, MSG_STARTING,
    MSG_STATUS_CHECK_FAILED, MSG_TIMED_OUT,
};
use tokio::time::Instant;

/// One scripted status answer.
enum Poll {
    State(JobState),
    Fail,
    /// Answer `running`, but only after the given delay.
    Slow(Duration),
}

struct FakeApi {
    start: Mutex<Option<Result<(), ScanError>>>,
    polls: Mutex<VecDeque<Poll>>,
    status_calls: Mutex<Vec<Instant>>,
}

impl FakeApi {
    fn new(start: Result<(), ScanError>, polls: Vec<Poll>) -> Self {
        Self {
            start: Mutex::new(Some(start)),
            polls: Mutex::new(polls.into()),
            status_calls: Mutex::new(Vec::new()),
        }
    }

    fn status_calls(&self) -> Vec<Instant> {
        self.status_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DashboardApi for FakeApi {
    async fn fetch_processed(&self) -> Result<FetchedReport, FetchError> {
        Ok(Report::default().into())
    }

    async fn start_scan(&self) -> Result<(), ScanError> {
        self.start.lock().unwrap().take().unwrap_or(Ok(()))
    }

    async fn scan_status(&self) -> Result<ScanStatusResponse, ScanError> {
        self.status_calls.lock().unwrap().push(Instant::now());
        let next = self.polls.lock().unwrap().pop_front();
        let state = match next {
            Some(Poll::State(state)) => state,
            Some(Poll::Fail) => {
                return Err(ScanError::Decode {
                    endpoint: "/api/scan/status",
                    reason: "expected value at line 1 column 1".to_string(),
                })
            }
            Some(Poll::Slow(delay)) => {
                tokio::time::sleep(delay).await;
                JobState::Running
            }
            None => JobState::Running,
        };
        Ok(ScanStatusResponse {
            status: state,
            error: None,
        })
    }
}

fn config() -> ScanConfig {
    ScanConfig::default()
}

#[tokio::test(start_paused = true)]
async fn running_twice_then_completed_schedules_reload() {
    let api = FakeApi::new(
        Ok(()),
        vec![
            Poll::State(JobState::Running),
            Poll::State(JobState::Running),
            Poll::State(JobState::Completed),
        ],
    );
    let mut surface = MemorySurface::new();
    let started = Instant::now();

    let state = ScanController::new(&api, &mut surface, config()).run().await;

    assert_eq!(state, ScanState::Completed);
    assert_eq!(surface.scan_status.as_deref(), Some("Scan completed. Reloading…"));
    assert_eq!(
        surface.scan_history,
        vec![MSG_STARTING, MSG_RUNNING, MSG_RUNNING, MSG_COMPLETED]
    );
    assert_eq!(surface.reloads, 1);
    // Trigger disabled at start and never re-enabled on this path.
    assert_eq!(surface.trigger_enabled, Some(false));

    // Three polls 2s apart, then the 1s reload delay.
    let calls = api.status_calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0] - started >= Duration::from_millis(2000));
    assert!(calls[2] - calls[1] >= Duration::from_millis(2000));
    assert!(started.elapsed() >= Duration::from_millis(7000));
}

#[tokio::test(start_paused = true)]
async fn rejected_start_re_enables_trigger() {
    let api = FakeApi::new(Err(ScanError::Rejected("busy".to_string())), Vec::new());
    let mut surface = MemorySurface::new();

    let state = ScanController::new(&api, &mut surface, config()).run().await;

    assert_eq!(state, ScanState::Error);
    assert_eq!(surface.scan_status.as_deref(), Some("Error: busy"));
    assert_eq!(surface.trigger_enabled, Some(true));
    assert!(api.status_calls().is_empty());
    assert_eq!(surface.reloads, 0);
}

#[tokio::test(start_paused = true)]
async fn failed_job_keeps_trigger_disabled() {
    let api = FakeApi::new(
        Ok(()),
        vec![Poll::State(JobState::Running), Poll::State(JobState::Failed)],
    );
    let mut surface = MemorySurface::new();

    let state = ScanController::new(&api, &mut surface, config()).run().await;

    assert_eq!(state, ScanState::Failed);
    assert_eq!(surface.scan_status.as_deref(), Some(MSG_FAILED));
    assert_eq!(surface.trigger_enabled, Some(false));
    assert_eq!(surface.reloads, 0);
    assert_eq!(api.status_calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn status_check_exception_stops_polling() {
    let api = FakeApi::new(
        Ok(()),
        vec![Poll::State(JobState::Running), Poll::Fail, Poll::State(JobState::Completed)],
    );
    let mut surface = MemorySurface::new();

    let state = ScanController::new(&api, &mut surface, config()).run().await;

    assert_eq!(state, ScanState::Error);
    assert_eq!(surface.scan_status.as_deref(), Some(MSG_STATUS_CHECK_FAILED));
    // The completed answer was never requested.
    assert_eq!(api.status_calls().len(), 2);
    assert_eq!(surface.trigger_enabled, Some(false));
}

#[tokio::test(start_paused = true)]
async fn non_terminal_statuses_keep_polling_silently() {
    let api = FakeApi::new(
        Ok(()),
        vec![
            Poll::State(JobState::NotFound),
            Poll::State(JobState::Other),
            Poll::State(JobState::Error),
            Poll::State(JobState::Completed),
        ],
    );
    let mut surface = MemorySurface::new();

    let state = ScanController::new(&api, &mut surface, config()).run().await;

    assert_eq!(state, ScanState::Completed);
    assert_eq!(surface.scan_history, vec![MSG_STARTING, MSG_COMPLETED]);
}

#[tokio::test(start_paused = true)]
async fn poll_limit_ends_in_timeout() {
    let api = FakeApi::new(Ok(()), Vec::new());
    let mut surface = MemorySurface::new();
    let config = ScanConfig {
        max_polls: Some(3),
        ..ScanConfig::default()
    };

    let state = ScanController::new(&api, &mut surface, config).run().await;

    assert_eq!(state, ScanState::Error);
    assert_eq!(surface.scan_status.as_deref(), Some(MSG_TIMED_OUT));
    assert_eq!(api.status_calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn slow_status_check_never_overlaps_next_tick() {
    let api = FakeApi::new(
        Ok(()),
        vec![
            Poll::Slow(Duration::from_millis(4500)),
            Poll::State(JobState::Completed),
        ],
    );
    let mut surface = MemorySurface::new();

    let state = ScanController::new(&api, &mut surface, config()).run().await;

    assert_eq!(state, ScanState::Completed);
    let calls = api.status_calls();
    assert_eq!(calls.len(), 2);
    // The second check starts only after the slow one returned.
    assert!(calls[1] - calls[0] >= Duration::from_millis(4500));
}

#[tokio::test(start_paused = true)]
async fn controller_reports_state_after_run() {
    let api = FakeApi::new(Ok(()), vec![Poll::State(JobState::Completed)]);
    let mut surface = MemorySurface::new();
    let mut controller = ScanController::new(&api, &mut surface, config());
    assert_eq!(controller.state(), ScanState::Idle);
    controller.run().await;
    assert_eq!(controller.state(), ScanState::Completed);
    assert!(controller.state().is_terminal());
}
