// Recurring poll schedule with an explicit stop.
//
// Ticks are awaited one at a time by the caller, so a status check that runs
// longer than the period can never overlap the next one: missed ticks are
// skipped rather than fired in a burst. Under tokio's paused clock the
// schedule advances deterministically.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub struct PollSchedule {
    interval: Interval,
    period: Duration,
    max_ticks: Option<u32>,
    ticks: u32,
    stopped: bool,
}

impl PollSchedule {
    /// Start a schedule whose first tick fires one full `period` from now.
    ///
    /// `max_ticks` bounds how many ticks are handed out; `None` never runs out.
    pub fn start(period: Duration, max_ticks: Option<u32>) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            period,
            max_ticks,
            ticks: 0,
            stopped: false,
        }
    }

    /// Wait for the next tick and return its 1-based number.
    ///
    /// Returns `None` immediately once stopped or once `max_ticks` is spent.
    pub async fn next_tick(&mut self) -> Option<u32> {
        if self.stopped || self.is_exhausted() {
            return None;
        }
        self.interval.tick().await;
        self.ticks += 1;
        Some(self.ticks)
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// True when a tick limit was set and every tick has been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.max_ticks.is_some_and(|max| self.ticks >= max)
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_period() {
        let start = Instant::now();
        let mut schedule = PollSchedule::start(Duration::from_millis(2000), None);
        assert_eq!(schedule.next_tick().await, Some(1));
        assert!(start.elapsed() >= Duration::from_millis(2000));
        assert_eq!(schedule.next_tick().await, Some(2));
        assert!(start.elapsed() >= Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_schedule() {
        let mut schedule = PollSchedule::start(Duration::from_millis(10), None);
        assert!(schedule.next_tick().await.is_some());
        schedule.stop();
        assert!(schedule.is_stopped());
        assert_eq!(schedule.next_tick().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_limit_is_honored() {
        let mut schedule = PollSchedule::start(Duration::from_millis(10), Some(2));
        assert_eq!(schedule.next_tick().await, Some(1));
        assert_eq!(schedule.next_tick().await, Some(2));
        assert!(schedule.is_exhausted());
        assert_eq!(schedule.next_tick().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_work_skips_missed_ticks() {
        let start = Instant::now();
        let mut schedule = PollSchedule::start(Duration::from_millis(100), None);
        schedule.next_tick().await;
        // Work outlives two periods; the next tick lands on the grid, not in a burst.
        tokio::time::sleep(Duration::from_millis(250)).await;
        schedule.next_tick().await;
        let after_slow = start.elapsed();
        schedule.next_tick().await;
        assert!(start.elapsed() - after_slow >= Duration::from_millis(50));
    }
}
