//! Periodic re-poll of the current page.
//!
//! A running timer is a spawned tokio task; stopping aborts it. The
//! controller never holds more than one task, so restarts cannot stack up
//! duplicate polls.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Default poll period.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshStatus {
    Enabled,
    Disabled,
}

impl RefreshStatus {
    /// Label of the toggle control: what pressing it will do next.
    pub fn button_label(self) -> &'static str {
        match self {
            RefreshStatus::Enabled => "Stop",
            RefreshStatus::Disabled => "Start",
        }
    }

    pub fn badge_label(self) -> &'static str {
        match self {
            RefreshStatus::Enabled => "enabled",
            RefreshStatus::Disabled => "disabled",
        }
    }
}

type TickFn = Arc<dyn Fn() + Send + Sync + 'static>;

pub struct RefreshController {
    period: Duration,
    enabled: bool,
    on_tick: TickFn,
    timer: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for RefreshController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshController")
            .field("period", &self.period)
            .field("enabled", &self.enabled)
            .field("active_timers", &self.active_timers())
            .finish()
    }
}

impl RefreshController {
    /// Creates a stopped controller. `enabled` is the initial flag only;
    /// call [`start`](Self::start) to arm the timer.
    pub fn new<F>(period: Duration, enabled: bool, on_tick: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            period,
            enabled,
            on_tick: Arc::new(on_tick),
            timer: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn status(&self) -> RefreshStatus {
        if self.enabled {
            RefreshStatus::Enabled
        } else {
            RefreshStatus::Disabled
        }
    }

    pub fn active_timers(&self) -> usize {
        usize::from(self.timer.is_some())
    }

    /// Arms the timer, replacing any existing one. The first tick fires one
    /// full period from now. Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        self.cancel_timer();

        let period = self.period;
        let on_tick = Arc::clone(&self.on_tick);
        self.timer = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tracing::debug!(event = "refresh.tick");
                on_tick();
            }
        }));
        tracing::info!(event = "refresh.started", period_secs = period.as_secs());
    }

    /// Cancels the timer if one is armed. In-flight fetches are not affected.
    pub fn stop(&mut self) {
        if self.cancel_timer() {
            tracing::info!(event = "refresh.stopped");
        }
    }

    pub fn toggle(&mut self) -> RefreshStatus {
        self.enabled = !self.enabled;
        if self.enabled {
            self.start();
        } else {
            self.stop();
        }
        self.status()
    }

    fn cancel_timer(&mut self) -> bool {
        match self.timer.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for RefreshController {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
