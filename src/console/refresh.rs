use super::ConsoleEvent;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Periodic refresh schedule.
///
/// While running, a ticker task sends [`ConsoleEvent::RefreshTick`] right away
/// and then once per period; the console turns each tick into a refresh.
/// Stopping aborts the ticker only, refreshes already issued still land.
#[derive(Debug)]
pub struct RefreshLoop {
    period: Duration,
    ticker: Option<JoinHandle<()>>,
}

impl RefreshLoop {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            ticker: None,
        }
    }

    pub fn state(&self) -> LoopState {
        match &self.ticker {
            Some(handle) if !handle.is_finished() => LoopState::Running,
            _ => LoopState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts ticking; a no-op returning `false` when already running.
    pub fn start(&mut self, events: UnboundedSender<ConsoleEvent>) -> bool {
        if self.is_running() {
            return false;
        }

        let period = self.period;
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // first tick completes immediately
                interval.tick().await;
                if events.send(ConsoleEvent::RefreshTick).is_err() {
                    break;
                }
            }
        }));
        tracing::info!(period_ms = period.as_millis() as u64, "auto-refresh started");
        true
    }

    /// Cancels future ticks; returns `false` when it was not running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_running();
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        if was_running {
            tracing::info!("auto-refresh stopped");
        }
        was_running
    }

    pub fn toggle(&mut self, events: UnboundedSender<ConsoleEvent>) -> LoopState {
        if self.is_running() {
            self.stop();
        } else {
            self.start(events);
        }
        self.state()
    }

    /// Changes the period; a running schedule restarts with it.
    pub fn set_period(&mut self, period: Duration, events: UnboundedSender<ConsoleEvent>) {
        if period == self.period {
            return;
        }
        self.period = period;
        if self.stop() {
            self.start(events);
        }
    }
}

impl Drop for RefreshLoop {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}
