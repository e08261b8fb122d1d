//! Cancellable polling task used to notice changes made inside the signing
//! agent (account or network switched by the user).
//!
//! At most one task runs per watcher. Every start bumps a generation counter;
//! ticks carry the generation they were spawned with and must apply their
//! result through [`ChangeWatcher::apply_if_current`], which holds the slot
//! lock for the duration of the update. Once [`WatcherGuard::stop`] returns no
//! tick from an older generation can land.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub use crate::config_store::DEFAULT_WATCH_INTERVAL_MS;

pub const MIN_WATCH_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Default)]
struct WatcherSlot {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

#[derive(Debug)]
pub struct ChangeWatcher {
    interval: Duration,
    slot: Mutex<WatcherSlot>,
}

/// Exclusive access to the watcher slot.
pub struct WatcherGuard<'a> {
    slot: MutexGuard<'a, WatcherSlot>,
    interval: Duration,
}

impl ChangeWatcher {
    /// Intervals below [`MIN_WATCH_INTERVAL`] are raised to it; tokio
    /// intervals cannot be zero.
    pub fn new(interval: Duration) -> Self {
        if interval < MIN_WATCH_INTERVAL {
            log::warn!(
                "Watch interval {:?} too short, using {:?}",
                interval,
                MIN_WATCH_INTERVAL
            );
        }
        Self {
            interval: interval.max(MIN_WATCH_INTERVAL),
            slot: Mutex::new(WatcherSlot::default()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn lock(&self) -> WatcherGuard<'_> {
        WatcherGuard {
            slot: self.slot.lock(),
            interval: self.interval,
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_running()
    }

    pub fn stop(&self) {
        self.lock().stop();
    }

    /// Run `op` only if `generation` is still the active watcher.
    pub fn apply_if_current<T>(
        &self,
        generation: u64,
        op: impl FnOnce(&mut WatcherGuard<'_>) -> T,
    ) -> Option<T> {
        let mut guard = self.lock();
        if !guard.is_current(generation) {
            return None;
        }
        Some(op(&mut guard))
    }
}

impl WatcherGuard<'_> {
    pub fn is_running(&self) -> bool {
        self.slot
            .task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    pub fn generation(&self) -> u64 {
        self.slot.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.slot.task.is_some() && self.slot.generation == generation
    }

    /// Cancel the active task. Its pending ticks become stale immediately.
    pub fn stop(&mut self) {
        self.slot.generation += 1;
        if let Some(task) = self.slot.task.take() {
            task.abort();
            log::debug!("Wallet watcher stopped");
        }
    }

    /// Replace any running task with a new one invoking `on_tick` every
    /// interval, first after one full interval. The loop ends when `on_tick`
    /// breaks. Must be called from within a tokio runtime.
    pub fn start<F, Fut>(&mut self, mut on_tick: F) -> u64
    where
        F: FnMut(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        self.stop();
        let generation = self.slot.generation;
        let period = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if on_tick(generation).await.is_break() {
                    break;
                }
            }
        });

        self.slot.task = Some(task);
        log::debug!(
            "Wallet watcher started (generation {}, every {:?})",
            generation,
            period
        );
        generation
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        if let Some(task) = self.slot.get_mut().task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn ticks_until_stopped() {
        let watcher = ChangeWatcher::new(Duration::from_millis(10));
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        watcher.lock().start(move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                ControlFlow::Continue(())
            }
        });

        time::sleep(Duration::from_millis(60)).await;
        assert!(ticks.load(Ordering::SeqCst) >= 2);

        watcher.stop();
        assert!(!watcher.is_running());
        let after_stop = ticks.load(Ordering::SeqCst);
        time::sleep(Duration::from_millis(40)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn restart_invalidates_previous_generation() {
        let watcher = ChangeWatcher::new(Duration::from_secs(60));
        let first = watcher.lock().start(|_| async { ControlFlow::Continue(()) });
        let second = watcher.lock().start(|_| async { ControlFlow::Continue(()) });
        assert_ne!(first, second);

        assert!(watcher.apply_if_current(first, |_| ()).is_none());
        assert!(watcher.apply_if_current(second, |_| ()).is_some());

        watcher.stop();
        assert!(watcher.apply_if_current(second, |_| ()).is_none());
    }

    #[tokio::test]
    async fn break_ends_the_loop() {
        let watcher = ChangeWatcher::new(Duration::from_millis(5));
        watcher
            .lock()
            .start(|_| async { ControlFlow::Break(()) });
        time::sleep(Duration::from_millis(40)).await;
        assert!(!watcher.is_running());
    }

    #[tokio::test]
    async fn zero_interval_is_raised_to_minimum() {
        let watcher = ChangeWatcher::new(Duration::ZERO);
        assert_eq!(watcher.interval(), MIN_WATCH_INTERVAL);

        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        watcher.lock().start(move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                ControlFlow::Continue(())
            }
        });

        time::sleep(Duration::from_millis(20)).await;
        assert!(watcher.is_running());
        assert!(ticks.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn default_interval_is_three_seconds() {
        assert_eq!(DEFAULT_WATCH_INTERVAL_MS, 3000);
    }
}
