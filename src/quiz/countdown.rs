//! One-second ticker for a quiz session.
//!
//! The ticker never touches the session itself; it sends [`Tick`]s to the
//! session's owner. Each countdown has its own generation number so the
//! owner can drop ticks that were already queued when a countdown was
//! cancelled and replaced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

static GENERATIONS: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

pub struct Countdown {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    /// Start ticking once per second. The first tick arrives after one
    /// second, not immediately.
    pub fn start(ticks: mpsc::UnboundedSender<Tick>) -> Self {
        let generation = GENERATIONS.fetch_add(1, Ordering::Relaxed);
        let task = tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if ticks.send(Tick { generation }).is_err() {
                    break;
                }
            }
        });

        Self {
            generation,
            task: Some(task),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `tick` came from this countdown while it was running.
    pub fn accepts(&self, tick: Tick) -> bool {
        self.task.is_some() && tick.generation == self.generation
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}
