//! Reveal scheduler.
//!
//! A spawned task that only *signals*: one `Tick` per character on a fixed
//! period, then a single `Settled` once the commit delay has passed. It
//! never touches delivery state; the host applies the signals. The task
//! stops as soon as its [`CancellationToken`] fires or the handle is dropped.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

const SIGNAL_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealSignal {
    Tick,
    Settled,
}

pub struct RevealScheduler;

impl RevealScheduler {
    /// Spawns the reveal task on the current runtime.
    pub fn start(total_chars: usize, tick: Duration, commit_delay: Duration) -> RevealHandle {
        let token = CancellationToken::new();
        let (tx, signals) = mpsc::channel(SIGNAL_BUFFER);
        let task = tokio::spawn(run(total_chars, tick, commit_delay, tx, token.clone()));
        RevealHandle { token, signals, task }
    }
}

async fn run(
    total_chars: usize,
    tick: Duration,
    commit_delay: Duration,
    tx: mpsc::Sender<RevealSignal>,
    token: CancellationToken,
) {
    let mut interval = time::interval_at(Instant::now() + tick, tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for _ in 0..total_chars {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("reveal cancelled mid-text");
                return;
            }
            _ = interval.tick() => {}
        }
        if !emit(&tx, &token, RevealSignal::Tick).await {
            return;
        }
    }

    tokio::select! {
        _ = token.cancelled() => {
            debug!("reveal cancelled before settling");
            return;
        }
        _ = time::sleep(commit_delay) => {}
    }
    emit(&tx, &token, RevealSignal::Settled).await;
}

/// Returns false once nobody is listening any more.
async fn emit(tx: &mpsc::Sender<RevealSignal>, token: &CancellationToken, signal: RevealSignal) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        sent = tx.send(signal) => sent.is_ok(),
    }
}

/// Owner side of a running reveal. Dropping it cancels the task.
pub struct RevealHandle {
    token: CancellationToken,
    signals: mpsc::Receiver<RevealSignal>,
    task: JoinHandle<()>,
}

impl RevealHandle {
    /// Next signal, or `None` once the task has finished or was cancelled.
    pub async fn recv(&mut self) -> Option<RevealSignal> {
        if self.token.is_cancelled() {
            return None;
        }
        self.signals.recv().await
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
