//! Single-slot background timer for auto-repeat and long-hold.
//!
//! Timer tasks run on a tokio runtime and never touch key state. They post
//! [`TimerEvent`]s onto a channel that the owning thread drains with
//! [`JobSlot::try_next`] or awaits with [`JobSlot::next`]. Every job gets a fresh generation; cancelling
//! retires the generation so ticks already queued by the old job are dropped
//! when drained.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// One auto-repeat click.
    RepeatTick,
    /// The long-press threshold passed on a modifier.
    LongHold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub generation: u64,
    pub kind: TimerKind,
}

struct ActiveJob {
    generation: u64,
    kind: TimerKind,
    handle: JoinHandle<()>,
}

pub struct JobSlot {
    runtime: Handle,
    tx: UnboundedSender<TimerEvent>,
    rx: UnboundedReceiver<TimerEvent>,
    generation: u64,
    active: Option<ActiveJob>,
}

impl JobSlot {
    pub fn new(runtime: Handle) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            runtime,
            tx,
            rx,
            generation: 0,
            active: None,
        }
    }

    fn start(
        &mut self,
        kind: TimerKind,
        task: impl FnOnce(u64, UnboundedSender<TimerEvent>) -> JoinHandle<()>,
    ) {
        self.cancel();
        self.generation += 1;
        let handle = task(self.generation, self.tx.clone());
        self.active = Some(ActiveJob {
            generation: self.generation,
            kind,
            handle,
        });
    }

    /// Tick after `delay`, then every `interval` until cancelled.
    pub fn start_repeat(&mut self, delay: Duration, interval: Duration) {
        let runtime = self.runtime.clone();
        self.start(TimerKind::RepeatTick, |generation, tx| {
            runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                let event = TimerEvent {
                    generation,
                    kind: TimerKind::RepeatTick,
                };
                while tx.send(event).is_ok() {
                    tokio::time::sleep(interval).await;
                }
            })
        });
        tracing::trace!("Repeat job {} started", self.generation);
    }

    /// Fire a single long-hold event after `delay`.
    pub fn start_long_hold(&mut self, delay: Duration) {
        let runtime = self.runtime.clone();
        self.start(TimerKind::LongHold, |generation, tx| {
            runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(TimerEvent {
                    generation,
                    kind: TimerKind::LongHold,
                });
            })
        });
        tracing::trace!("Long-hold job {} started", self.generation);
    }

    /// Abort the running job. Its queued events will be discarded.
    pub fn cancel(&mut self) {
        if let Some(job) = self.active.take() {
            job.handle.abort();
            tracing::trace!("Job {} cancelled", job.generation);
        }
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    fn accept(&mut self, event: TimerEvent) -> Option<TimerKind> {
        let job = self.active.as_ref()?;
        if job.generation != event.generation {
            tracing::trace!("Dropped stale event from job {}", event.generation);
            return None;
        }
        if job.kind == TimerKind::LongHold {
            self.active = None;
        }
        Some(event.kind)
    }

    /// Next event of the current job, skipping stale ones. Never blocks.
    pub fn try_next(&mut self) -> Option<TimerKind> {
        while let Ok(event) = self.rx.try_recv() {
            if let Some(kind) = self.accept(event) {
                return Some(kind);
            }
        }
        None
    }

    /// Wait for the next event of the current job. Cancel-safe.
    pub async fn next(&mut self) -> TimerKind {
        loop {
            // The slot owns a sender, so the channel never closes.
            let Some(event) = self.rx.recv().await else {
                return std::future::pending().await;
            };
            if let Some(kind) = self.accept(event) {
                return kind;
            }
        }
    }
}

impl Drop for JobSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
