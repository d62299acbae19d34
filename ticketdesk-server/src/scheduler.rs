//! Delayed continuations tracked per channel.
//!
//! Each scheduled continuation is a tokio task that sleeps and then runs.
//! Tasks are grouped by channel so that ending an interview or closing a
//! ticket can abort everything still pending for it. Continuations must
//! re-check the state they act on when they fire.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use ticketdesk_core::ChannelId;

#[derive(Default)]
pub struct Scheduler {
    timers: Mutex<HashMap<ChannelId, Vec<JoinHandle<()>>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay` unless `cancel(channel)` is called first.
    pub async fn schedule<F>(&self, channel: ChannelId, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        let mut timers = self.timers.lock().await;
        let pending = timers.entry(channel).or_default();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Abort every pending continuation for `channel`. Returns how many were
    /// still waiting.
    pub async fn cancel(&self, channel: ChannelId) -> usize {
        let Some(handles) = self.timers.lock().await.remove(&channel) else {
            return 0;
        };

        let mut aborted = 0;
        for handle in handles {
            if !handle.is_finished() {
                handle.abort();
                aborted += 1;
            }
        }
        if aborted > 0 {
            debug!("Cancelled {} pending timer(s) for channel {}", aborted, channel);
        }
        aborted
    }

    /// Number of continuations for `channel` that have not run yet.
    pub async fn pending(&self, channel: ChannelId) -> usize {
        let timers = self.timers.lock().await;
        timers
            .get(&channel)
            .map(|handles| handles.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }
}
