//! Flood-controlled outbound sender.
//!
//! Outbound lines are queued rather than written directly; a background
//! sender task drains the queue under a weighted rate limit. Every line
//! sent costs a fixed weight, a companion decay task bleeds the weight off
//! once per second, and the sender stalls while the accumulated weight sits
//! at or above the threshold. The net effect is roughly three lines per
//! three seconds sustained, with bursts allowed from idle.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::error;

use crate::connection::{send_line, SharedWriter};

/// Weight added per transmitted line.
pub const LINE_WEIGHT: f64 = 1.0;

/// Sending stalls while the accumulated weight is at or above this.
pub const FLOOD_THRESHOLD: f64 = 3.9;

/// Weight removed per decay tick.
pub const DECAY_STEP: f64 = 0.33;

/// Interval between decay ticks.
pub const DECAY_INTERVAL: Duration = Duration::from_secs(1);

/// One decay tick. The weight never drops below zero, no matter how long
/// the connection idles.
pub(crate) fn decay(weight: f64) -> f64 {
    (weight - DECAY_STEP).max(0.0)
}

#[derive(Default)]
struct FloodState {
    queue: VecDeque<String>,
    weight: f64,
}

struct Shared {
    state: Mutex<FloodState>,
    enqueued: Notify,
    decayed: Notify,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, FloodState> {
        self.state.lock().expect("flood state lock poisoned")
    }
}

/// Handle to the sender/decay task pair for one connection.
///
/// Both tasks are lifecycle-bound to this handle and aborted on drop, so a
/// discarded client never blocks shutdown on its background work.
pub struct FloodSender {
    shared: Arc<Shared>,
    sender_task: JoinHandle<()>,
    decay_task: JoinHandle<()>,
}

impl FloodSender {
    /// Spawns the sender and decay tasks over a shared transport writer.
    pub(crate) fn start(writer: SharedWriter) -> FloodSender {
        let shared = Arc::new(Shared {
            state: Mutex::new(FloodState::default()),
            enqueued: Notify::new(),
            decayed: Notify::new(),
        });

        let sender_task = tokio::spawn(sender_loop(Arc::clone(&shared), writer));
        let decay_task = tokio::spawn(decay_loop(Arc::clone(&shared)));

        FloodSender {
            shared,
            sender_task,
            decay_task,
        }
    }

    /// Queues one line for throttled transmission and wakes the sender.
    ///
    /// Never blocks and never fails from the caller's point of view;
    /// transmission errors are logged by the sender task. Lines leave in
    /// FIFO enqueue order, though a concurrent
    /// [`write_now`](crate::Client::write_now) may overtake them.
    pub fn write(&self, line: impl Into<String>) {
        self.shared.lock().queue.push_back(line.into());
        self.shared.enqueued.notify_one();
    }

    /// Number of lines still waiting in the outbound queue.
    pub fn queued(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Current accumulated flood weight.
    pub fn weight(&self) -> f64 {
        self.shared.lock().weight
    }
}

impl Drop for FloodSender {
    fn drop(&mut self) {
        self.sender_task.abort();
        self.decay_task.abort();
    }
}

/// Drains the outbound queue, stalling whenever the weight is over the
/// threshold until the decay task signals another tick.
async fn sender_loop(shared: Arc<Shared>, writer: SharedWriter) {
    loop {
        // Wait for the queue to become non-empty, then snapshot its length;
        // lines enqueued after the snapshot are picked up next round.
        let mut batch = loop {
            let len = shared.lock().queue.len();
            if len > 0 {
                break len;
            }
            shared.enqueued.notified().await;
        };

        while batch > 0 {
            batch -= 1;

            while shared.lock().weight >= FLOOD_THRESHOLD {
                shared.decayed.notified().await;
            }

            let line = shared.lock().queue.pop_front();
            if let Some(line) = line {
                if let Err(e) = send_line(&writer, &line).await {
                    error!("throttled send failed: {e}");
                }
                shared.lock().weight += LINE_WEIGHT;
            }
        }
    }
}

/// Bleeds the flood weight off once per second and wakes the sender so it
/// can re-check the threshold.
async fn decay_loop(shared: Arc<Shared>) {
    loop {
        tokio::time::sleep(DECAY_INTERVAL).await;

        {
            let mut state = shared.lock();
            state.weight = decay(state.weight);
        }
        shared.decayed.notify_one();
    }
}
