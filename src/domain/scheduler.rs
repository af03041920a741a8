// One-shot delayed tasks, run on the simulation thread once per tick.

use std::time::Duration;

#[derive(Debug)]
struct Scheduled<T> {
    due: Duration,
    seq: u64,
    task: T,
}

/// Task queue driven by simulation time rather than wall-clock time.
#[derive(Debug)]
pub struct TaskQueue<T> {
    now: Duration,
    next_seq: u64,
    entries: Vec<Scheduled<T>>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            entries: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn schedule(&mut self, delay: Duration, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Scheduled {
            due: self.now + delay,
            seq,
            task,
        });
    }

    /// Moves the clock forward and returns every task now due, earliest
    /// first; tasks due at the same instant keep scheduling order.
    pub fn advance(&mut self, dt: Duration) -> Vec<T> {
        self.now += dt;
        let now = self.now;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|entry| entry.due <= now);
        self.entries = pending;
        due.sort_by_key(|entry| (entry.due, entry.seq));
        due.into_iter().map(|entry| entry.task).collect()
    }
}
