//! Session lifecycle timers
//!
//! Timers are delayed messages. Arming a timer hands a [`TimerToken`] to a
//! [`Scheduler`], which posts it back into the sequencer's queue when due.
//! Each arm gets a fresh generation; cancelling or re-arming makes earlier
//! tokens stale, and the sequencer drops stale tokens when they arrive.

use crate::message::Message;
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Delayed actions a session can schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// Restore availability of buckets dropped after frame loss
    ReenableBuckets,
    /// Disconnect after display and audio stayed inactive
    IdleDisconnect,
    /// Read muxer statistics
    MuxerPoll,
}

impl TimerKind {
    const COUNT: usize = 3;

    fn slot(self) -> usize {
        match self {
            TimerKind::ReenableBuckets => 0,
            TimerKind::IdleDisconnect => 1,
            TimerKind::MuxerPoll => 2,
        }
    }
}

/// Identifies one arming of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken {
    pub kind: TimerKind,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct TimerSlot {
    generation: u64,
    armed: bool,
}

/// Generation bookkeeping for every timer kind
#[derive(Debug, Default)]
pub struct Timers {
    slots: [TimerSlot; TimerKind::COUNT],
    next_generation: u64,
}

impl Timers {
    /// Create with nothing armed
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer, invalidating any earlier arming of the same kind
    pub fn arm(&mut self, kind: TimerKind) -> TimerToken {
        self.next_generation += 1;
        self.slots[kind.slot()] = TimerSlot {
            generation: self.next_generation,
            armed: true,
        };
        TimerToken {
            kind,
            generation: self.next_generation,
        }
    }

    /// Disarm a timer; its pending token becomes stale
    pub fn cancel(&mut self, kind: TimerKind) {
        self.slots[kind.slot()].armed = false;
    }

    /// Disarm every timer
    pub fn cancel_all(&mut self) {
        for slot in &mut self.slots {
            slot.armed = false;
        }
    }

    /// Whether a timer of this kind is pending
    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.slots[kind.slot()].armed
    }

    /// Consume a fired token
    ///
    /// Returns true and disarms the timer if the token is the current arming;
    /// returns false for stale tokens.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        let slot = &mut self.slots[token.kind.slot()];
        if slot.armed && slot.generation == token.generation {
            slot.armed = false;
            true
        } else {
            false
        }
    }
}

/// Delivers armed tokens back to the sequencer after a delay
pub trait Scheduler: Send {
    /// Post `token` once `delay` has elapsed
    fn schedule(&mut self, token: TimerToken, delay: Duration);
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Pending {
    deadline: Instant,
    seq: u64,
    token: TimerToken,
}

/// Scheduler backed by one background thread
///
/// Due tokens are posted as [`Message::Timer`] into the sequencer's queue.
/// The thread exits when the scheduler is dropped or the queue closes.
pub struct ThreadScheduler {
    control: Option<Sender<Pending>>,
    worker: Option<JoinHandle<()>>,
    seq: u64,
}

impl ThreadScheduler {
    /// Spawn the timer thread posting into `sink`
    pub fn spawn(sink: Sender<Message>) -> std::io::Result<Self> {
        let (control, requests) = channel::unbounded::<Pending>();

        let worker = thread::Builder::new()
            .name("wfd-timers".to_string())
            .spawn(move || {
                let mut heap: BinaryHeap<Reverse<Pending>> = BinaryHeap::new();
                loop {
                    let received = match heap.peek() {
                        Some(Reverse(next)) => requests.recv_deadline(next.deadline),
                        None => requests.recv().map_err(|_| RecvTimeoutError::Disconnected),
                    };

                    match received {
                        Ok(pending) => heap.push(Reverse(pending)),
                        Err(RecvTimeoutError::Timeout) => {
                            let now = Instant::now();
                            while heap.peek().map_or(false, |Reverse(p)| p.deadline <= now) {
                                if let Some(Reverse(due)) = heap.pop() {
                                    if sink.send(Message::Timer(due.token)).is_err() {
                                        return;
                                    }
                                }
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => return,
                    }
                }
            })?;

        Ok(ThreadScheduler {
            control: Some(control),
            worker: Some(worker),
            seq: 0,
        })
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&mut self, token: TimerToken, delay: Duration) {
        let Some(deadline) = Instant::now().checked_add(delay) else {
            tracing::warn!("Delay {:?} out of range, dropping {:?}", delay, token.kind);
            return;
        };
        self.seq += 1;
        let pending = Pending {
            deadline,
            seq: self.seq,
            token,
        };
        if let Some(control) = &self.control {
            if control.send(pending).is_err() {
                tracing::warn!("Timer thread gone, dropping {:?}", token.kind);
            }
        }
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.control.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
