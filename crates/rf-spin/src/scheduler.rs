//! Deferred step scheduling
//!
//! The spin sequence never waits. Each stage is queued with a deadline and
//! the host drains due steps. `ManualClock` moves time only when told to,
//! `RealtimeClock` follows the wall clock.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

// ═══════════════════════════════════════════════════════════════════════════════
// SPIN STEPS
// ═══════════════════════════════════════════════════════════════════════════════

/// A deferred stage of the spin sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpinStep {
    /// Column begins spinning
    ColumnStart(u8),
    /// Column stops and shows its final cells
    ColumnStop(u8),
    /// Evaluate and pay out
    Settle,
}

/// Step queued for future execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingStep {
    /// The step to run
    pub step: SpinStep,
    /// Absolute deadline (ms)
    pub execute_at_ms: u64,
    /// Insertion order, breaks deadline ties
    seq: u64,
}

impl PendingStep {
    /// Check if step should run at given time
    #[inline]
    pub fn should_execute(&self, now_ms: u64) -> bool {
        now_ms >= self.execute_at_ms
    }
}

// Min-heap ordering: earliest deadline first, FIFO among equal deadlines
impl Ord for PendingStep {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .execute_at_ms
            .cmp(&self.execute_at_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PendingStep {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Deadline-ordered step queue
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<PendingStep>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, execute_at_ms: u64, step: SpinStep) {
        self.heap.push(PendingStep {
            step,
            execute_at_ms,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    /// Earliest deadline, if any
    pub fn peek_deadline(&self) -> Option<u64> {
        self.heap.peek().map(|p| p.execute_at_ms)
    }

    /// Remove the earliest step if it is due at `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<PendingStep> {
        if self.heap.peek()?.should_execute(now_ms) {
            self.heap.pop()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCHEDULER
// ═══════════════════════════════════════════════════════════════════════════════

/// Time source plus deferred step queue
pub trait Scheduler {
    /// Current time (ms)
    fn now_ms(&self) -> u64;

    /// Queue `step` to run `delay_ms` from now
    fn schedule_after(&mut self, delay_ms: u64, step: SpinStep);

    /// Earliest pending deadline
    fn next_deadline(&self) -> Option<u64>;

    /// Next step whose deadline has passed
    fn pop_due(&mut self) -> Option<PendingStep>;

    /// Number of queued steps
    fn pending(&self) -> usize;
}

/// Simulated clock, advanced explicitly
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: u64,
    queue: TimerQueue,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `ms`
    pub fn advance(&mut self, ms: u64) {
        self.now_ms = self.now_ms.saturating_add(ms);
    }

    /// Jump to `at_ms` (never moves backwards)
    pub fn advance_to(&mut self, at_ms: u64) {
        self.now_ms = self.now_ms.max(at_ms);
    }

    /// Jump to the next deadline, returning it
    pub fn advance_to_next(&mut self) -> Option<u64> {
        let deadline = self.queue.peek_deadline()?;
        self.advance_to(deadline);
        Some(deadline)
    }
}

impl Scheduler for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn schedule_after(&mut self, delay_ms: u64, step: SpinStep) {
        self.queue.push(self.now_ms.saturating_add(delay_ms), step);
    }

    fn next_deadline(&self) -> Option<u64> {
        self.queue.peek_deadline()
    }

    fn pop_due(&mut self) -> Option<PendingStep> {
        self.queue.pop_due(self.now_ms)
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Wall-clock scheduler, time measured from construction
#[derive(Debug)]
pub struct RealtimeClock {
    origin: Instant,
    queue: TimerQueue,
}

impl RealtimeClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            queue: TimerQueue::new(),
        }
    }

    /// Time left until the next deadline (0 if already due)
    pub fn until_next_ms(&self) -> Option<u64> {
        self.next_deadline()
            .map(|at| at.saturating_sub(self.now_ms()))
    }
}

impl Default for RealtimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for RealtimeClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn schedule_after(&mut self, delay_ms: u64, step: SpinStep) {
        let at = self.now_ms().saturating_add(delay_ms);
        self.queue.push(at, step);
    }

    fn next_deadline(&self) -> Option<u64> {
        self.queue.peek_deadline()
    }

    fn pop_due(&mut self) -> Option<PendingStep> {
        let now = self.now_ms();
        self.queue.pop_due(now)
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}
