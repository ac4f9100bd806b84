//! Half-cycle event clock.
//!
//! The clock keeps `now` in half-cycles: even values are PHI1 (the half the
//! VIC owns the bus), odd values are PHI2 (the CPU half). Time advances only
//! when an event fires, so a machine does exactly as much work as its
//! components have scheduled.

use std::collections::VecDeque;

/// Half of a CPU cycle an event is aligned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// First half of the cycle (even half-cycle count).
    Phi1,
    /// Second half of the cycle (odd half-cycle count).
    Phi2,
    /// No alignment: the event keeps the parity of `now`.
    Any,
}

/// Receives events when they fall due.
///
/// The handler gets the clock back so it can reschedule itself or queue
/// follow-up events while it runs.
pub trait EventHandler<E> {
    fn handle_event(&mut self, event: E, clock: &mut EventClock<E>);
}

#[derive(Debug, Clone, Copy)]
struct Pending<E> {
    trigger: u64,
    event: E,
}

/// Discrete-event scheduler counting half-cycles.
///
/// Events are small `Copy` tokens. A token is pending at most once:
/// scheduling a token that is already pending moves it. Events with the same
/// trigger time fire in the order they were scheduled.
#[derive(Debug, Clone)]
pub struct EventClock<E> {
    now: u64,
    cycles_per_second: f64,
    pending: VecDeque<Pending<E>>,
}

impl<E: Copy + PartialEq> EventClock<E> {
    #[must_use]
    pub fn new(cycles_per_second: f64) -> Self {
        Self {
            now: 0,
            cycles_per_second,
            pending: VecDeque::new(),
        }
    }

    /// Schedule `event` to fire `cycles` whole cycles from now, aligned to
    /// `phase`. Returns the trigger time in half-cycles.
    pub fn schedule(&mut self, event: E, cycles: u32, phase: Phase) -> u64 {
        let parity = self.now & 1;
        let adjust = match phase {
            Phase::Phi1 => parity,
            Phase::Phi2 => parity ^ 1,
            Phase::Any => 0,
        };
        self.schedule_at(event, u64::from(cycles) * 2 + self.now + adjust)
    }

    /// Schedule `event` at an absolute half-cycle. Times already in the past
    /// are clamped to now.
    pub fn schedule_at(&mut self, event: E, trigger: u64) -> u64 {
        self.cancel(event);
        let trigger = trigger.max(self.now);

        // Insert ahead of the first strictly later event.
        let index = self.pending.partition_point(|p| p.trigger <= trigger);
        self.pending.insert(index, Pending { trigger, event });
        trigger
    }

    /// Remove `event` from the pending list. Returns `false` if it was not
    /// pending.
    pub fn cancel(&mut self, event: E) -> bool {
        match self.pending.iter().position(|p| p.event == event) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_pending(&self, event: E) -> bool {
        self.pending.iter().any(|p| p.event == event)
    }

    /// Trigger time of `event` in half-cycles, if it is pending.
    #[must_use]
    pub fn trigger_time(&self, event: E) -> Option<u64> {
        self.pending
            .iter()
            .find(|p| p.event == event)
            .map(|p| p.trigger)
    }

    /// Trigger time of the earliest pending event.
    #[must_use]
    pub fn next_trigger(&self) -> Option<u64> {
        self.pending.front().map(|p| p.trigger)
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pop the earliest event, advance `now` to its trigger time and hand it
    /// to `handler`. Returns `false` if nothing was pending.
    pub fn run_next_event<H>(&mut self, handler: &mut H) -> bool
    where
        H: EventHandler<E> + ?Sized,
    {
        let Some(next) = self.pending.pop_front() else {
            return false;
        };
        self.now = next.trigger;
        handler.handle_event(next.event, self);
        true
    }

    /// Run the next event, then every event that falls due at the same
    /// half-cycle, including ones scheduled while this step runs.
    pub fn step<H>(&mut self, handler: &mut H) -> bool
    where
        H: EventHandler<E> + ?Sized,
    {
        if !self.run_next_event(handler) {
            return false;
        }
        while self.pending.front().is_some_and(|p| p.trigger == self.now) {
            self.run_next_event(handler);
        }
        true
    }

    /// Whole cycles elapsed, as seen from `phase`. A PHI1 observer sees the
    /// cycle count roll over one half-cycle earlier than a PHI2 observer.
    #[must_use]
    pub fn time(&self, phase: Phase) -> u64 {
        let bias = u64::from(phase == Phase::Phi1);
        (self.now + bias) / 2
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.now & 1 == 0 {
            Phase::Phi1
        } else {
            Phase::Phi2
        }
    }

    /// Current time in half-cycles.
    #[must_use]
    pub fn time_and_phase(&self) -> u64 {
        self.now
    }

    #[must_use]
    pub fn cycles_per_second(&self) -> f64 {
        self.cycles_per_second
    }

    pub fn set_cycles_per_second(&mut self, cycles_per_second: f64) {
        self.cycles_per_second = cycles_per_second;
    }

    /// Rewind to half-cycle 0 and drop every pending event.
    pub fn reset(&mut self) {
        self.now = 0;
        self.pending.clear();
    }
}
