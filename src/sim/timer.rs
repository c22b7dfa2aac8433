/// Level countdown.
///
/// One tick per second while running, each tick a deferred callback on
/// the shared scheduler. Only one countdown is ever live: `start` cancels
/// the pending tick first, and every tick carries the timer generation
/// so a stale tick is dropped even if it slipped past cancellation.

use super::schedule::{Handle, Scheduler};

/// Milliseconds between ticks.
pub const TICK_MS: u64 = 1000;

/// Seconds left at or below which the display is "danger".
const DANGER_SECONDS: u32 = 5;
/// Seconds left at or below which the display is "warn".
const WARN_SECONDS: u32 = 10;

/// Presentational classification of the remaining time.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimerBucket {
    Ok,
    Warn,
    Danger,
}

impl TimerBucket {
    pub fn for_seconds(remaining: u32) -> Self {
        if remaining <= DANGER_SECONDS {
            TimerBucket::Danger
        } else if remaining <= WARN_SECONDS {
            TimerBucket::Warn
        } else {
            TimerBucket::Ok
        }
    }
}

/// Result of a tick that belonged to the live countdown.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(dead_code)]
pub enum TimerSignal {
    Ticked(u32),
    Expired,
}

#[derive(Debug)]
pub struct LevelTimer {
    remaining: u32,
    running: bool,
    expired: bool,
    generation: u64,
    pending: Option<Handle>,
}

impl LevelTimer {
    pub fn new(seconds: u32) -> Self {
        LevelTimer {
            remaining: seconds,
            running: false,
            expired: false,
            generation: 0,
            pending: None,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True from expiry until the next `start`.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn bucket(&self) -> TimerBucket {
        TimerBucket::for_seconds(self.remaining)
    }

    /// (Re)start the countdown at `seconds`. `tick` builds the scheduler
    /// action for a given timer generation.
    pub fn start<A>(&mut self, sched: &mut Scheduler<A>, seconds: u32, tick: impl FnOnce(u64) -> A) {
        self.cancel(sched);
        self.generation += 1;
        self.remaining = seconds.max(1);
        self.expired = false;
        self.running = true;
        self.pending = Some(sched.schedule(TICK_MS, tick(self.generation)));
    }

    /// Stop without expiring. Remaining seconds are kept for display.
    pub fn cancel<A>(&mut self, sched: &mut Scheduler<A>) {
        if let Some(handle) = self.pending.take() {
            sched.cancel(handle);
        }
        self.running = false;
    }

    /// Handle a fired tick. Returns `None` for ticks of a superseded
    /// countdown.
    pub fn on_tick<A>(
        &mut self,
        sched: &mut Scheduler<A>,
        generation: u64,
        tick: impl FnOnce(u64) -> A,
    ) -> Option<TimerSignal> {
        if !self.running || generation != self.generation {
            return None;
        }
        self.pending = None;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            self.expired = true;
            return Some(TimerSignal::Expired);
        }
        self.pending = Some(sched.schedule(TICK_MS, tick(self.generation)));
        Some(TimerSignal::Ticked(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Tick(u64);

    /// Run the scheduler to `until`, feeding ticks back into the timer.
    fn run(t: &mut LevelTimer, s: &mut Scheduler<Tick>, until: u64) -> Vec<TimerSignal> {
        let mut out = vec![];
        while let Some(Tick(g)) = s.pop_due(until) {
            if let Some(sig) = t.on_tick(s, g, Tick) {
                out.push(sig);
            }
        }
        s.advance_to(until);
        out
    }

    #[test]
    fn counts_down_once_per_second() {
        let mut s = Scheduler::new();
        let mut t = LevelTimer::new(30);
        t.start(&mut s, 30, Tick);
        assert!(run(&mut t, &mut s, 999).is_empty());
        assert_eq!(run(&mut t, &mut s, 1000), vec![TimerSignal::Ticked(29)]);
        run(&mut t, &mut s, 10_000);
        assert_eq!(t.remaining(), 20);
        assert!(t.is_running());
    }

    #[test]
    fn expires_and_stops() {
        let mut s = Scheduler::new();
        let mut t = LevelTimer::new(3);
        t.start(&mut s, 3, Tick);
        let sigs = run(&mut t, &mut s, 10_000);
        assert_eq!(
            sigs,
            vec![TimerSignal::Ticked(2), TimerSignal::Ticked(1), TimerSignal::Expired]
        );
        assert_eq!(t.remaining(), 0);
        assert!(t.is_expired());
        assert!(!t.is_running());
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn restart_replaces_running_countdown() {
        let mut s = Scheduler::new();
        let mut t = LevelTimer::new(30);
        t.start(&mut s, 30, Tick);
        run(&mut t, &mut s, 5_500);
        assert_eq!(t.remaining(), 25);
        t.start(&mut s, 30, Tick);
        assert_eq!(s.pending(), 1);
        // Old countdown would have ticked at 6000; the new one ticks at 6500.
        assert!(run(&mut t, &mut s, 6_000).is_empty());
        assert_eq!(run(&mut t, &mut s, 6_500), vec![TimerSignal::Ticked(29)]);
    }

    #[test]
    fn stale_generation_is_ignored() {
        let mut s = Scheduler::new();
        let mut t = LevelTimer::new(30);
        t.start(&mut s, 30, Tick);
        let old = t.generation;
        t.start(&mut s, 30, Tick);
        assert_eq!(t.on_tick(&mut s, old, Tick), None);
        assert_eq!(t.remaining(), 30);
    }

    #[test]
    fn cancel_keeps_remaining() {
        let mut s = Scheduler::new();
        let mut t = LevelTimer::new(30);
        t.start(&mut s, 30, Tick);
        run(&mut t, &mut s, 3_000);
        t.cancel(&mut s);
        assert!(run(&mut t, &mut s, 60_000).is_empty());
        assert_eq!(t.remaining(), 27);
        assert!(!t.is_expired());
    }

    #[test]
    fn display_buckets() {
        assert_eq!(TimerBucket::for_seconds(30), TimerBucket::Ok);
        assert_eq!(TimerBucket::for_seconds(11), TimerBucket::Ok);
        assert_eq!(TimerBucket::for_seconds(10), TimerBucket::Warn);
        assert_eq!(TimerBucket::for_seconds(6), TimerBucket::Warn);
        assert_eq!(TimerBucket::for_seconds(5), TimerBucket::Danger);
        assert_eq!(TimerBucket::for_seconds(0), TimerBucket::Danger);
    }
}
