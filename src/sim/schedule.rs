/// Deferred callback queue on a virtual millisecond clock.
///
/// Callbacks fire in (due time, scheduling order). The clock only moves
/// when the owner drains it, so nothing here touches wall time.
///
/// Each scheduled entry gets a `Handle`; cancelling a handle that already
/// fired (or was already cancelled) is a no-op.

use std::collections::BTreeMap;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Handle {
    due_ms: u64,
    seq: u64,
}

pub struct Scheduler<A> {
    now_ms: u64,
    next_seq: u64,
    queue: BTreeMap<Handle, A>,
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Scheduler {
            now_ms: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Queue `action` to fire `delay_ms` after the current clock.
    pub fn schedule(&mut self, delay_ms: u64, action: A) -> Handle {
        let handle = Handle {
            due_ms: self.now_ms + delay_ms,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.queue.insert(handle, action);
        handle
    }

    /// Returns true if the entry was still pending.
    pub fn cancel(&mut self, handle: Handle) -> bool {
        self.queue.remove(&handle).is_some()
    }

    pub fn is_pending(&self, handle: Handle) -> bool {
        self.queue.contains_key(&handle)
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Pop the earliest entry due at or before `until_ms`, moving the
    /// clock to its due time. Entries scheduled by the caller while
    /// draining are relative to that time, so they can still fire in
    /// the same window.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<A> {
        let (&handle, _) = self.queue.iter().next()?;
        if handle.due_ms > until_ms {
            return None;
        }
        self.now_ms = self.now_ms.max(handle.due_ms);
        self.queue.remove(&handle)
    }

    /// Move the clock forward without firing anything.
    /// Call after draining with `pop_due`.
    pub fn advance_to(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Scheduler::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut Scheduler<&'static str>, until: u64) -> Vec<&'static str> {
        let mut fired = vec![];
        while let Some(a) = s.pop_due(until) {
            fired.push(a);
        }
        s.advance_to(until);
        fired
    }

    #[test]
    fn fires_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule(300, "c");
        s.schedule(100, "a");
        s.schedule(200, "b");
        assert_eq!(drain(&mut s, 250), vec!["a", "b"]);
        assert_eq!(s.now_ms(), 250);
        assert_eq!(drain(&mut s, 1000), vec!["c"]);
    }

    #[test]
    fn ties_fire_in_scheduling_order() {
        let mut s = Scheduler::new();
        s.schedule(100, "first");
        s.schedule(100, "second");
        s.schedule(100, "third");
        assert_eq!(drain(&mut s, 100), vec!["first", "second", "third"]);
    }

    #[test]
    fn cancelled_entries_never_fire() {
        let mut s = Scheduler::new();
        let h = s.schedule(100, "stale");
        s.schedule(150, "live");
        assert!(s.is_pending(h));
        assert!(s.cancel(h));
        assert!(!s.cancel(h));
        assert!(!s.is_pending(h));
        assert_eq!(drain(&mut s, 500), vec!["live"]);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn nothing_fires_early() {
        let mut s = Scheduler::new();
        s.schedule(1000, "tick");
        assert!(drain(&mut s, 999).is_empty());
        assert_eq!(drain(&mut s, 1000), vec!["tick"]);
    }

    #[test]
    fn rescheduled_from_due_time() {
        let mut s: Scheduler<&'static str> = Scheduler::new();
        s.schedule(200, "blink");
        // Drain a 1s window, rescheduling every fire like a repeating timer.
        let mut fires = 0;
        while s.pop_due(1000).is_some() {
            fires += 1;
            assert_eq!(s.now_ms(), fires * 200);
            s.schedule(200, "blink");
        }
        s.advance_to(1000);
        assert_eq!(fires, 5);
        assert_eq!(s.pending(), 1);
    }
}
