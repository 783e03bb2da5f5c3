//! Deterministic timer queue.
//!
//! Key properties:
//! - Total ordering on `(deadline, id)`.
//! - Timers with equal deadlines fire in scheduling order.
//! - Cancellation does not perturb the order of remaining timers.
//!
//! Vec-backed: a tour session holds a handful of timers at most.

use foundation::time::Time;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

#[derive(Debug)]
struct Entry<T> {
    id: TimerId,
    deadline: Time,
    payload: T,
    canceled: bool,
}

impl<T> Entry<T> {
    fn fires_before(&self, other: &Self) -> bool {
        // Total ordering: (deadline, id)
        match self.deadline.0.total_cmp(&other.deadline.0) {
            core::cmp::Ordering::Less => true,
            core::cmp::Ordering::Greater => false,
            core::cmp::Ordering::Equal => self.id < other.id,
        }
    }
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.canceled).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn schedule(&mut self, deadline: Time, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push(Entry {
            id,
            deadline,
            payload,
            canceled: false,
        });
        id
    }

    /// Returns `true` if the timer was still armed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id && !e.canceled) {
            entry.canceled = true;
            return true;
        }
        false
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn next_deadline(&self) -> Option<Time> {
        self.earliest().map(|idx| self.entries[idx].deadline)
    }

    /// Pops the earliest timer whose deadline is `<= now`.
    pub fn pop_due(&mut self, now: Time) -> Option<(TimerId, T)> {
        self.entries.retain(|e| !e.canceled);
        let idx = self.earliest()?;
        if self.entries[idx].deadline.0 > now.0 {
            return None;
        }
        let entry = self.entries.remove(idx);
        Some((entry.id, entry.payload))
    }

    fn earliest(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.canceled {
                continue;
            }
            match best {
                None => best = Some(idx),
                Some(b) => {
                    if entry.fires_before(&self.entries[b]) {
                        best = Some(idx);
                    }
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::TimerQueue;
    use foundation::time::Time;

    #[test]
    fn fires_in_deadline_order() {
        let mut q = TimerQueue::new();
        q.schedule(Time(30.0), "late");
        q.schedule(Time(10.0), "early");

        assert!(q.pop_due(Time(5.0)).is_none());
        let (_, v) = q.pop_due(Time(100.0)).unwrap();
        assert_eq!(v, "early");
        let (_, v) = q.pop_due(Time(100.0)).unwrap();
        assert_eq!(v, "late");
        assert!(q.is_empty());
    }

    #[test]
    fn equal_deadlines_fire_in_schedule_order() {
        let mut q = TimerQueue::new();
        q.schedule(Time(10.0), "a");
        q.schedule(Time(10.0), "b");
        let (_, a) = q.pop_due(Time(10.0)).unwrap();
        let (_, b) = q.pop_due(Time(10.0)).unwrap();
        assert_eq!((a, b), ("a", "b"));
    }

    #[test]
    fn cancel_disarms_once() {
        let mut q = TimerQueue::new();
        let a = q.schedule(Time(10.0), "a");
        q.schedule(Time(20.0), "b");
        assert!(q.cancel(a));
        assert!(!q.cancel(a));
        assert_eq!(q.len(), 1);
        assert_eq!(q.next_deadline(), Some(Time(20.0)));

        let (_, v) = q.pop_due(Time(50.0)).unwrap();
        assert_eq!(v, "b");
        assert!(q.pop_due(Time(50.0)).is_none());
    }
}
