/*
 * Timer Policy and Timeout Queue
 *
 * Timed blocking is a plug-in, like scheduling itself. A timer policy
 * tracks absolute cycle deadlines for blocked threads; the runtime asks
 * it on every scheduling pass which deadlines elapsed and what the next
 * one is, and keeps the kernel's one-shot timer programmed to the
 * nearest outstanding deadline. All hooks run with the critical section
 * held.
 */

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::sched::thread::ThdDesc;
use crate::sched::types::Tid;
use crate::time::Cycles;

/// A pluggable timeout tracker. One instance exists per CPU.
pub trait TimerPolicy: Send {
    /// Register a descriptor. The default does nothing.
    fn thd_init(&mut self, t: &mut ThdDesc) {
        let _ = t;
    }

    /// Arm an absolute cycle deadline for `t`, replacing any existing
    /// one.
    fn set(&mut self, t: &mut ThdDesc, deadline: Cycles);

    /// Drop `t`'s armed deadline, if any.
    fn cancel(&mut self, t: &mut ThdDesc);

    /// Remove and return every thread whose deadline is at or before
    /// `now`, nearest first. The caller clears the descriptor link and
    /// wakes the threads.
    fn expire(&mut self, now: Cycles) -> Vec<Tid>;

    /// The next outstanding absolute deadline, if any.
    fn next(&mut self, now: Cycles) -> Option<Cycles>;
}

/// Default timer policy: deadlines ordered in a map, nearest first.
/// Threads sharing a deadline expire in arming order.
pub struct TimeoutQueue {
    deadlines: BTreeMap<Cycles, Vec<Tid>>,
}

impl TimeoutQueue {
    pub fn new() -> Self {
        TimeoutQueue {
            deadlines: BTreeMap::new(),
        }
    }
}

impl Default for TimeoutQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerPolicy for TimeoutQueue {
    fn set(&mut self, t: &mut ThdDesc, deadline: Cycles) {
        self.cancel(t);
        t.timeout_at = Some(deadline);
        self.deadlines.entry(deadline).or_default().push(t.tid);
    }

    fn cancel(&mut self, t: &mut ThdDesc) {
        let Some(deadline) = t.timeout_at.take() else {
            return;
        };
        if let Some(bucket) = self.deadlines.get_mut(&deadline) {
            bucket.retain(|&tid| tid != t.tid);
            if bucket.is_empty() {
                self.deadlines.remove(&deadline);
            }
        }
    }

    fn expire(&mut self, now: Cycles) -> Vec<Tid> {
        let mut expired = Vec::new();
        while let Some((&deadline, _)) = self.deadlines.first_key_value() {
            if deadline > now {
                break;
            }
            let (_, bucket) = self.deadlines.pop_first().unwrap();
            expired.extend(bucket);
        }
        expired
    }

    fn next(&mut self, _now: Cycles) -> Option<Cycles> {
        self.deadlines.first_key_value().map(|(&deadline, _)| deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::thread::{ThdCaps, ThdProperty, ThdState};
    use crate::sched::types::CapId;

    fn desc(tid: u32) -> ThdDesc {
        ThdDesc::new(
            ThdCaps::bare(Tid(tid), CapId(tid as u64)),
            ThdProperty::empty(),
            ThdState::Blocked,
        )
    }

    #[test]
    fn expires_elapsed_deadlines_nearest_first() {
        let mut q = TimeoutQueue::new();
        let mut a = desc(1);
        let mut b = desc(2);
        let mut c = desc(3);
        q.set(&mut a, 300);
        q.set(&mut b, 100);
        q.set(&mut c, 900);

        assert_eq!(q.next(0), Some(100));
        assert_eq!(q.expire(300), alloc::vec![Tid(2), Tid(1)]);
        assert_eq!(q.next(300), Some(900));
        assert_eq!(q.expire(899), Vec::<Tid>::new());
    }

    #[test]
    fn deadline_equal_to_now_expires() {
        let mut q = TimeoutQueue::new();
        let mut a = desc(1);
        q.set(&mut a, 500);
        assert_eq!(q.expire(500), alloc::vec![Tid(1)]);
        assert_eq!(q.next(500), None);
    }

    #[test]
    fn cancel_removes_the_deadline() {
        let mut q = TimeoutQueue::new();
        let mut a = desc(1);
        let mut b = desc(2);
        q.set(&mut a, 100);
        q.set(&mut b, 100);

        q.cancel(&mut a);
        assert_eq!(a.timeout_at, None);
        assert_eq!(q.expire(100), alloc::vec![Tid(2)]);
    }

    #[test]
    fn set_replaces_an_armed_deadline() {
        let mut q = TimeoutQueue::new();
        let mut a = desc(1);
        q.set(&mut a, 100);
        q.set(&mut a, 700);

        assert_eq!(q.expire(100), Vec::<Tid>::new());
        assert_eq!(q.next(100), Some(700));
        assert_eq!(q.expire(700), alloc::vec![Tid(1)]);
    }

    #[test]
    fn same_deadline_expires_in_arming_order() {
        let mut q = TimeoutQueue::new();
        let mut a = desc(1);
        let mut b = desc(2);
        q.set(&mut b, 100);
        q.set(&mut a, 100);
        assert_eq!(q.expire(100), alloc::vec![Tid(2), Tid(1)]);
    }
}
