/*
 * Thread Descriptor and State Machine
 *
 * One descriptor exists per user-level thread, owned by the scheduler
 * component. The descriptor separates two notions of "blocked" that must
 * never be conflated:
 *
 *   - `state` is the user-level state machine driven by block/wakeup/
 *     yield and by the event loop.
 *   - the `RCV_SUSPENDED` property mirrors the kernel-visible receive
 *     status of an event thread. A thread can be user-level runnable
 *     while the kernel considers it suspended on its endpoint, and the
 *     other way around. The event loop reconciles the two: it only
 *     touches `state` on an unblock event when `RCV_SUSPENDED` was set,
 *     because otherwise the thread may have blocked itself at user level
 *     and must not be made runnable out of turn.
 */

use crate::sched::types::{CapId, Priority, Tid};
use crate::time::{Cycles, Tick};

/// User-level thread state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThdState {
    /// Descriptor slot is unused.
    Free,
    /// Blocked at user level; not on any run queue, never dispatched.
    Blocked,
    /// A wakeup raced ahead of the thread's own imminent block. The
    /// thread is still queued; its block call converts this back to
    /// `Runnable` without suspending.
    Woken,
    /// Eligible to run; on its policy run queue.
    Runnable,
    /// Cooperative teardown in progress; `thd_deinit` may free it.
    Dying,
}

impl ThdState {
    /// Whether the policy may dispatch a thread in this state.
    pub fn is_runnable(self) -> bool {
        matches!(self, ThdState::Runnable | ThdState::Woken)
    }
}

bitflags::bitflags! {
    /// Property bits of a thread descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ThdProperty: u32 {
        /// Thread owns its time-budget container.
        const OWN_TCAP = 1;
        /// Dispatch this thread through its send-notify capability.
        const SEND = 1 << 1;
        /// Kernel considers the thread suspended on its receive endpoint.
        const RCV_SUSPENDED = 1 << 2;
    }
}

/// Mailbox written by the event loop, read by the policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventInfo {
    pub blocked: bool,
    /// Execution cycles accumulated since last credited to the policy.
    pub executed_cycles: Cycles,
    pub timeout: Tick,
}

/// Capability handles identifying one thread to the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThdCaps {
    pub tid: Tid,
    /// Dispatch capability.
    pub thd: CapId,
    /// Receive endpoint (event threads only).
    pub rcv: CapId,
    /// Send-notify capability (event threads only).
    pub asnd: CapId,
    /// Time-budget container.
    pub tc: CapId,
}

impl ThdCaps {
    /// Handles for a plain thread with only a dispatch capability.
    pub fn bare(tid: Tid, thd: CapId) -> Self {
        ThdCaps {
            tid,
            thd,
            rcv: CapId::NONE,
            asnd: CapId::NONE,
            tc: CapId::NONE,
        }
    }
}

/// The per-thread scheduler record.
///
/// Capability fields are immutable after init. Queue membership is held
/// by id: the policy run queues and the per-CPU event list store `Tid`s,
/// and the descriptor carries its side of each link (`event_pending`,
/// `timeout_at`).
pub struct ThdDesc {
    pub tid: Tid,
    pub thd: CapId,
    pub rcv: CapId,
    pub asnd: CapId,
    pub tc: CapId,

    pub properties: ThdProperty,
    pub state: ThdState,
    pub priority: Priority,
    pub event_info: EventInfo,

    /// Absolute cycle deadline armed in the timer policy, if any.
    pub(crate) timeout_at: Option<Cycles>,
    /// Whether the descriptor sits on the per-CPU pending-event list.
    pub(crate) event_pending: bool,
}

impl ThdDesc {
    pub(crate) fn new(caps: ThdCaps, properties: ThdProperty, state: ThdState) -> Self {
        ThdDesc {
            tid: caps.tid,
            thd: caps.thd,
            rcv: caps.rcv,
            asnd: caps.asnd,
            tc: caps.tc,
            properties,
            state,
            priority: Priority(0),
            event_info: EventInfo::default(),
            timeout_at: None,
            event_pending: false,
        }
    }

    /// Capability to dispatch this thread through: threads carrying the
    /// `SEND` property are activated via their send-notify capability.
    pub(crate) fn dispatch_cap(&self) -> CapId {
        if self.properties.contains(ThdProperty::SEND) {
            self.asnd
        } else {
            self.thd
        }
    }
}

impl core::fmt::Debug for ThdDesc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThdDesc")
            .field("tid", &self.tid)
            .field("state", &self.state)
            .field("priority", &self.priority)
            .field("properties", &self.properties)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runnable_predicate_covers_woken() {
        assert!(ThdState::Runnable.is_runnable());
        assert!(ThdState::Woken.is_runnable());
        assert!(!ThdState::Blocked.is_runnable());
        assert!(!ThdState::Free.is_runnable());
        assert!(!ThdState::Dying.is_runnable());
    }

    #[test]
    fn send_property_selects_asnd_for_dispatch() {
        let caps = ThdCaps {
            tid: Tid(7),
            thd: CapId(10),
            rcv: CapId(11),
            asnd: CapId(12),
            tc: CapId(13),
        };
        let plain = ThdDesc::new(caps, ThdProperty::empty(), ThdState::Runnable);
        assert_eq!(plain.dispatch_cap(), CapId(10));

        let send = ThdDesc::new(caps, ThdProperty::SEND, ThdState::Runnable);
        assert_eq!(send.dispatch_cap(), CapId(12));
    }
}
