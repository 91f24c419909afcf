/*
 * Kernel Event Processing
 *
 * The kernel reports thread activations, suspensions and consumed cycles
 * to the scheduler thread's receive endpoint. Harvested events are first
 * coalesced into each descriptor's mailbox and the descriptor is linked
 * onto the per-CPU pending list; the list is then drained in delivery
 * order, applying state transitions and crediting execution time to the
 * policy. A whole batch is applied before any dispatch decision, so the
 * decision never runs against half-applied state.
 */

use crate::kernel::KernelEvent;
use crate::sched::CpuRun;
use crate::sched::thread::{ThdProperty, ThdState};

/// Record one harvested event in the target descriptor's mailbox and
/// put the descriptor on the pending list. Later events for the same
/// thread in one batch coalesce: cycles accumulate, the blocked flag and
/// timeout keep their latest value.
pub(crate) fn enqueue(run: &mut CpuRun, ev: &KernelEvent) {
    let CpuRun {
        threads,
        event_list,
        ..
    } = run;

    let Some(t) = threads.iter_mut().find(|t| t.tid == ev.tid) else {
        log::warn!("event for unknown {}", ev.tid);
        return;
    };

    t.event_info.blocked = ev.blocked;
    t.event_info.executed_cycles += ev.cycles;
    t.event_info.timeout = ev.timeout;
    if !t.event_pending {
        t.event_pending = true;
        event_list.push_back(t.tid);
    }
}

/// Drain the pending list, reconciling kernel receive status with the
/// user-level state machine.
pub(crate) fn apply_pending(run: &mut CpuRun) {
    while let Some(tid) = run.event_list.pop_front() {
        let CpuRun {
            threads,
            policy,
            timer,
            ..
        } = &mut *run;

        let Some(t) = threads.iter_mut().find(|t| t.tid == tid) else {
            continue;
        };
        t.event_pending = false;
        let cycles = core::mem::take(&mut t.event_info.executed_cycles);

        if t.event_info.blocked {
            t.properties.insert(ThdProperty::RCV_SUSPENDED);
            if t.state.is_runnable() {
                policy.block(t);
                t.state = ThdState::Blocked;
                log::debug!("event: {} suspended on rcv", t.tid);
            }
        } else if t.properties.contains(ThdProperty::RCV_SUSPENDED) {
            t.properties.remove(ThdProperty::RCV_SUSPENDED);
            if t.state == ThdState::Blocked {
                t.state = ThdState::Runnable;
                timer.cancel(t);
                policy.wakeup(t);
                log::debug!("event: {} activated", t.tid);
            }
        }
        // An unblock for a thread the kernel never suspended carries no
        // state change: the thread may have blocked itself at user level
        // and must not be made runnable out of turn.

        if cycles > 0 {
            policy.execution(t, cycles);
        }
    }
}
