/*
 * Scheduling Policy Interface
 *
 * The runtime owns the mechanism (critical section, event processing,
 * dispatch); a policy owns the decision of which thread runs next. Every
 * hook below is invoked with the critical section held, so policies need
 * no synchronization of their own. Policies track membership by `Tid`
 * and read scheduling attributes from the descriptor they are handed;
 * they never touch kernel capabilities.
 */

pub mod fprr;

pub use fprr::Fprr;

use crate::error::SchedResult;
use crate::sched::thread::ThdDesc;
use crate::sched::types::{SchedParam, Tid};
use crate::time::Cycles;

/// A pluggable scheduling policy. One instance exists per CPU; all of a
/// policy's state is CPU-partitioned.
pub trait Policy: Send {
    /// Register a descriptor. Sets the policy's default parameters (for
    /// the reference policy, the lowest priority). Does not enqueue.
    fn thd_init(&mut self, t: &mut ThdDesc);

    /// Unregister a descriptor, removing it from any queue it occupies.
    fn thd_deinit(&mut self, t: &mut ThdDesc);

    /// Adjust a scheduling parameter, re-queueing if membership or order
    /// changed.
    fn thd_modify(&mut self, t: &mut ThdDesc, param: SchedParam, value: u32) -> SchedResult<()>;

    /// `t` ceased to be runnable; remove it from the run queue.
    fn block(&mut self, t: &mut ThdDesc);

    /// `t` became runnable; enqueue it.
    fn wakeup(&mut self, t: &mut ThdDesc);

    /// `t` voluntarily yielded, optionally in favor of `yield_to`.
    fn yield_to(&mut self, t: &mut ThdDesc, yield_to: Option<Tid>);

    /// Pick the next thread to run on this CPU, or `None` if no thread
    /// is runnable. Must be deterministic given equivalent queue state.
    fn schedule(&mut self) -> Option<Tid>;

    /// Account executed cycles to `t`. Round-robin ignores this; virtual
    /// time and deadline policies build on it.
    fn execution(&mut self, t: &mut ThdDesc, cycles: Cycles);

    /// Absolute cycle deadline the policy wants a timer interrupt at
    /// (quantum expiry), if any. The runtime programs the one-shot timer
    /// to the nearer of this and the timeout queue's next deadline.
    fn next_timeout(&mut self, now: Cycles) -> Option<Cycles> {
        let _ = now;
        None
    }

    /// Policy name for logging.
    fn name(&self) -> &'static str;

    /// How many times `tid` currently appears in the run queues.
    #[cfg(test)]
    fn queued_count(&self, tid: Tid) -> usize;
}
