/*
 * Kernel Mechanism Interface
 *
 * The scheduler never issues a syscall itself; everything it needs from
 * the kernel goes through this trait. This keeps the policy and runtime
 * layers testable in isolation and pins down exactly which capabilities
 * the component must hold: thread dispatch, the synchronous scheduler
 * token, the event receive endpoint, and the one-shot timer.
 */

use crate::error::SchedResult;
use crate::sched::types::{CapId, CpuId, SchedToken, Tid};
use crate::time::{Cycles, Tick};

/// Upper bound on kernel events harvested in one receive pass.
pub const MAX_SCHED_EVENTS: usize = 64;

/// One scheduling notification delivered by the kernel.
///
/// `blocked` reflects the kernel-visible receive status of the thread:
/// `true` means it suspended on its receive endpoint, `false` means it
/// was activated. `cycles` is the execution time consumed since the last
/// event for this thread; `timeout` is the kernel's view of its
/// time-budget expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelEvent {
    pub tid: Tid,
    pub blocked: bool,
    pub cycles: Cycles,
    pub timeout: Tick,
}

/// Fixed-capacity harvest buffer for one scheduling pass.
pub type EventBatch = heapless::Vec<KernelEvent, MAX_SCHED_EVENTS>;

/// The kernel primitives the scheduler consumes.
///
/// Implementations are expected to be cheap to call and safe to invoke
/// from any thread of the component. `dispatch` and `sched_rcv` are the
/// only operations that may suspend the caller.
pub trait Kernel {
    /// Current per-CPU scheduler token. The token changes on every
    /// context switch, so a stale token read rejects a later `dispatch`.
    fn sched_token(&self) -> SchedToken;

    /// Switch execution to the thread behind `cap`.
    ///
    /// Fails with `Again` if `tok` no longer matches (a context switch
    /// happened since the token was read) and with `Busy` if the caller
    /// is the scheduler thread and events are pending on its endpoint.
    /// With `inherit_prio` the target runs at the caller's priority until
    /// its next dispatch.
    fn dispatch(&self, cap: CapId, tok: SchedToken, inherit_prio: bool) -> SchedResult<()>;

    /// Drain pending scheduling events from the receive endpoint into
    /// `out`, appending at most the buffer's remaining capacity; any
    /// excess stays queued in the kernel for the next call. Returns the
    /// number of events appended. With `blocking`, parks the caller until
    /// at least one event arrives.
    fn sched_rcv(&self, rcv: CapId, blocking: bool, out: &mut EventBatch) -> usize;

    /// Program the one-shot timer to fire at the absolute tick.
    fn timer_arm(&self, tick: Tick);

    /// Cancel the programmed one-shot timer.
    fn timer_disarm(&self);

    /// Read the timestamp counter.
    fn tsc_now(&self) -> Cycles;

    /// Boot-time calibration: cycles per microsecond.
    fn cyc_per_usec(&self) -> u64;

    /// Convert absolute cycles to kernel ticks.
    fn cyc2tick(&self, cyc: Cycles) -> Tick;

    /// Convert kernel ticks to absolute cycles.
    fn tick2cyc(&self, tick: Tick) -> Cycles;

    /// The CPU the calling thread is pinned to.
    fn cpu_id(&self) -> CpuId;

    /// Number of CPUs the scheduler manages.
    fn cpu_count(&self) -> u32;
}
