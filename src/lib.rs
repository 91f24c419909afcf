/*
 * SLM - User-Level Scheduling Library
 *
 * The kernel provides mechanism only: capability-protected dispatch,
 * a synchronous scheduler token, timed notifications. This library
 * provides the policy side, running inside a scheduler component: the
 * per-thread state machine, the critical-section protocol with
 * priority-inheritance hand-off, the kernel event loop, and pluggable
 * scheduling and timer policies (with fixed-priority round-robin as the
 * reference policy).
 *
 * A component wires it up like this:
 *
 * ```ignore
 * let slm = Slm::new(kernel);
 * slm.init(sched_caps, idle_caps)?;     // per CPU, by the init thread
 * slm.thd_init(sched_tid, app_caps, ThdProperty::empty())?;
 * slm.sched_loop();                     // becomes the scheduler thread
 * ```
 *
 * Application threads then use `thd_block`, `thd_wakeup` and `thd_yield`;
 * the kernel reports activations and suspensions to the scheduler thread,
 * which reconciles them with the user-level state machine.
 */

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod error;
pub mod kernel;
pub mod sched;
pub mod time;

#[cfg(test)]
mod tests;

pub use error::{SchedError, SchedResult};
pub use kernel::{EventBatch, Kernel, KernelEvent, MAX_SCHED_EVENTS};
pub use sched::policies::fprr::{Fprr, NUM_PRIOS, PRIO_HIGHEST, PRIO_LOWEST};
pub use sched::policies::Policy;
pub use sched::thread::{EventInfo, ThdCaps, ThdDesc, ThdProperty, ThdState};
pub use sched::timer::{TimeoutQueue, TimerPolicy};
pub use sched::types::{CapId, CpuId, CsFlags, Priority, SchedParam, SchedToken, Tid};
pub use sched::{Slm, MAX_THREADS};
pub use time::{Cycles, Microseconds, Tick};
