/*
 * Scheduler Runtime - Mechanism Layer
 *
 * The `Slm` runtime mediates between kernel scheduling events,
 * cooperative user threads, timer expirations and the pluggable policy.
 * It owns one record per CPU and guarantees:
 *
 * 1. POLICY UNDER LOCK: every policy and timer hook runs with the
 *    scheduler critical section held.
 * 2. PRIORITY PROGRESS: a thread contending for the critical section
 *    switches to the owner with priority inheritance, independent of the
 *    policy in use.
 * 3. ORDERED EVENTS: a batch of kernel events is fully applied before
 *    any dispatch decision.
 *
 * Suspension points are exactly: contended `cs_enter` (switch to the
 * owner), `cs_exit_reschedule` (dispatch away), `sched_rcv` in the
 * scheduler loop, and `idle`. No other operation may suspend, and the
 * per-CPU spin mutex is never held across one of these points.
 */

pub mod events;
pub mod lock;
pub mod policies;
pub mod thread;
pub mod timer;
pub mod types;

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

use crate::error::{SchedError, SchedResult};
use crate::kernel::{EventBatch, Kernel};
use crate::sched::lock::{CsLock, CsWord};
use crate::sched::policies::{Fprr, Policy};
use crate::sched::thread::{ThdCaps, ThdDesc, ThdProperty, ThdState};
use crate::sched::timer::{TimeoutQueue, TimerPolicy};
use crate::sched::types::{CapId, CsFlags, SchedParam, SchedToken, Tid};
use crate::time::{Cycles, Tick};

/// Maximum number of threads per CPU.
pub const MAX_THREADS: usize = 64;

/// The critical-section-protected scheduler state of one CPU.
pub(crate) struct CpuRun {
    pub(crate) threads: Vec<ThdDesc>,
    pub(crate) policy: Box<dyn Policy>,
    pub(crate) timer: Box<dyn TimerPolicy>,
    /// Descriptors with pending kernel events, in delivery order.
    pub(crate) event_list: VecDeque<Tid>,
    pub(crate) sched_tid: Tid,
    pub(crate) idle_tid: Tid,
    /// Receive endpoint of the scheduler thread.
    pub(crate) sched_rcv: CapId,
    pub(crate) cyc_per_usec: u64,
    /// Currently programmed one-shot timeout, if any.
    pub(crate) timer_set: bool,
    pub(crate) timer_next_cycle: Cycles,
    pub(crate) timer_next_tick: Tick,
}

impl CpuRun {
    pub(crate) fn thd(&self, tid: Tid) -> Option<&ThdDesc> {
        self.threads.iter().find(|t| t.tid == tid)
    }
}

/// One cache line of per-CPU scheduler state.
///
/// `lock` is the critical-section word of the cross-thread protocol;
/// `run` is a plain spin mutex guarding the memory behind it, held only
/// across short non-suspending sections.
#[repr(align(64))]
pub(crate) struct PerCpu {
    pub(crate) lock: CsLock,
    pub(crate) ready: AtomicBool,
    pub(crate) run: Mutex<Option<CpuRun>>,
}

impl PerCpu {
    fn new() -> Self {
        PerCpu {
            lock: CsLock::new(),
            ready: AtomicBool::new(false),
            run: Mutex::new(None),
        }
    }

    pub(crate) fn with_run<R>(&self, f: impl FnOnce(&mut CpuRun) -> R) -> R {
        let mut guard = self.run.lock();
        let run = guard.as_mut().expect("scheduler not initialized on this cpu");
        f(run)
    }
}

/// The user-level scheduler runtime.
///
/// All kernel interaction goes through `K`. The runtime is shared by
/// every thread of the component; operations locate their CPU's state
/// through `Kernel::cpu_id`, so CPU-partitioned data is only ever
/// touched from its owning CPU.
pub struct Slm<K: Kernel> {
    kernel: K,
    cpus: Vec<PerCpu>,
    boot_claimed: AtomicBool,
    boot_done: AtomicBool,
}

impl<K: Kernel> Slm<K> {
    pub fn new(kernel: K) -> Self {
        let cpus = (0..kernel.cpu_count()).map(|_| PerCpu::new()).collect();
        Slm {
            kernel,
            cpus,
            boot_claimed: AtomicBool::new(false),
            boot_done: AtomicBool::new(false),
        }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub(crate) fn pcpu(&self) -> &PerCpu {
        &self.cpus[self.kernel.cpu_id().as_usize()]
    }

    /// This CPU's cycles-per-microsecond calibration.
    pub fn cyc_per_usec(&self) -> u64 {
        self.pcpu().with_run(|run| run.cyc_per_usec)
    }

    /// Read the kernel scheduler token for this CPU.
    pub fn sched_token(&self) -> SchedToken {
        self.kernel.sched_token()
    }

    // ====================================================================
    // INITIALIZATION
    // ====================================================================

    /// Initialize this CPU's scheduler with the reference fixed-priority
    /// round-robin policy and the default timeout queue.
    ///
    /// `sched` names the calling thread, which becomes the scheduler
    /// notification thread and must own the receive endpoint in
    /// `sched.rcv`; `idle` names the thread executing [`Slm::idle`].
    pub fn init(&self, sched: ThdCaps, idle: ThdCaps) -> SchedResult<()> {
        self.init_with(
            sched,
            idle,
            Box::new(Fprr::new()),
            Box::new(TimeoutQueue::new()),
        )
    }

    /// Initialize this CPU's scheduler with explicit policy plug-ins.
    pub fn init_with(
        &self,
        sched: ThdCaps,
        idle: ThdCaps,
        mut policy: Box<dyn Policy>,
        mut timer: Box<dyn TimerPolicy>,
    ) -> SchedResult<()> {
        // Process-wide one-shot setup: the first CPU in claims it, the
        // others spin until it is visible.
        if self
            .boot_claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            log::info!(
                "slm: {} cpu(s), {} cycles/usec",
                self.kernel.cpu_count(),
                self.kernel.cyc_per_usec()
            );
            self.boot_done.store(true, Ordering::SeqCst);
        } else {
            while !self.boot_done.load(Ordering::SeqCst) {
                core::hint::spin_loop();
            }
        }

        let pcpu = self.pcpu();
        if pcpu.ready.load(Ordering::SeqCst) {
            return Err(SchedError::InvalidState);
        }
        if sched.tid.0 == 0 || idle.tid.0 == 0 || sched.tid == idle.tid {
            return Err(SchedError::InvalidState);
        }

        let mut sched_thd = ThdDesc::new(sched, ThdProperty::empty(), ThdState::Runnable);
        let mut idle_thd = ThdDesc::new(idle, ThdProperty::empty(), ThdState::Runnable);
        // Neither sits on a policy run queue: the scheduler thread runs
        // on kernel events, and idle is the fallback pick when
        // `schedule` comes up empty.
        policy.thd_init(&mut sched_thd);
        timer.thd_init(&mut sched_thd);
        policy.thd_init(&mut idle_thd);
        timer.thd_init(&mut idle_thd);

        let policy_name = policy.name();
        *pcpu.run.lock() = Some(CpuRun {
            threads: vec![sched_thd, idle_thd],
            policy,
            timer,
            event_list: VecDeque::new(),
            sched_tid: sched.tid,
            idle_tid: idle.tid,
            sched_rcv: sched.rcv,
            cyc_per_usec: self.kernel.cyc_per_usec(),
            timer_set: false,
            timer_next_cycle: 0,
            timer_next_tick: 0,
        });
        pcpu.ready.store(true, Ordering::SeqCst);

        log::info!(
            "slm: cpu {} ready, policy {}",
            self.kernel.cpu_id().0,
            policy_name
        );
        Ok(())
    }

    // ====================================================================
    // CRITICAL SECTION PROTOCOL
    // ====================================================================

    /// Enter the scheduler critical section as `curr`.
    ///
    /// If the section is owned, marks it contended and switches to the
    /// owner with priority inheritance, then retries. `NOSPIN` turns the
    /// retry into `Again`; `SCHEDEVT` surfaces the kernel's `Busy`
    /// (pending scheduler events) instead of looping.
    pub fn cs_enter(&self, curr: Tid, flags: CsFlags) -> SchedResult<()> {
        debug_assert!(curr.0 != 0);
        let pcpu = self.pcpu();
        loop {
            let tok = self.kernel.sched_token();
            let word = pcpu.lock.word();

            if word.owner().is_some() {
                let ret = self.cs_enter_contended(pcpu, word, tok);
                if ret == Err(SchedError::Busy) {
                    if flags.contains(CsFlags::SCHEDEVT) {
                        return Err(SchedError::Busy);
                    }
                    debug_assert!(false, "pending events outside the scheduler thread");
                }
                if flags.contains(CsFlags::NOSPIN) {
                    return Err(SchedError::Again);
                }
                continue;
            }

            if pcpu.lock.try_update(word, CsWord::pack(curr, false)) {
                return Ok(());
            }
            if flags.contains(CsFlags::NOSPIN) {
                return Err(SchedError::Again);
            }
        }
    }

    fn cs_enter_contended(&self, pcpu: &PerCpu, word: CsWord, tok: SchedToken) -> SchedResult<()> {
        let owner = word.owner().expect("contended entry without owner");
        if !word.contended() && !pcpu.lock.try_update(word, word.with_contended()) {
            return Err(SchedError::Again);
        }
        let Some(cap) = pcpu.with_run(|run| run.thd(owner).map(|t| t.dispatch_cap())) else {
            // Owner vanished between the read and the lookup; retry.
            return Err(SchedError::Again);
        };
        // Donate our priority to the owner until it leaves the section.
        self.kernel.dispatch(cap, tok, true)
    }

    /// Release the critical section. `curr` must be the owner.
    ///
    /// If another thread contended while we held the section, the lock is
    /// cleared and control is handed to the scheduler thread so it can
    /// arbitrate the next owner.
    pub fn cs_exit(&self, curr: Tid) {
        let pcpu = self.pcpu();
        assert_eq!(
            pcpu.lock.word().owner(),
            Some(curr),
            "critical section exit by non-owner"
        );
        loop {
            let tok = self.kernel.sched_token();
            let word = pcpu.lock.word();
            if word.owner() != Some(curr) {
                // A contended hand-off below already cleared the word.
                return;
            }

            if word.contended() {
                if !pcpu.lock.try_update(word, CsWord::EMPTY) {
                    continue;
                }
                let cap = pcpu
                    .with_run(|run| run.thd(run.sched_tid).map(|t| t.dispatch_cap()))
                    .expect("scheduler thread missing");
                // A stale token just means the lock is already free and
                // someone else ran; anything else is a mechanism fault
                // worth hearing about.
                if let Err(e) = self.kernel.dispatch(cap, tok, false) {
                    if e != SchedError::Again {
                        log::warn!("contended exit hand-off failed: {}", e);
                    }
                }
                return;
            }

            if pcpu.lock.try_update(word, CsWord::EMPTY) {
                return;
            }
        }
    }

    /// Release the critical section and dispatch in one protocol step.
    ///
    /// Dispatches to `switchto` if it is runnable, otherwise to the
    /// policy's pick, otherwise to idle. The decision is made under the
    /// section against the token read beforehand; if the token moved by
    /// dispatch time, the section is re-entered and the whole sequence
    /// retried. `CHECK_TIMEOUT` expires pending timeouts first.
    pub fn cs_exit_reschedule(
        &self,
        curr: Tid,
        switchto: Option<Tid>,
        flags: CsFlags,
    ) -> SchedResult<()> {
        let pcpu = self.pcpu();
        loop {
            let tok = self.kernel.sched_token();
            let cap = pcpu.with_run(|run| {
                if flags.contains(CsFlags::CHECK_TIMEOUT) {
                    let now = self.kernel.tsc_now();
                    self.timer_expire(run, now);
                }
                let direct = switchto.filter(|&to| {
                    run.thd(to).is_some_and(|t| t.state == ThdState::Runnable)
                });
                let next = direct
                    .or_else(|| run.policy.schedule())
                    .unwrap_or(run.idle_tid);
                self.program_timeout(run);
                match run.thd(next) {
                    Some(t) => t.dispatch_cap(),
                    None => {
                        log::warn!("schedule returned unknown {}", next);
                        run.thd(run.idle_tid)
                            .map(|t| t.dispatch_cap())
                            .expect("idle thread missing")
                    }
                }
            });

            self.cs_exit(curr);
            match self.kernel.dispatch(cap, tok, false) {
                Ok(()) => return Ok(()),
                Err(SchedError::Again) => {
                    match self.cs_enter(curr, flags & CsFlags::SCHEDEVT) {
                        Ok(()) => continue,
                        Err(e) => return Err(e),
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Scheduler-bypass fast path: dispatch directly to `to` without a
    /// policy decision. `to` must be `Runnable`; with `inherit_prio` it
    /// borrows the caller's priority for the activation. The caller
    /// passes the token it based its decision on.
    pub fn switch_to(&self, to: Tid, tok: SchedToken, inherit_prio: bool) -> SchedResult<()> {
        let cap = self.pcpu().with_run(|run| {
            run.thd(to)
                .and_then(|t| (t.state == ThdState::Runnable).then(|| t.dispatch_cap()))
        });
        match cap {
            Some(cap) => self.kernel.dispatch(cap, tok, inherit_prio),
            None => Err(SchedError::InvalidState),
        }
    }

    // ====================================================================
    // TIMER PLUMBING
    // ====================================================================

    fn timer_expire(&self, run: &mut CpuRun, now: Cycles) {
        let expired = run.timer.expire(now);
        for tid in expired {
            let CpuRun {
                threads, policy, ..
            } = &mut *run;
            let Some(t) = threads.iter_mut().find(|t| t.tid == tid) else {
                continue;
            };
            t.timeout_at = None;
            if t.state == ThdState::Blocked {
                t.state = ThdState::Runnable;
                policy.wakeup(t);
                log::debug!("timeout woke {}", t.tid);
            }
        }
    }

    /// Re-program the kernel one-shot to the nearest outstanding
    /// deadline, or clear it when none remains. At most one timeout is
    /// armed per CPU.
    fn program_timeout(&self, run: &mut CpuRun) {
        let now = self.kernel.tsc_now();
        let timer_next = run.timer.next(now);
        let policy_next = run.policy.next_timeout(now);
        let next = match (timer_next, policy_next) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        match next {
            Some(deadline) => self.timeout_set(run, deadline),
            None => self.timeout_clear(run),
        }
    }

    pub(crate) fn timeout_set(&self, run: &mut CpuRun, deadline: Cycles) {
        if run.timer_set && run.timer_next_cycle == deadline {
            return;
        }
        run.timer_set = true;
        run.timer_next_cycle = deadline;
        run.timer_next_tick = self.kernel.cyc2tick(deadline);
        self.kernel.timer_arm(run.timer_next_tick);
    }

    pub(crate) fn timeout_clear(&self, run: &mut CpuRun) {
        if !run.timer_set {
            return;
        }
        run.timer_set = false;
        self.kernel.timer_disarm();
    }

    // ====================================================================
    // THREAD LIFECYCLE
    // ====================================================================

    /// Register a thread with the scheduler.
    ///
    /// The initial state derives from the properties: a thread created
    /// suspended on its receive endpoint (`RCV_SUSPENDED`) starts
    /// `Blocked`, anything else starts `Runnable` on the policy's
    /// default priority.
    pub fn thd_init(&self, curr: Tid, caps: ThdCaps, properties: ThdProperty) -> SchedResult<()> {
        if caps.tid.0 == 0 {
            return Err(SchedError::InvalidState);
        }
        self.cs_enter(curr, CsFlags::NONE)?;
        let pcpu = self.pcpu();
        let ret = pcpu.with_run(|run| {
            if run.threads.len() >= MAX_THREADS {
                return Err(SchedError::NoMem);
            }
            if run.thd(caps.tid).is_some() {
                return Err(SchedError::InvalidState);
            }

            let state = if properties.contains(ThdProperty::RCV_SUSPENDED) {
                ThdState::Blocked
            } else {
                ThdState::Runnable
            };
            let mut t = ThdDesc::new(caps, properties, state);
            run.policy.thd_init(&mut t);
            run.timer.thd_init(&mut t);
            if state == ThdState::Runnable {
                run.policy.wakeup(&mut t);
            }
            log::info!("thread {} registered ({:?})", t.tid, t.state);
            run.threads.push(t);
            Ok(())
        });
        self.cs_exit(curr);
        ret
    }

    /// Release a descriptor. The thread must have reached `Dying` via
    /// [`Slm::thd_exit`].
    pub fn thd_deinit(&self, curr: Tid, target: Tid) -> SchedResult<()> {
        self.cs_enter(curr, CsFlags::NONE)?;
        let pcpu = self.pcpu();
        let ret = pcpu.with_run(|run| {
            let Some(idx) = run.threads.iter().position(|t| t.tid == target) else {
                return Err(SchedError::InvalidState);
            };
            if run.threads[idx].state != ThdState::Dying {
                return Err(SchedError::InvalidState);
            }
            {
                let CpuRun {
                    threads,
                    policy,
                    timer,
                    ..
                } = &mut *run;
                let t = &mut threads[idx];
                policy.thd_deinit(t);
                timer.cancel(t);
                t.state = ThdState::Free;
            }
            run.event_list.retain(|&tid| tid != target);
            run.threads.swap_remove(idx);
            log::info!("thread {} released", target);
            Ok(())
        });
        self.cs_exit(curr);
        ret
    }

    /// Cooperative teardown of the calling thread: leave the run queues,
    /// enter `Dying`, and dispatch away for the last time. Another thread
    /// reclaims the descriptor with [`Slm::thd_deinit`].
    pub fn thd_exit(&self, curr: Tid) -> SchedResult<()> {
        self.cs_enter(curr, CsFlags::NONE)?;
        let pcpu = self.pcpu();
        pcpu.with_run(|run| {
            let CpuRun {
                threads,
                policy,
                timer,
                ..
            } = &mut *run;
            let t = threads
                .iter_mut()
                .find(|t| t.tid == curr)
                .unwrap_or_else(|| panic!("exit by unknown {}", curr));
            policy.block(t);
            timer.cancel(t);
            t.state = ThdState::Dying;
            log::info!("thread {} dying", curr);
        });
        self.cs_exit_reschedule(curr, None, CsFlags::NONE)
    }

    /// Adjust a scheduling parameter of `target`.
    pub fn thd_modify(
        &self,
        curr: Tid,
        target: Tid,
        param: SchedParam,
        value: u32,
    ) -> SchedResult<()> {
        self.cs_enter(curr, CsFlags::NONE)?;
        let pcpu = self.pcpu();
        let ret = pcpu.with_run(|run| {
            let CpuRun {
                threads, policy, ..
            } = &mut *run;
            let Some(t) = threads.iter_mut().find(|t| t.tid == target) else {
                return Err(SchedError::InvalidState);
            };
            policy.thd_modify(t, param, value)
        });
        self.cs_exit(curr);
        ret
    }

    // ====================================================================
    // BLOCK / WAKEUP / YIELD
    // ====================================================================

    /// Block the calling thread until another thread wakes it.
    ///
    /// If a wakeup already raced ahead (`Woken`), the state folds back to
    /// `Runnable` and the call returns without suspending.
    pub fn thd_block(&self, curr: Tid) -> SchedResult<()> {
        self.block_inner(curr, None)
    }

    /// Block the calling thread until a wakeup or until the absolute
    /// cycle deadline elapses, whichever comes first.
    pub fn thd_block_timeout(&self, curr: Tid, deadline: Cycles) -> SchedResult<()> {
        self.block_inner(curr, Some(deadline))
    }

    fn block_inner(&self, curr: Tid, deadline: Option<Cycles>) -> SchedResult<()> {
        self.cs_enter(curr, CsFlags::NONE)?;
        let pcpu = self.pcpu();
        let suspended = pcpu.with_run(|run| {
            if curr == run.idle_tid {
                return Err(SchedError::InvalidState);
            }
            let CpuRun {
                threads,
                policy,
                timer,
                ..
            } = &mut *run;
            let t = threads
                .iter_mut()
                .find(|t| t.tid == curr)
                .unwrap_or_else(|| panic!("block by unknown {}", curr));
            match t.state {
                ThdState::Woken => {
                    // The wakeup won the race; do not suspend.
                    t.state = ThdState::Runnable;
                    Ok(false)
                }
                ThdState::Runnable => {
                    t.state = ThdState::Blocked;
                    policy.block(t);
                    if let Some(deadline) = deadline {
                        timer.set(t, deadline);
                    }
                    Ok(true)
                }
                state => panic!("block of {} in state {:?}", curr, state),
            }
        });
        match suspended {
            Ok(true) => self.cs_exit_reschedule(curr, None, CsFlags::CHECK_TIMEOUT),
            Ok(false) => {
                self.cs_exit(curr);
                Ok(())
            }
            Err(e) => {
                self.cs_exit(curr);
                Err(e)
            }
        }
    }

    /// Make `target` runnable again.
    ///
    /// Waking an already-runnable thread records `Woken` so that a block
    /// the target is about to make short-circuits; unless `redundant` is
    /// set, that case additionally reports `InvalidState` to the caller.
    pub fn thd_wakeup(&self, curr: Tid, target: Tid, redundant: bool) -> SchedResult<()> {
        self.cs_enter(curr, CsFlags::NONE)?;
        let pcpu = self.pcpu();
        let ret = pcpu.with_run(|run| {
            let CpuRun {
                threads,
                policy,
                timer,
                ..
            } = &mut *run;
            let Some(t) = threads.iter_mut().find(|t| t.tid == target) else {
                return Err(SchedError::InvalidState);
            };
            match t.state {
                ThdState::Blocked => {
                    t.state = ThdState::Runnable;
                    timer.cancel(t);
                    // Enqueue even if the kernel still reports the thread
                    // suspended on its endpoint; the unblock event
                    // arrives before the thread can run.
                    policy.wakeup(t);
                    log::debug!("{} woke {}", curr, target);
                    Ok(())
                }
                ThdState::Runnable | ThdState::Woken => {
                    // Record the wakeup either way so a racing block is
                    // not lost; non-redundant callers asked to hear
                    // about it.
                    t.state = ThdState::Woken;
                    if redundant {
                        Ok(())
                    } else {
                        Err(SchedError::InvalidState)
                    }
                }
                ThdState::Free | ThdState::Dying => Err(SchedError::InvalidState),
            }
        });
        self.cs_exit(curr);
        ret
    }

    /// Yield the CPU, optionally in favor of `yield_to`.
    pub fn thd_yield(&self, curr: Tid, yield_to: Option<Tid>) -> SchedResult<()> {
        self.cs_enter(curr, CsFlags::NONE)?;
        let pcpu = self.pcpu();
        pcpu.with_run(|run| {
            let CpuRun {
                threads, policy, ..
            } = &mut *run;
            let t = threads
                .iter_mut()
                .find(|t| t.tid == curr)
                .unwrap_or_else(|| panic!("yield by unknown {}", curr));
            policy.yield_to(t, yield_to);
        });
        self.cs_exit_reschedule(curr, yield_to, CsFlags::NONE)
    }

    // ====================================================================
    // SCHEDULER LOOP
    // ====================================================================

    /// One scheduling pass: harvest kernel events, apply them, expire
    /// timeouts, and dispatch the policy's pick. Returns the number of
    /// events harvested; `Busy` means the kernel refused the dispatch
    /// because new events are already pending.
    pub(crate) fn sched_pass(&self, blocking: bool) -> SchedResult<usize> {
        let pcpu = self.pcpu();
        let (sched_tid, rcv) = pcpu.with_run(|run| (run.sched_tid, run.sched_rcv));

        let mut batch = EventBatch::new();
        let mut harvested = self.kernel.sched_rcv(rcv, blocking, &mut batch);

        loop {
            match self.cs_enter(sched_tid, CsFlags::SCHEDEVT) {
                Ok(()) => break,
                Err(SchedError::Busy) => {
                    // Events landed while we contended; pick them up too.
                    harvested += self.kernel.sched_rcv(rcv, false, &mut batch);
                }
                Err(_) => {}
            }
        }

        pcpu.with_run(|run| {
            for ev in batch.iter() {
                events::enqueue(run, ev);
            }
            events::apply_pending(run);
        });

        match self.cs_exit_reschedule(
            sched_tid,
            None,
            CsFlags::SCHEDEVT | CsFlags::CHECK_TIMEOUT,
        ) {
            Ok(()) => Ok(harvested),
            Err(e) => Err(e),
        }
    }

    /// The main scheduler loop. Must be executed by the thread passed as
    /// `sched` to [`Slm::init`]; parks on the receive endpoint between
    /// passes and never returns.
    pub fn sched_loop(&self) -> ! {
        log::info!("slm: scheduler loop starting");
        loop {
            let _ = self.sched_pass(true);
        }
    }

    /// Non-blocking variant of the scheduler loop: processes passes until
    /// one harvests no events, then returns. Used by bootstrap and test
    /// configurations where parking on the endpoint is not possible.
    pub fn sched_loop_nonblock(&self) {
        loop {
            match self.sched_pass(false) {
                Ok(0) => return,
                _ => {}
            }
        }
    }

    /// Body of the per-CPU idle thread: spin at the lowest priority until
    /// the next kernel event preempts us back into the scheduler.
    pub fn idle(&self) -> ! {
        log::debug!("idle thread parked");
        loop {
            core::hint::spin_loop();
        }
    }
}
