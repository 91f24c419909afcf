/*
 * Mock Kernel
 *
 * A scripted stand-in for the kernel mechanism: a virtual timestamp
 * counter, a token that moves on every successful dispatch, a log of
 * dispatches, and pre-loaded event batches for `sched_rcv`. Ticks equal
 * cycles to keep arithmetic transparent in assertions.
 */

use std::collections::VecDeque;
use std::sync::Arc;

use spin::Mutex;

use crate::error::{SchedError, SchedResult};
use crate::kernel::{EventBatch, Kernel, KernelEvent};
use crate::sched::types::{CapId, CpuId, SchedToken};
use crate::time::{Cycles, Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub cap: CapId,
    pub inherit_prio: bool,
}

#[derive(Default)]
struct MockState {
    now: Cycles,
    token: u64,
    dispatches: Vec<Dispatch>,
    batches: VecDeque<Vec<KernelEvent>>,
    armed: Option<Tick>,
    disarms: usize,
}

#[derive(Clone)]
pub struct MockKernel {
    state: Arc<Mutex<MockState>>,
    cyc_per_usec: u64,
}

impl MockKernel {
    pub fn new() -> Self {
        MockKernel {
            state: Arc::new(Mutex::new(MockState::default())),
            cyc_per_usec: 1000,
        }
    }

    pub fn advance(&self, cycles: Cycles) {
        self.state.lock().now += cycles;
    }

    pub fn push_events(&self, events: Vec<KernelEvent>) {
        self.state.lock().batches.push_back(events);
    }

    pub fn dispatches(&self) -> Vec<Dispatch> {
        self.state.lock().dispatches.clone()
    }

    pub fn dispatch_caps(&self) -> Vec<u64> {
        self.state
            .lock()
            .dispatches
            .iter()
            .map(|d| d.cap.0)
            .collect()
    }

    pub fn last_dispatch(&self) -> Option<Dispatch> {
        self.state.lock().dispatches.last().copied()
    }

    pub fn armed(&self) -> Option<Tick> {
        self.state.lock().armed
    }

    pub fn disarms(&self) -> usize {
        self.state.lock().disarms
    }
}

impl Kernel for MockKernel {
    fn sched_token(&self) -> SchedToken {
        SchedToken(self.state.lock().token)
    }

    fn dispatch(&self, cap: CapId, tok: SchedToken, inherit_prio: bool) -> SchedResult<()> {
        let mut s = self.state.lock();
        if tok.0 != s.token {
            return Err(SchedError::Again);
        }
        s.dispatches.push(Dispatch { cap, inherit_prio });
        // Every context switch moves the scheduler token.
        s.token += 1;
        Ok(())
    }

    fn sched_rcv(&self, _rcv: CapId, _blocking: bool, out: &mut EventBatch) -> usize {
        let mut s = self.state.lock();
        let Some(batch) = s.batches.pop_front() else {
            return 0;
        };
        let mut n = 0;
        for ev in batch.iter() {
            if out.push(*ev).is_err() {
                break;
            }
            n += 1;
        }
        // Whatever did not fit stays queued for the next call, per the
        // trait contract.
        if n < batch.len() {
            s.batches.push_front(batch[n..].to_vec());
        }
        n
    }

    fn timer_arm(&self, tick: Tick) {
        self.state.lock().armed = Some(tick);
    }

    fn timer_disarm(&self) {
        let mut s = self.state.lock();
        s.armed = None;
        s.disarms += 1;
    }

    fn tsc_now(&self) -> Cycles {
        self.state.lock().now
    }

    fn cyc_per_usec(&self) -> u64 {
        self.cyc_per_usec
    }

    fn cyc2tick(&self, cyc: Cycles) -> Tick {
        cyc
    }

    fn tick2cyc(&self, tick: Tick) -> Cycles {
        tick
    }

    fn cpu_id(&self) -> CpuId {
        CpuId::BSP
    }

    fn cpu_count(&self) -> u32 {
        1
    }
}
