/*
 * Scheduler Type Definitions
 *
 * Core identifier and flag types shared by the runtime, the policies and
 * the kernel interface. All of them are small Copy newtypes so they can
 * move freely between layers without ownership entanglement.
 */

use core::fmt;

/// Kernel-assigned thread identifier.
///
/// Tid 0 is reserved: it encodes the empty owner in the critical-section
/// lock word and is never assigned to a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tid(pub u32);

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thd({})", self.0)
    }
}

/// Logical CPU identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuId(pub u32);

impl CpuId {
    /// Bootstrap processor.
    pub const BSP: CpuId = CpuId(0);

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Opaque kernel capability handle (dispatch, receive, send, time budget).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapId(pub u64);

impl CapId {
    /// An empty capability slot.
    pub const NONE: CapId = CapId(0);
}

/// Per-CPU scheduler synchronization token.
///
/// The kernel changes the token on every context switch; reading it
/// before a decision and passing it to `dispatch` makes the decision
/// optimistically concurrent: a stale token rejects the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedToken(pub u64);

/// Policy-specific priority ordinal. For the fixed-priority round-robin
/// reference policy, 1 is the highest and 32 the lowest level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(pub u32);

/// Parameter selector for `thd_modify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedParam {
    Priority,
}

bitflags::bitflags! {
    /// Flags controlling the critical-section primitives.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CsFlags: u32 {
        /// Return instead of looping when racing another thread.
        const NOSPIN = 1;
        /// Surface `Busy` (pending scheduler events) to the caller; only
        /// the scheduler thread should pass this.
        const SCHEDEVT = 1 << 1;
        /// Expire pending timeouts before the dispatch decision on exit.
        const CHECK_TIMEOUT = 1 << 2;
    }
}

impl CsFlags {
    pub const NONE: CsFlags = CsFlags::empty();
}
