/*
 * Scheduler Error Codes
 *
 * Error kinds shared by the critical-section primitives, the policy layer,
 * and the public thread operations. The numeric codes follow the usual
 * negative-errno convention so components written against a C ABI see
 * familiar values.
 */

use core::fmt;

/// Errors surfaced by scheduler operations.
///
/// `Again` and `Busy` are flow-control values: the critical-section
/// primitives return them for the caller to decide on a retry, while the
/// public operations absorb `Again` internally and surface `Busy` only to
/// the scheduler loop. The remaining kinds are genuine failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// Optimistic retry required: the scheduler token changed or a CAS lost.
    Again,
    /// Pending scheduler events block progress.
    Busy,
    /// Operation attempted on a descriptor in the wrong state.
    InvalidState,
    /// Critical-section exit by a thread that does not own it.
    NotOwner,
    /// Descriptor table is full.
    NoMem,
    /// Invariant violation.
    Fatal,
}

impl SchedError {
    /// Conventional negative status code for this error.
    pub fn code(self) -> i32 {
        match self {
            SchedError::Again => -11,
            SchedError::Busy => -16,
            SchedError::InvalidState => -22,
            SchedError::NotOwner => -1,
            SchedError::NoMem => -12,
            SchedError::Fatal => -125,
        }
    }
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedError::Again => "again",
            SchedError::Busy => "busy",
            SchedError::InvalidState => "invalid state",
            SchedError::NotOwner => "not owner",
            SchedError::NoMem => "no memory",
            SchedError::Fatal => "fatal",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

pub type SchedResult<T> = Result<T, SchedError>;
