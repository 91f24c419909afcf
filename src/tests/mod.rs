/*
 * Scheduler Test Suite
 *
 * Crate-level tests driven through a mock kernel: the end-to-end
 * scheduling scenarios, the state-machine invariants, and the event
 * loop's reconciliation rules. Module-local unit tests live next to the
 * code they cover.
 */

pub mod mock;
