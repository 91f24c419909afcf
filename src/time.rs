/*
 * Time Units and Conversions
 *
 * Three time units exist in the system: cycles (the raw timestamp
 * counter, cheapest to read), microseconds (what users specify), and
 * kernel ticks (the unit the one-shot timer is programmed in). This
 * module hides ticks entirely and converts between the other two using
 * the per-boot calibration constant; tick conversions delegate to the
 * kernel helpers.
 *
 * All arithmetic is 64-bit unsigned. An underflowing subtraction is a
 * bug, never a wrap.
 */

use crate::kernel::Kernel;
use crate::sched::Slm;

/// Raw timestamp-counter cycles.
pub type Cycles = u64;

/// Microseconds.
pub type Microseconds = u64;

/// Kernel timer ticks.
pub type Tick = u64;

/// Cycles elapsed between two timestamps. Asserts on underflow.
pub fn elapsed(later: Cycles, earlier: Cycles) -> Cycles {
    assert!(
        later >= earlier,
        "time went backwards: {} < {}",
        later,
        earlier
    );
    later - earlier
}

impl<K: Kernel> Slm<K> {
    /// Current cycle count from the timestamp counter.
    pub fn now(&self) -> Cycles {
        self.kernel().tsc_now()
    }

    /// Convert cycles to microseconds using this CPU's calibration.
    pub fn cyc2usec(&self, cyc: Cycles) -> Microseconds {
        let per_usec = self.cyc_per_usec();
        assert!(per_usec > 0, "cycle calibration not initialized");
        cyc / per_usec
    }

    /// Convert microseconds to cycles using this CPU's calibration.
    pub fn usec2cyc(&self, usec: Microseconds) -> Cycles {
        let per_usec = self.cyc_per_usec();
        assert!(per_usec > 0, "cycle calibration not initialized");
        usec * per_usec
    }

    /// Convert an absolute cycle count to kernel ticks.
    pub fn cyc2tick(&self, cyc: Cycles) -> Tick {
        self.kernel().cyc2tick(cyc)
    }

    /// Convert kernel ticks to an absolute cycle count.
    pub fn tick2cyc(&self, tick: Tick) -> Cycles {
        self.kernel().tick2cyc(tick)
    }
}

#[cfg(test)]
mod tests {
    use super::elapsed;

    #[test]
    fn elapsed_computes_difference() {
        assert_eq!(elapsed(1500, 500), 1000);
        assert_eq!(elapsed(7, 7), 0);
    }

    #[test]
    #[should_panic(expected = "time went backwards")]
    fn elapsed_asserts_on_underflow() {
        let _ = elapsed(10, 20);
    }
}
