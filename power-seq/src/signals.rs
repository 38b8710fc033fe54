use core::cell::Cell;

use bitflags::bitflags;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, with_deadline};
use portable_atomic::{AtomicU32, Ordering};

bitflags! {
    /// Snapshot of the tracked power input lines, one bit per signal.
    ///
    /// Bit assignments are fixed for the lifetime of the process; a set bit
    /// always means "asserted" (power good, or sleep request line released).
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct SignalMask: u32 {
        /// 5 V bulk rail power good.
        const PGOOD_PP5000 = 1 << 0;
        /// 1.05 V suspend-well rail power good.
        const PGOOD_PP1050 = 1 << 1;
        /// Always-on (S5) well power good.
        const PGOOD_S5 = 1 << 2;
        /// AP core rail power good.
        const PGOOD_VCORE = 1 << 3;
        /// SLP_S3# released: the AP is not requesting suspend.
        const SLP_S3_DEASSERTED = 1 << 4;
        /// SLP_S4# released: the AP is not requesting soft-off.
        const SLP_S4_DEASSERTED = 1 << 5;
    }
}

/// All always-on supplies.
pub const PGOOD_ALWAYS_ON: SignalMask = SignalMask::PGOOD_S5;
/// All non-core power rails.
pub const PGOOD_ALL_NONCORE: SignalMask = SignalMask::PGOOD_PP5000;
/// All core power rails.
pub const PGOOD_ALL_CORE: SignalMask = SignalMask::PGOOD_VCORE;
/// Rails required while in S3.
pub const PGOOD_S3: SignalMask = PGOOD_ALWAYS_ON;
/// Rails waited on during S3->S0, before the core rail is enabled.
pub const PGOOD_S0_RAILS: SignalMask = PGOOD_ALWAYS_ON.union(PGOOD_ALL_NONCORE);
/// Rails required while in steady S0. Unlike the S3->S0 wait this includes
/// the core rail: once the AP runs, losing it is a fault.
pub const PGOOD_S0: SignalMask = PGOOD_S0_RAILS.union(PGOOD_ALL_CORE);
/// Both sleep-request lines released.
pub const ALL_SLP_DEASSERTED: SignalMask =
    SignalMask::SLP_S3_DEASSERTED.union(SignalMask::SLP_S4_DEASSERTED);
/// Everything in the right state for S0; used by the boot-time shortcut.
pub const ALL_S0: SignalMask = PGOOD_S0.union(ALL_SLP_DEASSERTED);

/// Default bound on a single signal wait.
pub const DEFAULT_SIGNAL_TIMEOUT: Duration = Duration::from_secs(1);

/// A signal wait ran out of time. Carries what was wanted and what was
/// actually present when the deadline passed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalTimeout {
    pub want: u32,
    pub got: u32,
}

/// Shared view of the power input signals.
///
/// Producers (the GPIO sampling task, or an interrupt handler) push fresh
/// snapshots with `update`; the single chipset task reads and waits. Updates
/// that change nothing are absorbed without waking anyone.
pub struct PowerSignals {
    mask: Mutex<CriticalSectionRawMutex, Cell<SignalMask>>,
    changed: Signal<CriticalSectionRawMutex, ()>,
    debug_mask: AtomicU32,
}

impl PowerSignals {
    pub const fn new() -> Self {
        Self {
            mask: Mutex::new(Cell::new(SignalMask::empty())),
            changed: Signal::new(),
            debug_mask: AtomicU32::new(0),
        }
    }

    /// Current snapshot. Pure read, callable from any context.
    pub fn read(&self) -> SignalMask {
        self.mask.lock(|m| m.get())
    }

    /// Replace the snapshot. Returns true if any bit changed.
    pub(crate) fn update(&self, new: SignalMask) -> bool {
        let old = self.mask.lock(|m| m.replace(new));
        if old == new {
            return false;
        }
        let debug = SignalMask::from_bits_truncate(self.debug_mask.load(Ordering::Relaxed));
        if (old ^ new).intersects(debug) {
            info!("power in 0x{:04x}", new.bits());
        }
        self.changed.signal(());
        true
    }

    /// True iff every bit in `want` is currently set. Logs what went missing
    /// on failure, since every caller treats that as a fault.
    pub fn has_all(&self, want: SignalMask) -> bool {
        let got = self.read();
        if got.contains(want) {
            return true;
        }
        warn!(
            "power lost input; wanted 0x{:04x}, got 0x{:04x}",
            want.bits(),
            (got & want).bits()
        );
        false
    }

    /// Block the calling task until every bit in `want` is set, or `timeout`
    /// elapses. Never returns partial success.
    pub async fn wait_for(
        &self,
        want: SignalMask,
        timeout: Duration,
    ) -> Result<(), SignalTimeout> {
        if want.is_empty() {
            return Ok(());
        }
        let deadline = Instant::now() + timeout;
        loop {
            if self.read().contains(want) {
                return Ok(());
            }
            if with_deadline(deadline, self.changed.wait()).await.is_err() {
                // Deadline hit; one last look in case the final update and
                // the timer raced.
                let got = self.read();
                if got.contains(want) {
                    return Ok(());
                }
                warn!(
                    "power timeout on input; wanted 0x{:04x}, got 0x{:04x}",
                    want.bits(),
                    (got & want).bits()
                );
                return Err(SignalTimeout {
                    want: want.bits(),
                    got: got.bits(),
                });
            }
        }
    }

    /// Signal-change debug print mask (`powerindebug` console command).
    pub fn debug_mask(&self) -> u32 {
        self.debug_mask.load(Ordering::Relaxed)
    }

    pub fn set_debug_mask(&self, mask: u32) {
        self.debug_mask.store(mask, Ordering::Relaxed);
    }
}

impl Default for PowerSignals {
    fn default() -> Self {
        Self::new()
    }
}
