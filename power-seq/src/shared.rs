use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicBool, AtomicU8, Ordering};

use crate::signals::{PowerSignals, SignalMask};
use crate::state::{ChipsetState, PowerState};

/// Process-wide sequencing tunables. Written by host/console command
/// handlers, read by the chipset task at transition-entry points only, so
/// plain atomics are enough.
pub struct Tunables {
    pause_in_s5: AtomicBool,
    fake_platform_reset_timeout: AtomicBool,
    throttle_ap: AtomicBool,
    usb_power_in_s3: AtomicBool,
    locked: AtomicBool,
}

impl Tunables {
    pub const fn new() -> Self {
        Self {
            pause_in_s5: AtomicBool::new(true),
            fake_platform_reset_timeout: AtomicBool::new(false),
            throttle_ap: AtomicBool::new(false),
            usb_power_in_s3: AtomicBool::new(false),
            locked: AtomicBool::new(false),
        }
    }

    /// Should the AP pause in S5 while shutting down, instead of dropping
    /// straight to G3?
    pub fn pause_in_s5(&self) -> bool {
        self.pause_in_s5.load(Ordering::Relaxed)
    }

    pub fn set_pause_in_s5(&self, pause: bool) {
        self.pause_in_s5.store(pause, Ordering::Relaxed);
    }

    /// Arm a fake platform-reset timeout for the next power-on, exercising
    /// the recovery path without broken hardware.
    pub fn inject_fault_next_resume(&self) {
        self.fake_platform_reset_timeout.store(true, Ordering::Relaxed);
    }

    pub fn fault_next_resume_armed(&self) -> bool {
        self.fake_platform_reset_timeout.load(Ordering::Relaxed)
    }

    /// Consume the armed fault, if any. Self-clearing: one injection faults
    /// exactly one power-on.
    pub(crate) fn take_fake_platform_reset_timeout(&self) -> bool {
        self.fake_platform_reset_timeout.swap(false, Ordering::Relaxed)
    }

    pub fn throttle_ap(&self) -> bool {
        self.throttle_ap.load(Ordering::Relaxed)
    }

    pub fn set_throttle_ap(&self, throttle: bool) {
        self.throttle_ap.store(throttle, Ordering::Relaxed);
    }

    /// Keep the 5 V rail up in S3 while USB ports are powering devices.
    pub fn usb_power_in_s3(&self) -> bool {
        self.usb_power_in_s3.load(Ordering::Relaxed)
    }

    pub fn set_usb_power_in_s3(&self, keep: bool) {
        self.usb_power_in_s3.store(keep, Ordering::Relaxed);
    }

    /// System lock state; gates fault injection from untrusted surfaces.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::Relaxed);
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self::new()
    }
}

/// Emergency actions requested from outside the normal transition table
/// (watchdog expiry, host command, console). Single slot, latest wins.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EmergencyRequest {
    Shutdown,
    Reset { cold: bool },
}

/// Cross-task surface of the power controller: the live signal snapshot,
/// the single-slot wake side channel, the tunables, and a published copy of
/// the current state for read-only queries.
///
/// Exactly one chipset task consumes this; any context may produce into it.
pub struct PowerShared {
    pub signals: PowerSignals,
    pub tunables: Tunables,
    wake: Signal<CriticalSectionRawMutex, ()>,
    emergency: Mutex<CriticalSectionRawMutex, Cell<Option<EmergencyRequest>>>,
    want_g3_exit: AtomicBool,
    state: AtomicU8,
}

impl PowerShared {
    pub const fn new() -> Self {
        Self {
            signals: PowerSignals::new(),
            tunables: Tunables::new(),
            wake: Signal::new(),
            emergency: Mutex::new(Cell::new(None)),
            want_g3_exit: AtomicBool::new(false),
            state: AtomicU8::new(PowerState::G3 as u8),
        }
    }

    /// Last state published by the chipset task.
    pub fn power_state(&self) -> PowerState {
        // The task only ever stores valid discriminants.
        PowerState::from_raw(self.state.load(Ordering::Relaxed)).unwrap_or(PowerState::G3)
    }

    /// True iff the current state matches every class in `mask`.
    pub fn in_state(&self, mask: ChipsetState) -> bool {
        mask.contains(self.power_state().chipset_state())
    }

    /// Wake the chipset task for a fresh state evaluation. The only payload
    /// is "re-run now"; coalescing concurrent requests is the point.
    pub fn wake(&self) {
        self.wake.signal(());
    }

    pub(crate) async fn wait_wake(&self) {
        self.wake.wait().await
    }

    /// Push a fresh signal snapshot; wakes the chipset task if anything
    /// changed. Callable from interrupt context.
    pub fn update_signals(&self, mask: SignalMask) {
        if self.signals.update(mask) {
            self.wake();
        }
    }

    /// Ask the chipset task to leave G3. Only meaningful when hard-off or
    /// headed there; ignored otherwise.
    pub fn exit_hard_off(&self) {
        let state = self.power_state();
        if state != PowerState::G3 && state != PowerState::S5G3 {
            return;
        }
        self.want_g3_exit.store(true, Ordering::Relaxed);
        self.wake();
    }

    pub(crate) fn take_g3_exit(&self) -> bool {
        self.want_g3_exit.swap(false, Ordering::Relaxed)
    }

    pub(crate) fn clear_g3_exit(&self) {
        self.want_g3_exit.store(false, Ordering::Relaxed);
    }

    /// Request an immediate forced shutdown, serviced by the chipset task
    /// ahead of its next state evaluation.
    pub fn request_shutdown(&self) {
        self.emergency.lock(|slot| slot.set(Some(EmergencyRequest::Shutdown)));
        self.wake();
    }

    /// Request an AP reset. `cold` drops power to the platform; warm pulses
    /// the reset input without touching rails.
    pub fn request_reset(&self, cold: bool) {
        self.emergency.lock(|slot| slot.set(Some(EmergencyRequest::Reset { cold })));
        self.wake();
    }

    pub(crate) fn take_emergency(&self) -> Option<EmergencyRequest> {
        self.emergency.lock(|slot| slot.take())
    }

    pub(crate) fn publish_state(&self, state: PowerState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }
}

impl Default for PowerShared {
    fn default() -> Self {
        Self::new()
    }
}
