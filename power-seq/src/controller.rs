use embassy_time::{Duration, Timer, with_timeout};

use crate::board::{PowerBoard, PowerLine, WirelessState};
use crate::hooks::{ChipsetEvent, HookRegistry};
use crate::shared::{EmergencyRequest, PowerShared};
use crate::signals::{
    ALL_S0, DEFAULT_SIGNAL_TIMEOUT, PGOOD_ALWAYS_ON, PGOOD_S0, PGOOD_S0_RAILS, PGOOD_S3,
    SignalMask, SignalTimeout,
};
use crate::state::PowerState;

/// How long to sit in S5 with nothing happening before dropping to G3.
pub const S5_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded poll for platform reset to deassert after power OK: 50 x 1 ms.
const PLATFORM_RESET_POLL_COUNT: u32 = 50;

/// The chipset power state machine.
///
/// Owns the board actuator and the hook registry; shares signal input, wake
/// requests, and tunables with the rest of the system through `PowerShared`.
/// The owning task is the sole writer of the power state; everyone else
/// observes it through the published copy in `PowerShared`.
///
/// Faults only ever move the system toward "off": a missing rail in a steady
/// state forces shutdown and takes the matching down edge, and a signal-wait
/// timeout inside a transition steps back toward S5/G3, never forward.
pub struct PowerController<'d, B: PowerBoard> {
    board: B,
    shared: &'d PowerShared,
    hooks: HookRegistry,
    state: PowerState,
    /// Set by the platform-reset recovery path; makes the next S3->S5 pass
    /// restart the AP from scratch instead of stopping in S5.
    restart_from_s5: bool,
}

impl<'d, B: PowerBoard> PowerController<'d, B> {
    pub fn new(board: B, shared: &'d PowerShared, hooks: HookRegistry) -> Self {
        Self {
            board,
            shared,
            hooks,
            state: PowerState::G3,
            restart_from_s5: false,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    /// True while a platform-reset fault has scheduled a restart-from-S5.
    pub fn restart_pending(&self) -> bool {
        self.restart_from_s5
    }

    /// Boot-time classification, run once before the control loop.
    ///
    /// After a warm restart (new firmware image, no hardware reset) with the
    /// AP already fully up, adopt S0 directly rather than cycling it through
    /// G3; the startup/resume hooks are not re-fired. A warm restart in any
    /// other input state forces every line to its G3 default first, undoing
    /// whatever the previous image left behind. A cold start begins in G3
    /// with the hardware already at its reset defaults.
    pub fn init(&mut self, jumped_to_image: bool) {
        let initial = if jumped_to_image {
            if self.shared.signals.read().contains(ALL_S0) {
                info!("power already in S0");
                self.board.allow_deep_sleep(false);
                PowerState::S0
            } else {
                info!("power forcing G3");
                self.drive_g3_defaults();
                PowerState::G3
            }
        } else {
            PowerState::G3
        };
        self.set_state(initial);
    }

    /// Force power off. Undone when the state machine next runs the G3->S5
    /// edge.
    pub fn force_shutdown(&mut self) {
        info!("power forcing shutdown");
        self.board.set_line(PowerLine::SocSysPwrok, false);
        self.board.set_line(PowerLine::SocRsmrstL, false);
    }

    /// Reset the AP. A cold reset drops and restores power OK, which makes
    /// the platform controller drop power to the rest of the system and
    /// reboot regardless of its after-G3 setting; it is a no-op if power OK
    /// is already low. A warm reset pulses the reset input without touching
    /// rails; the pulse is held for twice the AP's 16 ms debounce time.
    pub async fn reset(&mut self, cold: bool) {
        info!("power reset, cold={}", cold);
        if cold {
            if !self.board.line(PowerLine::SocSysPwrok) {
                return;
            }
            // Power OK must stay low for at least 3 RTC clocks (91 us).
            self.board.set_line(PowerLine::SocSysPwrok, false);
            Timer::after_micros(100).await;
            self.board.set_line(PowerLine::SocSysPwrok, true);
        } else {
            self.board.set_line(PowerLine::SocRcinL, false);
            Timer::after_millis(32).await;
            self.board.set_line(PowerLine::SocRcinL, true);
        }
    }

    /// Run one control-loop iteration: service any emergency request,
    /// evaluate the state machine, and if the state did not change, block in
    /// the steady-state handler until something happens. Returns the state
    /// the machine settled on.
    pub async fn step(&mut self) -> PowerState {
        debug!(
            "power state {} = {}, in 0x{:04x}",
            self.state.raw(),
            self.state.name(),
            self.shared.signals.read().bits()
        );

        if let Some(request) = self.shared.take_emergency() {
            match request {
                EmergencyRequest::Shutdown => self.force_shutdown(),
                EmergencyRequest::Reset { cold } => self.reset(cold).await,
            }
        }

        let mut new_state = self.handle_state(self.state).await;
        if new_state == self.state {
            new_state = self.common_state().await;
        }
        if new_state != self.state {
            info!("power transition {} -> {}", self.state.name(), new_state.name());
            self.set_state(new_state);
        }
        self.state
    }

    /// The control loop proper. Never returns; every fault degrades to a
    /// lower state and re-enters the table.
    pub async fn run(&mut self) -> ! {
        loop {
            self.step().await;
        }
    }

    /// Evaluate the transition table once from `state`. Steady states check
    /// their leave conditions; transitional states run their actuation
    /// script to completion (or to a bounded timeout) before returning.
    pub async fn handle_state(&mut self, state: PowerState) -> PowerState {
        match state {
            PowerState::G3 => state,

            PowerState::S5 => {
                if self.shared.signals.read().contains(SignalMask::SLP_S4_DEASSERTED) {
                    // AP asked to move toward on.
                    return PowerState::S5S3;
                }
                state
            }

            PowerState::S3 => {
                // Lid closed holds the touchscreen in reset to cut power;
                // lid open releases it so it can wake the AP.
                let lid_open = self.board.lid_open();
                self.board.set_line(PowerLine::TouchscreenRstL, lid_open);

                if !self.shared.signals.has_all(PGOOD_S3) {
                    // Required rail went away.
                    self.force_shutdown();
                    return PowerState::S3S5;
                }
                let signals = self.shared.signals.read();
                if signals.contains(SignalMask::SLP_S3_DEASSERTED) {
                    return PowerState::S3S0;
                }
                if !signals.contains(SignalMask::SLP_S4_DEASSERTED) {
                    return PowerState::S3S5;
                }
                state
            }

            PowerState::S0 => {
                if !self.shared.signals.has_all(PGOOD_S0) {
                    // Required rail went away.
                    self.force_shutdown();
                    return PowerState::S0S3;
                }
                if !self.shared.signals.read().contains(SignalMask::SLP_S3_DEASSERTED) {
                    return PowerState::S0S3;
                }
                // Track the throttle flag; commands wake the task so a
                // change takes effect on the next pass.
                self.board
                    .set_line(PowerLine::CpuProchot, self.shared.tunables.throttle_ap());
                state
            }

            PowerState::G3S5 => {
                // The always-on well feeds the suspend wells; let it settle
                // before enabling the suspend regulator.
                Timer::after_millis(10).await;
                self.board.set_line(PowerLine::SuspVrEn, true);
                if self.wait_signals(PGOOD_ALWAYS_ON).await.is_err() {
                    self.board.set_line(PowerLine::SuspVrEn, false);
                    self.force_shutdown();
                    return PowerState::G3;
                }

                self.board.set_line(PowerLine::SocRsmrstL, true);
                // Suspend clock needs 10 ms to stabilize after RSMRST#.
                Timer::after_millis(10).await;
                PowerState::S5
            }

            PowerState::S5S3 => {
                if self.wait_signals(PGOOD_ALWAYS_ON).await.is_err() {
                    self.force_shutdown();
                    return PowerState::S5G3;
                }

                // Turn on power to RAM.
                self.board.set_line(PowerLine::Pp1350En, true);
                if self.wait_signals(PGOOD_S3).await.is_err() {
                    self.force_shutdown();
                    return PowerState::S5G3;
                }

                // Touchpad power on so it can wake the system from suspend.
                self.board.set_line(PowerLine::TouchpadEn, true);

                self.hooks.notify(ChipsetEvent::Startup);
                PowerState::S3
            }

            PowerState::S3S0 => self.handle_s3s0().await,

            PowerState::S0S3 => {
                // Hooks run before any rail drops.
                self.hooks.notify(ChipsetEvent::Suspend);

                self.board.set_line(PowerLine::SocSysPwrok, false);
                self.board.set_line(PowerLine::SocCorePwrok, false);
                Timer::after_micros(1).await;
                self.board.set_line(PowerLine::VcoreEn, false);

                self.board.set_wireless(WirelessState::Suspend);
                self.board.allow_deep_sleep(true);

                // PROCHOT is meaningless with the core supplies down.
                self.board.set_line(PowerLine::CpuProchot, false);

                Timer::after_millis(7).await;
                self.board.set_line(PowerLine::Pp3300DxEn, false);

                // Leave 5 V up if USB ports keep sourcing power in S3.
                if !(self.shared.tunables.usb_power_in_s3() && self.board.usb_ports_powered()) {
                    self.board.set_line(PowerLine::Pp5000En, false);
                }
                PowerState::S3
            }

            PowerState::S3S5 => {
                self.hooks.notify(ChipsetEvent::Shutdown);

                // 5 V may still be up if it was left on for USB in S3.
                self.board.set_line(PowerLine::Pp5000En, false);
                self.board.set_wireless(WirelessState::Off);
                self.board.set_line(PowerLine::TouchpadEn, false);
                self.board.set_line(PowerLine::TouchscreenRstL, false);
                self.board.set_line(PowerLine::Pp1350En, false);

                if self.restart_from_s5 {
                    info!("power restart from S5");
                    self.restart_from_s5 = false;

                    // Let the rails discharge before powering back up, then
                    // restart via a synthesized power-button press.
                    Timer::after_millis(100).await;
                    self.board.power_button_pulse();

                    // Re-enter from scratch; this also undoes the earlier
                    // forced shutdown.
                    return PowerState::G3S5;
                }

                if self.shared.tunables.pause_in_s5() {
                    PowerState::S5
                } else {
                    PowerState::S5G3
                }
            }

            PowerState::S5G3 => {
                self.board.set_line(PowerLine::SocRsmrstL, false);
                self.board.set_line(PowerLine::SuspVrEn, false);
                PowerState::G3
            }
        }
    }

    async fn handle_s3s0(&mut self) -> PowerState {
        // Stagger the two non-core enables to limit inrush.
        self.board.set_line(PowerLine::Pp5000En, true);
        Timer::after_millis(3).await;
        self.board.set_line(PowerLine::Pp3300DxEn, true);

        self.board.set_wireless(WirelessState::On);

        // Touchscreen out of reset even if the lid is closed; it may have
        // been held in reset while suspended.
        self.board.set_line(PowerLine::TouchscreenRstL, true);

        if self.wait_signals(PGOOD_S0_RAILS).await.is_err() {
            // Roll the edge back: drop what we brought up and return to S3,
            // where the steady-state check decides what happens next.
            self.force_shutdown();
            self.board.set_wireless(WirelessState::Off);
            self.board.set_line(PowerLine::Pp3300DxEn, false);
            self.board.set_line(PowerLine::Pp5000En, false);
            self.board.set_line(PowerLine::TouchscreenRstL, false);
            return PowerState::S3;
        }

        // Enable the core rail; the AP requests its supplies itself once
        // this is on.
        self.board.set_line(PowerLine::VcoreEn, true);

        self.hooks.notify(ChipsetEvent::Resume);

        // Keep the idle loop out of deep sleep while the AP runs.
        self.board.allow_deep_sleep(false);

        // 15 ms after all voltages good before signalling power OK.
        Timer::after_millis(15).await;

        self.board
            .set_line(PowerLine::CpuProchot, self.shared.tunables.throttle_ap());

        self.board.set_line(PowerLine::SocSysPwrok, true);
        self.board.set_line(PowerLine::SocCorePwrok, true);

        // Platform reset must deassert within 50 ms of power OK.
        let mut deasserted = false;
        for _ in 0..PLATFORM_RESET_POLL_COUNT {
            Timer::after_millis(1).await;
            if !self.board.platform_reset_asserted() {
                deasserted = true;
                break;
            }
        }

        if deasserted && !self.shared.tunables.take_fake_platform_reset_timeout() {
            debug!("power platform reset deasserted");
        } else {
            // The AP wedged coming out of reset. Release the synthesized
            // power button, force off, and arrange for a full restart once
            // the down edges have run.
            warn!("power platform reset timeout");
            self.board.power_button_release();
            self.force_shutdown();
            self.restart_from_s5 = true;
        }

        PowerState::S0
    }

    /// Steady-state blocking: wait for something worth re-evaluating.
    async fn common_state(&mut self) -> PowerState {
        match self.state {
            PowerState::G3 => {
                if self.shared.take_g3_exit() {
                    return PowerState::G3S5;
                }
                self.shared.wait_wake().await;
                self.state
            }
            PowerState::S5 => {
                if with_timeout(S5_INACTIVITY_TIMEOUT, self.shared.wait_wake())
                    .await
                    .is_err()
                {
                    // Nothing happened; drop to G3. Wake was not requested,
                    // so make sure a stale exit flag does not bounce us.
                    self.shared.clear_g3_exit();
                    return PowerState::S5G3;
                }
                self.state
            }
            PowerState::S3 | PowerState::S0 => {
                self.shared.wait_wake().await;
                self.state
            }
            // Transitional states always resolve in handle_state.
            _ => self.state,
        }
    }

    async fn wait_signals(&self, want: SignalMask) -> Result<(), SignalTimeout> {
        self.shared.signals.wait_for(want, DEFAULT_SIGNAL_TIMEOUT).await
    }

    fn drive_g3_defaults(&mut self) {
        self.board.set_line(PowerLine::SocCorePwrok, false);
        self.board.set_line(PowerLine::VcoreEn, false);
        self.board.set_line(PowerLine::SuspVrEn, false);
        self.board.set_line(PowerLine::Pp1350En, false);
        self.board.set_line(PowerLine::Pp3300DxEn, false);
        self.board.set_line(PowerLine::Pp5000En, false);
        self.board.set_line(PowerLine::SocRsmrstL, false);
        self.board.set_line(PowerLine::SocSysPwrok, false);
        self.board.set_wireless(WirelessState::Off);
    }

    fn set_state(&mut self, state: PowerState) {
        self.state = state;
        self.shared.publish_state(state);
    }
}
