//! Host-side tests of the power state machine against a scripted board.
//!
//! The mock board records every actuation. In "auto" mode it also behaves
//! like a healthy board: power goods track their rail enables, the sleep
//! request lines follow the AP's scripted wishes while RSMRST# is released,
//! and platform reset deasserts once system power OK rises.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use embassy_futures::block_on;
use embassy_time::{Duration, Instant};
use power_seq::{
    ALL_S0, ChipsetEvent, HookRegistry, PowerBoard, PowerController, PowerLine, PowerShared,
    PowerState, SignalMask, WirelessState,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Action {
    Line(PowerLine, bool),
    Wireless(WirelessState),
    ButtonRelease,
    ButtonPulse,
    DeepSleep(bool),
}

struct Model {
    levels: HashMap<PowerLine, bool>,
    actions: Vec<Action>,
    auto: bool,
    /// What the AP requests while RSMRST# is released.
    slp_s3_released: bool,
    slp_s4_released: bool,
    platform_reset_follows_pwrok: bool,
    platform_reset_asserted: bool,
    lid_open: bool,
    usb_powered: bool,
    deep_sleep_allowed: bool,
}

impl Model {
    fn new() -> Self {
        let mut levels = HashMap::new();
        levels.insert(PowerLine::SocRcinL, true);
        Self {
            levels,
            actions: Vec::new(),
            auto: false,
            slp_s3_released: false,
            slp_s4_released: false,
            platform_reset_follows_pwrok: true,
            platform_reset_asserted: true,
            lid_open: true,
            usb_powered: false,
            deep_sleep_allowed: true,
        }
    }

    fn level(&self, line: PowerLine) -> bool {
        *self.levels.get(&line).unwrap_or(&false)
    }

    /// Signal mask a healthy board would report for the current levels.
    fn mask(&self) -> SignalMask {
        let mut mask = SignalMask::empty();
        if self.level(PowerLine::SuspVrEn) {
            mask |= SignalMask::PGOOD_S5 | SignalMask::PGOOD_PP1050;
        }
        if self.level(PowerLine::Pp5000En) {
            mask |= SignalMask::PGOOD_PP5000;
        }
        if self.level(PowerLine::VcoreEn) {
            mask |= SignalMask::PGOOD_VCORE;
        }
        // The AP only drives its sleep lines while out of resume reset.
        let ap_alive = self.level(PowerLine::SocRsmrstL);
        if ap_alive && self.slp_s3_released {
            mask |= SignalMask::SLP_S3_DEASSERTED;
        }
        if ap_alive && self.slp_s4_released {
            mask |= SignalMask::SLP_S4_DEASSERTED;
        }
        mask
    }
}

#[derive(Clone)]
struct MockBoard {
    model: Arc<Mutex<Model>>,
    shared: &'static PowerShared,
}

impl PowerBoard for MockBoard {
    fn set_line(&mut self, line: PowerLine, level: bool) {
        let mut model = self.model.lock().unwrap();
        model.actions.push(Action::Line(line, level));
        model.levels.insert(line, level);
        if model.auto {
            match line {
                PowerLine::SocSysPwrok if level && model.platform_reset_follows_pwrok => {
                    model.platform_reset_asserted = false;
                }
                PowerLine::SocRsmrstL if !level => {
                    model.platform_reset_asserted = true;
                }
                _ => {}
            }
            let mask = model.mask();
            self.shared.update_signals(mask);
        }
    }

    fn line(&self, line: PowerLine) -> bool {
        self.model.lock().unwrap().level(line)
    }

    fn platform_reset_asserted(&self) -> bool {
        self.model.lock().unwrap().platform_reset_asserted
    }

    fn set_wireless(&mut self, state: WirelessState) {
        self.model.lock().unwrap().actions.push(Action::Wireless(state));
    }

    fn power_button_release(&mut self) {
        self.model.lock().unwrap().actions.push(Action::ButtonRelease);
    }

    fn power_button_pulse(&mut self) {
        self.model.lock().unwrap().actions.push(Action::ButtonPulse);
    }

    fn usb_ports_powered(&self) -> bool {
        self.model.lock().unwrap().usb_powered
    }

    fn lid_open(&self) -> bool {
        self.model.lock().unwrap().lid_open
    }

    fn allow_deep_sleep(&mut self, allow: bool) {
        let mut model = self.model.lock().unwrap();
        model.deep_sleep_allowed = allow;
        model.actions.push(Action::DeepSleep(allow));
    }
}

struct Rig {
    shared: &'static PowerShared,
    model: Arc<Mutex<Model>>,
    ctl: PowerController<'static, MockBoard>,
}

fn rig_with_hooks(auto: bool, hooks: HookRegistry) -> Rig {
    let shared: &'static PowerShared = Box::leak(Box::new(PowerShared::new()));
    let model = Arc::new(Mutex::new(Model::new()));
    model.lock().unwrap().auto = auto;
    let board = MockBoard {
        model: model.clone(),
        shared,
    };
    let ctl = PowerController::new(board, shared, hooks);
    Rig { shared, model, ctl }
}

fn rig(auto: bool) -> Rig {
    rig_with_hooks(auto, HookRegistry::new())
}

impl Rig {
    fn actions(&self) -> Vec<Action> {
        self.model.lock().unwrap().actions.clone()
    }

    fn clear_actions(&self) {
        self.model.lock().unwrap().actions.clear();
    }

    /// Step until the controller settles on `target`. Panics rather than
    /// blocking forever if the path never gets there.
    fn step_until(&mut self, target: PowerState, max_steps: usize) {
        for _ in 0..max_steps {
            if block_on(self.ctl.step()) == target {
                return;
            }
        }
        panic!(
            "never reached {:?}, stuck at {:?}",
            target,
            self.ctl.state()
        );
    }
}

#[test]
fn handle_state_terminates_for_all_states_and_masks() {
    for raw in 0..=9u8 {
        let state = PowerState::from_raw(raw).unwrap();
        for mask in [SignalMask::empty(), ALL_S0] {
            let mut rig = rig(false);
            rig.shared.update_signals(mask);
            let next = block_on(rig.ctl.handle_state(state));
            // Typed return plus actual completion is the property; spot
            // check that the raw value stays in range too.
            assert!(PowerState::from_raw(next.raw()).is_some());
        }
    }
}

#[test]
fn g3_is_idle_and_idempotent() {
    let mut rig = rig(false);
    for _ in 0..5 {
        assert_eq!(block_on(rig.ctl.handle_state(PowerState::G3)), PowerState::G3);
    }
    assert!(rig.actions().is_empty(), "G3 must not actuate anything");
}

#[test]
fn s0_rail_fault_forces_shutdown_then_suspend_edge() {
    let mut rig = rig(false);
    rig.shared.update_signals(ALL_S0 - SignalMask::PGOOD_VCORE);
    let next = block_on(rig.ctl.handle_state(PowerState::S0));
    assert_eq!(next, PowerState::S0S3);
    // The forced shutdown happened before the state changed hands.
    let actions = rig.actions();
    assert_eq!(
        actions,
        vec![
            Action::Line(PowerLine::SocSysPwrok, false),
            Action::Line(PowerLine::SocRsmrstL, false),
        ]
    );
}

#[test]
fn s3_rail_fault_forces_shutdown_then_off_edge() {
    let mut rig = rig(false);
    rig.shared
        .update_signals(SignalMask::SLP_S3_DEASSERTED | SignalMask::SLP_S4_DEASSERTED);
    let next = block_on(rig.ctl.handle_state(PowerState::S3));
    assert_eq!(next, PowerState::S3S5);
    assert!(rig.actions().contains(&Action::Line(PowerLine::SocSysPwrok, false)));
    assert!(rig.actions().contains(&Action::Line(PowerLine::SocRsmrstL, false)));
}

#[test]
fn init_adopts_s0_after_warm_restart_with_ap_running() {
    static EVENTS: Mutex<Vec<ChipsetEvent>> = Mutex::new(Vec::new());
    fn record(event: ChipsetEvent) {
        EVENTS.lock().unwrap().push(event);
    }

    let mut hooks = HookRegistry::new();
    hooks.register(ChipsetEvent::Startup, record).unwrap();
    hooks.register(ChipsetEvent::Resume, record).unwrap();

    let mut rig = rig_with_hooks(false, hooks);
    rig.shared.update_signals(ALL_S0);
    rig.ctl.init(true);

    assert_eq!(rig.ctl.state(), PowerState::S0);
    assert_eq!(rig.shared.power_state(), PowerState::S0);
    assert!(EVENTS.lock().unwrap().is_empty(), "no hooks on adoption");
    assert!(!rig.model.lock().unwrap().deep_sleep_allowed);
    // Only the deep-sleep permission was touched, no rails.
    assert_eq!(rig.actions(), vec![Action::DeepSleep(false)]);
}

#[test]
fn init_forces_g3_defaults_after_warm_restart_with_ap_down() {
    let mut rig = rig(false);
    rig.shared.update_signals(SignalMask::PGOOD_S5);
    rig.ctl.init(true);

    assert_eq!(rig.ctl.state(), PowerState::G3);
    let actions = rig.actions();
    assert!(actions.contains(&Action::Line(PowerLine::SuspVrEn, false)));
    assert!(actions.contains(&Action::Line(PowerLine::SocRsmrstL, false)));
    assert!(actions.contains(&Action::Wireless(WirelessState::Off)));
}

#[test]
fn init_cold_start_begins_in_g3_untouched() {
    let mut rig = rig(false);
    rig.ctl.init(false);
    assert_eq!(rig.ctl.state(), PowerState::G3);
    assert!(rig.actions().is_empty());
}

#[test]
fn bringup_reaches_s0_with_one_startup_then_one_resume() {
    static EVENTS: Mutex<Vec<ChipsetEvent>> = Mutex::new(Vec::new());
    fn record(event: ChipsetEvent) {
        EVENTS.lock().unwrap().push(event);
    }

    let mut hooks = HookRegistry::new();
    hooks.register(ChipsetEvent::Startup, record).unwrap();
    hooks.register(ChipsetEvent::Resume, record).unwrap();

    let mut rig = rig_with_hooks(true, hooks);
    {
        let mut model = rig.model.lock().unwrap();
        model.slp_s3_released = true;
        model.slp_s4_released = true;
    }
    rig.ctl.init(false);
    rig.shared.exit_hard_off();

    rig.step_until(PowerState::S0, 10);

    assert_eq!(*EVENTS.lock().unwrap(), vec![ChipsetEvent::Startup, ChipsetEvent::Resume]);
    // Power OK handshake completed.
    let model = rig.model.lock().unwrap();
    assert!(model.level(PowerLine::SocSysPwrok));
    assert!(model.level(PowerLine::SocCorePwrok));
    assert!(!model.platform_reset_asserted);
    assert!(!model.deep_sleep_allowed);
}

#[test]
fn platform_reset_timeout_recovers_through_g3s5() {
    let mut rig = rig(true);
    {
        let mut model = rig.model.lock().unwrap();
        model.slp_s3_released = true;
        model.slp_s4_released = true;
        // AP never comes out of platform reset.
        model.platform_reset_follows_pwrok = false;
    }
    rig.ctl.init(false);
    rig.shared.exit_hard_off();

    // The failed resume lands in S0 with the restart flag armed.
    rig.step_until(PowerState::S0, 10);
    assert!(rig.ctl.restart_pending());
    let actions = rig.actions();
    assert!(actions.contains(&Action::ButtonRelease));
    let shutdown_at = actions
        .iter()
        .position(|a| *a == Action::Line(PowerLine::SocRsmrstL, false))
        .expect("forced shutdown must run");
    let release_at = actions.iter().position(|a| *a == Action::ButtonRelease).unwrap();
    assert!(release_at < shutdown_at);

    // The forced shutdown unwinds S0 -> S3, and the S3->S5 edge notices the
    // flag: one synthesized button pulse, then re-entry from scratch.
    rig.clear_actions();
    rig.step_until(PowerState::G3S5, 10);
    assert!(!rig.ctl.restart_pending());
    let pulses = rig
        .actions()
        .iter()
        .filter(|a| **a == Action::ButtonPulse)
        .count();
    assert_eq!(pulses, 1);
}

#[test]
fn injected_fault_trips_next_resume_only() {
    let mut rig = rig(true);
    {
        let mut model = rig.model.lock().unwrap();
        model.slp_s3_released = true;
        model.slp_s4_released = true;
    }
    rig.ctl.init(false);
    rig.shared.tunables.inject_fault_next_resume();
    rig.shared.exit_hard_off();

    rig.step_until(PowerState::S0, 10);
    assert!(rig.ctl.restart_pending());
    assert!(!rig.shared.tunables.fault_next_resume_armed(), "injection is one-shot");

    // Recovery replays the whole bring-up and the second resume sticks.
    rig.step_until(PowerState::G3S5, 10);
    rig.step_until(PowerState::S0, 10);
    assert!(!rig.ctl.restart_pending());
}

#[test]
fn s3s5_pauses_in_s5_or_drops_to_g3() {
    {
        let mut rig = rig(false);
        assert_eq!(block_on(rig.ctl.handle_state(PowerState::S3S5)), PowerState::S5);
    }

    let mut rig = rig(false);
    rig.shared.tunables.set_pause_in_s5(false);
    assert_eq!(block_on(rig.ctl.handle_state(PowerState::S3S5)), PowerState::S5G3);
}

#[test]
fn s0s3_keeps_5v_rail_for_powered_usb_ports() {
    {
        let mut rig = rig(false);
        rig.shared.tunables.set_usb_power_in_s3(true);
        rig.model.lock().unwrap().usb_powered = true;
        assert_eq!(block_on(rig.ctl.handle_state(PowerState::S0S3)), PowerState::S3);
        assert!(!rig.actions().contains(&Action::Line(PowerLine::Pp5000En, false)));
    }

    // Policy off: the rail drops with everything else.
    let mut rig = rig(false);
    rig.model.lock().unwrap().usb_powered = true;
    assert_eq!(block_on(rig.ctl.handle_state(PowerState::S0S3)), PowerState::S3);
    assert!(rig.actions().contains(&Action::Line(PowerLine::Pp5000En, false)));
}

#[test]
fn suspend_then_shutdown_hooks_fire_in_order() {
    static EVENTS: Mutex<Vec<ChipsetEvent>> = Mutex::new(Vec::new());
    fn record(event: ChipsetEvent) {
        EVENTS.lock().unwrap().push(event);
    }

    let mut hooks = HookRegistry::new();
    hooks.register(ChipsetEvent::Suspend, record).unwrap();
    hooks.register(ChipsetEvent::Shutdown, record).unwrap();

    let mut rig = rig_with_hooks(false, hooks);
    assert_eq!(block_on(rig.ctl.handle_state(PowerState::S0S3)), PowerState::S3);
    assert_eq!(block_on(rig.ctl.handle_state(PowerState::S3S5)), PowerState::S5);

    assert_eq!(
        *EVENTS.lock().unwrap(),
        vec![ChipsetEvent::Suspend, ChipsetEvent::Shutdown]
    );
}

#[test]
fn lid_state_gates_touchscreen_reset_in_s3() {
    let mut rig = rig(false);
    rig.shared.update_signals(SignalMask::PGOOD_S5 | SignalMask::SLP_S4_DEASSERTED);
    rig.model.lock().unwrap().lid_open = false;
    assert_eq!(block_on(rig.ctl.handle_state(PowerState::S3)), PowerState::S3);
    assert_eq!(rig.actions(), vec![Action::Line(PowerLine::TouchscreenRstL, false)]);

    rig.clear_actions();
    rig.model.lock().unwrap().lid_open = true;
    block_on(rig.ctl.handle_state(PowerState::S3));
    assert_eq!(rig.actions(), vec![Action::Line(PowerLine::TouchscreenRstL, true)]);
}

#[test]
fn cold_reset_is_noop_with_power_ok_low() {
    let mut rig = rig(false);
    block_on(rig.ctl.reset(true));
    assert!(rig.actions().is_empty());

    rig.model
        .lock()
        .unwrap()
        .levels
        .insert(PowerLine::SocSysPwrok, true);
    block_on(rig.ctl.reset(true));
    assert_eq!(
        rig.actions(),
        vec![
            Action::Line(PowerLine::SocSysPwrok, false),
            Action::Line(PowerLine::SocSysPwrok, true),
        ]
    );
}

#[test]
fn warm_reset_pulses_reset_input() {
    let mut rig = rig(false);
    block_on(rig.ctl.reset(false));
    assert_eq!(
        rig.actions(),
        vec![
            Action::Line(PowerLine::SocRcinL, false),
            Action::Line(PowerLine::SocRcinL, true),
        ]
    );
}

#[test]
fn emergency_shutdown_is_serviced_before_evaluation() {
    let mut rig = rig(false);
    rig.shared.update_signals(ALL_S0);
    rig.ctl.init(true);
    assert_eq!(rig.ctl.state(), PowerState::S0);
    rig.clear_actions();

    rig.shared.request_shutdown();
    // The wake from the request keeps the steady-state wait from blocking.
    block_on(rig.ctl.step());
    let actions = rig.actions();
    assert_eq!(actions[0], Action::Line(PowerLine::SocSysPwrok, false));
    assert_eq!(actions[1], Action::Line(PowerLine::SocRsmrstL, false));
}

#[test]
fn wait_for_times_out_at_or_after_deadline() {
    let shared = PowerShared::new();
    block_on(async {
        let started = Instant::now();
        let err = shared
            .signals
            .wait_for(SignalMask::PGOOD_VCORE, Duration::from_millis(200))
            .await
            .unwrap_err();
        let elapsed = Instant::now() - started;
        assert!(elapsed >= Duration::from_millis(200), "returned early: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(1200), "overslept: {elapsed:?}");
        assert_eq!(err.want, SignalMask::PGOOD_VCORE.bits());
        assert_eq!(err.got, 0);
    });
}

#[test]
fn g3s5_timeout_steps_back_to_g3() {
    // No model response at all: the suspend regulator never reports good.
    let mut rig = rig(false);
    let next = block_on(rig.ctl.handle_state(PowerState::G3S5));
    assert_eq!(next, PowerState::G3);
    let actions = rig.actions();
    // The regulator is switched back off before the forced shutdown.
    assert_eq!(actions[0], Action::Line(PowerLine::SuspVrEn, true));
    assert_eq!(actions[1], Action::Line(PowerLine::SuspVrEn, false));
}
