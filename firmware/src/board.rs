use defmt::{debug, warn};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use portable_atomic::{AtomicBool, Ordering};
use power_seq::{PowerBoard, PowerLine, WirelessState};

use crate::config_resources::PowerPlaneResources;
use crate::tasks::lid::LID_OPEN;
use crate::tasks::power_button::{POWER_BUTTON_EVENT_CHANNEL, PowerButtonEvents};

/// Deep-sleep permission for the idle loop. The sequencer forbids it while
/// the AP runs so host wake latency stays bounded.
pub static DEEP_SLEEP_ALLOWED: AtomicBool = AtomicBool::new(true);

/// Whether the AP reports its USB ports as sourcing power; feeds the 5 V
/// rail policy on suspend.
pub static USB_PORTS_POWERED: AtomicBool = AtomicBool::new(false);

/// The power plane: every rail enable, reset, and strap the sequencer
/// drives, plus the platform reset readback. Constructed once by the
/// chipset task, which is the only writer of these pins.
pub struct Board {
    susp_vr_en: Output<'static>,
    pp1350_en: Output<'static>,
    pp5000_en: Output<'static>,
    pp3300_dx_en: Output<'static>,
    vcore_en: Output<'static>,
    soc_rsmrst_l: Output<'static>,
    soc_sys_pwrok: Output<'static>,
    soc_core_pwrok: Output<'static>,
    soc_rcin_l: Output<'static>,
    cpu_prochot: Output<'static>,
    touchscreen_rst_l: Output<'static>,
    touchpad_en: Output<'static>,
    wlan_en: Output<'static>,
    wlan_suspend_l: Output<'static>,
    plt_rst_l: Input<'static>,
}

impl Board {
    pub fn new(r: PowerPlaneResources) -> Self {
        // Initial levels are the G3 defaults: rails off, resets asserted,
        // except the warm-reset input which idles released.
        Self {
            susp_vr_en: Output::new(r.susp_vr_en, Level::Low),
            pp1350_en: Output::new(r.pp1350_en, Level::Low),
            pp5000_en: Output::new(r.pp5000_en, Level::Low),
            pp3300_dx_en: Output::new(r.pp3300_dx_en, Level::Low),
            vcore_en: Output::new(r.vcore_en, Level::Low),
            soc_rsmrst_l: Output::new(r.soc_rsmrst_l, Level::Low),
            soc_sys_pwrok: Output::new(r.soc_sys_pwrok, Level::Low),
            soc_core_pwrok: Output::new(r.soc_core_pwrok, Level::Low),
            soc_rcin_l: Output::new(r.soc_rcin_l, Level::High),
            cpu_prochot: Output::new(r.cpu_prochot, Level::Low),
            touchscreen_rst_l: Output::new(r.touchscreen_rst_l, Level::Low),
            touchpad_en: Output::new(r.touchpad_en, Level::Low),
            wlan_en: Output::new(r.wlan_en, Level::Low),
            wlan_suspend_l: Output::new(r.wlan_suspend_l, Level::High),
            plt_rst_l: Input::new(r.plt_rst_l, Pull::Up),
        }
    }

    fn output(&mut self, line: PowerLine) -> &mut Output<'static> {
        match line {
            PowerLine::SuspVrEn => &mut self.susp_vr_en,
            PowerLine::Pp1350En => &mut self.pp1350_en,
            PowerLine::Pp5000En => &mut self.pp5000_en,
            PowerLine::Pp3300DxEn => &mut self.pp3300_dx_en,
            PowerLine::VcoreEn => &mut self.vcore_en,
            PowerLine::SocRsmrstL => &mut self.soc_rsmrst_l,
            PowerLine::SocSysPwrok => &mut self.soc_sys_pwrok,
            PowerLine::SocCorePwrok => &mut self.soc_core_pwrok,
            PowerLine::SocRcinL => &mut self.soc_rcin_l,
            PowerLine::CpuProchot => &mut self.cpu_prochot,
            PowerLine::TouchscreenRstL => &mut self.touchscreen_rst_l,
            PowerLine::TouchpadEn => &mut self.touchpad_en,
        }
    }
}

impl PowerBoard for Board {
    fn set_line(&mut self, line: PowerLine, level: bool) {
        self.output(line).set_level(Level::from(level));
    }

    fn line(&self, line: PowerLine) -> bool {
        let output = match line {
            PowerLine::SuspVrEn => &self.susp_vr_en,
            PowerLine::Pp1350En => &self.pp1350_en,
            PowerLine::Pp5000En => &self.pp5000_en,
            PowerLine::Pp3300DxEn => &self.pp3300_dx_en,
            PowerLine::VcoreEn => &self.vcore_en,
            PowerLine::SocRsmrstL => &self.soc_rsmrst_l,
            PowerLine::SocSysPwrok => &self.soc_sys_pwrok,
            PowerLine::SocCorePwrok => &self.soc_core_pwrok,
            PowerLine::SocRcinL => &self.soc_rcin_l,
            PowerLine::CpuProchot => &self.cpu_prochot,
            PowerLine::TouchscreenRstL => &self.touchscreen_rst_l,
            PowerLine::TouchpadEn => &self.touchpad_en,
        };
        output.is_set_high()
    }

    fn platform_reset_asserted(&self) -> bool {
        self.plt_rst_l.is_low()
    }

    fn set_wireless(&mut self, state: WirelessState) {
        debug!("wireless {:?}", state);
        match state {
            WirelessState::On => {
                self.wlan_en.set_high();
                self.wlan_suspend_l.set_high();
            }
            WirelessState::Suspend => {
                self.wlan_suspend_l.set_low();
            }
            WirelessState::Off => {
                self.wlan_en.set_low();
                self.wlan_suspend_l.set_high();
            }
        }
    }

    fn power_button_release(&mut self) {
        if POWER_BUTTON_EVENT_CHANNEL.try_send(PowerButtonEvents::Release).is_err() {
            warn!("power button queue full");
        }
    }

    fn power_button_pulse(&mut self) {
        if POWER_BUTTON_EVENT_CHANNEL.try_send(PowerButtonEvents::Pulse).is_err() {
            warn!("power button queue full");
        }
    }

    fn usb_ports_powered(&self) -> bool {
        USB_PORTS_POWERED.load(Ordering::Relaxed)
    }

    fn lid_open(&self) -> bool {
        LID_OPEN.load(Ordering::Relaxed)
    }

    fn allow_deep_sleep(&mut self, allow: bool) {
        DEEP_SLEEP_ALLOWED.store(allow, Ordering::Relaxed);
    }
}
