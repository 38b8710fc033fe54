/// Rails, resets, and strap lines driven by the power sequencer. One entry
/// per controlled output; the board glue maps these onto real pins.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerLine {
    /// Suspend voltage regulator enable.
    SuspVrEn,
    /// 1.35 V RAM rail enable.
    Pp1350En,
    /// 5 V bulk rail enable.
    Pp5000En,
    /// 3.3 V device-well rail enable.
    Pp3300DxEn,
    /// AP core rail enable.
    VcoreEn,
    /// Resume reset to the AP's platform controller, active low.
    SocRsmrstL,
    /// System power OK to the AP.
    SocSysPwrok,
    /// Core power OK to the AP.
    SocCorePwrok,
    /// Warm-reset input to the AP, active low.
    SocRcinL,
    /// CPU throttle request.
    CpuProchot,
    /// Touchscreen reset, active low.
    TouchscreenRstL,
    /// Touchpad power enable.
    TouchpadEn,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WirelessState {
    On,
    Off,
    Suspend,
}

/// Board-side collaborators of the power state machine: the rail/GPIO
/// actuator plus the handful of adjacent inputs and services the transition
/// scripts consult. All operations are bounded and non-blocking; hardware
/// feedback comes back through the signal source, not through return values.
pub trait PowerBoard {
    /// Drive a line. Idempotent; driving a line to its current level is a
    /// no-op electrically.
    fn set_line(&mut self, line: PowerLine, level: bool);

    /// Read back the driven level of a line.
    fn line(&self, line: PowerLine) -> bool;

    /// Is the AP's platform reset still asserted after power-up?
    fn platform_reset_asserted(&self) -> bool;

    fn set_wireless(&mut self, state: WirelessState);

    /// Release the synthesized power button towards the AP.
    fn power_button_release(&mut self);

    /// Pulse the synthesized power button towards the AP, as if the user
    /// pressed it.
    fn power_button_pulse(&mut self);

    /// Are USB ports currently sourcing power? Consulted by the suspend
    /// script's 5 V rail policy.
    fn usb_ports_powered(&self) -> bool;

    fn lid_open(&self) -> bool;

    /// Permit or forbid the idle loop's deep sleep. Forbidden while the AP
    /// runs so wake latency stays bounded.
    fn allow_deep_sleep(&mut self, allow: bool);
}
