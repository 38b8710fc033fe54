pub(crate) mod chipset;
pub(crate) mod console;
pub(crate) mod host_interface;
pub(crate) mod lid;
pub(crate) mod power_button;
pub(crate) mod power_signals;
pub(crate) mod status_led;
