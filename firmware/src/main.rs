#![no_std]
#![no_main]

use defmt::{debug, info};
use embassy_executor::Spawner;
use embassy_rp::watchdog::Watchdog;
use embassy_time::{Duration, Timer};
use portable_atomic::Ordering;
use power_seq::PowerShared;
use {defmt_rtt as _, panic_probe as _};

mod board;
mod config;
mod config_resources;
mod tasks;
mod warm_boot;

use crate::config_resources::{
    AssignedResources, ConsoleResources, HostI2cResources, LidInputResources,
    PowerButtonInputResources, PowerButtonOutputResources, PowerPlaneResources,
    PowerSignalResources, StatusLedResources,
};

/// Cross-task surface of the power controller: live signal snapshot, wake
/// channel, tunables, and the published power state.
pub static POWER: PowerShared = PowerShared::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    let r = split_resources!(p);

    info!("Starting up...");

    // Must run before the chipset task spawns; it decides whether the boot
    // classification may adopt a running AP.
    let warm_restart = warm_boot::detect_warm_restart();
    if warm_restart {
        info!("Warm restart detected");
    }

    let mut watchdog = Watchdog::new(p.WATCHDOG);
    watchdog.start(Duration::from_secs(config::WATCHDOG_TIMEOUT_S));

    spawner
        .spawn(tasks::power_signals::power_signal_task(r.power_signals))
        .unwrap();

    spawner
        .spawn(tasks::power_button::power_button_input_task(
            r.power_button_input,
        ))
        .unwrap();

    spawner
        .spawn(tasks::power_button::power_button_output_task(
            r.power_button_output,
        ))
        .unwrap();

    spawner.spawn(tasks::lid::lid_task(r.lid)).unwrap();

    spawner
        .spawn(tasks::status_led::status_led_task(r.status_led))
        .unwrap();

    spawner
        .spawn(tasks::host_interface::host_interface_task(r.host_i2c))
        .unwrap();

    spawner
        .spawn(tasks::console::console_task(r.console))
        .unwrap();

    spawner
        .spawn(tasks::chipset::chipset_task(r.power_plane, warm_restart))
        .unwrap();

    loop {
        Timer::after(Duration::from_secs(1)).await;

        watchdog.feed();

        debug!(
            "state: {} | signals: 0x{:04x} | deep sleep ok: {}",
            POWER.power_state().name(),
            POWER.signals.read().bits(),
            board::DEEP_SLEEP_ALLOWED.load(Ordering::Relaxed)
        );
    }
}
