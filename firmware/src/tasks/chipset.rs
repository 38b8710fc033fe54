use defmt::info;
use embassy_executor::task;
use power_seq::{ChipsetEvent, HookRegistry, PowerController};

use crate::POWER;
use crate::board::Board;
use crate::config_resources::PowerPlaneResources;
use crate::tasks::status_led::{LED_PATTERN_CHANNEL, LedPattern};

// Chipset events drive the status LED. Bounded: a full queue drops the
// pattern change rather than stalling the state machine.
fn status_led_hook(event: ChipsetEvent) {
    let pattern = match event {
        ChipsetEvent::Startup | ChipsetEvent::Suspend => LedPattern::SlowBlink,
        ChipsetEvent::Resume => LedPattern::On,
        ChipsetEvent::Shutdown => LedPattern::Off,
    };
    let _ = LED_PATTERN_CHANNEL.try_send(pattern);
}

#[task]
pub async fn chipset_task(r: PowerPlaneResources, warm_restart: bool) {
    info!("Starting chipset task");

    let board = Board::new(r);

    // The hook set is fixed at init; registrations cannot fail unless the
    // table is outgrown at build time.
    let mut hooks = HookRegistry::new();
    hooks.register(ChipsetEvent::Startup, status_led_hook).unwrap();
    hooks.register(ChipsetEvent::Resume, status_led_hook).unwrap();
    hooks.register(ChipsetEvent::Suspend, status_led_hook).unwrap();
    hooks.register(ChipsetEvent::Shutdown, status_led_hook).unwrap();

    let mut controller = PowerController::new(board, &POWER, hooks);
    controller.init(warm_restart);

    info!("Chipset task initialized");

    controller.run().await
}
