use defmt::info;
use embassy_executor::task;
use embassy_rp::gpio::{Input, Pull};
use embassy_time::{Duration, Timer};
use portable_atomic::{AtomicBool, Ordering};

use crate::POWER;
use crate::config::LID_DEBOUNCE_MS;
use crate::config_resources::LidInputResources;

/// Debounced lid switch state; read by the chipset task's S3 touchscreen
/// policy.
pub static LID_OPEN: AtomicBool = AtomicBool::new(true);

#[task]
pub async fn lid_task(r: LidInputResources) {
    info!("Starting lid switch task");

    let mut lid = Input::new(r.pin, Pull::Up);
    LID_OPEN.store(lid.is_high(), Ordering::Relaxed);

    info!("Lid switch task initialized");

    loop {
        lid.wait_for_any_edge().await;
        Timer::after(Duration::from_millis(LID_DEBOUNCE_MS)).await;
        let open = lid.is_high();
        if open != LID_OPEN.swap(open, Ordering::Relaxed) {
            info!("lid {}", if open { "open" } else { "closed" });
            // State doesn't change here; the chipset task re-evaluates its
            // lid-dependent actuation on wake.
            POWER.wake();
        }
    }
}
