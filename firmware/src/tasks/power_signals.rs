use defmt::info;
use embassy_executor::task;
use embassy_rp::gpio::{Input, Pull};
use embassy_time::{Duration, Ticker};
use power_seq::SignalMask;

use crate::POWER;
use crate::config::SIGNAL_POLL_INTERVAL_MS;
use crate::config_resources::PowerSignalResources;

// Samples the power-good and sleep-request inputs on a fixed tick and
// publishes the snapshot. The tick interval is the debounce window; the
// shared side absorbs unchanged snapshots, so the chipset task only wakes
// on real edges.
#[task]
pub async fn power_signal_task(r: PowerSignalResources) {
    info!("Starting power signal task");

    // Power goods are push-pull from the regulators. The sleep lines idle
    // low (asserted) while the AP is unpowered.
    let pgood_pp5000 = Input::new(r.pgood_pp5000, Pull::None);
    let pgood_pp1050 = Input::new(r.pgood_pp1050, Pull::None);
    let pgood_s5 = Input::new(r.pgood_s5, Pull::None);
    let pgood_vcore = Input::new(r.pgood_vcore, Pull::None);
    let slp_s3_l = Input::new(r.slp_s3_l, Pull::Down);
    let slp_s4_l = Input::new(r.slp_s4_l, Pull::Down);

    let mut ticker = Ticker::every(Duration::from_millis(SIGNAL_POLL_INTERVAL_MS));

    info!("Power signal task initialized");

    loop {
        ticker.next().await;
        let mut mask = SignalMask::empty();
        mask.set(SignalMask::PGOOD_PP5000, pgood_pp5000.is_high());
        mask.set(SignalMask::PGOOD_PP1050, pgood_pp1050.is_high());
        mask.set(SignalMask::PGOOD_S5, pgood_s5.is_high());
        mask.set(SignalMask::PGOOD_VCORE, pgood_vcore.is_high());
        mask.set(SignalMask::SLP_S3_DEASSERTED, slp_s3_l.is_high());
        mask.set(SignalMask::SLP_S4_DEASSERTED, slp_s4_l.is_high());
        POWER.update_signals(mask);
    }
}
