use defmt::info;
use embassy_executor::task;
use embassy_rp::gpio::{Level, Output};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel;
use embassy_time::{Duration, Ticker};

use crate::config::STATUS_LED_TICK_MS;
use crate::config_resources::StatusLedResources;

#[derive(Clone, Copy)]
pub enum LedPattern {
    Off,
    On,
    SlowBlink,
}

pub type LedChannelType = channel::Channel<CriticalSectionRawMutex, LedPattern, 8>;
pub static LED_PATTERN_CHANNEL: LedChannelType = channel::Channel::new();

#[task]
pub async fn status_led_task(r: StatusLedResources) {
    info!("Starting status LED task");

    let mut led = Output::new(r.pin, Level::Low);
    let mut ticker = Ticker::every(Duration::from_millis(STATUS_LED_TICK_MS));
    let receiver = LED_PATTERN_CHANNEL.receiver();
    let mut pattern = LedPattern::Off;
    let mut phase = false;

    info!("Status LED task initialized");

    loop {
        ticker.next().await;
        while let Ok(new) = receiver.try_receive() {
            pattern = new;
        }
        match pattern {
            LedPattern::Off => led.set_low(),
            LedPattern::On => led.set_high(),
            LedPattern::SlowBlink => {
                phase = !phase;
                led.set_level(Level::from(phase));
            }
        }
    }
}
