use defmt::{debug, info};
use embassy_executor::task;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel;
use embassy_time::{Duration, Timer};
use power_seq::ChipsetState;

use crate::POWER;
use crate::config::{BUTTON_DEBOUNCE_MS, POWER_BUTTON_PULSE_MS};
use crate::config_resources::{PowerButtonInputResources, PowerButtonOutputResources};

/// Events for the synthesized power-button line toward the AP. `Pulse` is a
/// full press-and-release, used by the recovery path in the state machine.
pub enum PowerButtonEvents {
    Press,
    Release,
    Pulse,
}

pub type PowerButtonChannelType = channel::Channel<CriticalSectionRawMutex, PowerButtonEvents, 8>;
pub static POWER_BUTTON_EVENT_CHANNEL: PowerButtonChannelType = channel::Channel::new();

#[task]
pub async fn power_button_input_task(r: PowerButtonInputResources) {
    info!("Starting power button input task");

    let mut button = Input::new(r.pin, Pull::Up);

    info!("Power button input task initialized");

    loop {
        button.wait_for_any_edge().await;
        // Debounce, then act on the settled level.
        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;
        let pressed = button.is_low();
        debug!("power button pressed={}", pressed);
        if pressed {
            if POWER.in_state(ChipsetState::ANY_OFF) {
                POWER.exit_hard_off();
            }
            POWER_BUTTON_EVENT_CHANNEL.send(PowerButtonEvents::Press).await;
        } else {
            POWER_BUTTON_EVENT_CHANNEL.send(PowerButtonEvents::Release).await;
        }
        POWER.wake();
    }
}

#[task]
pub async fn power_button_output_task(r: PowerButtonOutputResources) {
    info!("Starting power button output task");

    // Active low toward the AP.
    let mut button = Output::new(r.pin, Level::High);
    let receiver = POWER_BUTTON_EVENT_CHANNEL.receiver();

    info!("Power button output task initialized");

    loop {
        match receiver.receive().await {
            PowerButtonEvents::Press => button.set_low(),
            PowerButtonEvents::Release => button.set_high(),
            PowerButtonEvents::Pulse => {
                // Make sure the line is released before the press.
                button.set_high();
                Timer::after(Duration::from_millis(100)).await;
                button.set_low();
                Timer::after(Duration::from_millis(POWER_BUTTON_PULSE_MS)).await;
                button.set_high();
            }
        }
    }
}
