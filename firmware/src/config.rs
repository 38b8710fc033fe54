pub const HOST_I2C_ADDR: u8 = 0x1e; // EC host-command secondary address

pub const CONSOLE_BAUD: u32 = 115_200;

// Power signal sampling interval. Doubles as the debounce window for the
// power-good and sleep lines.
pub const SIGNAL_POLL_INTERVAL_MS: u64 = 10;

pub const BUTTON_DEBOUNCE_MS: u64 = 30;
pub const LID_DEBOUNCE_MS: u64 = 30;

// Width of a synthesized power-button press toward the AP.
pub const POWER_BUTTON_PULSE_MS: u64 = 200;

pub const STATUS_LED_TICK_MS: u64 = 500;

pub const WATCHDOG_TIMEOUT_S: u64 = 8;

// [major, minor, patch, alpha]; alpha is 0xff for releases.
pub const FW_VERSION: [u8; 4] = [1, 0, 0, 0xff];
