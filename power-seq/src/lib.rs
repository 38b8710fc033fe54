//! Chipset power sequencing core.
//!
//! Everything hardware-independent about bringing an application processor
//! through G3/S5/S3/S0 and back: the state machine and its transition
//! scripts, the debounced signal snapshot it feeds on, the chipset event
//! fan-out, and the shared tunable/command surface. The firmware crate
//! supplies pins, tasks, and transports; host tests supply a mock board.

#![cfg_attr(not(test), no_std)]

// This mod must go first so the log macros are visible to the rest.
mod fmt;

mod board;
pub mod console;
mod controller;
mod hooks;
mod shared;
mod signals;
mod state;

pub use board::{PowerBoard, PowerLine, WirelessState};
pub use console::ConsoleError;
pub use controller::{PowerController, S5_INACTIVITY_TIMEOUT};
pub use hooks::{ChipsetEvent, HookFn, HookRegistry, MAX_HOOKS, RegistryFull};
pub use shared::{EmergencyRequest, PowerShared, Tunables};
pub use signals::{
    ALL_S0, ALL_SLP_DEASSERTED, DEFAULT_SIGNAL_TIMEOUT, PGOOD_ALL_CORE, PGOOD_ALL_NONCORE,
    PGOOD_ALWAYS_ON, PGOOD_S0, PGOOD_S0_RAILS, PGOOD_S3, PowerSignals, SignalMask, SignalTimeout,
};
pub use state::{ChipsetState, PowerState};
