//! Text command surface for the power sequencer.
//!
//! Transport-agnostic: the firmware feeds it complete lines from whatever
//! console it has (UART, RTT) and prints the response buffer back. Commands
//! mirror the host-command surface and operate purely on `PowerShared`.

use core::fmt::Write;

use crate::shared::PowerShared;
use crate::signals::SignalMask;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConsoleError {
    UnknownCommand,
    InvalidParam,
    /// Command not available while the system is locked.
    AccessDenied,
}

/// Parse and run one console command line, writing status into `out`.
pub fn execute(
    shared: &PowerShared,
    line: &str,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        // Blank line; nothing to do.
        return Ok(());
    };
    let arg = words.next();

    match command {
        "powerinfo" => {
            let state = shared.power_state();
            let _ = writeln!(
                out,
                "power state {} = {}, in 0x{:04x}",
                state.raw(),
                state.name(),
                shared.signals.read().bits()
            );
            Ok(())
        }

        "powerindebug" => {
            if let Some(arg) = arg {
                let mask = parse_u32(arg).ok_or(ConsoleError::InvalidParam)?;
                shared.signals.set_debug_mask(mask);
            }
            let _ = writeln!(out, "power in:   0x{:04x}", shared.signals.read().bits());
            let _ = writeln!(out, "debug mask: 0x{:04x}", shared.signals.debug_mask());
            let _ = writeln!(out, "bit meanings:");
            let current = shared.signals.read();
            for (name, flag) in SignalMask::all().iter_names() {
                let _ = writeln!(
                    out,
                    "  0x{:04x} {} {}",
                    flag.bits(),
                    current.contains(flag) as u8,
                    name
                );
            }
            Ok(())
        }

        "pause_in_s5" => {
            if let Some(arg) = arg {
                let pause = parse_bool(arg).ok_or(ConsoleError::InvalidParam)?;
                shared.tunables.set_pause_in_s5(pause);
            }
            let _ = writeln!(
                out,
                "pause_in_s5 = {}",
                if shared.tunables.pause_in_s5() { "on" } else { "off" }
            );
            Ok(())
        }

        "powerfail" => {
            if shared.tunables.is_locked() {
                return Err(ConsoleError::AccessDenied);
            }
            shared.tunables.inject_fault_next_resume();
            let _ = writeln!(out, "Faking a failure of the next power-on");
            Ok(())
        }

        "apreset" => {
            let cold = match arg {
                None | Some("warm") => false,
                Some("cold") => true,
                Some(_) => return Err(ConsoleError::InvalidParam),
            };
            shared.request_reset(cold);
            let _ = writeln!(out, "Requested {} AP reset", if cold { "cold" } else { "warm" });
            Ok(())
        }

        "apshutdown" => {
            shared.request_shutdown();
            let _ = writeln!(out, "Requested AP shutdown");
            Ok(())
        }

        _ => Err(ConsoleError::UnknownCommand),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "on" | "1" | "true" => Some(true),
        "off" | "0" | "false" => Some(false),
        _ => None,
    }
}

fn parse_u32(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix("0x") {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}
