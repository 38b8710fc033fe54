use defmt::{debug, error, info};
use embassy_executor::task;
use embassy_rp::peripherals::I2C1;
use embassy_rp::{bind_interrupts, i2c, i2c_slave};
use portable_atomic::Ordering;

use crate::POWER;
use crate::board::USB_PORTS_POWERED;
use crate::config::{FW_VERSION, HOST_I2C_ADDR};
use crate::config_resources::HostI2cResources;

// Commands supported on the host command interface:
// - Read 0x01: Query firmware version (4 bytes)
// - Read 0x10: Query power state (raw state machine value)
// - Read 0x11: Query power signal mask (4 bytes, big endian)
// - Read 0x12: Query pause-in-S5 tunable
// - Write 0x12 [00|01]: Set pause-in-S5 tunable
// - Write 0x13 [ANY]: Arm a fake platform-reset timeout for the next
//   power-on (rejected while the system is locked)
// - Read 0x14: Query AP throttle state
// - Write 0x14 [00|01]: Set AP throttle
// - Read 0x15: Query USB-power-in-S3 policy
// - Write 0x15 [00|01]: Set USB-power-in-S3 policy
// - Read 0x16: Query system lock
// - Write 0x16 [00|01]: Set system lock
// - Write 0x17 [00|01]: Report whether USB ports are sourcing power
// - Write 0x30 [ANY]: Force AP shutdown
// - Write 0x31 [00|01]: AP reset (00 = warm, 01 = cold)
// - Write 0x32 [ANY]: Power on (leave G3)

bind_interrupts!(struct Irqs {
    I2C1_IRQ => i2c::InterruptHandler<I2C1>;
});

async fn respond(device: &mut i2c_slave::I2cSlave<'_, I2C1>, data: &[u8]) {
    if let Err(e) = device.respond_and_fill(data, 0x00).await {
        error!("error while responding {}", e)
    }
}

fn flag_arg(buf: &[u8], len: usize) -> Option<bool> {
    if len < 2 {
        error!("host command missing argument");
        return None;
    }
    Some(buf[1] != 0)
}

#[task]
pub async fn host_interface_task(r: HostI2cResources) {
    info!("Starting host interface task");

    let mut config = i2c_slave::Config::default();
    config.addr = HOST_I2C_ADDR as u16;
    let mut device = i2c_slave::I2cSlave::new(r.i2c, r.scl, r.sda, Irqs, config);

    info!("Host interface task initialized");

    loop {
        let mut buf = [0u8; 8];
        match device.listen(&mut buf).await {
            Ok(i2c_slave::Command::GeneralCall(len)) => {
                error!("General call write received: {}", buf[..len]);
            }
            Ok(i2c_slave::Command::Read) => loop {
                match device.respond_to_read(&[POWER.power_state().raw()]).await {
                    Ok(x) => match x {
                        i2c_slave::ReadStatus::Done => break,
                        i2c_slave::ReadStatus::NeedMoreBytes => (),
                        i2c_slave::ReadStatus::LeftoverBytes(x) => {
                            info!("Left over bytes: {:?}", x);
                            break;
                        }
                    },
                    Err(e) => {
                        error!("Error responding to read: {:?}", e);
                    }
                }
            },
            Ok(i2c_slave::Command::Write(len)) => {
                if len < 1 {
                    error!("Write command too short");
                    continue;
                }
                match buf[0] {
                    // Set pause-in-S5
                    0x12 => {
                        if let Some(pause) = flag_arg(&buf, len) {
                            info!("Setting pause_in_s5 to {}", pause);
                            POWER.tunables.set_pause_in_s5(pause);
                        }
                    }
                    // Fault injection: fake a platform-reset timeout on the
                    // next power-on
                    0x13 => {
                        if POWER.tunables.is_locked() {
                            error!("Fault injection rejected: system locked");
                        } else {
                            info!("Faking a failure of the next power-on");
                            POWER.tunables.inject_fault_next_resume();
                        }
                    }
                    // Throttle the AP
                    0x14 => {
                        if let Some(throttle) = flag_arg(&buf, len) {
                            info!("Setting AP throttle to {}", throttle);
                            POWER.tunables.set_throttle_ap(throttle);
                            // Applied by the chipset task on its next pass.
                            POWER.wake();
                        }
                    }
                    // USB power in S3 policy
                    0x15 => {
                        if let Some(keep) = flag_arg(&buf, len) {
                            info!("Setting USB power in S3 to {}", keep);
                            POWER.tunables.set_usb_power_in_s3(keep);
                        }
                    }
                    // System lock
                    0x16 => {
                        if let Some(locked) = flag_arg(&buf, len) {
                            info!("Setting system lock to {}", locked);
                            POWER.tunables.set_locked(locked);
                        }
                    }
                    // USB port power report from the AP
                    0x17 => {
                        if let Some(powered) = flag_arg(&buf, len) {
                            debug!("USB ports powered: {}", powered);
                            USB_PORTS_POWERED.store(powered, Ordering::Relaxed);
                        }
                    }
                    // Force AP shutdown
                    0x30 => {
                        info!("Host requested AP shutdown");
                        POWER.request_shutdown();
                    }
                    // AP reset
                    0x31 => {
                        if let Some(cold) = flag_arg(&buf, len) {
                            info!("Host requested AP reset, cold={}", cold);
                            POWER.request_reset(cold);
                        }
                    }
                    // Power on
                    0x32 => {
                        info!("Host requested power on");
                        POWER.exit_hard_off();
                    }
                    x => error!("Invalid Write command: {:02x}", x),
                }
            }
            Ok(i2c_slave::Command::WriteRead(_len)) => match buf[0] {
                // Query firmware version
                0x01 => respond(&mut device, &FW_VERSION).await,
                // Query power state
                0x10 => respond(&mut device, &[POWER.power_state().raw()]).await,
                // Query power signal mask
                0x11 => {
                    let bits = POWER.signals.read().bits().to_be_bytes();
                    respond(&mut device, &bits).await
                }
                // Query pause-in-S5
                0x12 => respond(&mut device, &[POWER.tunables.pause_in_s5() as u8]).await,
                // Query throttle
                0x14 => respond(&mut device, &[POWER.tunables.throttle_ap() as u8]).await,
                // Query USB power in S3 policy
                0x15 => respond(&mut device, &[POWER.tunables.usb_power_in_s3() as u8]).await,
                // Query system lock
                0x16 => respond(&mut device, &[POWER.tunables.is_locked() as u8]).await,
                x => {
                    error!("Invalid WriteRead command: {:02x}", x);
                    respond(&mut device, &[0x00]).await
                }
            },
            Err(e) => {
                error!("i2c slave error: {:?}", e);
            }
        }
    }
}
