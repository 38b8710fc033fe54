use defmt::{info, warn};
use embassy_executor::task;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart, Config};
use embedded_io_async::{Read, Write};
use power_seq::ConsoleError;
use static_cell::StaticCell;

use crate::POWER;
use crate::config::CONSOLE_BAUD;
use crate::config_resources::ConsoleResources;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

const LINE_MAX: usize = 80;

/// fmt::Write adapter over a stack buffer; oversized responses truncate.
struct Response {
    buf: [u8; 512],
    len: usize,
}

impl Response {
    const fn new() -> Self {
        Self { buf: [0; 512], len: 0 }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    fn clear(&mut self) {
        self.len = 0;
    }
}

impl core::fmt::Write for Response {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let room = self.buf.len() - self.len;
        let n = bytes.len().min(room);
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        Ok(())
    }
}

// Line-oriented debug console on UART0. Parsing and dispatch live in the
// sequencing core; this task only moves bytes.
#[task]
pub async fn console_task(r: ConsoleResources) {
    info!("Starting console task");

    static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
    static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

    let mut config = Config::default();
    config.baudrate = CONSOLE_BAUD;
    let uart = BufferedUart::new(
        r.uart,
        r.tx,
        r.rx,
        Irqs,
        TX_BUF.init([0; 256]),
        RX_BUF.init([0; 256]),
        config,
    );
    let (mut tx, mut rx) = uart.split();

    let mut line = [0u8; LINE_MAX];
    let mut len = 0usize;
    let mut response = Response::new();

    info!("Console task initialized");

    let _ = tx.write_all(b"> ").await;
    loop {
        let mut byte = [0u8; 1];
        if rx.read(&mut byte).await.is_err() {
            continue;
        }
        match byte[0] {
            b'\r' | b'\n' => {
                if let Ok(cmd) = core::str::from_utf8(&line[..len]) {
                    response.clear();
                    match power_seq::console::execute(&POWER, cmd, &mut response) {
                        Ok(()) => {
                            let _ = tx.write_all(response.as_bytes()).await;
                        }
                        Err(e) => {
                            warn!("console error {:?}", e);
                            let msg = match e {
                                ConsoleError::UnknownCommand => "ERROR: unknown command\r\n",
                                ConsoleError::InvalidParam => "ERROR: invalid parameter\r\n",
                                ConsoleError::AccessDenied => "ERROR: access denied\r\n",
                            };
                            let _ = tx.write_all(msg.as_bytes()).await;
                        }
                    }
                }
                len = 0;
                let _ = tx.write_all(b"> ").await;
            }
            byte => {
                if len < LINE_MAX {
                    line[len] = byte;
                    len += 1;
                } else {
                    warn!("console line overflow");
                    len = 0;
                }
            }
        }
    }
}
