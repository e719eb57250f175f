//! Steering-wheel input daemon: a thin byte-to-event relay, not part of the
//! radio or audio core. Reads newline-terminated ASCII commands off a UART
//! and turns `KEYDOWN`/`KEYUP` into `EV_KEY`/`EV_SYN` events on a virtual
//! `uinput` keyboard, logs `DEBUG` lines, and forwards `PINPUT` analog/
//! digital state to whichever local client is listening on a Unix socket.
//!
//! Grounded on the original `swid.c`: a serial read loop driving `uinput`,
//! plus a Unix-domain socket (`/dev/swi` there) for the reverse channel.

mod command;
mod socket;
mod vkeyboard;

use anyhow::Context;
use clap::Parser;

use command::Command;
use rcc_serial::SerialEndpoint;
use socket::ClientSlot;
use vkeyboard::VirtualKeyboard;

#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
struct SwidOptions {
    /// UART the wheel controller is attached to, e.g. /dev/ttyAMA3
    #[arg(long, default_value = "/dev/ttyAMA3")]
    port: String,

    /// Unix socket for the PINPUT/key-relay side channel.
    #[arg(long, default_value = "/dev/swi")]
    socket: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts = SwidOptions::parse();

    let serial =
        SerialEndpoint::open(&opts.port).with_context(|| format!("opening {}", opts.port))?;
    let mut keyboard = VirtualKeyboard::create().context("creating virtual uinput keyboard")?;

    let clients = ClientSlot::default();
    {
        let clients = clients.clone();
        let socket_path = opts.socket.clone();
        let relay_serial = serial.try_clone().context("cloning serial endpoint for relay socket")?;
        std::thread::Builder::new()
            .name("swid-socket".into())
            .spawn(move || {
                if let Err(err) = socket::serve(&socket_path, clients, relay_serial) {
                    tracing::error!(%err, "key relay socket exited");
                }
            })
            .context("spawning key relay socket thread")?;
    }

    run(serial, &mut keyboard, &clients)
}

/// Read the UART line by line and dispatch each recognised command. Runs
/// forever; a read error on the UART ends the daemon, matching the
/// original's unchecked `read()` loop (no reconnect logic, since the UART
/// is expected to be a fixed, always-present board peripheral).
fn run(mut serial: SerialEndpoint, keyboard: &mut VirtualKeyboard, clients: &ClientSlot) -> anyhow::Result<()> {
    let mut line = Vec::with_capacity(64);
    loop {
        line.clear();
        loop {
            let byte = serial.read_one()?;
            if byte == b'\n' {
                break;
            }
            line.push(byte);
        }
        let Ok(text) = std::str::from_utf8(&line) else {
            tracing::warn!("dropped non-UTF-8 line from UART");
            continue;
        };

        match command::parse(text) {
            Some(Command::KeyDown(code)) => {
                tracing::debug!(code, "key down");
                if let Err(err) = keyboard.key_down(code) {
                    tracing::warn!(%err, "failed to emit key down");
                }
            }
            Some(Command::KeyUp(code)) => {
                tracing::debug!(code, "key up");
                if let Err(err) = keyboard.key_up(code) {
                    tracing::warn!(%err, "failed to emit key up");
                }
            }
            Some(Command::Debug(text)) => tracing::debug!(target: "swid::uart", "{text}"),
            Some(Command::PInput(payload)) => clients.forward(payload.as_bytes()),
            None => tracing::trace!(line = text, "unrecognised UART line"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn client_slot_forward_without_a_client_is_a_silent_no_op() {
        let clients = ClientSlot::default();
        clients.forward(b"01020304");
    }
}
