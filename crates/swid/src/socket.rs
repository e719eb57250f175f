//! Local Unix-domain socket side channel, grounded on the original's
//! `create_socket("/dev/swi")` and `key_read` thread: other processes on
//! the box connect here to (a) receive the analog/digital `PINPUT` state
//! as it arrives off the UART, and (b) push raw key bytes back out to the
//! wheel controller.
//!
//! The original's read loop wrote each client byte back to the *listening*
//! socket fd (`key_fd`) rather than the accepted connection (`key_client_fd`);
//! that looks like a copy-paste slip rather than intended behavior, so this
//! port tracks the current connection explicitly instead of reproducing it.

use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::{Arc, Mutex};

use rcc_serial::SerialEndpoint;

/// Shared handle to whichever client is currently connected, if any.
#[derive(Clone, Default)]
pub struct ClientSlot(Arc<Mutex<Option<UnixStream>>>);

impl ClientSlot {
    /// Forward `payload` to the connected client, dropping it silently if
    /// no one is listening right now (matching the original's fire-and-forget
    /// `PINPUT` forwarding).
    pub fn forward(&self, payload: &[u8]) {
        let mut slot = self.0.lock().unwrap();
        if let Some(stream) = slot.as_mut() {
            if stream.write_all(payload).is_err() {
                *slot = None;
            }
        }
    }
}

/// Accept connections on `path` forever, relaying each inbound byte to the
/// serial port as `<byte>\n` and registering the connection in `clients` so
/// `PINPUT` state can be forwarded back out to it.
pub fn serve(path: &str, clients: ClientSlot, serial: SerialEndpoint) -> anyhow::Result<()> {
    let _ = std::fs::remove_file(path);
    let listener = UnixListener::bind(path)?;
    tracing::info!(path, "key relay socket listening");

    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(%err, "accept error on key relay socket");
                continue;
            }
        };
        let reader = stream.try_clone()?;
        *clients.0.lock().unwrap() = Some(stream);

        if let Err(err) = relay_client(reader, serial.try_clone()?) {
            tracing::debug!(%err, "key relay client disconnected");
        }
        *clients.0.lock().unwrap() = None;
    }
    Ok(())
}

fn relay_client(mut client: UnixStream, mut serial: SerialEndpoint) -> anyhow::Result<()> {
    let mut byte = [0u8; 1];
    loop {
        let n = client.read(&mut byte)?;
        if n == 0 {
            return Ok(());
        }
        serial.write(&[byte[0], b'\n'])?;
    }
}
