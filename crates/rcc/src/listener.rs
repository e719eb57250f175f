//! The dedicated listener thread: blocks on serial reads, feeds bytes into
//! a [`rcc_proto::Decoder`], and hands decoded replies to the [`Dispatcher`].
//!
//! A dedicated thread owns the file handle and shuts down cooperatively
//! under a stop flag rather than having the fd closed out from under it.
//! The listener owns its own clone of the serial endpoint (see
//! `rcc_serial::SerialEndpoint::try_clone`) so it never needs to coordinate
//! with the writer side over a shared `&mut`. Unblocking the read on
//! shutdown relies on the serial endpoint's 0.5 s read timeout rather than
//! closing the fd out from under a concurrent writer sharing the same open
//! file description: the stop flag is checked once per timeout tick, so
//! shutdown completes within one tick of `request_stop`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use rcc_proto::Decoder;
use rcc_serial::SerialEndpoint;

use crate::dispatcher::Dispatcher;

pub struct Listener {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Listener {
    pub fn spawn(mut endpoint: SerialEndpoint, dispatcher: Arc<Dispatcher>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("rcc-listener".into())
            .spawn(move || run(&mut endpoint, &dispatcher, &worker_stop))
            .expect("failed to spawn listener thread");
        Listener {
            stop,
            handle: Some(handle),
        }
    }

    /// Signal the listener to exit at its next read; does not itself close
    /// the serial port (the caller closes its own handle, which is what
    /// actually unblocks the pending read).
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.request_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run(endpoint: &mut SerialEndpoint, dispatcher: &Dispatcher, stop: &AtomicBool) {
    let mut decoder = Decoder::new();
    tracing::debug!(path = %endpoint.path(), "listener thread started");
    loop {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        match endpoint.read_one() {
            Ok(byte) => {
                if let Some(result) = decoder.feed(byte) {
                    match result {
                        Ok(reply) => dispatcher.handle_reply(&reply),
                        Err(err) => tracing::debug!(%err, "dropping malformed frame"),
                    }
                }
            }
            Err(err) => {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                tracing::trace!(%err, "transient read error, retrying");
            }
        }
    }
    tracing::debug!("listener thread exiting");
}
