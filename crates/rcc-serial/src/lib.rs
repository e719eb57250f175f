//! Serial port endpoint: one character device, 115200 8N1, non-canonical,
//! 0.5 s read timeout, with DTR and HUPCL control via raw ioctls that the
//! `serialport` crate does not surface.
//!
//! Grounded on `LinuxPort` in the bring-up source (`hdlinuxio.cpp`):
//! `setportattr` for the termios configuration, `toggledtr`/`getdtr` for
//! DTR, `hanguponexit` for HUPCL. This crate does not retry on transient
//! I/O errors itself; per the concurrency model, the owning listener
//! thread (in `rcc`) decides whether to retry or to treat the error as an
//! exit signal.

use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;
use std::time::Duration;

use thiserror::Error;

pub const BAUD_RATE: u32 = 115_200;
const READ_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum SerialError {
    #[error("port not open")]
    NotOpen,
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },
    #[error("I/O error on serial port: {0}")]
    Io(#[from] std::io::Error),
    #[error("ioctl/termios error: {0}")]
    Nix(#[from] nix::Error),
}

pub type Result<T> = std::result::Result<T, SerialError>;

/// A single character device, configured for the DMHD-1000's fixed wire
/// parameters. Re-opening after [`SerialEndpoint::close`] is allowed.
pub struct SerialEndpoint {
    path: String,
    port: Option<serialport::TTYPort>,
}

impl SerialEndpoint {
    /// Open `path` at 115200 8N1, no flow control, no modem controls,
    /// non-canonical mode with a 0.5 s read timeout.
    pub fn open(path: &str) -> Result<Self> {
        let port = serialport::new(path, BAUD_RATE)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open_native()
            .map_err(|source| SerialError::Open {
                path: path.to_string(),
                source,
            })?;

        tracing::debug!(path, "serial port opened");
        Ok(SerialEndpoint {
            path: path.to_string(),
            port: Some(port),
        })
    }

    /// Duplicate the underlying file description so the read side and the
    /// write side can live on separate threads without sharing a `&mut`.
    /// Both instances refer to the same open port; closing one does not
    /// close the other.
    pub fn try_clone(&self) -> Result<Self> {
        let port = self.port.as_ref().ok_or(SerialError::NotOpen)?;
        let cloned = port
            .try_clone_native()
            .map_err(|source| SerialError::Open {
                path: self.path.clone(),
                source,
            })?;
        Ok(SerialEndpoint {
            path: self.path.clone(),
            port: Some(cloned),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Close the underlying file descriptor. A subsequent [`open`] on a new
    /// instance, or constructing a fresh `SerialEndpoint`, may reopen the
    /// same path.
    ///
    /// [`open`]: SerialEndpoint::open
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::debug!(path = %self.path, "serial port closed");
        }
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;
        port.write_all(bytes)?;
        Ok(())
    }

    /// Block until exactly one byte arrives, or the configured read timeout
    /// elapses (surfaced as `SerialError::Io` with `ErrorKind::TimedOut`).
    /// The owner is expected to retry on transient errors and to react to a
    /// closed file descriptor (EBADF) by exiting its loop.
    pub fn read_one(&mut self) -> Result<u8> {
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;
        let mut buf = [0u8; 1];
        port.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Raise or lower DTR via `TIOCMGET`/`TIOCMSET`, matching
    /// `LinuxPort::toggledtr`.
    pub fn set_dtr(&mut self, on: bool) -> Result<()> {
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;
        let fd = port.as_raw_fd();
        let mut status: libc::c_int = 0;
        unsafe { tiocmget(fd, &mut status)? };
        if on {
            status |= libc::TIOCM_DTR;
        } else {
            status &= !libc::TIOCM_DTR;
        }
        unsafe { tiocmset(fd, &status)? };
        Ok(())
    }

    pub fn dtr(&mut self) -> Result<bool> {
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;
        let fd = port.as_raw_fd();
        let mut status: libc::c_int = 0;
        unsafe { tiocmget(fd, &mut status)? };
        Ok(status & libc::TIOCM_DTR != 0)
    }

    /// Configure whether closing the port should hang up the line (HUPCL),
    /// matching `LinuxPort::hanguponexit`.
    pub fn hangup_on_exit(&mut self, hangup: bool) -> Result<()> {
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;
        let fd = port.as_raw_fd();
        unsafe {
            let mut attrs: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &mut attrs) != 0 {
                return Err(SerialError::Io(std::io::Error::last_os_error()));
            }
            if hangup {
                attrs.c_cflag |= libc::HUPCL;
            } else {
                attrs.c_cflag &= !libc::HUPCL;
            }
            if libc::tcsetattr(fd, libc::TCSANOW, &attrs) != 0 {
                return Err(SerialError::Io(std::io::Error::last_os_error()));
            }
        }
        Ok(())
    }
}

nix::ioctl_read_bad!(tiocmget, libc::TIOCMGET, libc::c_int);
nix::ioctl_write_ptr_bad!(tiocmset, libc::TIOCMSET, libc::c_int);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_a_nonexistent_device_is_reported_not_panicked() {
        let result = SerialEndpoint::open("/dev/does-not-exist-rcc-test");
        assert!(result.is_err());
    }

    #[test]
    fn operations_on_a_closed_endpoint_report_not_open() {
        // Constructing without opening is impossible by design (there is no
        // `new()`), so this exercises `close()` bringing a real endpoint
        // back to the not-open state, which is the only path to it short
        // of a successful open.
        if let Ok(mut ep) = SerialEndpoint::open("/dev/null") {
            ep.close();
            assert!(matches!(ep.write(&[0]), Err(SerialError::NotOpen)));
            assert!(matches!(ep.read_one(), Err(SerialError::NotOpen)));
        }
    }
}
