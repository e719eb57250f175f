//! Serial-port auto-discovery probing, scaffolding-only: open a candidate
//! port, send a `power get`, and see whether a `power` reply arrives before
//! a timeout. Grounded on `LinuxPort::testport`'s wait-for-known-reply-
//! preamble approach.

use std::time::{Duration, Instant};

use anyhow::{bail, Result};

use rcc_proto::{encode_frame, Command, Decoder, Op};
use rcc_serial::SerialEndpoint;

#[derive(clap::Args, Debug)]
pub struct ProbeOpts {
    /// Serial device to test, e.g. /dev/ttyUSB0
    port: String,
    #[arg(long, default_value_t = 1.0)]
    timeout_secs: f64,
}

#[derive(clap::Args, Debug)]
pub struct ListPortsOpts;

impl crate::ToolRun for ListPortsOpts {
    fn run(&self) -> Result<()> {
        for info in serialport::available_ports()? {
            println!("  {}", info.port_name);
            if let serialport::SerialPortType::UsbPort(usb) = info.port_type {
                println!("    - USB {:04x}:{:04x}", usb.vid, usb.pid);
                if let Some(product) = usb.product {
                    println!("    - {product}");
                }
            }
        }
        Ok(())
    }
}

impl crate::ToolRun for ProbeOpts {
    fn run(&self) -> Result<()> {
        println!("Testing port for HD Radio control: {}", self.port);
        let mut endpoint = match SerialEndpoint::open(&self.port) {
            Ok(endpoint) => endpoint,
            Err(err) => bail!("cannot open {}: {err}", self.port),
        };

        endpoint.write(&encode_frame(Command::Power, Op::Get, &[]))?;

        let mut decoder = Decoder::new();
        let deadline = Instant::now() + Duration::from_secs_f64(self.timeout_secs);
        while Instant::now() < deadline {
            match endpoint.read_one() {
                Ok(byte) => {
                    if let Some(Ok(reply)) = decoder.feed(byte) {
                        if reply.command == Command::Power {
                            println!("Port matched for HD Radio: {}", self.port);
                            return Ok(());
                        }
                    }
                }
                Err(_) => continue,
            }
        }

        bail!("no power reply from {} within {:.1}s", self.port, self.timeout_secs);
    }
}
