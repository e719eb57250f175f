//! In-process fake DMHD-1000: accepts frames from `rcc_proto`'s encoder
//! over a TCP loopback and replies as a real tuner would, for exercising
//! the host API and integration tests without hardware.
//!
//! `rcc_proto::Decoder` parses the device-to-host *reply* wire shape; here
//! we're reading the opposite direction (host-to-device commands), so this
//! module has its own minimal raw-frame reader rather than reusing it.

use std::io::{Read, Write};
use std::net::TcpListener;

use anyhow::Result;

use rcc_proto::{encode_frame, Band, Command, Op};

#[derive(clap::Args, Debug)]
pub struct SimulateOpts {
    #[arg(default_value = "127.0.0.1:8855")]
    bind: String,
}

impl crate::ToolRun for SimulateOpts {
    fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.bind)?;
        println!("Simulated DMHD-1000 listening on {}.", self.bind);

        loop {
            let (stream, addr) = listener.accept()?;
            println!("Connected to {addr}.");
            if let Err(err) = serve(stream) {
                println!("Connection from {addr} ended: {err}");
            }
        }
    }
}

/// One raw, already-unescaped command frame as sent by the host: the
/// opcode, the operation, and whatever payload followed.
struct RawFrame {
    cmd: (u8, u8),
    payload: Vec<u8>,
}

/// Read one raw byte, un-escaping `ESC ESC` -> `ESC` and `ESC ESC_BEGIN` ->
/// `BEGIN`, mirroring `rcc_proto::encode`'s escaping on the way back in.
fn read_unescaped_byte(stream: &mut std::net::TcpStream) -> std::io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    if stream.read(&mut byte)? == 0 {
        return Ok(None);
    }
    if byte[0] != rcc_proto::ESC {
        return Ok(Some(byte[0]));
    }
    if stream.read(&mut byte)? == 0 {
        return Ok(None);
    }
    Ok(Some(if byte[0] == rcc_proto::ESC_BEGIN {
        rcc_proto::BEGIN
    } else {
        byte[0]
    }))
}

fn read_raw_frame(stream: &mut std::net::TcpStream) -> std::io::Result<Option<RawFrame>> {
    let mut byte = [0u8; 1];
    loop {
        if stream.read(&mut byte)? == 0 {
            return Ok(None);
        }
        if byte[0] != rcc_proto::BEGIN {
            continue;
        }
        let Some(len) = read_unescaped_byte(stream)? else {
            return Ok(None);
        };
        let mut body = Vec::with_capacity(len as usize);
        for _ in 0..len {
            let Some(b) = read_unescaped_byte(stream)? else {
                return Ok(None);
            };
            body.push(b);
        }
        // checksum byte is never escaped; read and skip it without
        // validating (the simulator trusts its own loopback client).
        if stream.read(&mut byte)? == 0 {
            return Ok(None);
        }
        if body.len() < 4 {
            continue;
        }
        return Ok(Some(RawFrame {
            cmd: (body[0], body[1]),
            payload: body[4..].to_vec(),
        }));
    }
}

fn serve(mut stream: std::net::TcpStream) -> Result<()> {
    let mut tuned_khz: u16 = 9750;

    while let Some(frame) = read_raw_frame(&mut stream)? {
        let Some(command) = Command::from_opcode(frame.cmd.0, frame.cmd.1) else {
            continue;
        };

        let reply = match command {
            Command::Power => Some(encode_frame(Command::Power, Op::Reply, &[1, 0, 0, 0])),
            Command::Tune | Command::Seek => {
                if frame.payload.len() >= 6 {
                    let band = Band::from_byte(frame.payload[0]).unwrap_or(Band::Fm);
                    let freq = u16::from_le_bytes([frame.payload[4], frame.payload[5]]);
                    tuned_khz = freq;
                    let _ = band;
                }
                Some(tune_reply(command, tuned_khz))
            }
            Command::SignalStrength => {
                Some(encode_frame(Command::SignalStrength, Op::Reply, &[0x80, 0x07, 0, 0]))
            }
            _ => None,
        };

        if let Some(reply) = reply {
            stream.write_all(&reply)?;
        }
    }
    Ok(())
}

/// A BandInt-format reply payload: `<band LE32> <freq LE16> 00 00`, per the
/// reply layout `rcc_proto`'s decoder expects (band at value bytes 0..4,
/// frequency at value bytes 4..6).
fn tune_reply(command: Command, freq_khz10: u16) -> Vec<u8> {
    let mut payload = [0u8; 8];
    payload[0..4].copy_from_slice(&Band::Fm.bytes());
    payload[4..6].copy_from_slice(&freq_khz10.to_le_bytes());
    encode_frame(command, Op::Reply, &payload)
}
