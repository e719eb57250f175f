//! Interactive bring-up REPL, grounded on the original's `getcommands()`
//! loop: open the tuner, accept a few simple commands, print decoded state
//! changes as they arrive.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use rcc::{Direction, NullCallback, Tuner};

#[derive(clap::Args, Debug)]
pub struct ConsoleOpts {
    /// Serial device for the tuner, e.g. /dev/ttyUSB0
    port: String,
}

impl crate::ToolRun for ConsoleOpts {
    fn run(&self) -> Result<()> {
        let tuner = Tuner::open(&self.port, Arc::new(NullCallback), true)
            .with_context(|| format!("opening tuner on {}", self.port))?;

        println!("Connected. Commands: tune <khz> | scan up|down | step up|down | show <key> | quit");
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            print!("> ");
            std::io::stdout().flush()?;
            line.clear();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("tune") => {
                    let Some(khz) = parts.next().and_then(|s| s.parse().ok()) else {
                        println!("usage: tune <khz>");
                        continue;
                    };
                    if let Err(err) = tuner.tune(khz, 0) {
                        println!("tune failed: {err}");
                    }
                }
                Some("scan") => {
                    let dir = match parts.next() {
                        Some("up") => Direction::Up,
                        Some("down") => Direction::Down,
                        _ => {
                            println!("usage: scan up|down");
                            continue;
                        }
                    };
                    if let Err(err) = tuner.scan(dir) {
                        println!("scan failed: {err}");
                    }
                }
                Some("step") => {
                    let dir = match parts.next() {
                        Some("up") => Direction::Up,
                        Some("down") => Direction::Down,
                        _ => {
                            println!("usage: step up|down");
                            continue;
                        }
                    };
                    if let Err(err) = tuner.step(dir) {
                        println!("step failed: {err}");
                    }
                }
                Some("show") => {
                    let Some(key) = parts.next() else {
                        println!("usage: show <key>");
                        continue;
                    };
                    println!("{key} = {}", tuner.cache().get(key));
                }
                Some("quit") | None => break,
                Some(other) => println!("unrecognised command: {other}"),
            }
        }

        tuner.close()?;
        Ok(())
    }
}
