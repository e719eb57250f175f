//! Small helper for opening the four fixed-parameter PCMs the HFP bridge
//! engine owns directly (BT-in/out, USB-in/out) — period size 1024 frames,
//! 4 periods, S16LE, stereo, blocking I/O.

use alsa::pcm::{Access, Format, HwParams, PCM};
use alsa::Direction;

use crate::error::Result;

const PERIOD_SIZE: i64 = 1024;
const PERIODS: u32 = 4;
const CHANNELS: u32 = 2;

pub fn open_pcm(device: &str, direction: Direction, rate: u32) -> Result<PCM> {
    let pcm = PCM::new(device, direction, false)?;
    {
        let hwp = HwParams::any(&pcm)?;
        hwp.set_access(Access::RWInterleaved)?;
        hwp.set_format(Format::S16LE)?;
        hwp.set_rate(rate, alsa::ValueOr::Nearest)?;
        hwp.set_channels(CHANNELS)?;
        hwp.set_period_size(PERIOD_SIZE, alsa::ValueOr::Nearest)?;
        hwp.set_periods(PERIODS, alsa::ValueOr::Nearest)?;
        pcm.hw_params(&hwp)?;
    }
    pcm.prepare()?;
    Ok(pcm)
}
