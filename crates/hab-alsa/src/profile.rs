//! Device profile discovery: the allowed rates, formats, and channel counts
//! read from hardware when a stream is first opened.

use alsa::pcm::{Format, HwParams, PCM};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub rate_min: u32,
    pub rate_max: u32,
    pub channels_min: u8,
    pub channels_max: u8,
    pub formats: Vec<Format>,
}

const CANDIDATE_FORMATS: &[Format] = &[Format::S16LE, Format::S24LE, Format::S32LE];

impl DeviceProfile {
    pub fn discover(pcm: &PCM) -> Result<Self> {
        let hwp = HwParams::any(pcm)?;
        let formats = CANDIDATE_FORMATS
            .iter()
            .copied()
            .filter(|f| hwp.test_format(*f).is_ok())
            .collect();
        Ok(DeviceProfile {
            rate_min: hwp.get_rate_min()?,
            rate_max: hwp.get_rate_max()?,
            channels_min: hwp.get_channels_min()? as u8,
            channels_max: hwp.get_channels_max()? as u8,
            formats,
        })
    }

    pub fn supports_rate(&self, rate: u32) -> bool {
        rate >= self.rate_min && rate <= self.rate_max
    }

    pub fn supports_format(&self, format: Format) -> bool {
        self.formats.contains(&format)
    }

    pub fn clamp_channels(&self, requested: u8) -> u8 {
        requested.clamp(self.channels_min, self.channels_max)
    }

    /// The nearest supported rate to `requested`, used when the facade has
    /// to overwrite an unsupported request with a supported value.
    pub fn nearest_rate(&self, requested: u32) -> u32 {
        requested.clamp(self.rate_min, self.rate_max)
    }
}
