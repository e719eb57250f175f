//! Per-direction audio stream objects: open/standby/write/read,
//! channel-count conversion, and parameter negotiation against a profile
//! read from hardware.
//!
//! Each stream is guarded by a two-level lock: `pre_lock` is acquired first
//! and held for the duration of the call, `lock` guards the mutable PCM
//! state itself. Acquiring `pre_lock` before `lock` keeps a long-running
//! audio-thread call from starving a host thread that only needs to glance
//! at state, since the host thread still gets to queue up on `pre_lock`
//! instead of spinning on `lock` directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use alsa::pcm::{Access, Format, HwParams, State, PCM};
use alsa::Direction as AlsaDirection;

use crate::address::CardAddress;
use crate::channel::{convert_channels, ChannelMask};
use crate::error::{AlsaError, Result};
use crate::profile::DeviceProfile;

const PERIOD_SIZE: i64 = 1024;
const PERIODS: u32 = 4;
const HIGH_RATE_THRESHOLD: u32 = 96_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Playback,
    Capture,
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub sample_rate: u32,
    pub format: Format,
    pub channel_mask: ChannelMask,
}

/// State shared by every stream on a card, so the HFP mutual-exclusion rule
/// and the high-rate-playback sample-rate lock can be enforced across
/// independently-locked streams.
#[derive(Clone)]
pub struct SharedDeviceState {
    hfp_active: Arc<AtomicBool>,
    high_rate_playback: Arc<Mutex<Option<u32>>>,
}

impl SharedDeviceState {
    pub fn new() -> Self {
        SharedDeviceState {
            hfp_active: Arc::new(AtomicBool::new(false)),
            high_rate_playback: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_hfp_active(&self, active: bool) {
        self.hfp_active.store(active, Ordering::SeqCst);
    }

    pub fn hfp_active(&self) -> bool {
        self.hfp_active.load(Ordering::SeqCst)
    }
}

impl Default for SharedDeviceState {
    fn default() -> Self {
        Self::new()
    }
}

struct Inner {
    pcm: Option<PCM>,
    profile: Option<DeviceProfile>,
    config: StreamConfig,
    scratch: Vec<i16>,
    mic_muted: bool,
}

pub struct Stream {
    direction: Direction,
    address: CardAddress,
    pre_lock: Mutex<()>,
    inner: Mutex<Inner>,
    shared: SharedDeviceState,
}

impl Stream {
    pub fn new(direction: Direction, shared: SharedDeviceState) -> Self {
        Stream {
            direction,
            address: CardAddress { card: 0, device: 0 },
            pre_lock: Mutex::new(()),
            inner: Mutex::new(Inner {
                pcm: None,
                profile: None,
                config: StreamConfig {
                    sample_rate: 48_000,
                    format: Format::S16LE,
                    channel_mask: ChannelMask::default_for(2),
                },
                scratch: Vec::new(),
                mic_muted: false,
            }),
            shared,
        }
    }

    /// Open against `address` (`card=N;device=M`). Returns the channel mask
    /// actually selected so the host can learn the default when it passed
    /// `ChannelMask::None` to query.
    pub fn open(&mut self, mut config: StreamConfig, address: CardAddress) -> Result<ChannelMask> {
        let _pre = self.pre_lock.lock().unwrap();
        let alsa_dir = match self.direction {
            Direction::Playback => AlsaDirection::Playback,
            Direction::Capture => AlsaDirection::Capture,
        };
        let pcm = PCM::new(&address.device_name(), alsa_dir, false)?;
        let profile = DeviceProfile::discover(&pcm)?;

        if self.direction == Direction::Capture {
            if let Some(locked_rate) = *self.shared.high_rate_playback.lock().unwrap() {
                if config.sample_rate != locked_rate {
                    return Err(AlsaError::InvalidArguments(format!(
                        "input streams must open at the active high-rate playback rate {locked_rate}"
                    )));
                }
            }
        }

        let mut overwrote = false;
        if !profile.supports_rate(config.sample_rate) {
            config.sample_rate = profile.nearest_rate(config.sample_rate);
            overwrote = true;
        }
        if !profile.supports_format(config.format) {
            config.format = profile
                .formats
                .first()
                .copied()
                .ok_or(AlsaError::Unavailable("no usable sample format on device"))?;
            overwrote = true;
        }

        let requested_channels = match &config.channel_mask {
            ChannelMask::None => profile.clamp_channels(2),
            other => profile.clamp_channels(other.channel_count().unwrap_or(2)),
        };
        let selected_mask = ChannelMask::for_count(requested_channels);
        config.channel_mask = selected_mask.clone();

        {
            let hwp = HwParams::any(&pcm)?;
            hwp.set_access(Access::RWInterleaved)?;
            hwp.set_format(config.format)?;
            hwp.set_rate(config.sample_rate, alsa::ValueOr::Nearest)?;
            hwp.set_channels(u32::from(requested_channels))?;
            hwp.set_period_size(PERIOD_SIZE, alsa::ValueOr::Nearest)?;
            hwp.set_periods(PERIODS, alsa::ValueOr::Nearest)?;
            pcm.hw_params(&hwp)?;
        }

        if self.direction == Direction::Playback && config.sample_rate >= HIGH_RATE_THRESHOLD {
            *self.shared.high_rate_playback.lock().unwrap() = Some(config.sample_rate);
        }

        let mut inner = self.inner.lock().unwrap();
        inner.pcm = Some(pcm);
        inner.profile = Some(profile);
        inner.config = config;

        if overwrote {
            return Err(AlsaError::InvalidArguments(
                "requested rate/format unsupported; config overwritten with a supported value"
                    .into(),
            ));
        }
        Ok(selected_mask)
    }

    /// Close the underlying PCM handle; the next read/write reopens it.
    pub fn standby(&self) -> Result<()> {
        let _pre = self.pre_lock.lock().unwrap();
        let mut inner = self.inner.lock().unwrap();
        if let Some(pcm) = inner.pcm.take() {
            if pcm.state() == State::Running {
                let _ = pcm.drop();
            }
        }
        Ok(())
    }

    pub fn set_mic_muted(&self, muted: bool) {
        self.inner.lock().unwrap().mic_muted = muted;
    }

    pub fn write(&self, buf: &[i16], n: usize) -> Result<usize> {
        if self.shared.hfp_active() {
            return Ok(n);
        }
        let _pre = self.pre_lock.lock().unwrap();
        let mut inner = self.inner.lock().unwrap();
        let Some(pcm) = inner.pcm.as_ref() else {
            return Err(AlsaError::NotInitialized);
        };
        let hw_channels = hw_channel_count(&inner.config);
        let host_channels = inner
            .config
            .channel_mask
            .channel_count()
            .unwrap_or(hw_channels);

        let io = pcm.io_i16()?;
        if host_channels == hw_channels {
            Ok(io.writei(&buf[..n])?)
        } else {
            let frames = convert_channels(&buf[..n], host_channels, hw_channels, &mut inner.scratch);
            let scratch = std::mem::take(&mut inner.scratch);
            let written = io.writei(&scratch[..frames * hw_channels as usize])?;
            inner.scratch = scratch;
            Ok(written)
        }
    }

    pub fn read(&self, buf: &mut [i16], n: usize) -> Result<usize> {
        if self.shared.hfp_active() {
            return Ok(n);
        }
        let _pre = self.pre_lock.lock().unwrap();
        let mut inner = self.inner.lock().unwrap();
        if inner.mic_muted {
            buf[..n].fill(0);
            return Ok(n);
        }
        let Some(pcm) = inner.pcm.as_ref() else {
            return Err(AlsaError::NotInitialized);
        };
        let hw_channels = hw_channel_count(&inner.config);
        let host_channels = inner
            .config
            .channel_mask
            .channel_count()
            .unwrap_or(hw_channels);

        let io = pcm.io_i16()?;
        if host_channels == hw_channels {
            Ok(io.readi(&mut buf[..n])?)
        } else {
            let hw_frames = n / host_channels as usize;
            inner.scratch.clear();
            inner.scratch.resize(hw_frames * hw_channels as usize, 0);
            let mut scratch = std::mem::take(&mut inner.scratch);
            let read = io.readi(&mut scratch)?;
            let produced = convert_channels(
                &scratch[..read * hw_channels as usize],
                hw_channels,
                host_channels,
                &mut inner.scratch,
            );
            buf[..produced * host_channels as usize]
                .copy_from_slice(&inner.scratch[..produced * host_channels as usize]);
            Ok(produced)
        }
    }
}

fn hw_channel_count(config: &StreamConfig) -> u8 {
    config.channel_mask.channel_count().unwrap_or(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_state_tracks_hfp_activation() {
        let shared = SharedDeviceState::new();
        assert!(!shared.hfp_active());
        shared.set_hfp_active(true);
        assert!(shared.hfp_active());
    }

    #[test]
    fn write_is_a_no_op_while_hfp_is_active() {
        let shared = SharedDeviceState::new();
        shared.set_hfp_active(true);
        let stream = Stream::new(Direction::Playback, shared);
        let buf = vec![0i16; 128];
        assert_eq!(stream.write(&buf, 128).unwrap(), 128);
    }

    #[test]
    fn read_is_a_no_op_while_hfp_is_active() {
        let shared = SharedDeviceState::new();
        shared.set_hfp_active(true);
        let stream = Stream::new(Direction::Capture, shared);
        let mut buf = vec![1i16; 64];
        assert_eq!(stream.read(&mut buf, 64).unwrap(), 64);
    }

    #[test]
    fn read_without_an_open_pcm_and_hfp_inactive_is_not_initialized() {
        let shared = SharedDeviceState::new();
        let stream = Stream::new(Direction::Capture, shared);
        let mut buf = vec![0i16; 16];
        assert!(matches!(
            stream.read(&mut buf, 16),
            Err(AlsaError::NotInitialized)
        ));
    }
}
