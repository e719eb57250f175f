//! HFP Bridge Engine: the single worker thread that pumps audio between
//! the BT SCO card and the USB card while a hands-free call is active.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use alsa::pcm::PCM;
use alsa::Direction as AlsaDirection;

use hab_alsa::{SharedDeviceState, Stream};

use crate::apm::VoiceProcessor;
use crate::error::Result;
use crate::pcm::open_pcm;
use crate::resample::{BlockResampler, BT_BLOCK_FRAMES, USB_BLOCK_FRAMES};

const USB_SAMPLE_RATE: u32 = 48_000;

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub usb_card: u32,
    pub bt_card: u32,
    pub sco_sample_rate: u32,
}

/// An active HFP session: the worker thread plus the flag that signals it
/// to exit cooperatively at the next loop head.
pub struct Session {
    terminate: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Session {
    /// Place every C7 stream into standby, open the four PCMs, and spawn
    /// the worker thread. `on_exit` runs after the worker has closed its
    /// PCMs and cleared the running flag, to let the caller restore line-in
    /// routing and master volume via C9.
    pub fn start(
        config: SessionConfig,
        c7_streams: &[Arc<Stream>],
        shared: SharedDeviceState,
        on_exit: impl FnOnce() + Send + 'static,
    ) -> Result<Self> {
        for stream in c7_streams {
            let _ = stream.standby();
        }
        shared.set_hfp_active(true);

        let bt_in = open_pcm(
            &format!("hw:{}", config.bt_card),
            AlsaDirection::Capture,
            config.sco_sample_rate,
        )?;
        let bt_out = open_pcm(
            &format!("hw:{}", config.bt_card),
            AlsaDirection::Playback,
            config.sco_sample_rate,
        )?;
        let usb_in = open_pcm(
            &format!("hw:{}", config.usb_card),
            AlsaDirection::Capture,
            USB_SAMPLE_RATE,
        )?;
        let usb_out = open_pcm(
            &format!("hw:{}", config.usb_card),
            AlsaDirection::Playback,
            USB_SAMPLE_RATE,
        )?;

        let apm = VoiceProcessor::new(config.sco_sample_rate)?;
        let to_48 = BlockResampler::to_48k(config.sco_sample_rate)?;
        let from_48 = BlockResampler::from_48k(config.sco_sample_rate)?;

        let terminate = Arc::new(AtomicBool::new(false));
        let worker_terminate = Arc::clone(&terminate);
        let worker_shared = shared;
        let handle = std::thread::Builder::new()
            .name("hab-worker".into())
            .spawn(move || {
                tracing::debug!("HFP worker session started");
                run(
                    bt_in,
                    bt_out,
                    usb_in,
                    usb_out,
                    apm,
                    to_48,
                    from_48,
                    &worker_terminate,
                );
                worker_shared.set_hfp_active(false);
                tracing::debug!("HFP worker session ended");
                on_exit();
            })
            .expect("failed to spawn HFP worker thread");

        Ok(Session {
            terminate,
            handle: Some(handle),
        })
    }

    /// Cooperative termination: the worker exits at the next loop head
    /// after the current BT-in block completes.
    pub fn request_stop(&self) {
        self.terminate.store(true, Ordering::SeqCst);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.request_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run(
    bt_in: PCM,
    bt_out: PCM,
    usb_in: PCM,
    usb_out: PCM,
    mut apm: VoiceProcessor,
    mut to_48: BlockResampler,
    mut from_48: BlockResampler,
    terminate: &AtomicBool,
) {
    let bt_in_io = match bt_in.io_i16() {
        Ok(io) => io,
        Err(err) => {
            tracing::warn!(%err, "failed to get BT-in io handle, aborting HFP session");
            return;
        }
    };
    let bt_out_io = bt_out.io_i16().expect("bt_out io handle");
    let usb_in_io = usb_in.io_i16().expect("usb_in io handle");
    let usb_out_io = usb_out.io_i16().expect("usb_out io handle");

    let mut far_stereo = vec![0i16; BT_BLOCK_FRAMES * 2];
    let mut near_stereo = vec![0i16; USB_BLOCK_FRAMES * 2];

    while !terminate.load(Ordering::SeqCst) {
        // 1. Blocking read from BT-in: 160 stereo frames.
        if let Err(err) = bt_in_io.readi(&mut far_stereo) {
            tracing::trace!(%err, "BT-in read error, retrying");
            continue;
        }

        // 2. Reduce to mono by discarding the right channel.
        let far_mono_i16 = stereo_to_mono(&far_stereo);
        // 3. Submit as far-end AEC reference.
        let mut far_mono_f32 = i16_to_f32(&far_mono_i16);
        if let Err(err) = apm.analyze_reverse_stream(&mut far_mono_f32) {
            tracing::trace!(%err, "APM analyze_reverse_stream failed");
        }

        // 4. Resample 8 kHz -> 48 kHz.
        let near_mono_48 = match to_48.process(&far_mono_f32) {
            Ok(block) => block,
            Err(err) => {
                tracing::trace!(%err, "upsample failed, dropping block");
                continue;
            }
        };
        // 5. Expand mono -> stereo by duplication.
        let near_stereo_out = mono_to_stereo(&f32_to_i16(&near_mono_48));

        // 6. Write min(block, writable) stereo frames to USB-out.
        let writable = usb_out.avail_update().unwrap_or(0).max(0) as usize;
        let to_write = USB_BLOCK_FRAMES.min(writable);
        let _ = usb_out_io.writei(&near_stereo_out[..to_write * 2]);

        // 7. Read min(block, readable) stereo frames from USB-in.
        let readable = usb_in.avail_update().unwrap_or(0).max(0) as usize;
        let to_read = USB_BLOCK_FRAMES.min(readable);
        near_stereo.resize(to_read * 2, 0);
        if let Err(err) = usb_in_io.readi(&mut near_stereo) {
            tracing::trace!(%err, "USB-in read error, retrying");
            continue;
        }

        // 8. Reduce USB-in to mono, padding out to a full block if the
        // card had fewer frames ready than requested — the resampler needs
        // a fixed-size chunk every 10 ms to stay block-aligned.
        let mut near_mono_i16 = stereo_to_mono(&near_stereo);
        near_mono_i16.resize(USB_BLOCK_FRAMES, 0);
        let near_mono_f32 = i16_to_f32(&near_mono_i16);

        // 9. Resample 48 kHz -> 8 kHz.
        let mut far_mono_8k = match from_48.process(&near_mono_f32) {
            Ok(block) => block,
            Err(err) => {
                tracing::trace!(%err, "downsample failed, dropping block");
                continue;
            }
        };

        // 10. Run AEC/NS/AGC/HPF.
        if let Err(err) = apm.process_stream(&mut far_mono_8k) {
            tracing::trace!(%err, "APM process_stream failed");
        }

        // 11. Expand mono -> stereo, write to BT-out.
        let bt_out_stereo = mono_to_stereo(&f32_to_i16(&far_mono_8k));
        let _ = bt_out_io.writei(&bt_out_stereo);
    }
}

fn stereo_to_mono(stereo: &[i16]) -> Vec<i16> {
    stereo.chunks_exact(2).map(|pair| pair[0]).collect()
}

fn mono_to_stereo(mono: &[i16]) -> Vec<i16> {
    let mut out = Vec::with_capacity(mono.len() * 2);
    for &sample in mono {
        out.push(sample);
        out.push(sample);
    }
    out
}

fn i16_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| f32::from(s) / 32768.0).collect()
}

fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_to_mono_keeps_left_channel() {
        assert_eq!(stereo_to_mono(&[1, 99, 2, 98]), vec![1, 2]);
    }

    #[test]
    fn mono_to_stereo_duplicates_each_sample() {
        assert_eq!(mono_to_stereo(&[1, 2]), vec![1, 1, 2, 2]);
    }

    #[test]
    fn f32_round_trip_is_close_to_identity() {
        let original = vec![0i16, 16384, -16384, 32767, -32768];
        let back = f32_to_i16(&i16_to_f32(&original));
        for (a, b) in original.iter().zip(back.iter()) {
            assert!((*a as i32 - *b as i32).abs() <= 1);
        }
    }
}
