//! The WebRTC Audio Processing Module (APM): AEC (using the far-end
//! reference submitted via [`VoiceProcessor::analyze_reverse_stream`]), NS,
//! AGC and HPF on the near-end path, configured once at session start with
//! a fixed set of parameters.

use webrtc_audio_processing::{
    Config, EchoCancellation, EchoCancellationSuppressionLevel, GainControl, GainControlMode,
    InitializationConfig, NoiseSuppression, NoiseSuppressionLevel, Processor,
};

use crate::error::{HabError, Result};

pub struct VoiceProcessor {
    processor: Processor,
}

impl VoiceProcessor {
    /// One capture channel, one render channel, 8 kHz — the narrowband rate
    /// the session already resamples everything down to before this module
    /// ever sees a sample.
    pub fn new(sample_rate_hz: u32) -> Result<Self> {
        let mut processor = Processor::new(&InitializationConfig {
            num_capture_channels: 1,
            num_render_channels: 1,
            sample_rate_hz,
        })
        .map_err(HabError::Apm)?;

        processor.set_config(Config {
            echo_cancellation: Some(EchoCancellation {
                suppression_level: EchoCancellationSuppressionLevel::High,
                drift_compensation: false,
                enable_delay_agnostic: true,
                enable_extended_filter: true,
                stream_delay_ms: None,
            }),
            noise_suppression: Some(NoiseSuppression {
                suppression_level: NoiseSuppressionLevel::Moderate,
            }),
            gain_control: Some(GainControl {
                mode: GainControlMode::AdaptiveAnalog,
                target_level_dbfs: 3,
                compression_gain_db: 9,
                enable_limiter: true,
                analog_level_minimum: 0,
                analog_level_maximum: 255,
            }),
            enable_high_pass_filter: true,
            ..Default::default()
        });

        Ok(VoiceProcessor { processor })
    }

    /// Step 3: submit the far-end (BT-in, mono) block as the AEC reference.
    pub fn analyze_reverse_stream(&mut self, far_end_mono: &mut [f32]) -> Result<()> {
        self.processor
            .process_render_frame(far_end_mono)
            .map_err(HabError::Apm)
    }

    /// Step 10: run AEC/NS/AGC/HPF on the near-end (USB-in, mono) block.
    pub fn process_stream(&mut self, near_end_mono: &mut [f32]) -> Result<()> {
        self.processor
            .process_capture_frame(near_end_mono)
            .map_err(HabError::Apm)
    }
}
