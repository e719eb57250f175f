//! The two fixed 1-channel resamplers an HFP session owns: 8 kHz → 48 kHz
//! for the far-end path into the USB card, 48 kHz → 8 kHz for the near-end
//! path back to the BT SCO card.

use rubato::{FftFixedInOut, Resampler};

use crate::error::Result;

pub const BT_BLOCK_FRAMES: usize = 80; // 8 kHz, 10 ms
pub const USB_BLOCK_FRAMES: usize = 480; // 48 kHz, 10 ms

pub struct BlockResampler {
    inner: FftFixedInOut<f32>,
    scratch_in: Vec<Vec<f32>>,
}

impl BlockResampler {
    pub fn to_48k(bt_rate: u32) -> Result<Self> {
        let inner = FftFixedInOut::<f32>::new(bt_rate as usize, 48_000, BT_BLOCK_FRAMES, 1)?;
        Ok(BlockResampler {
            inner,
            scratch_in: vec![Vec::with_capacity(BT_BLOCK_FRAMES)],
        })
    }

    pub fn from_48k(bt_rate: u32) -> Result<Self> {
        let inner = FftFixedInOut::<f32>::new(48_000, bt_rate as usize, USB_BLOCK_FRAMES, 1)?;
        Ok(BlockResampler {
            inner,
            scratch_in: vec![Vec::with_capacity(USB_BLOCK_FRAMES)],
        })
    }

    /// Resample one fixed-size mono block, returning the produced samples.
    pub fn process(&mut self, block: &[f32]) -> Result<Vec<f32>> {
        self.scratch_in[0].clear();
        self.scratch_in[0].extend_from_slice(block);
        let output = self.inner.process(&self.scratch_in, None)?;
        Ok(output.into_iter().next().unwrap_or_default())
    }
}
