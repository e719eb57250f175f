//! Channel-count policy and the expand/reduce conversion used when a
//! stream's negotiated channel count differs from the hardware's.
//!
//! Up to 8 channels are representable. Two channels or fewer use a
//! positional mask (front-left/front-right or mono); more than two use a
//! plain index-assignment mask, since beyond stereo there's no single
//! universal channel-position convention to name them by.

pub const MAX_CHANNELS: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPosition {
    Mono,
    FrontLeft,
    FrontRight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelMask {
    /// "Query": the caller leaves channel selection to the facade.
    None,
    Positional(Vec<ChannelPosition>),
    Indexed(u8),
}

impl ChannelMask {
    pub fn channel_count(&self) -> Option<u8> {
        match self {
            ChannelMask::None => None,
            ChannelMask::Positional(positions) => Some(positions.len() as u8),
            ChannelMask::Indexed(n) => Some(*n),
        }
    }

    /// The facade's default choice when a caller passes `NONE` ("query").
    pub fn default_for(hw_channels: u8) -> ChannelMask {
        if hw_channels <= 2 {
            ChannelMask::Positional(match hw_channels {
                1 => vec![ChannelPosition::Mono],
                _ => vec![ChannelPosition::FrontLeft, ChannelPosition::FrontRight],
            })
        } else {
            ChannelMask::Indexed(hw_channels.min(MAX_CHANNELS))
        }
    }

    pub fn for_count(n: u8) -> ChannelMask {
        if n <= 2 {
            ChannelMask::Positional(match n {
                1 => vec![ChannelPosition::Mono],
                _ => vec![ChannelPosition::FrontLeft, ChannelPosition::FrontRight],
            })
        } else {
            ChannelMask::Indexed(n.min(MAX_CHANNELS))
        }
    }
}

/// Expand or reduce an interleaved S16LE buffer between `from_channels` and
/// `to_channels`, writing into `scratch` and returning the number of frames
/// produced. Extra channels on expansion duplicate the last source channel;
/// dropped channels on reduction are discarded.
pub fn convert_channels(
    src: &[i16],
    from_channels: u8,
    to_channels: u8,
    scratch: &mut Vec<i16>,
) -> usize {
    let from_channels = from_channels as usize;
    let to_channels = to_channels as usize;
    if from_channels == 0 || to_channels == 0 {
        scratch.clear();
        return 0;
    }
    let frames = src.len() / from_channels;
    scratch.clear();
    scratch.resize(frames * to_channels, 0);
    for frame in 0..frames {
        let src_frame = &src[frame * from_channels..frame * from_channels + from_channels];
        let dst_frame = &mut scratch[frame * to_channels..frame * to_channels + to_channels];
        for (ch, slot) in dst_frame.iter_mut().enumerate() {
            *slot = src_frame[ch.min(from_channels - 1)];
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mask_is_positional_up_to_stereo() {
        assert_eq!(
            ChannelMask::default_for(2),
            ChannelMask::Positional(vec![ChannelPosition::FrontLeft, ChannelPosition::FrontRight])
        );
        assert_eq!(
            ChannelMask::default_for(1),
            ChannelMask::Positional(vec![ChannelPosition::Mono])
        );
    }

    #[test]
    fn default_mask_is_indexed_above_stereo() {
        assert_eq!(ChannelMask::default_for(6), ChannelMask::Indexed(6));
    }

    #[test]
    fn indexed_mask_is_capped_at_max_channels() {
        assert_eq!(ChannelMask::default_for(16), ChannelMask::Indexed(8));
    }

    #[test]
    fn mono_to_stereo_duplicates_the_only_channel() {
        let mut scratch = Vec::new();
        let frames = convert_channels(&[10, 20, 30], 1, 2, &mut scratch);
        assert_eq!(frames, 3);
        assert_eq!(scratch, vec![10, 10, 20, 20, 30, 30]);
    }

    #[test]
    fn stereo_to_mono_drops_the_right_channel() {
        let mut scratch = Vec::new();
        let frames = convert_channels(&[10, 99, 20, 98], 2, 1, &mut scratch);
        assert_eq!(frames, 2);
        assert_eq!(scratch, vec![10, 20]);
    }

    #[test]
    fn stereo_to_six_channel_duplicates_trailing_channels() {
        let mut scratch = Vec::new();
        let frames = convert_channels(&[1, 2], 2, 6, &mut scratch);
        assert_eq!(frames, 1);
        assert_eq!(scratch, vec![1, 2, 2, 2, 2, 2]);
    }
}
