//! ALSA Stream Facade and Device Mixer Controls: the audio-side half of
//! the automotive-hw-bridge, wrapping the `alsa` crate's PCM and mixer APIs
//! behind the parameter-negotiation and HFP-mutual-exclusion rules the
//! host framework expects.

pub mod address;
pub mod channel;
pub mod error;
pub mod mixer;
pub mod profile;
pub mod stream;

pub use address::CardAddress;
pub use channel::{ChannelMask, ChannelPosition};
pub use error::{AlsaError, Result};
pub use mixer::DeviceMixer;
pub use profile::DeviceProfile;
pub use stream::{Direction, SharedDeviceState, Stream, StreamConfig};
