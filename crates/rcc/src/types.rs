//! Value types shared by the tuner facade and its callbacks: bands, program
//! selectors, program info, configuration, the host-visible result codes.
//!
//! Modeled on the host `ITunerCallback`/`Result` surface. The source
//! modelled all of this as loosely-typed string maps and Android
//! parcelables; here each has a concrete Rust shape.

use std::time::Duration;

/// The class of tunable programs a session is configured for. Only `Am`/
/// `Fm` are driven by this controller; `Dab`/`Drmo`/`Sxm` exist so a
/// `ProgramSelector` can name them, but `setConfiguration` only accepts
/// AM/FM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramType {
    Am,
    Fm,
    Dab,
    Drmo,
    Sxm,
}

impl ProgramType {
    pub fn to_band(self) -> Option<rcc_proto::Band> {
        match self {
            ProgramType::Am => Some(rcc_proto::Band::Am),
            ProgramType::Fm => Some(rcc_proto::Band::Fm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// A band/channel-plan configuration, as given to `setConfiguration`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandConfig {
    pub class: ProgramType,
    pub lower_limit: u32,
    pub upper_limit: u32,
    pub spacing: Vec<u32>,
}

impl BandConfig {
    /// `lowerLimit < upperLimit` once configured.
    pub fn is_valid(&self) -> bool {
        self.lower_limit < self.upper_limit
    }
}

/// A tagged program identifier: program type plus primary value (frequency
/// for AM/FM) plus an optional HD subchannel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramSelector {
    pub program_type: ProgramType,
    pub value: u32,
    pub subchannel: Option<u32>,
}

impl ProgramSelector {
    pub fn new(program_type: ProgramType, value: u32) -> Self {
        ProgramSelector {
            program_type,
            value,
            subchannel: None,
        }
    }
}

/// RDS/HD text metadata attached to a `ProgramInfo`. Stored as an ordered
/// `[RDS_PS, TITLE, GENRE]` triple.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub rds_program_service: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
}

impl Metadata {
    pub fn as_triple(&self) -> [Option<&str>; 3] {
        [
            self.rds_program_service.as_deref(),
            self.title.as_deref(),
            self.genre.as_deref(),
        ]
    }
}

/// Derived, transient view of the currently selected program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    pub selector: ProgramSelector,
    pub tuned: bool,
    pub stereo: bool,
    pub digital: bool,
    pub signal_strength: u8,
    /// Set when reporting a dummy info for a selector that hasn't actually
    /// completed a tune yet (`getProgramInformation`'s `LIVE` flag).
    pub live: bool,
    pub metadata: Metadata,
}

impl ProgramInfo {
    pub fn dummy_for(selector: ProgramSelector) -> Self {
        ProgramInfo {
            selector,
            tuned: true,
            stereo: true,
            digital: false,
            signal_strength: 50,
            live: true,
            metadata: Metadata::default(),
        }
    }
}

/// Host-visible result code for operations that report a value/error pair
/// (`ITunerCallback`'s `Result` enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostResult {
    Ok,
    NotInitialized,
    InvalidArguments,
    InvalidState,
}

/// Result code for `getProgramList` (`ProgramListResult`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramListResult {
    Ok,
    NotInitialized,
    Unavailable,
}

/// Nominal scheduler delays per operation kind.
pub mod delays {
    use super::Duration;
    pub const CONFIGURE: Duration = Duration::from_millis(50);
    pub const SEEK: Duration = Duration::from_millis(200);
    pub const STEP: Duration = Duration::from_millis(100);
    pub const TUNE: Duration = Duration::from_millis(150);
}

/// FM/AM plausible band windows used to validate replies.
pub const FM_WINDOW: std::ops::RangeInclusive<u32> = 8500..=10900;
pub const AM_WINDOW: std::ops::RangeInclusive<u32> = 50..=1800;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_config_validity() {
        let good = BandConfig {
            class: ProgramType::Fm,
            lower_limit: 8750,
            upper_limit: 10800,
            spacing: vec![20],
        };
        assert!(good.is_valid());

        let bad = BandConfig {
            upper_limit: 8750,
            ..good
        };
        assert!(!bad.is_valid());
    }
}
