//! The DMHD-1000 codebook: symbolic names, opcodes, reply formats.
//!
//! Lifted from the device's own bring-up tables (`hd_cmds`/`hd_ops`/
//! `hd_band`/`hd_constants`/`hd_format`/`hd_scale` in the original
//! controller). The source modelled all four relations as
//! `map<string,string>`; here they are closed enums with a `match` per
//! relation, so an unknown name is a compile error instead of an empty
//! string threading its way through the whole pipeline.

use std::collections::HashMap;

/// A symbolic command/reply name understood by the DMHD-1000.
///
/// Two pairs deliberately collide on opcode, matching the device's own
/// table: `HdApiVersion`/`HdHwVersion` both use `12 02`, and `Bass`/`Treble`
/// both use `05 04`. [`Command::from_opcode`] resolves each collision the
/// same way the original `map<string,string>` reverse-table did: entries
/// are folded in ascending name order, so the alphabetically later name
/// wins (`hdhwversion` over `hdapiversion`, `treble` over `bass`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Power,
    Mute,
    SignalStrength,
    Tune,
    Seek,
    HdActive,
    HdStreamLock,
    HdSignalStrength,
    HdSubchannel,
    HdSubchannelCount,
    HdEnableHdTuner,
    HdTitle,
    HdArtist,
    HdCallsign,
    HdStationName,
    HdUniqueId,
    HdApiVersion,
    HdHwVersion,
    RdsEnable,
    RdsGenre,
    RdsProgramService,
    RdsRadioText,
    Volume,
    Bass,
    Treble,
    Compression,
}

/// All commands, in the ascending-by-name order the original `std::map`
/// would have iterated them. Order matters only for [`Command::from_opcode`]'s
/// collision resolution; see that function.
pub const ALL_COMMANDS: &[Command] = &[
    Command::Bass,
    Command::Compression,
    Command::HdActive,
    Command::HdApiVersion,
    Command::HdArtist,
    Command::HdCallsign,
    Command::HdEnableHdTuner,
    Command::HdHwVersion,
    Command::HdSignalStrength,
    Command::HdStationName,
    Command::HdStreamLock,
    Command::HdSubchannel,
    Command::HdSubchannelCount,
    Command::HdTitle,
    Command::HdUniqueId,
    Command::Mute,
    Command::Power,
    Command::RdsEnable,
    Command::RdsGenre,
    Command::RdsProgramService,
    Command::RdsRadioText,
    Command::Seek,
    Command::SignalStrength,
    Command::Treble,
    Command::Tune,
    Command::Volume,
];

/// Reply payload shapes, from the device's `hd_format` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyFormat {
    Boolean,
    Int,
    Str,
    /// Band selector + 16-bit frequency (`tune`, `seek`).
    BandInt,
    /// Subchannel index + string (`hdtitle`, `hdartist`); the HD subchannel
    /// text protocol is deliberately not decoded, out of scope for this
    /// controller.
    IntString,
    /// No payload carried (`compression`).
    None,
}

impl Command {
    /// The two-byte opcode for this command, as `(lo, hi)`.
    pub const fn opcode(self) -> (u8, u8) {
        use Command::*;
        match self {
            Power => (0x01, 0x00),
            Mute => (0x02, 0x00),
            SignalStrength => (0x01, 0x01),
            Tune => (0x02, 0x01),
            Seek => (0x03, 0x01),
            HdActive => (0x01, 0x02),
            HdStreamLock => (0x02, 0x02),
            HdSignalStrength => (0x03, 0x02),
            HdSubchannel => (0x04, 0x02),
            HdSubchannelCount => (0x05, 0x02),
            HdEnableHdTuner => (0x06, 0x02),
            HdTitle => (0x07, 0x02),
            HdArtist => (0x08, 0x02),
            HdCallsign => (0x09, 0x02),
            HdStationName => (0x10, 0x02),
            HdUniqueId => (0x11, 0x02),
            HdApiVersion => (0x12, 0x02),
            HdHwVersion => (0x12, 0x02),
            RdsEnable => (0x01, 0x03),
            RdsGenre => (0x07, 0x03),
            RdsProgramService => (0x08, 0x03),
            RdsRadioText => (0x09, 0x03),
            Volume => (0x03, 0x04),
            Bass => (0x05, 0x04),
            Treble => (0x05, 0x04),
            Compression => (0x06, 0x04),
        }
    }

    /// The textual key this command/reply is cached under in the state cache.
    pub const fn name(self) -> &'static str {
        use Command::*;
        match self {
            Power => "power",
            Mute => "mute",
            SignalStrength => "signalstrength",
            Tune => "tune",
            Seek => "seek",
            HdActive => "hdactive",
            HdStreamLock => "hdstreamlock",
            HdSignalStrength => "hdsignalstrength",
            HdSubchannel => "hdsubchannel",
            HdSubchannelCount => "hdsubchannelcount",
            HdEnableHdTuner => "hdenablehdtuner",
            HdTitle => "hdtitle",
            HdArtist => "hdartist",
            HdCallsign => "hdcallsign",
            HdStationName => "hdstationname",
            HdUniqueId => "hduniqueid",
            HdApiVersion => "hdapiversion",
            HdHwVersion => "hdhwversion",
            RdsEnable => "rdsenable",
            RdsGenre => "rdsgenre",
            RdsProgramService => "rdsprogramservice",
            RdsRadioText => "rdsradiotext",
            Volume => "volume",
            Bass => "bass",
            Treble => "treble",
            Compression => "compression",
        }
    }

    /// The shape of this command's reply payload.
    pub const fn format(self) -> ReplyFormat {
        use Command::*;
        use ReplyFormat::*;
        match self {
            Power | Mute | HdActive | HdStreamLock | HdEnableHdTuner | RdsEnable => Boolean,
            SignalStrength | HdSignalStrength | HdSubchannel | HdSubchannelCount | Volume
            | Bass | Treble => Int,
            Tune | Seek => BandInt,
            HdCallsign | HdStationName | HdUniqueId | HdApiVersion | HdHwVersion | RdsGenre
            | RdsProgramService | RdsRadioText => Str,
            HdTitle | HdArtist => IntString,
            Compression => None,
        }
    }

    /// Whether this value is reported on the device's native 0..90 range
    /// and must be rescaled to the host's 0..100 range.
    pub const fn is_scaled(self) -> bool {
        matches!(self, Command::Volume | Command::Bass | Command::Treble)
    }

    /// Reverse-lookup a command by its opcode pair, resolving collisions
    /// the same way the original reverse table did (see [`ALL_COMMANDS`]).
    pub fn from_opcode(lo: u8, hi: u8) -> Option<Command> {
        reverse_table().get(&(lo, hi)).copied()
    }
}

fn reverse_table() -> HashMap<(u8, u8), Command> {
    let mut table = HashMap::with_capacity(ALL_COMMANDS.len());
    for &cmd in ALL_COMMANDS {
        table.insert(cmd.opcode(), cmd);
    }
    table
}

/// The `set`/`get`/`reply` operation selector that follows the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Set,
    Get,
    Reply,
}

impl Op {
    pub const fn bytes(self) -> (u8, u8) {
        match self {
            Op::Set => (0x00, 0x00),
            Op::Get => (0x01, 0x00),
            Op::Reply => (0x02, 0x00),
        }
    }

    /// Recognise the bytes for `reply`; every inbound message is one.
    pub const fn is_reply(b0: u8, b1: u8) -> bool {
        b0 == 0x02 && b1 == 0x00
    }
}

/// AM/FM band selector, sent as a 4-byte little-endian value that doubles
/// as the high bytes of the tune/seek payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Am,
    Fm,
}

impl Band {
    pub const fn bytes(self) -> [u8; 4] {
        match self {
            Band::Am => [0x00, 0x00, 0x00, 0x00],
            Band::Fm => [0x01, 0x00, 0x00, 0x00],
        }
    }

    pub const fn from_byte(b: u8) -> Option<Band> {
        match b {
            0 => Some(Band::Am),
            1 => Some(Band::Fm),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Band::Am => "AM",
            Band::Fm => "FM",
        }
    }
}

/// Named constants from the device's `hd_constants` table.
pub mod constants {
    pub const UP: [u8; 4] = [0x01, 0x00, 0x00, 0x00];
    pub const DOWN: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
    pub const ONE: [u8; 4] = [0x01, 0x00, 0x00, 0x00];
    pub const ZERO: [u8; 4] = [0x00, 0x00, 0x00, 0x00];
    pub const BEGIN_COMMAND: u8 = 0xA4;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_lookup_resolves_hwversion_over_apiversion() {
        assert_eq!(Command::from_opcode(0x12, 0x02), Some(Command::HdHwVersion));
    }

    #[test]
    fn reverse_lookup_resolves_treble_over_bass() {
        assert_eq!(Command::from_opcode(0x05, 0x04), Some(Command::Treble));
    }

    #[test]
    fn reverse_lookup_unknown_opcode_is_none() {
        assert_eq!(Command::from_opcode(0xff, 0xff), None);
    }

    #[test]
    fn every_command_round_trips_through_its_own_opcode_or_a_collision_winner() {
        for &cmd in ALL_COMMANDS {
            let (lo, hi) = cmd.opcode();
            assert!(Command::from_opcode(lo, hi).is_some());
        }
    }

    #[test]
    fn scaled_commands_match_spec() {
        assert!(Command::Volume.is_scaled());
        assert!(Command::Bass.is_scaled());
        assert!(Command::Treble.is_scaled());
        assert!(!Command::Power.is_scaled());
    }
}
