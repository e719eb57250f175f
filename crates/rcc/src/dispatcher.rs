//! Event dispatch half of the state cache and callback layer: turns a
//! decoded reply into (a) a state-cache write and (b) zero or more host
//! callback invocations, gated by a runtime flag injected at construction
//! rather than read ad-hoc from process state.

use std::sync::{Arc, Mutex};

use rcc_proto::{Band, Command, DecodedReply, ReplyValue};

use crate::cache::StateCache;
use crate::callback::TunerCallback;
use crate::types::{HostResult, Metadata, ProgramInfo, ProgramSelector, ProgramType, AM_WINDOW, FM_WINDOW};

/// Device-to-host scale for a decoded tune/seek frequency: the wire value is
/// in raw tuning-step units, the host channel value is ten times that.
const DEVICE_FREQ_SCALE: u32 = 10;

pub struct Dispatcher {
    cache: Arc<StateCache>,
    callback: Arc<dyn TunerCallback>,
    events_enabled: bool,
    current: Mutex<Option<ProgramInfo>>,
}

impl Dispatcher {
    pub fn new(cache: Arc<StateCache>, callback: Arc<dyn TunerCallback>, events_enabled: bool) -> Self {
        Dispatcher {
            cache,
            callback,
            events_enabled,
            current: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    pub fn callback(&self) -> &Arc<dyn TunerCallback> {
        &self.callback
    }

    /// The dispatcher's current view of the tuned program, if any reply has
    /// produced one yet.
    pub fn current_info(&self) -> Option<ProgramInfo> {
        self.current.lock().unwrap().clone()
    }

    /// Process one decoded reply: always updates the cache; emits host
    /// events only when the gate is enabled.
    pub fn handle_reply(&self, reply: &DecodedReply) {
        self.cache.set(reply.command.name(), cache_value(reply));

        if !self.events_enabled {
            return;
        }

        match reply.command {
            Command::Tune => self.handle_tune_or_seek(reply, true),
            Command::Seek => self.handle_tune_or_seek(reply, false),
            Command::RdsProgramService | Command::RdsRadioText | Command::RdsGenre => {
                self.handle_rds(reply)
            }
            Command::SignalStrength => self.handle_signal_strength(reply),
            _ => {}
        }
    }

    fn handle_tune_or_seek(&self, reply: &DecodedReply, is_tune: bool) {
        let ReplyValue::BandFreq(band, freq) = &reply.value else {
            return;
        };
        let (band, freq) = (*band, *freq);
        // The device reports frequency in raw tuning-step units; the host
        // channel value is ten times that (0x03CF = 975 on the wire is
        // channel 9750).
        let freq_scaled = u32::from(freq) * DEVICE_FREQ_SCALE;
        let window = match band {
            Band::Fm => FM_WINDOW,
            Band::Am => AM_WINDOW,
        };
        if !window.contains(&freq_scaled) {
            tracing::debug!(?band, freq_scaled, "dropping out-of-window tune/seek reply");
            return;
        }

        let program_type = match band {
            Band::Fm => ProgramType::Fm,
            Band::Am => ProgramType::Am,
        };
        let selector = ProgramSelector::new(program_type, freq_scaled);

        let mut info = ProgramInfo {
            selector,
            tuned: is_tune,
            stereo: true,
            digital: false,
            signal_strength: 50,
            live: is_tune,
            metadata: Metadata::default(),
        };
        if is_tune {
            // clear cached RDS strings on a fresh tune
            info.metadata = Metadata::default();
        }
        *self.current.lock().unwrap() = Some(info.clone());

        if is_tune {
            self.callback.tune_complete(HostResult::Ok, &info);
            self.callback.tune_complete_1_1(HostResult::Ok, &selector);
        }
        self.callback.current_program_info_changed(&info);
    }

    fn handle_rds(&self, reply: &DecodedReply) {
        let ReplyValue::Str(text) = &reply.value else {
            return;
        };
        let mut current = self.current.lock().unwrap();
        let Some(info) = current.as_mut() else {
            return;
        };
        match reply.command {
            Command::RdsProgramService => info.metadata.rds_program_service = Some(text.clone()),
            Command::RdsRadioText => info.metadata.title = Some(text.clone()),
            Command::RdsGenre => info.metadata.genre = Some(text.clone()),
            _ => unreachable!(),
        }
        self.callback.current_program_info_changed(info);
    }

    fn handle_signal_strength(&self, reply: &DecodedReply) {
        let ReplyValue::Int(raw) = &reply.value else {
            return;
        };
        let percent = signal_strength_percent(*raw);
        let mut current = self.current.lock().unwrap();
        let Some(info) = current.as_mut() else {
            return;
        };
        info.signal_strength = percent;
        self.callback.current_program_info_changed(info);
    }
}

/// Map a raw device signal-strength reading to a 0..100 percent scale.
pub fn signal_strength_percent(raw: u16) -> u8 {
    if raw < 400 {
        0
    } else if raw > 2850 {
        100
    } else {
        (((u32::from(raw) - 400) * 100) / 2450) as u8
    }
}

fn cache_value(reply: &DecodedReply) -> String {
    match &reply.value {
        ReplyValue::Boolean(b) => b.to_string(),
        ReplyValue::Int(v) => {
            let v = if reply.command.is_scaled() {
                u16::from(rcc_proto::encode::scale_from_device(*v as u8))
            } else {
                *v
            };
            v.to_string()
        }
        ReplyValue::Str(s) => s.clone(),
        ReplyValue::BandFreq(band, freq) => format!("{freq} {}", band.label()),
        ReplyValue::Ignored => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::TunerCallback;
    use rcc_proto::{encode::tune_payload, Command as Cmd, Op};
    use std::sync::Mutex as StdMutex;

    #[test]
    fn signal_strength_mapping_matches_spec_table() {
        assert_eq!(signal_strength_percent(0), 0);
        assert_eq!(signal_strength_percent(399), 0);
        assert_eq!(signal_strength_percent(2851), 100);
        assert_eq!(signal_strength_percent(1536), 46);
    }

    #[derive(Default)]
    struct RecordingCallback {
        last_tune: StdMutex<Option<ProgramInfo>>,
    }

    impl TunerCallback for RecordingCallback {
        fn tune_complete(&self, _result: HostResult, info: &ProgramInfo) {
            *self.last_tune.lock().unwrap() = Some(info.clone());
        }
    }

    fn decode_tune_reply(freq_raw: u16) -> rcc_proto::DecodedReply {
        let payload = tune_payload(Band::Fm, freq_raw);
        let frame = rcc_proto::encode_frame(Cmd::Tune, Op::Reply, &payload);
        let mut decoder = rcc_proto::Decoder::new();
        frame
            .into_iter()
            .find_map(|b| decoder.feed(b))
            .expect("frame completes")
            .expect("frame decodes")
    }

    #[test]
    fn tune_reply_scales_raw_frequency_to_host_channel() {
        let callback = Arc::new(RecordingCallback::default());
        let dispatcher = Dispatcher::new(Arc::new(StateCache::new()), callback.clone(), true);

        // 0x03CF = 975 raw, the scenario-1 wire value for FM channel 97.5.
        let reply = decode_tune_reply(975);
        dispatcher.handle_reply(&reply);

        let info = callback.last_tune.lock().unwrap().clone().expect("tune_complete fired");
        assert_eq!(info.selector.value, 9750);
        assert!(info.live, "a completed tune reply must carry the LIVE flag");
    }
}
