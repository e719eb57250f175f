//! Host callback abstraction, modeled on `ITunerCallback`, replacing a C
//! callback pointer plus null check with a typed capability.
//!
//! The original host interface grew a `_1_1` sibling for several methods
//! without removing the originals, and callers passed a raw function
//! pointer that could be null. Here that's a trait with default no-op
//! methods for the v1.1-only calls, so a v1.0 host can implement just the
//! base trait and the dispatcher invokes whichever methods are present at
//! calls that matter, without ever checking for null.

use crate::types::{BandConfig, HostResult, ProgramInfo, ProgramSelector};

/// Host-visible tuner events. A v1.0 host only cares about `tune_complete`
/// and `config_change`; a v1.1 host additionally wants the richer
/// `tune_complete_1_1` and `current_program_info_changed` calls. Both are
/// declared here with default implementations so either capability level
/// can be implemented without the other.
pub trait TunerCallback: Send + Sync {
    fn tune_complete(&self, _result: HostResult, _info: &ProgramInfo) {}

    fn tune_complete_1_1(&self, _result: HostResult, _selector: &ProgramSelector) {}

    fn current_program_info_changed(&self, _info: &ProgramInfo) {}

    fn config_change(&self, _result: HostResult, _config: &BandConfig) {}
}

/// A callback that drops every event; used when the host hasn't registered
/// one yet or the orchestrator is running headless (e.g. `device-orchestrator
/// simulate`).
pub struct NullCallback;

impl TunerCallback for NullCallback {}
