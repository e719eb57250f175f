//! Tuner Facade: the synchronous host-facing API. Each operation validates
//! against the current session state under a single mutex, then (if valid)
//! enqueues the actual device command on the [`Scheduler`] so the call
//! returns without waiting on serial I/O.

use std::sync::{Arc, Mutex};

use rcc_proto::codebook::constants;
use rcc_proto::{encode_frame, Band, Command, Op};
use rcc_serial::SerialEndpoint;

use crate::dispatcher::Dispatcher;
use crate::error::{Result, TunerError};
use crate::listener::Listener;
use crate::scheduler::Scheduler;
use crate::types::{
    delays, BandConfig, Direction, ProgramInfo, ProgramListResult, ProgramSelector, ProgramType,
};
use crate::TunerCallback;

struct Session {
    config: Option<BandConfig>,
    selector: Option<ProgramSelector>,
    antenna_connected: bool,
    analog_forced: bool,
    closed: bool,
}

impl Session {
    fn new() -> Self {
        Session {
            config: None,
            selector: None,
            antenna_connected: false,
            analog_forced: false,
            closed: false,
        }
    }
}

/// Owns the serial endpoint's write half, the scheduler, the dispatcher
/// (and through it the state cache), and the listener thread reading the
/// endpoint's read half. Dropping a `Tuner` joins both the listener and
/// scheduler threads.
pub struct Tuner {
    session: Mutex<Session>,
    scheduler: Scheduler,
    dispatcher: Arc<Dispatcher>,
    write_endpoint: Mutex<SerialEndpoint>,
    listener: Listener,
}

impl Tuner {
    /// Open `path`, spawn the listener thread, and return a ready-to-use
    /// facade. `events_enabled` gates whether the dispatcher fires host
    /// callbacks at all.
    pub fn open(path: &str, callback: Arc<dyn TunerCallback>, events_enabled: bool) -> Result<Self> {
        let write_endpoint = SerialEndpoint::open(path)?;
        let read_endpoint = write_endpoint.try_clone()?;

        let cache = Arc::new(crate::cache::StateCache::new());
        let dispatcher = Arc::new(Dispatcher::new(cache, callback, events_enabled));
        let listener = Listener::spawn(read_endpoint, Arc::clone(&dispatcher));

        Ok(Tuner {
            session: Mutex::new(Session::new()),
            scheduler: Scheduler::new(),
            dispatcher,
            write_endpoint: Mutex::new(write_endpoint),
            listener,
        })
    }

    pub fn cache(&self) -> &crate::cache::StateCache {
        self.dispatcher.cache()
    }

    fn require_open(&self) -> Result<()> {
        if self.session.lock().unwrap().closed {
            Err(TunerError::NotInitialized)
        } else {
            Ok(())
        }
    }

    pub fn set_configuration(&self, config: BandConfig) -> Result<()> {
        self.require_open()?;
        if !matches!(config.class, ProgramType::Am | ProgramType::Fm) {
            return Err(TunerError::InvalidState);
        }
        if !config.is_valid() {
            return Err(TunerError::InvalidArguments(
                "lowerLimit must be < upperLimit".into(),
            ));
        }

        let band = config.class.to_band().expect("validated AM/FM above");
        let default_selector = ProgramSelector::new(config.class, config.lower_limit);

        {
            let mut session = self.session.lock().unwrap();
            session.config = Some(config.clone());
            session.selector = Some(default_selector);
            session.antenna_connected = true;
        }

        let dispatcher = Arc::clone(&self.dispatcher);
        let write_endpoint = self.write_endpoint_handle()?;
        let freq = config.lower_limit as u16;
        self.scheduler.schedule(delays::CONFIGURE, move || {
            let _ = send_frame(&write_endpoint, Command::Tune, Op::Set, &rcc_proto::encode::tune_payload(band, freq));
            let _ = send_frame(&write_endpoint, Command::SignalStrength, Op::Get, &[]);
            dispatcher.callback().config_change(crate::types::HostResult::Ok, &config);
        });
        Ok(())
    }

    pub fn get_configuration(&self) -> Result<BandConfig> {
        self.require_open()?;
        self.session
            .lock()
            .unwrap()
            .config
            .clone()
            .ok_or(TunerError::NotInitialized)
    }

    pub fn tune(&self, channel: u32, subchannel: u8) -> Result<()> {
        let class = self
            .session
            .lock()
            .unwrap()
            .config
            .as_ref()
            .ok_or(TunerError::NotInitialized)?
            .class;
        let mut selector = ProgramSelector::new(class, channel);
        if subchannel != 0 {
            selector.subchannel = Some(u32::from(subchannel));
        }
        self.tune_by_program_selector(selector)
    }

    pub fn tune_by_program_selector(&self, selector: ProgramSelector) -> Result<()> {
        self.require_open()?;
        let config = self
            .session
            .lock()
            .unwrap()
            .config
            .clone()
            .ok_or(TunerError::NotInitialized)?;

        match selector.program_type {
            ProgramType::Am | ProgramType::Fm => {
                if selector.program_type != config.class {
                    return Err(TunerError::InvalidState);
                }
                if selector.value < config.lower_limit || selector.value > config.upper_limit {
                    return Err(TunerError::InvalidArguments(format!(
                        "{} outside [{}, {}]",
                        selector.value, config.lower_limit, config.upper_limit
                    )));
                }
            }
            ProgramType::Dab | ProgramType::Drmo | ProgramType::Sxm => {
                if selector.subchannel.is_none() {
                    return Err(TunerError::InvalidArguments(
                        "required sub-identifier missing".into(),
                    ));
                }
            }
        }

        self.session.lock().unwrap().selector = Some(selector);

        let band = selector.program_type.to_band().unwrap_or(Band::Fm);
        let freq = selector.value as u16;
        let write_endpoint = self.write_endpoint_handle()?;
        self.scheduler.schedule(delays::TUNE, move || {
            let _ = send_frame(
                &write_endpoint,
                Command::Tune,
                Op::Set,
                &rcc_proto::encode::tune_payload(band, freq),
            );
        });
        Ok(())
    }

    pub fn scan(&self, dir: Direction) -> Result<()> {
        self.require_open()?;
        let payload = match dir {
            Direction::Up => constants::UP,
            Direction::Down => constants::DOWN,
        };
        let write_endpoint = self.write_endpoint_handle()?;
        self.scheduler.schedule(delays::SEEK, move || {
            let _ = send_frame(&write_endpoint, Command::Seek, Op::Set, &payload);
        });
        Ok(())
    }

    pub fn step(&self, dir: Direction) -> Result<()> {
        self.require_open()?;
        let (config, selector) = {
            let session = self.session.lock().unwrap();
            (
                session
                    .config
                    .clone()
                    .ok_or(TunerError::NotInitialized)?,
                session.selector.ok_or(TunerError::NotInitialized)?,
            )
        };
        if !matches!(config.class, ProgramType::Am | ProgramType::Fm) {
            return Err(TunerError::InvalidState);
        }
        let spacing = *config.spacing.first().unwrap_or(&1);
        let delta = match dir {
            Direction::Up => spacing as i64,
            Direction::Down => -(spacing as i64),
        };
        let mut next = selector.value as i64 + delta;
        if next > config.upper_limit as i64 {
            next = config.lower_limit as i64;
        } else if next < config.lower_limit as i64 {
            next = config.upper_limit as i64;
        }
        let next = next as u32;

        let band = config.class.to_band().expect("validated AM/FM above");
        let freq = next as u16;
        let write_endpoint = self.write_endpoint_handle()?;
        self.scheduler.schedule(delays::STEP, move || {
            let _ = send_frame(
                &write_endpoint,
                Command::Tune,
                Op::Set,
                &rcc_proto::encode::tune_payload(band, freq),
            );
        });
        self.session.lock().unwrap().selector = Some(ProgramSelector::new(config.class, next));
        Ok(())
    }

    pub fn cancel(&self) -> Result<()> {
        self.require_open()?;
        self.scheduler.cancel_all();
        Ok(())
    }

    pub fn cancel_announcement(&self) -> Result<()> {
        self.require_open()?;
        Ok(())
    }

    pub fn close(&self) -> Result<()> {
        self.scheduler.cancel_all();
        self.listener.request_stop();
        self.write_endpoint.lock().unwrap().close();
        self.session.lock().unwrap().closed = true;
        Ok(())
    }

    pub fn get_program_information(&self) -> Result<ProgramInfo> {
        self.require_open()?;
        let selector = self
            .session
            .lock()
            .unwrap()
            .selector
            .ok_or(TunerError::NotInitialized)?;
        Ok(self
            .dispatcher
            .current_info()
            .filter(|info| info.tuned)
            .unwrap_or_else(|| ProgramInfo::dummy_for(selector)))
    }

    pub fn start_background_scan(&self) -> Result<()> {
        self.require_open()?;
        Err(TunerError::Unavailable("background scan is not implemented"))
    }

    pub fn get_program_list(&self) -> Result<(ProgramListResult, Vec<ProgramSelector>)> {
        self.require_open()?;
        Ok((ProgramListResult::Ok, Vec::new()))
    }

    pub fn set_analog_forced(&self, forced: bool) -> Result<()> {
        self.require_open()?;
        self.session.lock().unwrap().analog_forced = forced;
        Ok(())
    }

    pub fn is_analog_forced(&self) -> Result<bool> {
        self.require_open()?;
        Ok(self.session.lock().unwrap().analog_forced)
    }

    /// A cloned write handle the scheduler thread can use without holding
    /// the facade's own lock for the duration of the deferred task.
    ///
    /// Deferred tasks share the same underlying fd via `try_clone`, so a
    /// dropped clone here never closes the port out from under the
    /// facade's own writer.
    fn write_endpoint_handle(&self) -> Result<Arc<Mutex<SerialEndpoint>>> {
        let cloned = self.write_endpoint.lock().unwrap().try_clone()?;
        Ok(Arc::new(Mutex::new(cloned)))
    }
}

fn send_frame(endpoint: &Arc<Mutex<SerialEndpoint>>, cmd: Command, op: Op, payload: &[u8]) -> Result<()> {
    let frame = encode_frame(cmd, op, payload);
    endpoint.lock().unwrap().write(&frame)?;
    Ok(())
}
