//! Virtual `uinput` keyboard, grounded on the original's `uinput_init`/
//! `uinput_keyevt`: create one device advertising every key code the wheel
//! might send, then emit a key event followed by a sync report for each
//! button transition.

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};

const DEVICE_NAME: &str = "uinput-swid";

pub struct VirtualKeyboard {
    device: VirtualDevice,
}

impl VirtualKeyboard {
    /// Build a virtual device that can report every 8-bit key code, since
    /// the UART hands us raw bytes rather than a fixed button set.
    pub fn create() -> anyhow::Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for code in 0u16..0xff {
            keys.insert(Key::new(code));
        }

        let device = VirtualDeviceBuilder::new()?
            .name(DEVICE_NAME)
            .with_keys(&keys)?
            .build()?;

        tracing::info!(name = DEVICE_NAME, "virtual keyboard created");
        Ok(VirtualKeyboard { device })
    }

    pub fn key_down(&mut self, code: u8) -> anyhow::Result<()> {
        self.emit_key(code, 1)
    }

    pub fn key_up(&mut self, code: u8) -> anyhow::Result<()> {
        self.emit_key(code, 0)
    }

    fn emit_key(&mut self, code: u8, value: i32) -> anyhow::Result<()> {
        let events = [
            InputEvent::new(EventType::KEY, code as u16, value),
            InputEvent::new(EventType::SYNCHRONIZATION, 0, 0),
        ];
        self.device.emit(&events)?;
        Ok(())
    }
}
