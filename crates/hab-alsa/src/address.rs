//! `card=N;device=M` addressing, the same key-value shape the device
//! orchestrator uses for its own configuration strings.

use crate::error::{AlsaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardAddress {
    pub card: u32,
    pub device: u32,
}

impl CardAddress {
    /// ALSA device name for this address, e.g. `hw:1,0`.
    pub fn device_name(&self) -> String {
        format!("hw:{},{}", self.card, self.device)
    }

    pub fn parse(address: &str) -> Result<Self> {
        let mut card = None;
        let mut device = 0u32;
        for pair in address.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let Some((key, value)) = pair.split_once('=') else {
                return Err(AlsaError::InvalidArguments(format!(
                    "malformed address segment: {pair}"
                )));
            };
            match key.trim() {
                "card" => {
                    card = Some(value.trim().parse::<u32>().map_err(|_| {
                        AlsaError::InvalidArguments(format!("bad card number: {value}"))
                    })?)
                }
                "device" => {
                    device = value.trim().parse::<u32>().map_err(|_| {
                        AlsaError::InvalidArguments(format!("bad device number: {value}"))
                    })?
                }
                other => {
                    return Err(AlsaError::InvalidArguments(format!(
                        "unrecognised address key: {other}"
                    )))
                }
            }
        }
        let card = card.ok_or_else(|| AlsaError::InvalidArguments("missing card=N".into()))?;
        Ok(CardAddress { card, device })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_card_and_device() {
        let addr = CardAddress::parse("card=1;device=2").unwrap();
        assert_eq!(addr, CardAddress { card: 1, device: 2 });
        assert_eq!(addr.device_name(), "hw:1,2");
    }

    #[test]
    fn device_defaults_to_zero() {
        let addr = CardAddress::parse("card=0").unwrap();
        assert_eq!(addr.device, 0);
    }

    #[test]
    fn missing_card_is_invalid_arguments() {
        assert!(matches!(
            CardAddress::parse("device=1"),
            Err(AlsaError::InvalidArguments(_))
        ));
    }

    #[test]
    fn unknown_key_is_invalid_arguments() {
        assert!(matches!(
            CardAddress::parse("card=0;bogus=1"),
            Err(AlsaError::InvalidArguments(_))
        ));
    }
}
