use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Emulation slot selector, always in `0..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(u8);

/// Rejected slot input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("slot {0} is out of range (0-7)")]
    OutOfRange(i64),
    #[error("'{0}' is not a slot number")]
    NotANumber(String),
}

impl Slot {
    pub const MAX: u8 = 7;

    pub fn new(value: u8) -> Result<Self, SlotError> {
        if value <= Self::MAX {
            Ok(Self(value))
        } else {
            Err(SlotError::OutOfRange(value.into()))
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Slot {
    type Error = SlotError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or(SlotError::OutOfRange(value))
    }
}

impl FromStr for Slot {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .parse()
            .map_err(|_| SlotError::NotANumber(s.to_string()))?;
        Slot::try_from(value)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
