use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Wall-clock time of day with minute resolution, written as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimeOfDayError(String);

impl fmt::Display for ParseTimeOfDayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid time of day '{}', expected HH:MM", self.0)
    }
}

impl std::error::Error for ParseTimeOfDayError {}

impl TimeOfDay {
    pub fn new(hour: u16, minute: u16) -> Option<Self> {
        if hour >= 24 || minute >= 60 {
            return None;
        }
        Some(Self(hour * 60 + minute))
    }

    /// Saturates at 23:59; meant for literal schedule constants.
    pub const fn saturating(hour: u16, minute: u16) -> Self {
        let minutes = hour.saturating_mul(60).saturating_add(minute);
        if minutes >= MINUTES_PER_DAY {
            return Self(MINUTES_PER_DAY - 1);
        }
        Self(minutes)
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn minutes_since_midnight(&self) -> u16 {
        self.0
    }

    pub fn hour(&self) -> u16 {
        self.0 / 60
    }

    pub fn minute(&self) -> u16 {
        self.0 % 60
    }

    /// `None` once the result would pass midnight.
    pub fn checked_add_minutes(&self, minutes: u32) -> Option<Self> {
        let total = u32::from(self.0) + minutes;
        u16::try_from(total).ok().and_then(Self::from_minutes)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = ParseTimeOfDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTimeOfDayError(s.to_string());
        let (hour, minute) = s.split_once(':').ok_or_else(err)?;
        if hour.len() != 2 || minute.len() != 2 {
            return Err(err());
        }
        let hour: u16 = hour.parse().map_err(|_| err())?;
        let minute: u16 = minute.parse().map_err(|_| err())?;
        Self::new(hour, minute).ok_or_else(err)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
