use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Tooth in FDI two-digit notation: quadrant 1-4, position 1-8.
/// Written as `tooth11` .. `tooth48`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToothPosition {
    quadrant: u8,
    position: u8,
}

impl ToothPosition {
    pub fn new(quadrant: u8, position: u8) -> Option<Self> {
        ((1..=4).contains(&quadrant) && (1..=8).contains(&position))
            .then_some(Self { quadrant, position })
    }

    pub fn quadrant(&self) -> u8 {
        self.quadrant
    }

    pub fn position(&self) -> u8 {
        self.position
    }

    /// All 32 permanent teeth, quadrant by quadrant.
    pub fn all() -> impl Iterator<Item = ToothPosition> {
        (1..=4u8).flat_map(|quadrant| (1..=8u8).map(move |position| ToothPosition { quadrant, position }))
    }
}

impl fmt::Display for ToothPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tooth{}{}", self.quadrant, self.position)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidToothPosition(pub String);

impl fmt::Display for InvalidToothPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown tooth position '{}'", self.0)
    }
}

impl std::error::Error for InvalidToothPosition {}

impl FromStr for ToothPosition {
    type Err = InvalidToothPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidToothPosition(s.to_string());
        let digits = s.strip_prefix("tooth").ok_or_else(err)?.as_bytes();
        match digits {
            [q, p] if q.is_ascii_digit() && p.is_ascii_digit() => {
                ToothPosition::new(q - b'0', p - b'0').ok_or_else(err)
            }
            _ => Err(err()),
        }
    }
}

impl Serialize for ToothPosition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ToothPosition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToothCondition {
    #[default]
    #[serde(rename = "none")]
    Healthy,
    Cavity,
    Filling,
    Crown,
    Missing,
    RootCanal,
    Extraction,
}

impl FromStr for ToothCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("unknown tooth condition '{}'", s))
    }
}

/// Per-tooth findings. Positions never recorded read as healthy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DentalChart(BTreeMap<ToothPosition, ToothCondition>);

impl DentalChart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a chart from untyped `toothNN -> condition` pairs.
    pub fn from_entries<'a, I>(entries: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut chart = Self::new();
        for (tooth, condition) in entries {
            let position: ToothPosition = tooth.parse().map_err(|e: InvalidToothPosition| e.to_string())?;
            chart.set(position, condition.parse()?);
        }
        Ok(chart)
    }

    pub fn condition(&self, position: ToothPosition) -> ToothCondition {
        self.0.get(&position).copied().unwrap_or_default()
    }

    pub fn set(&mut self, position: ToothPosition, condition: ToothCondition) {
        self.0.insert(position, condition);
    }

    /// Teeth with a recorded finding other than healthy.
    pub fn findings(&self) -> impl Iterator<Item = (ToothPosition, ToothCondition)> + '_ {
        self.0
            .iter()
            .filter(|(_, condition)| **condition != ToothCondition::Healthy)
            .map(|(position, condition)| (*position, *condition))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
