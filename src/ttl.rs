use crate::consts::DEFAULT_TTL;
use serde::{Serialize, Serializer};
use std::{
    fmt,
    str::FromStr,
    time::{Duration, SystemTime},
};
use thiserror::Error as ThisError;

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

const MAX_HOURS: u64 = 24;
const MAX_DAYS: u64 = 7;

#[derive(ThisError, Debug, PartialEq, Eq)]
#[error("Invalid ttl '{0}'. Valid TTLs are 1-24h or 1-7d")]
pub struct TtlError(pub String);

/// Lifetime of a dynamic namespace, e.g. `24h` or `7d`.
///
/// The original string is what the API receives; the parsed duration is only
/// used locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ttl {
    raw: String,
    duration: Duration,
}

impl Ttl {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Point in time at which a namespace created at `created` expires.
    pub fn expiry_from(&self, created: SystemTime) -> SystemTime {
        created + self.duration
    }
}

impl FromStr for Ttl {
    type Err = TtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TtlError(s.to_string());

        let (unit_index, _) = s.char_indices().last().ok_or_else(invalid)?;
        let (amount, unit) = s.split_at(unit_index);

        if amount.is_empty()
            || amount.starts_with('0')
            || !amount.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let amount: u64 = amount.parse().map_err(|_| invalid())?;

        let (unit_secs, max) = match unit {
            "h" => (HOUR, MAX_HOURS),
            "d" => (DAY, MAX_DAYS),
            _ => return Err(invalid()),
        };

        if amount == 0 || amount > max {
            return Err(invalid());
        }

        Ok(Ttl {
            raw: s.to_string(),
            duration: Duration::from_secs(amount * unit_secs),
        })
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Ttl {
            raw: DEFAULT_TTL.to_string(),
            duration: Duration::from_secs(MAX_HOURS * HOUR),
        }
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Ttl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}
