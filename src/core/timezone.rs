//! Timezone used to stamp log records

use chrono::{DateTime, FixedOffset, Local, Utc};
use std::fmt;
use std::str::FromStr;

/// Timezone applied to every record a channel logger creates.
///
/// Accepted spellings: `UTC` (also `Z`, `Etc/UTC`), `Local`, or a fixed
/// offset such as `+02:00` / `-0530`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timezone {
    #[default]
    Utc,
    Local,
    Fixed(FixedOffset),
}

impl Timezone {
    /// Current time in this timezone
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.convert(Utc::now())
    }

    pub fn convert(&self, datetime: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Timezone::Utc => datetime.fixed_offset(),
            Timezone::Local => datetime.with_timezone(&Local).fixed_offset(),
            Timezone::Fixed(offset) => datetime.with_timezone(offset),
        }
    }

    fn parse_offset(s: &str) -> Option<FixedOffset> {
        let (sign, rest) = match s.as_bytes().first()? {
            b'+' => (1, &s[1..]),
            b'-' => (-1, &s[1..]),
            _ => return None,
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let hours: i32 = digits[..2].parse().ok()?;
        let minutes: i32 = digits[2..].parse().ok()?;
        if hours > 23 || minutes > 59 {
            return None;
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
    }
}

impl FromStr for Timezone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "utc" | "z" | "etc/utc" | "gmt" => Ok(Timezone::Utc),
            "local" => Ok(Timezone::Local),
            _ => Self::parse_offset(trimmed)
                .map(Timezone::Fixed)
                .ok_or_else(|| format!("Unsupported timezone: '{}'", s)),
        }
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timezone::Utc => write!(f, "UTC"),
            Timezone::Local => write!(f, "Local"),
            Timezone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}
