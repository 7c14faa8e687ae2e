//! Health-check durations in Consul's `<n><unit>` notation.

use crate::{RegistrationError, Result};
use std::fmt;
use std::str::FromStr;

/// Unit of a health-check duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Seconds,
    Minutes,
}

impl TimeUnit {
    /// Suffix Consul expects after the magnitude.
    pub fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "m",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Ok(TimeUnit::Seconds),
            "m" | "min" | "mins" | "minute" | "minutes" => Ok(TimeUnit::Minutes),
            other => Err(RegistrationError::validation(format!(
                "Unsupported time unit '{}', expected seconds or minutes",
                other
            ))),
        }
    }
}

/// A validated health-check duration such as `10s` or `1m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CheckDuration {
    magnitude: u8,
    unit: TimeUnit,
}

impl CheckDuration {
    /// Create a duration; `magnitude` must be at least 1.
    pub fn new(magnitude: u8, unit: TimeUnit) -> Result<Self> {
        if magnitude < 1 {
            return Err(RegistrationError::validation(
                "Duration must be at least 1",
            ));
        }
        Ok(Self { magnitude, unit })
    }

    // Unchecked; only for constants with a nonzero magnitude.
    pub(crate) const fn seconds(magnitude: u8) -> Self {
        Self {
            magnitude,
            unit: TimeUnit::Seconds,
        }
    }

    pub(crate) const fn minutes(magnitude: u8) -> Self {
        Self {
            magnitude,
            unit: TimeUnit::Minutes,
        }
    }

    pub fn magnitude(&self) -> u8 {
        self.magnitude
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }
}

impl fmt::Display for CheckDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.suffix())
    }
}

impl FromStr for CheckDuration {
    type Err = RegistrationError;

    /// Parse `"15s"`, `"2m"` or `"3 minutes"`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);

        if unit.trim().is_empty() {
            return Err(RegistrationError::validation(format!(
                "Duration '{}' has no time unit",
                s
            )));
        }

        let magnitude = digits.parse::<u8>().map_err(|_| {
            RegistrationError::validation(format!("Invalid duration magnitude in '{}'", s))
        })?;

        Self::new(magnitude, unit.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(CheckDuration::new(10, TimeUnit::Seconds).unwrap().to_string(), "10s");
        assert_eq!(CheckDuration::minutes(1).to_string(), "1m");
    }

    #[test]
    fn test_zero_is_rejected() {
        let err = CheckDuration::new(0, TimeUnit::Minutes).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_parse() {
        assert_eq!("15s".parse::<CheckDuration>().unwrap(), CheckDuration::seconds(15));
        assert_eq!("2 minutes".parse::<CheckDuration>().unwrap(), CheckDuration::minutes(2));
        assert!("0s".parse::<CheckDuration>().is_err());
        assert!("15".parse::<CheckDuration>().is_err());
        assert!("s".parse::<CheckDuration>().is_err());
        assert!("300s".parse::<CheckDuration>().is_err());
    }

    #[test]
    fn test_unknown_unit_is_a_validation_error() {
        let err = "5h".parse::<CheckDuration>().unwrap_err();
        assert!(err.is_validation());
        assert!("hours".parse::<TimeUnit>().is_err());
        assert_eq!("Seconds".parse::<TimeUnit>().unwrap(), TimeUnit::Seconds);
    }
}
