use crate::error::{CooldownError, Result};
use std::fmt;

const SECS_PER_DAY: u64 = 86_400;
const SECS_PER_HOUR: u64 = 3_600;
const SECS_PER_MINUTE: u64 = 60;

const UNITS: [char; 4] = ['d', 'h', 'm', 's'];

/// A duration split into days, hours, minutes and seconds.
///
/// Built from seconds the lower units stay in range (hours < 24, minutes and
/// seconds < 60). Parsed from slicer text they are taken as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DurationComponents {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl DurationComponents {
    pub fn from_secs(secs: u64) -> Self {
        Self {
            days: secs / SECS_PER_DAY,
            hours: (secs % SECS_PER_DAY) / SECS_PER_HOUR,
            minutes: (secs % SECS_PER_HOUR) / SECS_PER_MINUTE,
            seconds: secs % SECS_PER_MINUTE,
        }
    }

    /// Total seconds, or `None` on overflow.
    pub fn total_secs(&self) -> Option<u64> {
        self.days
            .checked_mul(SECS_PER_DAY)?
            .checked_add(self.hours.checked_mul(SECS_PER_HOUR)?)?
            .checked_add(self.minutes.checked_mul(SECS_PER_MINUTE)?)?
            .checked_add(self.seconds)
    }

    fn values(&self) -> [u64; 4] {
        [self.days, self.hours, self.minutes, self.seconds]
    }
}

/// Slicer style: leading zero units are skipped, every unit after the first
/// emitted one is kept (`1d 0h 0m 0s`). Zero is `0s`.
impl fmt::Display for DurationComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut started = false;
        for (value, unit) in self.values().into_iter().zip(UNITS) {
            if started {
                write!(f, " {}{}", value, unit)?;
            } else if value > 0 {
                write!(f, "{}{}", value, unit)?;
                started = true;
            }
        }
        if !started {
            write!(f, "0s")?;
        }
        Ok(())
    }
}

pub fn format_duration(secs: u64) -> String {
    DurationComponents::from_secs(secs).to_string()
}

/// Parse `[Nd] [Nh] [Nm] [Ns]`. Units are optional but must appear in that
/// order, at most once each; whitespace between them is optional. A missing
/// unit counts as zero, so an empty value is zero seconds.
pub fn parse_duration(text: &str) -> Result<DurationComponents> {
    let invalid = || {
        CooldownError::InvalidTimeValue(format!(
            "'{}' is not a duration like '1d 2h 3m 4s'",
            text
        ))
    };

    let mut rest = text.trim();
    let mut values = [0u64; 4];
    let mut next_unit = 0;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(invalid());
        }
        let (digits, tail) = rest.split_at(digits_end);

        let mut chars = tail.chars();
        let unit = chars.next().ok_or_else(invalid)?.to_ascii_lowercase();
        let position = UNITS[next_unit..]
            .iter()
            .position(|u| *u == unit)
            .ok_or_else(invalid)?
            + next_unit;

        values[position] = digits.parse().map_err(|_| invalid())?;
        next_unit = position + 1;
        rest = chars.as_str().trim_start();
    }

    let [days, hours, minutes, seconds] = values;
    Ok(DurationComponents {
        days,
        hours,
        minutes,
        seconds,
    })
}
