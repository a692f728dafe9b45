use std::fmt;
use std::str::FromStr;

use chrono::Datelike;

use crate::error::WatchError;

/// Academic season a term code can be resolved for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    /// Spring term, suffix `02`
    Spring,
    /// Summer term, suffix `05`
    Summer,
    /// Fall term, suffix `08`
    Fall,
}

impl Season {
    /// Term code for the upcoming instance of this season as seen from `now`.
    ///
    /// Spring registration for the next calendar year opens once the current
    /// spring term is over, so any date after April rolls spring forward a year.
    pub fn term_code<D: Datelike>(self, now: &D) -> String {
        let year = now.year();
        match self {
            Season::Spring if now.month() > 4 => format!("{}02", year + 1),
            Season::Spring => format!("{}02", year),
            Season::Summer => format!("{}05", year),
            Season::Fall => format!("{}08", year),
        }
    }
}

impl FromStr for Season {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" => Ok(Season::Fall),
            _ => Err(WatchError::InvalidSeason(s.to_string())),
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        };
        f.write_str(name)
    }
}

/// Resolve a season token (case-insensitive) to a term code relative to `now`.
pub fn resolve_term<D: Datelike>(season: &str, now: &D) -> Result<String, WatchError> {
    Ok(season.parse::<Season>()?.term_code(now))
}
