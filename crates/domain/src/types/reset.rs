//! Periodic reset types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two recurring server-side reset events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetKind {
    /// Every day at the reset hour
    Daily,
    /// Once a week at the reset hour on the reset weekday
    Weekly,
}

impl ResetKind {
    /// Both kinds, in the order they are evaluated on each tick.
    pub const ALL: [Self; 2] = [Self::Daily, Self::Weekly];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl fmt::Display for ResetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            _ => Err(format!("Invalid ResetKind: {s}")),
        }
    }
}

/// Body returned by a reset trigger endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetResult {
    pub affected: i64,
    pub message: String,
}

/// Published view of the reset state.
///
/// `refetch_token` is the only signal views use to decide that their data
/// may be stale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetStatus {
    /// Countdown to the next daily reset
    pub daily: String,
    /// Countdown to the next weekly reset
    pub weekly: String,
    pub refetch_token: u64,
    pub simulated_daily_at: Option<DateTime<Utc>>,
    pub simulated_weekly_at: Option<DateTime<Utc>>,
}

impl ResetStatus {
    /// Countdown text for `kind`.
    #[must_use]
    pub fn countdown(&self, kind: ResetKind) -> &str {
        match kind {
            ResetKind::Daily => &self.daily,
            ResetKind::Weekly => &self.weekly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_case_insensitively() {
        assert_eq!("Daily".parse::<ResetKind>().unwrap(), ResetKind::Daily);
        assert_eq!("WEEKLY".parse::<ResetKind>().unwrap(), ResetKind::Weekly);
        assert!("monthly".parse::<ResetKind>().unwrap_err().contains("Invalid ResetKind"));
    }

    #[test]
    fn test_reset_result_tolerates_missing_fields() {
        let result: ResetResult = serde_json::from_str(r#"{ "affected": 12 }"#).unwrap();
        assert_eq!(result.affected, 12);
        assert!(result.message.is_empty());
    }
}
