//! Domain models for DevPulse

use crate::{ModelError, Result, Slot};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Account-level counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
}

/// Countable facts about one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub fork: bool,
    pub language: Option<String>,
}

/// An organization the account belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMembership {
    pub login: String,
    pub id: u64,
    pub avatar_url: String,
}

/// Intensity bucket of a contribution day, ordinal 0-4
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(into = "u8", from = "u8")]
pub enum ContributionLevel {
    #[default]
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Max = 4,
}

impl ContributionLevel {
    /// Map a GraphQL `ContributionLevel` label onto its ordinal
    pub fn from_label(label: &str) -> Result<Self> {
        match label {
            "NONE" => Ok(Self::None),
            "FIRST_QUARTILE" => Ok(Self::Low),
            "SECOND_QUARTILE" => Ok(Self::Medium),
            "THIRD_QUARTILE" => Ok(Self::High),
            "FOURTH_QUARTILE" => Ok(Self::Max),
            other => Err(ModelError::UnknownLevel(other.to_string())),
        }
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

impl From<u8> for ContributionLevel {
    /// Values above 4 saturate at `Max`
    fn from(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Low,
            2 => Self::Medium,
            3 => Self::High,
            _ => Self::Max,
        }
    }
}

impl From<ContributionLevel> for u8 {
    fn from(level: ContributionLevel) -> Self {
        level.ordinal()
    }
}

/// Activity for a single calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionDay {
    pub date: NaiveDate,
    pub count: u32,
    pub level: ContributionLevel,
}

impl ContributionDay {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            count: 0,
            level: ContributionLevel::None,
        }
    }
}

/// Star and fork totals over original (non-fork) repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepoTotals {
    pub stars: u64,
    pub forks: u64,
}

/// One entry of the language histogram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCount {
    pub language: String,
    pub count: usize,
}

/// Contributions summed over one `YYYY-MM` month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyActivity {
    pub month: String,
    pub count: u64,
}

/// Aggregates derived from repositories and the active contribution year
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub totals: RepoTotals,
    pub languages: Vec<LanguageCount>,
    pub monthly_activity: Vec<MonthlyActivity>,
}

/// Week-aligned contribution calendar for one year
///
/// `days` starts with `None` padding so that index 0 falls on a Sunday and
/// its length is a multiple of 7. An empty `days` means no data was
/// available for the year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionCalendar {
    pub year: i32,
    pub total: u64,
    pub days: Vec<Option<ContributionDay>>,
    pub monthly: Vec<MonthlyActivity>,
}

impl ContributionCalendar {
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            total: 0,
            days: Vec::new(),
            monthly: Vec::new(),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.days.is_empty()
    }

    /// Columns of seven days, Sunday first
    pub fn weeks(&self) -> impl Iterator<Item = &[Option<ContributionDay>]> {
        self.days.chunks(7)
    }
}

/// Read-only view handed to the presentation layer
///
/// `profile` stays `None` until a profile fetch succeeds; a failed fetch
/// leaves it as a placeholder rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub account: String,
    pub year: i32,
    pub profile: Option<Profile>,
    pub organizations: Slot<Vec<OrgMembership>>,
    pub repositories: Slot<Vec<RepoSummary>>,
    pub metrics: Slot<DerivedMetrics>,
    pub contributions: Slot<ContributionCalendar>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl DashboardSnapshot {
    pub fn new(account: impl Into<String>, year: i32) -> Self {
        Self {
            account: account.into(),
            year,
            profile: None,
            organizations: Slot::Pending,
            repositories: Slot::Pending,
            metrics: Slot::Pending,
            contributions: Slot::Pending,
            refreshed_at: None,
        }
    }
}
