//! Contribution calendar retrieval
//!
//! Tries the authenticated GraphQL calendar first and falls back to the
//! public contributions mirror when no usable token is configured or the
//! query fails.

use crate::transport::{ReqwestTransport, Transport};
use crate::{endpoint, CollectorConfig, CollectorError, Result};
use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, TimeZone, Utc};
use devpulse_model::{ContributionDay, ContributionLevel};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

const CALENDAR_QUERY: &str = "query($login: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $login) {
    contributionsCollection(from: $from, to: $to) {
      contributionCalendar {
        weeks {
          contributionDays {
            date
            contributionCount
            contributionLevel
          }
        }
      }
    }
  }
}";

/// Contribution data collector
pub struct ContributionCollector {
    transport: Arc<dyn Transport>,
    config: CollectorConfig,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CalendarData {
    user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    contributions_collection: CollectionNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionNode {
    contribution_calendar: CalendarNode,
}

#[derive(Debug, Deserialize)]
struct CalendarNode {
    weeks: Vec<WeekNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeekNode {
    contribution_days: Vec<DayNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DayNode {
    date: NaiveDate,
    contribution_count: u32,
    contribution_level: String,
}

#[derive(Debug, Deserialize)]
struct FallbackResponse {
    contributions: Vec<FallbackDay>,
}

#[derive(Debug, Deserialize)]
struct FallbackDay {
    date: NaiveDate,
    count: u32,
    level: u8,
}

/// Query window for a calendar year.
///
/// Runs from Jan 1 00:00:00 UTC to `now` for the current year, otherwise
/// to Dec 31 23:59:59 UTC. `None` if the year is outside chrono's range.
pub fn contribution_window(
    year: i32,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let from = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
    let to = if year == now.year() {
        now
    } else {
        Utc.with_ymd_and_hms(year, 12, 31, 23, 59, 59).single()?
    };
    Some((from, to))
}

impl ContributionCollector {
    pub fn new(config: CollectorConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: CollectorConfig, transport: Arc<dyn Transport>) -> Self {
        Self { transport, config }
    }

    /// Sparse contribution days for `year`; empty when both sources fail
    pub async fn load_contributions(&self, account: &str, year: i32) -> Vec<ContributionDay> {
        if let Some(token) = self.config.valid_token() {
            match self.fetch_calendar(account, year, token, Utc::now()).await {
                Ok(days) => {
                    info!(
                        account = account,
                        year = year,
                        days = days.len(),
                        "Loaded contribution calendar"
                    );
                    return days;
                }
                Err(e) => {
                    warn!(
                        account = account,
                        year = year,
                        error = %e,
                        "Calendar query failed, using public mirror"
                    );
                }
            }
        } else {
            debug!(account = account, year = year, "No usable token, using public mirror");
        }

        match self.fetch_public(account, year).await {
            Ok(days) => {
                info!(
                    account = account,
                    year = year,
                    days = days.len(),
                    "Loaded public contributions"
                );
                days
            }
            Err(e) => {
                warn!(account = account, year = year, error = %e, "Failed to load contributions");
                Vec::new()
            }
        }
    }

    async fn fetch_calendar(
        &self,
        account: &str,
        year: i32,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContributionDay>> {
        let (from, to) = contribution_window(year, now)
            .ok_or_else(|| CollectorError::Api(format!("Year out of range: {}", year)))?;

        let body = json!({
            "query": CALENDAR_QUERY,
            "variables": {
                "login": account,
                "from": from.to_rfc3339_opts(SecondsFormat::Secs, true),
                "to": to.to_rfc3339_opts(SecondsFormat::Secs, true),
            }
        });

        let text = self
            .transport
            .post_json(&self.config.graphql_url, Some(token), &body)
            .await?;
        let response: GraphqlResponse<CalendarData> = serde_json::from_str(&text)?;

        if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(CollectorError::Api(messages.join("; ")));
        }

        let user = response
            .data
            .and_then(|data| data.user)
            .ok_or_else(|| CollectorError::Api(format!("No calendar for {}", account)))?;

        user.contributions_collection
            .contribution_calendar
            .weeks
            .into_iter()
            .flat_map(|week| week.contribution_days)
            .map(|day| -> Result<ContributionDay> {
                let level = ContributionLevel::from_label(&day.contribution_level)
                    .map_err(|e| CollectorError::Api(e.to_string()))?;
                Ok(ContributionDay {
                    date: day.date,
                    count: day.contribution_count,
                    level,
                })
            })
            .collect()
    }

    async fn fetch_public(&self, account: &str, year: i32) -> Result<Vec<ContributionDay>> {
        let mut url = endpoint(&self.config.fallback_base, &[account])?;
        url.query_pairs_mut().append_pair("y", &year.to_string());
        let text = self.transport.get(url.as_str(), None).await?;
        let response: FallbackResponse = serde_json::from_str(&text)?;

        Ok(response
            .contributions
            .into_iter()
            .map(|day| ContributionDay {
                date: day.date,
                count: day.count,
                level: ContributionLevel::from(day.level),
            })
            .collect())
    }
}
