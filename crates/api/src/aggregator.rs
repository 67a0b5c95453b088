//! Dashboard aggregation
//!
//! Runs the independent fetches concurrently and publishes their results
//! into a snapshot that is replaced wholesale on every change.

use chrono::{Datelike, Utc};
use devpulse_analyzer::{build_calendar, derive_metrics};
use devpulse_collector::contributions::ContributionCollector;
use devpulse_collector::github::GithubCollector;
use devpulse_model::{ContributionCalendar, DashboardSnapshot, Slot};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Which account to aggregate and the initially selected year
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub account: String,
    pub year: i32,
}

impl AggregatorConfig {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            year: Utc::now().year(),
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }
}

struct State {
    snapshot: Arc<DashboardSnapshot>,
    /// Bumped on every year selection; results tagged with an older value are dropped.
    generation: u64,
}

/// Fetches, derives and publishes the dashboard for one account
pub struct StatsAggregator {
    account: String,
    github: GithubCollector,
    contributions: ContributionCollector,
    state: RwLock<State>,
}

impl StatsAggregator {
    pub fn new(
        config: AggregatorConfig,
        github: GithubCollector,
        contributions: ContributionCollector,
    ) -> Self {
        let snapshot = DashboardSnapshot::new(config.account.clone(), config.year);
        Self {
            account: config.account,
            github,
            contributions,
            state: RwLock::new(State {
                snapshot: Arc::new(snapshot),
                generation: 0,
            }),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.read().snapshot.clone()
    }

    /// Reload everything for the active year.
    ///
    /// Each result is published as soon as it arrives; a failed fetch
    /// publishes its empty value (or leaves the profile untouched).
    pub async fn refresh(&self) -> Arc<DashboardSnapshot> {
        let account = self.account.as_str();
        let (year, generation) = self.begin_year(None);
        info!(account = account, year = year, "Refreshing dashboard");

        tokio::join!(
            async {
                if let Some(profile) = self.github.load_profile(account).await {
                    self.publish(|snapshot| snapshot.profile = Some(profile));
                }
            },
            async {
                let orgs = self.github.load_organizations(account).await;
                self.publish(|snapshot| snapshot.organizations = Slot::Ready(orgs));
            },
            async {
                let repos = self.github.load_all_repositories(account).await;
                self.publish(|snapshot| snapshot.repositories = Slot::Ready(repos));
            },
            self.load_year(year, generation),
        );

        self.publish(|snapshot| snapshot.refreshed_at = Some(Utc::now()));
        self.snapshot()
    }

    /// Switch the contribution year and load it.
    ///
    /// The contributions slot goes back to pending before the request is
    /// issued. Returns `false` if a later selection superseded this one, in
    /// which case the result was discarded.
    pub async fn select_year(&self, year: i32) -> bool {
        let (year, generation) = self.begin_year(Some(year));
        self.load_year(year, generation).await
    }

    /// Claim the contributions slot for `year` (or the active year) and
    /// reset it to pending. The returned generation tags the fetch.
    fn begin_year(&self, year: Option<i32>) -> (i32, u64) {
        let mut state = self.write();
        let year = year.unwrap_or(state.snapshot.year);
        state.generation += 1;

        let mut next = DashboardSnapshot::clone(&state.snapshot);
        next.year = year;
        next.contributions = Slot::Pending;
        state.snapshot = Arc::new(with_metrics(next));
        (year, state.generation)
    }

    async fn load_year(&self, year: i32, generation: u64) -> bool {
        let sparse = self.contributions.load_contributions(&self.account, year).await;
        let calendar = build_calendar(year, &sparse);

        let mut state = self.write();
        if state.generation != generation || state.snapshot.year != year {
            debug!(year = year, "Discarding superseded contribution result");
            return false;
        }

        let mut next = DashboardSnapshot::clone(&state.snapshot);
        next.contributions = Slot::Ready(calendar);
        state.snapshot = Arc::new(with_metrics(next));
        true
    }

    /// Calendar for the active year, if it has resolved
    pub fn calendar(&self) -> Option<ContributionCalendar> {
        self.snapshot().contributions.as_ready().cloned()
    }

    fn publish(&self, change: impl FnOnce(&mut DashboardSnapshot)) {
        let mut state = self.write();
        let mut next = DashboardSnapshot::clone(&state.snapshot);
        change(&mut next);
        state.snapshot = Arc::new(with_metrics(next));
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Recompute metrics from the snapshot's current inputs
fn with_metrics(mut snapshot: DashboardSnapshot) -> DashboardSnapshot {
    let days = snapshot
        .contributions
        .as_ready()
        .map(|calendar| calendar.days.as_slice())
        .unwrap_or(&[]);

    snapshot.metrics = match snapshot.repositories.as_ready() {
        Some(repos) => Slot::Ready(derive_metrics(repos, days)),
        None => Slot::Pending,
    };
    snapshot
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use devpulse_collector::testing::{FnTransport, RecordedRequest, Reply};
    use devpulse_collector::CollectorConfig;
    use serde_json::{json, Value};
    use std::time::Duration;

    pub(crate) fn aggregator_with(
        year: i32,
        handler: impl Fn(&RecordedRequest) -> Reply + Send + Sync + 'static,
    ) -> (StatsAggregator, Arc<FnTransport>) {
        let config = CollectorConfig::anonymous().with_base_url("http://stub");
        let transport = Arc::new(FnTransport::new(handler));
        let aggregator = StatsAggregator::new(
            AggregatorConfig::new("octocat").with_year(year),
            GithubCollector::with_transport(config.clone(), transport.clone()),
            ContributionCollector::with_transport(config, transport.clone()),
        );
        (aggregator, transport)
    }

    fn repo_json(name: &str, stars: u64, forks: u64, fork: bool, language: &str) -> Value {
        json!({
            "name": name,
            "stargazers_count": stars,
            "forks_count": forks,
            "fork": fork,
            "language": language
        })
    }

    pub(crate) fn stub(req: &RecordedRequest) -> Reply {
        let url = req.url.as_str();
        if url.ends_with("/users/octocat") {
            Reply::json(json!({"login": "octocat", "public_repos": 2, "followers": 7}))
        } else if url.ends_with("/users/octocat/orgs") {
            Reply::json(json!([{"login": "github", "id": 9919, "avatar_url": "https://a/9919"}]))
        } else if url.contains("/users/octocat/repos") {
            Reply::json(json!([
                repo_json("hello", 10, 2, false, "Rust"),
                repo_json("linux", 100, 50, true, "C")
            ]))
        } else if let Some(year) = url.strip_prefix("http://stub/contributions/octocat?y=") {
            Reply::json(json!({
                "contributions": [
                    {"date": format!("{}-01-05", year), "count": 3, "level": 1},
                    {"date": format!("{}-02-01", year), "count": 1, "level": 1}
                ]
            }))
        } else {
            Reply::Status(404)
        }
    }

    #[tokio::test]
    async fn test_refresh_populates_every_slot() {
        let (aggregator, _) = aggregator_with(2024, stub);

        let snapshot = aggregator.refresh().await;
        assert_eq!(snapshot.profile.as_ref().unwrap().followers, 7);
        assert_eq!(snapshot.organizations.as_ready().unwrap().len(), 1);
        assert_eq!(snapshot.repositories.as_ready().unwrap().len(), 2);
        assert!(snapshot.refreshed_at.is_some());

        let metrics = snapshot.metrics.as_ready().unwrap();
        assert_eq!(metrics.totals.stars, 10);
        assert_eq!(metrics.totals.forks, 2);
        assert_eq!(metrics.languages.len(), 2);
        assert_eq!(metrics.monthly_activity[0].month, "2024-01");
        assert_eq!(metrics.monthly_activity[0].count, 3);

        let calendar = snapshot.contributions.as_ready().unwrap();
        assert_eq!(calendar.year, 2024);
        assert_eq!(calendar.total, 4);
        assert_eq!(calendar.days.iter().flatten().count(), 366);
    }

    #[tokio::test]
    async fn test_failures_resolve_to_empty_values() {
        let (aggregator, _) = aggregator_with(2024, |_| Reply::Fail);

        let snapshot = aggregator.refresh().await;
        assert!(snapshot.profile.is_none());
        assert_eq!(snapshot.organizations, Slot::Ready(Vec::new()));
        assert_eq!(snapshot.repositories, Slot::Ready(Vec::new()));
        assert_eq!(snapshot.metrics.as_ready().unwrap().totals.stars, 0);

        let calendar = snapshot.contributions.as_ready().unwrap();
        assert!(!calendar.has_data());
    }

    #[tokio::test]
    async fn test_profile_kept_when_later_refresh_fails() {
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = fail.clone();
        let (aggregator, _) = aggregator_with(2024, move |req| {
            if flag.load(std::sync::atomic::Ordering::SeqCst) {
                Reply::Fail
            } else {
                stub(req)
            }
        });

        aggregator.refresh().await;
        fail.store(true, std::sync::atomic::Ordering::SeqCst);
        let snapshot = aggregator.refresh().await;
        assert_eq!(snapshot.profile.as_ref().unwrap().public_repos, 2);
    }

    #[tokio::test]
    async fn test_year_switch_resets_slot_before_fetching() {
        let (aggregator, _) =
            aggregator_with(2024, |req| stub(req).after(Duration::from_millis(50)));

        let observed = tokio::join!(aggregator.select_year(2022), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            aggregator.snapshot()
        })
        .1;

        assert_eq!(observed.year, 2022);
        assert_eq!(observed.contributions, Slot::Pending);
        assert_eq!(aggregator.calendar().unwrap().year, 2022);
    }

    #[tokio::test]
    async fn test_stale_year_result_is_discarded() {
        let (aggregator, transport) = aggregator_with(2024, |req| {
            if req.url.ends_with("y=2023") {
                stub(req).after(Duration::from_millis(100))
            } else {
                stub(req)
            }
        });

        let (first, second) =
            tokio::join!(aggregator.select_year(2023), aggregator.select_year(2024));
        assert!(!first);
        assert!(second);

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.year, 2024);
        let calendar = snapshot.contributions.as_ready().unwrap();
        assert_eq!(calendar.year, 2024);
        assert!(calendar
            .days
            .iter()
            .flatten()
            .all(|day| day.date.year() == 2024));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_claims_year_before_loading() {
        let (aggregator, _) = aggregator_with(2024, stub);

        let (year, generation) = aggregator.begin_year(None);
        assert_eq!(year, 2024);
        assert_eq!(aggregator.snapshot().contributions, Slot::Pending);

        // a selection arriving after the claim supersedes it
        assert!(aggregator.select_year(2023).await);
        assert!(!aggregator.load_year(year, generation).await);
        assert_eq!(aggregator.calendar().unwrap().year, 2023);
    }

    #[tokio::test]
    async fn test_year_selected_during_refresh_wins() {
        let (aggregator, _) = aggregator_with(2024, |req| {
            if req.url.ends_with("y=2024") {
                stub(req).after(Duration::from_millis(100))
            } else {
                stub(req)
            }
        });

        let (_, selected) = tokio::join!(aggregator.refresh(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            aggregator.select_year(2023).await
        });
        assert!(selected);

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.year, 2023);
        assert_eq!(snapshot.contributions.as_ready().unwrap().year, 2023);
        assert!(snapshot.repositories.as_ready().is_some());
    }

    #[tokio::test]
    async fn test_malformed_token_goes_straight_to_public_mirror() {
        let config = CollectorConfig::anonymous()
            .with_base_url("http://stub")
            .with_token(Some("abc123".into()));
        let transport = Arc::new(FnTransport::new(stub));
        let aggregator = StatsAggregator::new(
            AggregatorConfig::new("octocat").with_year(2024),
            GithubCollector::with_transport(config.clone(), transport.clone()),
            ContributionCollector::with_transport(config, transport.clone()),
        );

        aggregator.select_year(2024).await;
        let urls = transport.urls();
        assert_eq!(urls, vec!["http://stub/contributions/octocat?y=2024"]);
        assert!(!urls.iter().any(|u| u.ends_with("/graphql")));
    }
}
