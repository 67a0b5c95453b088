//! DevPulse Metrics Analyzer
//!
//! Pure derivations over collected repositories and contribution days.

mod calendar;

pub use calendar::{build_calendar, densify, monthly_activity};

use devpulse_model::{ContributionDay, DerivedMetrics, LanguageCount, RepoSummary, RepoTotals};
use std::collections::HashMap;
use tracing::debug;

/// Number of languages kept in the histogram
pub const TOP_LANGUAGES: usize = 5;

/// Sum stars and forks over repositories that are not forks
pub fn compute_totals(repos: &[RepoSummary]) -> RepoTotals {
    repos
        .iter()
        .filter(|repo| !repo.fork)
        .fold(RepoTotals::default(), |totals, repo| RepoTotals {
            stars: totals.stars + repo.stargazers_count,
            forks: totals.forks + repo.forks_count,
        })
}

/// Count primary languages across all repositories (forks included).
///
/// Sorted by count descending; equal counts keep the order in which the
/// language was first seen. At most `top_n` entries are returned.
pub fn language_histogram(repos: &[RepoSummary], top_n: usize) -> Vec<LanguageCount> {
    let mut counts: Vec<LanguageCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for language in repos.iter().filter_map(|repo| repo.language.as_deref()) {
        match index.get(language) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(language, counts.len());
                counts.push(LanguageCount {
                    language: language.to_string(),
                    count: 1,
                });
            }
        }
    }

    // stable sort keeps first-seen order among ties
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(top_n);
    counts
}

/// Assemble the full metrics view from its inputs
pub fn derive_metrics(repos: &[RepoSummary], days: &[Option<ContributionDay>]) -> DerivedMetrics {
    let metrics = DerivedMetrics {
        totals: compute_totals(repos),
        languages: language_histogram(repos, TOP_LANGUAGES),
        monthly_activity: monthly_activity(days),
    };

    debug!(
        stars = metrics.totals.stars,
        forks = metrics.totals.forks,
        languages = metrics.languages.len(),
        "Derived metrics"
    );
    metrics
}
