//! Embeddable stat-card images from public badge generators

use crate::{ModelError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

const README_STATS: &str = "https://github-readme-stats.vercel.app/api";
const TOP_LANGS: &str = "https://github-readme-stats.vercel.app/api/top-langs/";
const STREAK_STATS: &str = "https://nirzak-streak-stats.vercel.app/";
const TROPHIES: &str = "https://github-profile-trophy.vercel.app/";

/// A labelled image rendered by a third-party generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCard {
    pub label: String,
    pub src: String,
}

fn card(label: &str, base: &str, params: &[(&str, &str)]) -> Result<StatCard> {
    let url = Url::parse_with_params(base, params)
        .map_err(|e| ModelError::InvalidCardUrl(format!("{}: {}", base, e)))?;
    Ok(StatCard {
        label: label.to_string(),
        src: url.into(),
    })
}

/// Build the dashboard's stat cards for an account, in display order
pub fn stat_cards(account: &str) -> Result<Vec<StatCard>> {
    Ok(vec![
        card(
            "GitHub Stats",
            README_STATS,
            &[
                ("username", account),
                ("theme", "dark"),
                ("bg_color", "0d1117"),
                ("title_color", "4ade80"),
                ("text_color", "9ca3af"),
                ("icon_color", "4ade80"),
                ("border_color", "1f2937"),
                ("hide_border", "false"),
            ],
        )?,
        card(
            "Streak Stats",
            STREAK_STATS,
            &[
                ("user", account),
                ("theme", "dark"),
                ("background", "0d1117"),
                ("stroke", "1f2937"),
                ("ring", "4ade80"),
                ("fire", "4ade80"),
                ("currStreakLabel", "4ade80"),
                ("border", "1f2937"),
            ],
        )?,
        card(
            "Top Languages",
            TOP_LANGS,
            &[
                ("username", account),
                ("theme", "dark"),
                ("bg_color", "0d1117"),
                ("title_color", "4ade80"),
                ("text_color", "9ca3af"),
                ("border_color", "1f2937"),
                ("layout", "compact"),
            ],
        )?,
        card(
            "Trophies",
            TROPHIES,
            &[
                ("username", account),
                ("theme", "radical"),
                ("no-frame", "true"),
                ("column", "4"),
                ("margin-w", "4"),
                ("margin-h", "4"),
            ],
        )?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cards_in_display_order() {
        let cards = stat_cards("octocat").unwrap();
        let labels: Vec<&str> = cards.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["GitHub Stats", "Streak Stats", "Top Languages", "Trophies"]
        );
        assert!(cards[0].src.starts_with(README_STATS));
        assert!(cards[0].src.contains("username=octocat"));
        assert!(cards[1].src.contains("user=octocat"));
        assert!(cards[2].src.contains("layout=compact"));
    }

    #[test]
    fn test_account_is_query_encoded() {
        let cards = stat_cards("a b&c").unwrap();
        assert!(cards[0].src.contains("username=a+b%26c"));
    }
}
