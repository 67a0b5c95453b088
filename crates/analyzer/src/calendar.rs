//! Contribution calendar layout

use chrono::{Datelike, NaiveDate};
use devpulse_model::{ContributionCalendar, ContributionDay, MonthlyActivity};
use std::collections::{BTreeMap, HashMap};

/// Expand sparse days into a week-aligned sequence covering all of `year`.
///
/// Days missing from `sparse` become zero entries. The result starts with
/// one `None` per weekday before Jan 1 (Sunday = 0) and is padded with
/// `None` to a multiple of 7. If a date appears more than once in
/// `sparse`, the first occurrence wins.
pub fn densify(sparse: &[ContributionDay], year: i32) -> Vec<Option<ContributionDay>> {
    let Some(first) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return Vec::new();
    };

    let mut by_date: HashMap<NaiveDate, &ContributionDay> = HashMap::with_capacity(sparse.len());
    for day in sparse {
        by_date.entry(day.date).or_insert(day);
    }

    let lead = first.weekday().num_days_from_sunday() as usize;
    let mut dense: Vec<Option<ContributionDay>> = Vec::with_capacity(lead + 366 + 6);
    dense.resize(lead, None);

    for date in first.iter_days().take_while(|date| date.year() == year) {
        let day = match by_date.get(&date) {
            Some(day) => (*day).clone(),
            None => ContributionDay::empty(date),
        };
        dense.push(Some(day));
    }

    let remainder = dense.len() % 7;
    if remainder != 0 {
        dense.resize(dense.len() + 7 - remainder, None);
    }
    dense
}

/// Sum contribution counts per `YYYY-MM`, ascending by month
pub fn monthly_activity(days: &[Option<ContributionDay>]) -> Vec<MonthlyActivity> {
    let mut months: BTreeMap<String, u64> = BTreeMap::new();
    for day in days.iter().flatten() {
        *months.entry(day.date.format("%Y-%m").to_string()).or_default() += u64::from(day.count);
    }

    months
        .into_iter()
        .map(|(month, count)| MonthlyActivity { month, count })
        .collect()
}

/// Build the calendar for `year`; no source days means no data
pub fn build_calendar(year: i32, sparse: &[ContributionDay]) -> ContributionCalendar {
    if sparse.is_empty() {
        return ContributionCalendar::empty(year);
    }

    let days = densify(sparse, year);
    let total = days.iter().flatten().map(|day| u64::from(day.count)).sum();
    let monthly = monthly_activity(&days);

    ContributionCalendar {
        year,
        total,
        days,
        monthly,
    }
}
