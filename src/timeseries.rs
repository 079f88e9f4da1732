//! Follower time-series analytics: date normalization, weekly/monthly
//! grouping, period-over-period growth, performer ranking, and longitudinal
//! performance history.
//!
//! Every operation is a pure function over an immutable slice of records;
//! nothing here touches the network or the filesystem.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One period of the input table: a calendar date plus a follower count per
/// tracked account. A missing count means "no observation", never zero.
///
/// `BTreeMap` keeps entity iteration in lexical order, so every computation
/// that scans accounts is stable across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowerRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl FollowerRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, account: impl Into<String>, count: impl Into<Option<f64>>) -> Self {
        self.values.insert(account.into(), count.into());
        self
    }

    /// Follower count for `account`, flattening "column absent" and
    /// "column present but null" into one missing state.
    pub fn value(&self, account: &str) -> Option<f64> {
        self.values.get(account).copied().flatten()
    }
}

/// The entity with extreme growth over one consecutive period pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub account: String,
    pub growth: f64,
    #[serde(rename = "currentFollowers")]
    pub current_followers: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performers {
    pub best: Option<Performer>,
    pub worst: Option<Performer>,
}

/// How many period pairs each account was the single best or worst performer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceHistory {
    #[serde(rename = "bestPerformer")]
    pub best_performer: BTreeMap<String, u32>,
    #[serde(rename = "worstPerformer")]
    pub worst_performer: BTreeMap<String, u32>,
}

impl PerformanceHistory {
    pub fn times_best(&self, account: &str) -> u32 {
        self.best_performer.get(account).copied().unwrap_or(0)
    }

    pub fn times_worst(&self, account: &str) -> u32 {
        self.worst_performer.get(account).copied().unwrap_or(0)
    }
}

/// Parses a date in ISO (`YYYY-MM-DD`, with or without a time suffix) or US
/// slash (`M/D/YYYY`) form. Anything else is `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.contains('-') {
        let iso = trimmed.get(..10)?;
        return NaiveDate::parse_from_str(iso, "%Y-%m-%d").ok();
    }

    let mut parts = trimmed.split('/');
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// [`parse_date`] with the keep-rendering fallback: a malformed date becomes
/// today's date (logged) instead of aborting the whole refresh. Callers that
/// need strict adjacency should use [`parse_date`] and drop the row.
pub fn normalize_date(raw: &str) -> NaiveDate {
    match parse_date(raw) {
        Some(date) => date,
        None => {
            let fallback = Utc::now().date_naive();
            warn!(
                component = "timeseries",
                event = "date.parse_fallback",
                raw = raw,
                fallback = %fallback
            );
            fallback
        }
    }
}

/// Defensive ascending sort; the source may not guarantee order and every
/// previous/next computation here is index-adjacent.
pub fn sort_records(records: &mut [FollowerRecord]) {
    records.sort_by_key(|record| record.date);
}

/// Union of account names across all rows. Sampling a single row would miss
/// accounts that only appear later in the table.
pub fn entity_names(records: &[FollowerRecord]) -> Vec<String> {
    let mut names = BTreeSet::new();
    for record in records {
        for account in record.values.keys() {
            names.insert(account.clone());
        }
    }
    names.into_iter().collect()
}

/// Buckets records by the Sunday start of their week; the latest record in a
/// bucket is that week's representative. Output is ascending by bucket start.
pub fn group_by_week(records: &[FollowerRecord]) -> Vec<FollowerRecord> {
    group_by_bucket(records, week_start)
}

/// Buckets records by calendar month. Policy: the latest record in a bucket
/// wins, matching the weekly rule.
pub fn group_by_month(records: &[FollowerRecord]) -> Vec<FollowerRecord> {
    group_by_bucket(records, month_start)
}

fn group_by_bucket(
    records: &[FollowerRecord],
    bucket_start: fn(NaiveDate) -> NaiveDate,
) -> Vec<FollowerRecord> {
    let mut sorted = records.to_vec();
    sort_records(&mut sorted);

    let mut buckets: BTreeMap<NaiveDate, FollowerRecord> = BTreeMap::new();
    for record in sorted {
        buckets.insert(bucket_start(record.date), record);
    }
    buckets.into_values().collect()
}

fn week_start(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_sunday() as u64;
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Percent change between two optional observations. `None` when either side
/// is missing or the previous value is zero; a missing period must not be
/// coerced into a fabricated "dropped to zero" point.
pub fn growth_between(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let current = current?;
    let previous = previous?;
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

/// Period-over-period growth for one account. Same length as the input;
/// index 0 is a fixed `Some(0.0)` baseline.
pub fn growth_series(records: &[FollowerRecord], account: &str) -> Vec<Option<f64>> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            if i == 0 {
                Some(0.0)
            } else {
                growth_between(record.value(account), records[i - 1].value(account))
            }
        })
        .collect()
}

/// Absolute follower change at period `i`, independent of percent growth.
pub fn absolute_change(records: &[FollowerRecord], account: &str, i: usize) -> Option<f64> {
    if i == 0 || i >= records.len() {
        return None;
    }
    let current = records[i].value(account)?;
    let previous = records[i - 1].value(account)?;
    Some(current - previous)
}

/// Mean of the defined growth points after the index-0 baseline.
pub fn average_growth(records: &[FollowerRecord], account: &str) -> Option<f64> {
    let defined: Vec<f64> = growth_series(records, account)
        .into_iter()
        .skip(1)
        .flatten()
        .collect();
    if defined.is_empty() {
        return None;
    }
    Some(defined.iter().sum::<f64>() / defined.len() as f64)
}

/// Overall first-to-last percent change across the account's defined values.
pub fn trend(records: &[FollowerRecord], account: &str) -> Option<f64> {
    let mut defined = records.iter().filter_map(|record| record.value(account));
    let first = defined.next()?;
    let last = defined.last()?;
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

/// Single best and worst performer over one consecutive period pair, among
/// accounts with both observations defined. Strict comparisons keep the
/// earliest account in lexical order on ties; no eligible account means both
/// slots stay `None` (insufficient data, not an error).
pub fn rank_performers(current: &FollowerRecord, previous: &FollowerRecord) -> Performers {
    let mut best: Option<Performer> = None;
    let mut worst: Option<Performer> = None;
    let mut best_growth = f64::NEG_INFINITY;
    let mut worst_growth = f64::INFINITY;

    for (account, value) in &current.values {
        let Some(current_followers) = *value else {
            continue;
        };
        let Some(growth) = growth_between(Some(current_followers), previous.value(account)) else {
            continue;
        };

        if growth > best_growth {
            best_growth = growth;
            best = Some(Performer {
                account: account.clone(),
                growth,
                current_followers,
            });
        }
        if growth < worst_growth {
            worst_growth = growth;
            worst = Some(Performer {
                account: account.clone(),
                growth,
                current_followers,
            });
        }
    }

    Performers { best, worst }
}

/// One pass over every consecutive period pair, counting how often each
/// account was the single best or worst performer. O(periods × accounts).
pub fn build_history(records: &[FollowerRecord]) -> PerformanceHistory {
    let mut history = PerformanceHistory::default();

    for pair in records.windows(2) {
        let performers = rank_performers(&pair[1], &pair[0]);
        if let Some(best) = performers.best {
            *history.best_performer.entry(best.account).or_insert(0) += 1;
        }
        if let Some(worst) = performers.worst {
            *history.worst_performer.entry(worst.account).or_insert(0) += 1;
        }
    }

    history
}

/// Each account's share of the summed follower total in `latest`, as a
/// percent. Accounts with no observation are excluded from both the
/// numerator pool and the denominator sum; an all-null or zero-total period
/// yields an empty map.
pub fn market_share(latest: &FollowerRecord) -> BTreeMap<String, f64> {
    let total: f64 = latest.values.values().filter_map(|value| *value).sum();
    if total == 0.0 {
        return BTreeMap::new();
    }

    latest
        .values
        .iter()
        .filter_map(|(account, value)| value.map(|count| (account.clone(), count / total * 100.0)))
        .collect()
}
