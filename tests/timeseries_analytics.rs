use chrono::NaiveDate;
use flockboard::{
    absolute_change, average_growth, build_history, entity_names, group_by_month, group_by_week,
    growth_series, market_share, parse_date, rank_performers, trend, FollowerRecord,
};

fn date(raw: &str) -> NaiveDate {
    parse_date(raw).expect("test date should parse")
}

fn record(raw: &str) -> FollowerRecord {
    FollowerRecord::new(date(raw))
}

fn two_month_pair() -> Vec<FollowerRecord> {
    vec![
        record("2024-01-01").with_value("A", 100.0).with_value("B", 200.0),
        record("2024-02-01").with_value("A", 150.0).with_value("B", 180.0),
    ]
}

#[test]
fn growth_series_starts_at_zero_and_matches_worked_example() {
    let records = two_month_pair();

    assert_eq!(growth_series(&records, "A"), vec![Some(0.0), Some(50.0)]);
    assert_eq!(growth_series(&records, "B"), vec![Some(0.0), Some(-10.0)]);
}

#[test]
fn ranking_matches_worked_example() {
    let records = two_month_pair();
    let performers = rank_performers(&records[1], &records[0]);

    let best = performers.best.expect("A should rank best");
    assert_eq!(best.account, "A");
    assert_eq!(best.growth, 50.0);
    assert_eq!(best.current_followers, 150.0);

    let worst = performers.worst.expect("B should rank worst");
    assert_eq!(worst.account, "B");
    assert_eq!(worst.growth, -10.0);
    assert_eq!(worst.current_followers, 180.0);
}

#[test]
fn missing_observations_propagate_as_null_never_zero() {
    let records = vec![
        record("2024-01-01").with_value("A", 100.0).with_value("B", 200.0),
        record("2024-02-01").with_value("A", 150.0).with_value("B", None),
    ];

    assert_eq!(growth_series(&records, "B"), vec![Some(0.0), None]);

    // B is ineligible for the pair, so A takes both slots.
    let performers = rank_performers(&records[1], &records[0]);
    assert_eq!(performers.best.expect("A eligible").account, "A");
    assert_eq!(performers.worst.expect("A eligible").account, "A");
}

#[test]
fn zero_previous_value_is_not_computable() {
    let records = vec![
        record("2024-01-01").with_value("A", 0.0),
        record("2024-02-01").with_value("A", 500.0),
    ];

    assert_eq!(growth_series(&records, "A"), vec![Some(0.0), None]);
    let performers = rank_performers(&records[1], &records[0]);
    assert!(performers.best.is_none());
    assert!(performers.worst.is_none());
}

#[test]
fn ranking_on_insufficient_data_yields_none_not_error() {
    let single = vec![record("2024-01-01").with_value("A", 100.0)];
    let history = build_history(&single);
    assert!(history.best_performer.is_empty());
    assert!(history.worst_performer.is_empty());
    assert_eq!(history.times_best("A"), 0);
    assert_eq!(history.times_worst("never-seen"), 0);
}

#[test]
fn ties_keep_the_first_account_in_lexical_order() {
    // Both grow exactly 10%.
    let records = vec![
        record("2024-01-01").with_value("alpha", 100.0).with_value("beta", 200.0),
        record("2024-02-01").with_value("alpha", 110.0).with_value("beta", 220.0),
    ];

    let performers = rank_performers(&records[1], &records[0]);
    assert_eq!(performers.best.expect("tie").account, "alpha");
    assert_eq!(performers.worst.expect("tie").account, "alpha");
}

#[test]
fn history_counts_one_best_and_worst_per_eligible_pair() {
    let records = vec![
        record("2024-01-01").with_value("A", 100.0).with_value("B", 100.0),
        record("2024-02-01").with_value("A", 120.0).with_value("B", 110.0),
        record("2024-03-01").with_value("A", 121.0).with_value("B", 150.0),
        record("2024-04-01").with_value("A", 140.0).with_value("B", 149.0),
    ];

    let history = build_history(&records);
    let total_best: u32 = history.best_performer.values().sum();
    let total_worst: u32 = history.worst_performer.values().sum();
    assert_eq!(total_best, records.len() as u32 - 1);
    assert_eq!(total_worst, records.len() as u32 - 1);
    assert_eq!(history.times_best("A"), 2);
    assert_eq!(history.times_best("B"), 1);
    assert_eq!(history.times_worst("B"), 2);
}

#[test]
fn history_skips_pairs_with_no_eligible_account() {
    let records = vec![
        record("2024-01-01").with_value("A", 100.0),
        record("2024-02-01").with_value("A", None),
        record("2024-03-01").with_value("A", 120.0),
        record("2024-04-01").with_value("A", 130.0),
    ];

    let history = build_history(&records);
    let total_best: u32 = history.best_performer.values().sum();
    // Pairs 1 and 2 touch the null month; only the final pair counts.
    assert_eq!(total_best, 1);
    assert_eq!(history.times_best("A"), 1);
}

#[test]
fn market_share_excludes_nulls_and_sums_to_100() {
    let latest = record("2024-06-01")
        .with_value("A", 300.0)
        .with_value("B", 700.0)
        .with_value("C", None);

    let shares = market_share(&latest);
    assert_eq!(shares.len(), 2);
    assert!((shares["A"] - 30.0).abs() <= 1e-9);
    assert!((shares["B"] - 70.0).abs() <= 1e-9);
    assert!((shares.values().sum::<f64>() - 100.0).abs() <= 1e-9);

    let all_null = record("2024-06-01").with_value("A", None);
    assert!(market_share(&all_null).is_empty());
}

#[test]
fn monthly_grouping_sorts_input_and_keeps_latest_per_month() {
    let records = vec![
        record("2024-02-10").with_value("A", 210.0),
        record("2024-01-25").with_value("A", 130.0),
        record("2024-01-05").with_value("A", 100.0),
        record("2024-02-28").with_value("A", 220.0),
    ];

    let monthly = group_by_month(&records);
    assert_eq!(monthly.len(), 2);
    assert_eq!(monthly[0].value("A"), Some(130.0));
    assert_eq!(monthly[1].value("A"), Some(220.0));
}

#[test]
fn weekly_grouping_buckets_by_sunday_start() {
    // 2024-03-03 is a Sunday; the 4th..9th share its week.
    let records = vec![
        record("2024-03-04").with_value("A", 100.0),
        record("2024-03-08").with_value("A", 105.0),
        record("2024-03-10").with_value("A", 110.0),
    ];

    let weekly = group_by_week(&records);
    assert_eq!(weekly.len(), 2);
    assert_eq!(weekly[0].value("A"), Some(105.0));
    assert_eq!(weekly[1].value("A"), Some(110.0));
}

#[test]
fn entity_set_is_the_union_over_all_rows() {
    let records = vec![
        record("2024-01-01").with_value("late", None),
        record("2024-02-01").with_value("early", 5.0),
    ];
    assert_eq!(
        entity_names(&records),
        vec!["early".to_string(), "late".to_string()]
    );
}

#[test]
fn absolute_change_needs_both_operands() {
    let records = vec![
        record("2024-01-01").with_value("A", 100.0),
        record("2024-02-01").with_value("A", 160.0),
        record("2024-03-01").with_value("A", None),
    ];

    assert_eq!(absolute_change(&records, "A", 0), None);
    assert_eq!(absolute_change(&records, "A", 1), Some(60.0));
    assert_eq!(absolute_change(&records, "A", 2), None);
    assert_eq!(absolute_change(&records, "A", 9), None);
}

#[test]
fn average_growth_ignores_undefined_points() {
    let records = vec![
        record("2024-01-01").with_value("A", 100.0),
        record("2024-02-01").with_value("A", 110.0),
        record("2024-03-01").with_value("A", None),
        record("2024-04-01").with_value("A", 121.0),
    ];

    // Only the first pair is defined: +10%.
    assert_eq!(average_growth(&records, "A"), Some(10.0));
    assert_eq!(average_growth(&records, "missing"), None);
}

#[test]
fn trend_spans_first_to_last_defined_value() {
    let records = vec![
        record("2024-01-01").with_value("A", 100.0),
        record("2024-02-01").with_value("A", None),
        record("2024-03-01").with_value("A", 150.0),
    ];

    assert_eq!(trend(&records, "A"), Some(50.0));
    assert_eq!(trend(&records[..1], "A"), None);
}

#[test]
fn computations_are_idempotent_on_the_same_input() {
    let records = vec![
        record("2024-01-01").with_value("A", 100.0).with_value("B", 50.0),
        record("2024-02-01").with_value("A", 130.0).with_value("B", 45.0),
        record("2024-03-01").with_value("A", 125.0).with_value("B", 60.0),
    ];

    assert_eq!(growth_series(&records, "A"), growth_series(&records, "A"));
    assert_eq!(build_history(&records), build_history(&records));
    assert_eq!(
        rank_performers(&records[2], &records[1]),
        rank_performers(&records[2], &records[1])
    );
    assert_eq!(group_by_month(&records), group_by_month(&records));
}
