//! Integration tests for recurring-event expansion

use chrono::{Duration, TimeZone, Utc};
use collabhub::events::{expand_rule, Frequency, RecurrenceRule};
use pretty_assertions::assert_eq;

fn ts(y: i32, mo: u32, d: u32, h: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
}

#[test]
fn test_daily_series_of_five() {
    let rule = RecurrenceRule {
        frequency: Frequency::Daily,
        interval: Some(1),
        until: None,
        count: Some(5),
    };

    let occurrences = expand_rule(&rule, ts(2025, 6, 1, 14), ts(2025, 6, 1, 15));

    assert_eq!(occurrences.len(), 5);
    assert_eq!(occurrences[0].start_at, ts(2025, 6, 2, 14));
    assert_eq!(occurrences[4].start_at, ts(2025, 6, 6, 14));
    for occ in &occurrences {
        assert_eq!(occ.end_at - occ.start_at, Duration::hours(1));
    }
}

#[test]
fn test_until_and_count_whichever_stops_first() {
    // The count allows ten instances but `until` cuts the series at two
    let rule = RecurrenceRule {
        frequency: Frequency::Weekly,
        interval: Some(1),
        until: Some(ts(2025, 6, 16, 0)),
        count: Some(10),
    };
    let occurrences = expand_rule(&rule, ts(2025, 6, 2, 9), ts(2025, 6, 2, 10));
    assert_eq!(occurrences.len(), 2);

    // And the reverse: a far `until` with a small count
    let rule = RecurrenceRule {
        frequency: Frequency::Weekly,
        interval: Some(1),
        until: Some(ts(2026, 1, 1, 0)),
        count: Some(3),
    };
    let occurrences = expand_rule(&rule, ts(2025, 6, 2, 9), ts(2025, 6, 2, 10));
    assert_eq!(occurrences.len(), 3);
}

#[test]
fn test_multi_day_event_keeps_its_span() {
    let rule = RecurrenceRule {
        frequency: Frequency::Weekly,
        interval: Some(1),
        until: None,
        count: Some(2),
    };

    // A two-day workshop recurring weekly
    let occurrences = expand_rule(&rule, ts(2025, 9, 1, 9), ts(2025, 9, 2, 17));

    assert_eq!(occurrences[0].start_at, ts(2025, 9, 8, 9));
    assert_eq!(occurrences[0].end_at, ts(2025, 9, 9, 17));
    assert_eq!(occurrences[1].start_at, ts(2025, 9, 15, 9));
    assert_eq!(occurrences[1].end_at, ts(2025, 9, 16, 17));
}

#[test]
fn test_monthly_series_from_month_end() {
    let rule = RecurrenceRule {
        frequency: Frequency::Monthly,
        interval: Some(1),
        until: None,
        count: Some(4),
    };

    let occurrences = expand_rule(&rule, ts(2025, 10, 31, 12), ts(2025, 10, 31, 13));

    let starts: Vec<_> = occurrences.iter().map(|o| o.start_at).collect();
    assert_eq!(
        starts,
        vec![
            ts(2025, 11, 30, 12),
            ts(2025, 12, 31, 12),
            ts(2026, 1, 31, 12),
            ts(2026, 2, 28, 12),
        ]
    );
}
