/**
 * Recurrence Expansion
 *
 * Expands a recurrence rule into concrete occurrences, starting one step
 * after the parent event. Each step advances the parent's start by
 * frequency × interval; expansion stops at the rule's `until` date or at
 * its instance cap, whichever comes first. Monthly and yearly steps use
 * calendar arithmetic, so a Jan 31 monthly series lands on Feb 28 (or 29)
 * and back on Mar 31.
 */

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Instances generated per series when the rule gives no explicit count
pub const DEFAULT_INSTANCE_CAP: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// Steps between occurrences; defaults to 1
    pub interval: Option<u32>,
    /// Inclusive end of the series
    pub until: Option<DateTime<Utc>>,
    /// Explicit instance count, capped at `DEFAULT_INSTANCE_CAP`
    pub count: Option<u32>,
}

/// One concrete occurrence of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// The start of step `n` (1-based), counted from the parent start
fn nth_start(start: DateTime<Utc>, frequency: Frequency, interval: u32, n: u32) -> Option<DateTime<Utc>> {
    let steps = interval.checked_mul(n)?;
    match frequency {
        Frequency::Daily => start.checked_add_signed(Duration::days(i64::from(steps))),
        Frequency::Weekly => start.checked_add_signed(Duration::weeks(i64::from(steps))),
        Frequency::Monthly => start.checked_add_months(Months::new(steps)),
        Frequency::Yearly => start.checked_add_months(Months::new(steps.checked_mul(12)?)),
    }
}

/// Expand a rule against the parent's `[start, end)` window.
///
/// The parent itself is not an occurrence; the first generated instance
/// is one step after it. Every occurrence keeps the parent's duration.
pub fn expand_rule(
    rule: &RecurrenceRule,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<Occurrence> {
    let interval = rule.interval.unwrap_or(1).max(1);
    let cap = rule
        .count
        .unwrap_or(DEFAULT_INSTANCE_CAP)
        .min(DEFAULT_INSTANCE_CAP);
    let duration = end - start;

    let mut occurrences = Vec::new();
    for n in 1..=cap {
        let Some(occ_start) = nth_start(start, rule.frequency, interval, n) else {
            break;
        };
        if let Some(until) = rule.until {
            if occ_start > until {
                break;
            }
        }
        occurrences.push(Occurrence {
            start_at: occ_start,
            end_at: occ_start + duration,
        });
    }
    occurrences
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_daily_rule_with_count_five() {
        let rule = RecurrenceRule {
            frequency: Frequency::Daily,
            interval: Some(1),
            until: None,
            count: Some(5),
        };
        let occurrences = expand_rule(&rule, ts(2025, 3, 1, 9), ts(2025, 3, 1, 10));

        assert_eq!(occurrences.len(), 5);
        for (i, occ) in occurrences.iter().enumerate() {
            assert_eq!(occ.start_at, ts(2025, 3, 2 + i as u32, 9));
            assert_eq!(occ.end_at - occ.start_at, Duration::hours(1));
        }
    }

    #[test]
    fn test_interval_skips_steps() {
        let rule = RecurrenceRule {
            frequency: Frequency::Weekly,
            interval: Some(2),
            until: None,
            count: Some(3),
        };
        let occurrences = expand_rule(&rule, ts(2025, 1, 6, 12), ts(2025, 1, 6, 13));

        assert_eq!(occurrences.len(), 3);
        assert_eq!(occurrences[0].start_at, ts(2025, 1, 20, 12));
        assert_eq!(occurrences[1].start_at, ts(2025, 2, 3, 12));
        assert_eq!(occurrences[2].start_at, ts(2025, 2, 17, 12));
    }

    #[test]
    fn test_until_stops_before_cap() {
        let rule = RecurrenceRule {
            frequency: Frequency::Daily,
            interval: None,
            until: Some(ts(2025, 3, 4, 23)),
            count: None,
        };
        let occurrences = expand_rule(&rule, ts(2025, 3, 1, 9), ts(2025, 3, 1, 10));

        // March 2, 3, 4 fit; March 5 is past `until`
        assert_eq!(occurrences.len(), 3);
        assert_eq!(occurrences.last().unwrap().start_at, ts(2025, 3, 4, 9));
    }

    #[test]
    fn test_monthly_clamps_short_months() {
        let rule = RecurrenceRule {
            frequency: Frequency::Monthly,
            interval: Some(1),
            until: None,
            count: Some(3),
        };
        let occurrences = expand_rule(&rule, ts(2025, 1, 31, 8), ts(2025, 1, 31, 9));

        assert_eq!(occurrences[0].start_at, ts(2025, 2, 28, 8));
        // Steps are counted from the parent, so March recovers the 31st
        assert_eq!(occurrences[1].start_at, ts(2025, 3, 31, 8));
        assert_eq!(occurrences[2].start_at, ts(2025, 4, 30, 8));
    }

    #[test]
    fn test_yearly_rule() {
        let rule = RecurrenceRule {
            frequency: Frequency::Yearly,
            interval: Some(1),
            until: None,
            count: Some(2),
        };
        let occurrences = expand_rule(&rule, ts(2024, 2, 29, 10), ts(2024, 2, 29, 11));

        // Non-leap years clamp to Feb 28
        assert_eq!(occurrences[0].start_at, ts(2025, 2, 28, 10));
        assert_eq!(occurrences[1].start_at, ts(2026, 2, 28, 10));
    }

    #[test]
    fn test_default_cap_bounds_unbounded_rules() {
        let rule = RecurrenceRule {
            frequency: Frequency::Daily,
            interval: Some(1),
            until: None,
            count: None,
        };
        let occurrences = expand_rule(&rule, ts(2025, 1, 1, 0), ts(2025, 1, 1, 1));
        assert_eq!(occurrences.len(), DEFAULT_INSTANCE_CAP as usize);
    }

    #[test]
    fn test_explicit_count_cannot_exceed_cap() {
        let rule = RecurrenceRule {
            frequency: Frequency::Daily,
            interval: Some(1),
            until: None,
            count: Some(10_000),
        };
        let occurrences = expand_rule(&rule, ts(2025, 1, 1, 0), ts(2025, 1, 1, 1));
        assert_eq!(occurrences.len(), DEFAULT_INSTANCE_CAP as usize);
    }

    #[test]
    fn test_zero_interval_treated_as_one() {
        let rule = RecurrenceRule {
            frequency: Frequency::Daily,
            interval: Some(0),
            until: None,
            count: Some(2),
        };
        let occurrences = expand_rule(&rule, ts(2025, 1, 1, 0), ts(2025, 1, 1, 1));
        assert_eq!(occurrences[0].start_at, ts(2025, 1, 2, 0));
        assert_eq!(occurrences[1].start_at, ts(2025, 1, 3, 0));
    }
}
