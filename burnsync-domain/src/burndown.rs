use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, TimeZone};

use crate::Issue;

/// Creation and completion events that fell on one calendar day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DailyBucket {
    pub created: u32,
    pub completed: u32,
}

/// Cumulative counters as of `date`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BurndownPoint {
    pub date: NaiveDate,
    pub created: u32,
    pub completed: u32,
    pub remaining: u32,
}

/// Burndown series using the local calendar and today's local date.
pub fn burndown(issues: &[Issue]) -> Vec<BurndownPoint> {
    burndown_in(issues, &Local, Local::now().date_naive())
}

/// Groups creation and completion events by calendar day in `tz`.
///
/// A completion that predates its creation is counted on the creation day,
/// so cumulative completions never overtake cumulative creations.
pub fn daily_buckets_in<Tz: TimeZone>(issues: &[Issue], tz: &Tz) -> BTreeMap<NaiveDate, DailyBucket> {
    let mut buckets = BTreeMap::<NaiveDate, DailyBucket>::new();

    for issue in issues {
        let created_day = issue.created_at.with_timezone(tz).date_naive();
        buckets.entry(created_day).or_default().created += 1;

        let Some(completed_at) = issue.completed_at else {
            continue;
        };

        let mut completed_day = completed_at.with_timezone(tz).date_naive();
        if completed_day < created_day {
            log::warn!(
                "issue {} completed on {} before its creation on {}; counting completion on {}",
                issue.identifier,
                completed_day,
                created_day,
                created_day
            );
            completed_day = created_day;
        }
        buckets.entry(completed_day).or_default().completed += 1;
    }

    buckets
}

/// Cumulative series, one point per event day plus a trailing point for
/// `today` unless the last event day already is `today`. Events dated after
/// `today` are folded into `today`, so dates stay strictly ascending.
pub fn burndown_in<Tz: TimeZone>(issues: &[Issue], tz: &Tz, today: NaiveDate) -> Vec<BurndownPoint> {
    let mut buckets = daily_buckets_in(issues, tz);

    // events stamped after `today` (clock skew) are counted on `today`
    let from_today = buckets.split_off(&today);
    if !from_today.is_empty() {
        let mut today_bucket = DailyBucket::default();
        for (date, bucket) in from_today {
            if date > today {
                log::warn!(
                    "{} event(s) dated {date} are after today ({today}); counting them on {today}",
                    bucket.created + bucket.completed
                );
            }
            today_bucket.created += bucket.created;
            today_bucket.completed += bucket.completed;
        }
        buckets.insert(today, today_bucket);
    }

    let mut series = Vec::with_capacity(buckets.len() + 1);
    let mut total_created = 0u32;
    let mut total_completed = 0u32;

    for (date, bucket) in buckets {
        total_created += bucket.created;
        total_completed += bucket.completed;
        series.push(point(date, total_created, total_completed));
    }

    let ends_today = series.last().is_some_and(|last| last.date == today);
    if !ends_today {
        series.push(point(today, total_created, total_completed));
    }

    series
}

fn point(date: NaiveDate, created: u32, completed: u32) -> BurndownPoint {
    BurndownPoint {
        date,
        created,
        completed,
        remaining: created.saturating_sub(completed),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
    use proptest::prelude::*;

    use super::{burndown_in, daily_buckets_in, BurndownPoint};
    use crate::{Issue, IssueState, StateType};

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("timestamp")
            .with_timezone(&Utc)
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("date")
    }

    fn issue(identifier: &str, created_at: DateTime<Utc>, completed_at: Option<DateTime<Utc>>) -> Issue {
        let state_type = if completed_at.is_some() {
            StateType::Completed
        } else {
            StateType::Started
        };
        Issue {
            id: format!("id-{identifier}"),
            identifier: identifier.to_string(),
            title: format!("ghissue {identifier}"),
            state: IssueState {
                name: state_type.as_str().to_string(),
                state_type,
            },
            created_at,
            completed_at,
        }
    }

    fn expected(date: NaiveDate, created: u32, completed: u32, remaining: u32) -> BurndownPoint {
        BurndownPoint {
            date,
            created,
            completed,
            remaining,
        }
    }

    #[test]
    fn empty_input_yields_single_zero_point_for_today() {
        let today = date(2024, 6, 1);
        let series = burndown_in(&[], &Utc, today);
        assert_eq!(series, vec![expected(today, 0, 0, 0)]);
    }

    #[test]
    fn accumulates_created_and_completed_per_day() {
        let issues = vec![
            issue("SQ-1", at("2024-01-01T09:00:00Z"), Some(at("2024-01-03T10:00:00Z"))),
            issue("SQ-2", at("2024-01-01T10:00:00Z"), None),
            issue("SQ-3", at("2024-01-01T11:00:00Z"), None),
            issue("SQ-4", at("2024-01-02T09:00:00Z"), None),
            issue("SQ-5", at("2024-01-02T17:00:00Z"), None),
        ];

        let series = burndown_in(&issues, &Utc, date(2024, 2, 1));
        assert_eq!(
            series,
            vec![
                expected(date(2024, 1, 1), 3, 0, 3),
                expected(date(2024, 1, 2), 5, 0, 5),
                expected(date(2024, 1, 3), 5, 1, 4),
                expected(date(2024, 2, 1), 5, 1, 4),
            ]
        );
    }

    #[test]
    fn does_not_duplicate_today_when_last_event_is_today() {
        let issues = vec![issue(
            "SQ-1",
            at("2024-01-01T09:00:00Z"),
            Some(at("2024-01-03T10:00:00Z")),
        )];

        let series = burndown_in(&issues, &Utc, date(2024, 1, 3));
        assert_eq!(
            series,
            vec![
                expected(date(2024, 1, 1), 1, 0, 1),
                expected(date(2024, 1, 3), 1, 1, 0),
            ]
        );
    }

    #[test]
    fn same_day_completion_lands_in_one_bucket() {
        let issues = vec![issue(
            "SQ-1",
            at("2024-03-05T08:00:00Z"),
            Some(at("2024-03-05T18:00:00Z")),
        )];

        let buckets = daily_buckets_in(&issues, &Utc);
        assert_eq!(buckets.len(), 1);
        let bucket = buckets[&date(2024, 3, 5)];
        assert_eq!((bucket.created, bucket.completed), (1, 1));
    }

    #[test]
    fn buckets_follow_the_given_timezone() {
        let issues = vec![issue("SQ-1", at("2024-01-01T23:30:00Z"), None)];
        let tokyo = FixedOffset::east_opt(9 * 3600).expect("offset");

        let utc_buckets = daily_buckets_in(&issues, &Utc);
        let tokyo_buckets = daily_buckets_in(&issues, &tokyo);
        assert!(utc_buckets.contains_key(&date(2024, 1, 1)));
        assert!(tokyo_buckets.contains_key(&date(2024, 1, 2)));
    }

    #[test]
    fn completion_before_creation_is_counted_on_creation_day() {
        let issues = vec![issue(
            "SQ-1",
            at("2024-01-05T09:00:00Z"),
            Some(at("2024-01-02T09:00:00Z")),
        )];

        let series = burndown_in(&issues, &Utc, date(2024, 1, 5));
        assert_eq!(series, vec![expected(date(2024, 1, 5), 1, 1, 0)]);
    }

    #[test]
    fn events_after_today_are_counted_on_today() {
        let issues = vec![
            issue("SQ-1", at("2023-12-30T09:00:00Z"), None),
            issue("SQ-2", at("2024-01-02T00:00:05Z"), None),
            issue("SQ-3", at("2023-12-31T09:00:00Z"), Some(at("2024-01-03T09:00:00Z"))),
        ];

        let series = burndown_in(&issues, &Utc, date(2024, 1, 1));
        assert_eq!(
            series,
            vec![
                expected(date(2023, 12, 30), 1, 0, 1),
                expected(date(2023, 12, 31), 2, 0, 2),
                expected(date(2024, 1, 1), 3, 1, 2),
            ]
        );
    }

    #[test]
    fn arrival_order_does_not_matter() {
        let mut issues = vec![
            issue("SQ-1", at("2024-01-03T09:00:00Z"), None),
            issue("SQ-2", at("2024-01-01T09:00:00Z"), Some(at("2024-01-02T09:00:00Z"))),
            issue("SQ-3", at("2024-01-02T09:00:00Z"), None),
        ];
        let today = date(2024, 1, 10);
        let forward = burndown_in(&issues, &Utc, today);
        issues.reverse();
        assert_eq!(burndown_in(&issues, &Utc, today), forward);
    }

    fn arbitrary_issues() -> impl Strategy<Value = Vec<Issue>> {
        prop::collection::vec((0i64..24 * 90, prop::option::of(0i64..24 * 60)), 0..40).prop_map(
            |entries| {
                let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
                entries
                    .into_iter()
                    .enumerate()
                    .map(|(index, (created_hours, completed_after))| {
                        let created_at = base + Duration::hours(created_hours);
                        let completed_at =
                            completed_after.map(|hours| created_at + Duration::hours(hours));
                        issue(&format!("P-{index}"), created_at, completed_at)
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn series_is_strictly_ascending_and_consistent(
            issues in arbitrary_issues(),
            today_offset in 0u64..200,
        ) {
            let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(today_offset);
            let series = burndown_in(&issues, &Utc, today);

            prop_assert!(!series.is_empty());
            prop_assert_eq!(series.last().unwrap().date, today);
            for pair in series.windows(2) {
                prop_assert!(pair[0].date < pair[1].date);
                prop_assert!(pair[0].created <= pair[1].created);
                prop_assert!(pair[0].completed <= pair[1].completed);
            }
            for point in &series {
                prop_assert!(point.completed <= point.created);
                prop_assert_eq!(point.remaining, point.created - point.completed);
            }

            let last = series.last().unwrap();
            prop_assert_eq!(last.created as usize, issues.len());
            prop_assert_eq!(
                last.completed as usize,
                issues.iter().filter(|issue| !issue.is_open()).count()
            );
        }
    }
}
