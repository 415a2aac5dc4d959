//! Practice statistics — day/week/month totals, per-mantra breakdowns,
//! consecutive-day streaks, and the zero-filled analytics series.
//!
//! Everything here is a pure computation over a user's chanting records;
//! the handlers in [`api`] read the stores and delegate.

pub mod api;

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::dates;
use crate::mantra::store::Mantra;
use crate::tracker::types::ChantingRecord;

/// The backward streak walk gives up after a year.
const STREAK_SCAN_DAYS: i64 = 365;

/// Aggregate totals for one user.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PracticeStats {
    pub today: u64,
    pub week: u64,
    pub month: u64,
    pub streak: u32,
}

/// Per-mantra slice of the same totals. Mantras with no activity appear
/// with zeroes.
#[derive(Debug, Clone, Serialize)]
pub struct MantraStats {
    pub mantra: Mantra,
    pub today: u64,
    pub week: u64,
    pub month: u64,
}

/// Full stats report.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub stats: PracticeStats,
    #[serde(rename = "mantraStats")]
    pub mantra_stats: Vec<MantraStats>,
}

/// One day of the analytics time series.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPoint {
    pub date: String,
    pub total: u64,
    /// Mantra id → count for this day, zero-filled for every catalog mantra.
    pub by_mantra: HashMap<String, u64>,
}

/// Per-mantra total over an analytics window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MantraTotal {
    pub name: String,
    pub category: String,
    pub value: u64,
    pub mantra_id: String,
}

/// Summed chant count per day across a set of records.
pub fn daily_totals(records: &[ChantingRecord]) -> HashMap<String, u64> {
    let mut totals: HashMap<String, u64> = HashMap::new();
    for record in records {
        *totals.entry(record.chant_date.clone()).or_default() += record.chant_count;
    }
    totals
}

/// Current consecutive-day streak ending at `as_of`.
///
/// Walks backward one day at a time for up to a year. Day 0 (the reference
/// day) never breaks the walk on its own absence — a quiet reference day is
/// simply not counted, and earlier days still extend the streak. Day i > 0
/// with no activity stops the walk.
pub fn streak(totals_by_day: &HashMap<String, u64>, as_of: NaiveDate) -> u32 {
    let mut streak = 0;
    for i in 0..STREAK_SCAN_DAYS {
        let day = dates::day_string(as_of - Duration::days(i));
        if totals_by_day.get(&day).copied().unwrap_or(0) > 0 {
            streak += 1;
        } else if i > 0 {
            break;
        }
    }
    streak
}

/// Compute the full stats report from a user's complete record set.
pub fn compute_stats(
    records: &[ChantingRecord],
    mantras: &[Mantra],
    as_of: NaiveDate,
) -> StatsReport {
    let today = dates::day_string(as_of);
    let week_start = dates::day_string(dates::week_start(as_of));
    let month_start = dates::day_string(dates::month_start(as_of));

    let mut totals = PracticeStats {
        today: 0,
        week: 0,
        month: 0,
        streak: 0,
    };
    let mut per_mantra: HashMap<&str, (u64, u64, u64)> = HashMap::new();

    for record in records {
        let date = record.chant_date.as_str();
        let count = record.chant_count;
        let slot = per_mantra.entry(record.mantra_id.as_str()).or_default();

        if date >= month_start.as_str() && date <= today.as_str() {
            totals.month += count;
            slot.2 += count;
        }
        if date >= week_start.as_str() && date <= today.as_str() {
            totals.week += count;
            slot.1 += count;
        }
        if date == today {
            totals.today += count;
            slot.0 += count;
        }
    }

    totals.streak = streak(&daily_totals(records), as_of);

    let mantra_stats = mantras
        .iter()
        .map(|mantra| {
            let (today, week, month) = per_mantra
                .get(mantra.id.as_str())
                .copied()
                .unwrap_or_default();
            MantraStats {
                mantra: mantra.clone(),
                today,
                week,
                month,
            }
        })
        .collect();

    StatsReport {
        stats: totals,
        mantra_stats,
    }
}

/// Chronological daily series over an inclusive window, zero-filled for days
/// (and catalog mantras) with no activity.
pub fn analytics_series(
    records: &[ChantingRecord],
    mantras: &[Mantra],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<DayPoint> {
    let mut by_day: HashMap<&str, HashMap<&str, u64>> = HashMap::new();
    for record in records {
        *by_day
            .entry(record.chant_date.as_str())
            .or_default()
            .entry(record.mantra_id.as_str())
            .or_default() += record.chant_count;
    }

    let mut series = Vec::new();
    let mut day = start;
    while day <= end {
        let date = dates::day_string(day);
        let counts = by_day.get(date.as_str());
        let by_mantra: HashMap<String, u64> = mantras
            .iter()
            .map(|m| {
                let count = counts
                    .and_then(|c| c.get(m.id.as_str()).copied())
                    .unwrap_or(0);
                (m.id.clone(), count)
            })
            .collect();
        series.push(DayPoint {
            total: by_mantra.values().sum(),
            date,
            by_mantra,
        });
        day += Duration::days(1);
    }
    series
}

/// Per-mantra totals over a record set, sorted by descending count. Mantras
/// with no activity in the window are omitted.
pub fn mantra_totals(records: &[ChantingRecord], mantras: &[Mantra]) -> Vec<MantraTotal> {
    let mut sums: HashMap<&str, u64> = HashMap::new();
    for record in records {
        *sums.entry(record.mantra_id.as_str()).or_default() += record.chant_count;
    }

    let mut totals: Vec<MantraTotal> = mantras
        .iter()
        .filter_map(|mantra| {
            let value = sums.get(mantra.id.as_str()).copied()?;
            Some(MantraTotal {
                name: mantra.name.clone(),
                category: mantra.category.clone(),
                value,
                mantra_id: mantra.id.clone(),
            })
        })
        .collect();
    totals.sort_by(|a, b| b.value.cmp(&a.value));
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(user: &str, mantra: &str, date: &str, count: u64) -> ChantingRecord {
        let now = Utc::now();
        ChantingRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user.to_string(),
            mantra_id: mantra.to_string(),
            chant_date: date.to_string(),
            chant_count: count,
            created_at: now,
            updated_at: now,
        }
    }

    fn mantra(id: &str, name: &str) -> Mantra {
        Mantra {
            id: id.to_string(),
            name: name.to_string(),
            sanskrit: String::new(),
            transliteration: String::new(),
            description: String::new(),
            audio_url: None,
            category: "Prayer".to_string(),
            duration_seconds: 30,
            created_at: Utc::now(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        crate::dates::parse_day(s).unwrap()
    }

    #[test]
    fn test_streak_counts_consecutive_days() {
        // Activity on D, D-1, D-2; none on D-3.
        let records = vec![
            record("u", "m", "2024-01-10", 16),
            record("u", "m", "2024-01-09", 16),
            record("u", "m", "2024-01-08", 16),
            record("u", "m", "2024-01-06", 16),
        ];
        assert_eq!(streak(&daily_totals(&records), day("2024-01-10")), 3);
    }

    #[test]
    fn test_streak_gap_stops_walk() {
        // Zero on D-1 but activity on D and D-2: the gap at i=1 stops the walk.
        let records = vec![
            record("u", "m", "2024-01-10", 16),
            record("u", "m", "2024-01-08", 16),
        ];
        assert_eq!(streak(&daily_totals(&records), day("2024-01-10")), 1);
    }

    #[test]
    fn test_streak_quiet_reference_day_does_not_break() {
        // No activity on D itself, but D-1 and D-2 chanted: streak is 2.
        let records = vec![
            record("u", "m", "2024-01-09", 16),
            record("u", "m", "2024-01-08", 16),
        ];
        assert_eq!(streak(&daily_totals(&records), day("2024-01-10")), 2);
    }

    #[test]
    fn test_streak_zero_for_no_records() {
        assert_eq!(streak(&HashMap::new(), day("2024-01-10")), 0);
    }

    #[test]
    fn test_compute_stats_totals() {
        // 2024-01-10 is a Wednesday; week starts Sunday 2024-01-07.
        let as_of = day("2024-01-10");
        let mantras = vec![mantra("m1", "Maha Mantra"), mantra("m2", "Gayatri")];
        let records = vec![
            record("u", "m1", "2024-01-10", 108), // today
            record("u", "m2", "2024-01-08", 54),  // this week
            record("u", "m1", "2024-01-02", 27),  // this month, before week start
            record("u", "m1", "2023-12-31", 999), // previous month, excluded
        ];

        let report = compute_stats(&records, &mantras, as_of);
        assert_eq!(
            report.stats,
            PracticeStats {
                today: 108,
                week: 162,
                month: 189,
                streak: 1,
            }
        );

        // Every catalog mantra appears, zero-filled where inactive.
        assert_eq!(report.mantra_stats.len(), 2);
        assert_eq!(report.mantra_stats[0].today, 108);
        assert_eq!(report.mantra_stats[1].today, 0);
        assert_eq!(report.mantra_stats[1].week, 54);
    }

    #[test]
    fn test_compute_stats_empty_user() {
        let report = compute_stats(&[], &[mantra("m1", "Maha Mantra")], day("2024-01-10"));
        assert_eq!(
            report.stats,
            PracticeStats {
                today: 0,
                week: 0,
                month: 0,
                streak: 0,
            }
        );
        assert_eq!(report.mantra_stats.len(), 1);
    }

    #[test]
    fn test_analytics_series_zero_fills() {
        // Three-day window with activity only on the middle day.
        let mantras = vec![mantra("m1", "Maha Mantra")];
        let records = vec![record("u", "m1", "2024-01-02", 32)];

        let series = analytics_series(&records, &mantras, day("2024-01-01"), day("2024-01-03"));
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].date, "2024-01-01");
        assert_eq!(series[0].total, 0);
        assert_eq!(series[1].total, 32);
        assert_eq!(series[1].by_mantra.get("m1"), Some(&32));
        assert_eq!(series[2].total, 0);
        assert_eq!(series[2].by_mantra.get("m1"), Some(&0));
    }

    #[test]
    fn test_mantra_totals_sorted_descending() {
        let mantras = vec![mantra("m1", "Maha Mantra"), mantra("m2", "Gayatri")];
        let records = vec![
            record("u", "m1", "2024-01-01", 10),
            record("u", "m2", "2024-01-01", 40),
        ];

        let totals = mantra_totals(&records, &mantras);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].mantra_id, "m2");
        assert_eq!(totals[0].value, 40);
    }
}
