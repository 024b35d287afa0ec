//! Per-date aggregation of raw entries for the two calendar render modes.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::entry::{Entry, EntryBody};
use crate::models::user::UserRef;

/// How a calendar is being viewed: by the owner of the entries, or by a
/// visitor who only sees aggregate counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Owner,
    Community,
}

/// Aggregate for one date in community mode. `users` backs the count and is
/// never rendered per-user to a non-owner.
#[derive(Debug, Clone, Serialize)]
pub struct DayCount {
    pub count: usize,
    pub users: Vec<UserRef>,
}

/// Owner mode: each date maps directly to the viewer's own entry.
pub fn entry_map(rows: Vec<Entry>) -> BTreeMap<NaiveDate, EntryBody> {
    rows.into_iter().map(|e| (e.date, e.into())).collect()
}

/// Community mode: group by date, counting distinct users per date. A user
/// who logged more than once on one day counts once. Dates with no entries
/// are absent from the map.
pub fn community_counts(rows: Vec<(NaiveDate, UserRef)>) -> BTreeMap<NaiveDate, DayCount> {
    let mut by_date: BTreeMap<NaiveDate, DayCount> = BTreeMap::new();
    for (date, user) in rows {
        let day = by_date.entry(date).or_insert_with(|| DayCount {
            count: 0,
            users: Vec::new(),
        });
        if !day.users.iter().any(|u| u.id == user.id) {
            day.count += 1;
            day.users.push(user);
        }
    }
    by_date
}

/// What a calendar render actually has to work with. The two modes carry
/// different data, so they are distinct variants rather than a boolean flag
/// threaded through render code.
#[derive(Debug, Clone)]
pub enum CalendarData {
    Own(BTreeMap<NaiveDate, EntryBody>),
    Shared(BTreeMap<NaiveDate, DayCount>),
}

impl CalendarData {
    pub fn mode(&self) -> ViewMode {
        match self {
            CalendarData::Own(_) => ViewMode::Owner,
            CalendarData::Shared(_) => ViewMode::Community,
        }
    }

    /// Community data from a fetch outcome. A failed fetch renders as an
    /// empty month rather than an error page.
    pub fn shared_or_empty<E: std::fmt::Display>(
        result: Result<BTreeMap<NaiveDate, DayCount>, E>,
    ) -> Self {
        match result {
            Ok(counts) => CalendarData::Shared(counts),
            Err(e) => {
                tracing::warn!(error = %e, "Community fetch failed, rendering empty month");
                CalendarData::Shared(BTreeMap::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(name: &str) -> UserRef {
        UserRef {
            id: Uuid::new_v4(),
            name: name.into(),
            email: format!("{}@example.com", name),
            image: None,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn test_duplicate_user_counts_once() {
        let a = user("alice");
        let b = user("bob");
        let rows = vec![
            (date(5), a.clone()),
            (date(5), b.clone()),
            (date(5), a.clone()),
        ];

        let counts = community_counts(rows);
        let day = &counts[&date(5)];
        assert_eq!(day.count, 2);
        assert_eq!(day.users.len(), 2);
    }

    #[test]
    fn test_empty_dates_absent() {
        let counts = community_counts(vec![(date(1), user("alice"))]);
        assert_eq!(counts.len(), 1);
        assert!(!counts.contains_key(&date(2)));
    }

    #[test]
    fn test_counts_split_across_dates() {
        let a = user("alice");
        let rows = vec![(date(1), a.clone()), (date(2), a.clone())];

        let counts = community_counts(rows);
        assert_eq!(counts[&date(1)].count, 1);
        assert_eq!(counts[&date(2)].count, 1);
    }

    #[test]
    fn test_shared_or_empty_swallows_fetch_failure() {
        let failed: Result<BTreeMap<NaiveDate, DayCount>, String> =
            Err("connection refused".into());
        let data = CalendarData::shared_or_empty(failed);
        assert_eq!(data.mode(), ViewMode::Community);
        match data {
            CalendarData::Shared(counts) => assert!(counts.is_empty()),
            CalendarData::Own(_) => panic!("expected community data"),
        }
    }

    #[test]
    fn test_entry_map_keys_by_date() {
        let uid = Uuid::new_v4();
        let now = Utc::now();
        let rows = vec![
            Entry {
                user_id: uid,
                date: date(3),
                success: true,
                happy: false,
                notes: "ran 5k".into(),
                created_at: now,
                updated_at: now,
            },
            Entry {
                user_id: uid,
                date: date(4),
                success: false,
                happy: true,
                notes: String::new(),
                created_at: now,
                updated_at: now,
            },
        ];

        let map = entry_map(rows);
        assert_eq!(map.len(), 2);
        let e = &map[&date(3)];
        assert!(e.success);
        assert!(!e.happy);
        assert_eq!(e.notes, "ran 5k");
    }
}
