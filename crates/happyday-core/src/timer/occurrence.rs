//! Pure next-occurrence computation.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone};

use crate::reminder::TimeOfDay;

/// Next instant at `time_of_day` strictly after `after`, in `after`'s
/// timezone.
///
/// Builds today's date at `time_of_day`; if that instant is not strictly
/// after `after`, advances one calendar day. This covers both "reminder
/// set for a time already past today" and "daily reminder re-arming
/// after firing".
///
/// Wall-clock times skipped by a DST jump slide forward to the first
/// valid instant; ambiguous times resolve to the earlier instant.
pub fn next_occurrence<Tz: TimeZone>(time_of_day: TimeOfDay, after: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = after.timezone();
    let mut date = after.date_naive();
    // Two iterations suffice; the third guards pathological zones.
    for _ in 0..3 {
        if let Some(naive) = at_time(date, time_of_day) {
            if let Some(candidate) = resolve_local(&tz, naive) {
                if candidate > *after {
                    return candidate;
                }
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    after.clone() + Duration::days(1)
}

fn at_time(date: NaiveDate, time_of_day: TimeOfDay) -> Option<NaiveDateTime> {
    date.and_hms_opt(time_of_day.hour as u32, time_of_day.minute as u32, 0)
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => {
            // DST gap: probe forward until the wall clock exists again.
            let mut probe = naive;
            for _ in 0..8 {
                probe += Duration::minutes(15);
                match tz.from_local_datetime(&probe) {
                    LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => return Some(t),
                    LocalResult::None => continue,
                }
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike, Utc};
    use proptest::prelude::*;

    fn tod(hour: u8, minute: u8) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    #[test]
    fn later_today_stays_today() {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let after = tz.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap();
        let next = next_occurrence(tod(20, 0), &after);
        assert_eq!(next, tz.with_ymd_and_hms(2025, 6, 1, 20, 0, 0).unwrap());
    }

    #[test]
    fn earlier_today_rolls_to_tomorrow() {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let after = tz.with_ymd_and_hms(2025, 6, 1, 21, 0, 0).unwrap();
        let next = next_occurrence(tod(20, 0), &after);
        assert_eq!(next, tz.with_ymd_and_hms(2025, 6, 2, 20, 0, 0).unwrap());
    }

    #[test]
    fn exact_now_rolls_to_tomorrow() {
        // Strictly after: an instant equal to `after` is not a valid target.
        let after = Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap();
        let next = next_occurrence(tod(18, 0), &after);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 2, 18, 0, 0).unwrap());
    }

    #[test]
    fn crosses_month_boundary() {
        let after = Utc.with_ymd_and_hms(2025, 1, 31, 23, 0, 0).unwrap();
        let next = next_occurrence(tod(9, 0), &after);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap());
    }

    proptest! {
        #[test]
        fn always_strictly_future_within_a_day(
            hour in 0u8..24,
            minute in 0u8..60,
            offset_hours in -12i32..=12,
            epoch_offset_secs in 0i64..86_400,
        ) {
            let tz = FixedOffset::east_opt(offset_hours * 3600).unwrap();
            let after = DateTime::from_timestamp(1_750_000_000 + epoch_offset_secs, 0)
                .unwrap()
                .with_timezone(&tz);
            let t = tod(hour, minute);
            let next = next_occurrence(t, &after);

            prop_assert!(next > after);
            prop_assert!(next - after <= Duration::days(1));
            prop_assert_eq!(next.time().hour(), hour as u32);
            prop_assert_eq!(next.time().minute(), minute as u32);
        }
    }
}
