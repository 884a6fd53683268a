use chrono::{Local, NaiveDate, TimeZone};

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;
const WEEK_MS: i64 = 604_800_000;

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn local_date(timestamp: i64) -> Option<NaiveDate> {
    Local
        .timestamp_millis_opt(timestamp)
        .single()
        .map(|dt| dt.date_naive())
}

fn calendar_date(timestamp: i64) -> String {
    local_date(timestamp)
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Relative age label: `now`, `{n}m`, `{n}h`, `{n}d`, then `dd/mm/yyyy`.
/// Each bucket starts exactly at its threshold, so 60_000 ms is `1m`.
pub fn format_age(timestamp: i64, now: i64) -> String {
    let diff = now.saturating_sub(timestamp);
    if diff < MINUTE_MS {
        "now".to_string()
    } else if diff < HOUR_MS {
        format!("{}m", diff / MINUTE_MS)
    } else if diff < DAY_MS {
        format!("{}h", diff / HOUR_MS)
    } else if diff < WEEK_MS {
        format!("{}d", diff / DAY_MS)
    } else {
        calendar_date(timestamp)
    }
}

/// `Today`, `Yesterday` or `dd/mm/yyyy`, on local calendar days.
pub fn date_label(timestamp: i64, now: i64) -> String {
    let (Some(day), Some(today)) = (local_date(timestamp), local_date(now)) else {
        return calendar_date(timestamp);
    };
    if day == today {
        "Today".to_string()
    } else if Some(day) == today.pred_opt() {
        "Yesterday".to_string()
    } else {
        calendar_date(timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000_000;

    #[test]
    fn buckets_start_at_their_threshold() {
        assert_eq!(format_age(NOW, NOW), "now");
        assert_eq!(format_age(NOW - 59_999, NOW), "now");
        assert_eq!(format_age(NOW - 60_000, NOW), "1m");
        assert_eq!(format_age(NOW - 3_599_999, NOW), "59m");
        assert_eq!(format_age(NOW - 3_600_000, NOW), "1h");
        assert_eq!(format_age(NOW - 86_400_000, NOW), "1d");
        assert_eq!(format_age(NOW - 6 * 86_400_000, NOW), "6d");
    }

    #[test]
    fn future_timestamps_read_as_now() {
        assert_eq!(format_age(NOW + 10_000, NOW), "now");
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        assert_eq!(format_age(i64::MIN, NOW), "-");
        assert_eq!(format_age(i64::MAX, NOW), "now");
        assert_eq!(format_age(i64::MAX, i64::MIN), "now");
        assert_eq!(format_age(0, i64::MAX), calendar_date(0));
    }

    #[test]
    fn a_week_or_older_shows_the_date() {
        let ts = NOW - 604_800_000;
        let expected = Local
            .timestamp_millis_opt(ts)
            .unwrap()
            .format("%d/%m/%Y")
            .to_string();
        assert_eq!(format_age(ts, NOW), expected);
        assert_eq!(expected.len(), 10);
    }

    #[test]
    fn date_labels_follow_calendar_days() {
        assert_eq!(date_label(NOW, NOW), "Today");
        let yesterday = NOW - 86_400_000;
        assert_eq!(date_label(yesterday, NOW), "Yesterday");
        let older = NOW - 3 * 86_400_000;
        assert_eq!(date_label(older, NOW), calendar_date(older));
    }
}
