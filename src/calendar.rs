//! Calendar arithmetic used by the timeline.
//!
//! Instants are `NaiveDateTime` in local wall-clock time; the chart never deals
//! with offsets, so DST transitions cannot shift bars.

use chrono::{Datelike, Duration, Locale, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

const MS_PER_SECOND: f64 = 1_000.0;
const MS_PER_MINUTE: f64 = 60.0 * MS_PER_SECOND;
const MS_PER_HOUR: f64 = 60.0 * MS_PER_MINUTE;
const MS_PER_DAY: f64 = 24.0 * MS_PER_HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

impl TimeUnit {
    fn fixed_millis(self) -> Option<f64> {
        match self {
            TimeUnit::Second => Some(MS_PER_SECOND),
            TimeUnit::Minute => Some(MS_PER_MINUTE),
            TimeUnit::Hour => Some(MS_PER_HOUR),
            TimeUnit::Day => Some(MS_PER_DAY),
            TimeUnit::Month | TimeUnit::Year => None,
        }
    }
}

/// Parse a date or date-time string. Bare dates resolve to midnight.
pub fn parse(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d.%m.%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Format with a strftime pattern in the locale named by `language`.
pub fn format(instant: NaiveDateTime, pattern: &str, language: &str) -> String {
    instant
        .and_utc()
        .format_localized(pattern, locale(language))
        .to_string()
}

/// Map a short language code ("en", "de", "pt-br", ...) to a chrono locale.
pub fn locale(language: &str) -> Locale {
    match language.trim().to_lowercase().replace('_', "-").as_str() {
        "es" => Locale::es_ES,
        "ru" => Locale::ru_RU,
        "pt" | "pt-br" | "ptbr" => Locale::pt_BR,
        "fr" => Locale::fr_FR,
        "tr" => Locale::tr_TR,
        "zh" | "zh-cn" => Locale::zh_CN,
        "de" => Locale::de_DE,
        "hu" => Locale::hu_HU,
        "it" => Locale::it_IT,
        "ja" => Locale::ja_JP,
        "ko" => Locale::ko_KR,
        _ => Locale::en_US,
    }
}

/// Add `amount` units. Fixed units accept fractions (rounded to the
/// millisecond); month and year steps are calendar-aware and truncate the
/// amount to whole units, clamping to the end of shorter months.
pub fn add(instant: NaiveDateTime, amount: f64, unit: TimeUnit) -> NaiveDateTime {
    if let Some(ms) = unit.fixed_millis() {
        let delta = (amount * ms).round() as i64;
        return instant
            .checked_add_signed(Duration::milliseconds(delta))
            .unwrap_or(instant);
    }
    let months = match unit {
        TimeUnit::Year => amount.trunc() as i64 * 12,
        _ => amount.trunc() as i64,
    };
    let shifted = if months >= 0 {
        instant.checked_add_months(Months::new(months as u32))
    } else {
        instant.checked_sub_months(Months::new(months.unsigned_abs() as u32))
    };
    shifted.unwrap_or(instant)
}

/// `a - b` expressed in `unit`. Fixed units are fractional; months and
/// years count whole calendar periods.
pub fn diff(a: NaiveDateTime, b: NaiveDateTime, unit: TimeUnit) -> f64 {
    if let Some(ms) = unit.fixed_millis() {
        return (a - b).num_milliseconds() as f64 / ms;
    }
    let months = whole_months(a, b);
    match unit {
        TimeUnit::Year => (months / 12) as f64,
        _ => months as f64,
    }
}

fn whole_months(a: NaiveDateTime, b: NaiveDateTime) -> i64 {
    if a < b {
        return -whole_months(b, a);
    }
    let mut months = (a.year() as i64 - b.year() as i64) * 12 + a.month() as i64 - b.month() as i64;
    // Partial trailing month does not count.
    if (a.day(), a.time()) < (b.day(), b.time()) {
        months -= 1;
    }
    months
}

/// Truncate to the start of the given unit.
pub fn start_of(instant: NaiveDateTime, unit: TimeUnit) -> NaiveDateTime {
    let date = instant.date();
    match unit {
        TimeUnit::Second => instant.with_nanosecond(0).unwrap_or(instant),
        TimeUnit::Minute => instant
            .with_nanosecond(0)
            .and_then(|d| d.with_second(0))
            .unwrap_or(instant),
        TimeUnit::Hour => date
            .and_hms_opt(instant.hour(), 0, 0)
            .unwrap_or(instant),
        TimeUnit::Day => date.and_time(NaiveTime::MIN),
        TimeUnit::Month => date
            .with_day(1)
            .unwrap_or(date)
            .and_time(NaiveTime::MIN),
        TimeUnit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1)
            .unwrap_or(date)
            .and_time(NaiveTime::MIN),
    }
}

pub fn days_in_month(instant: NaiveDateTime) -> u32 {
    let first = start_of(instant, TimeUnit::Month);
    let next = add(first, 1.0, TimeUnit::Month);
    (next - first).num_days() as u32
}

/// Midnight of the current local day.
pub fn today() -> NaiveDateTime {
    chrono::Local::now().date_naive().and_time(NaiveTime::MIN)
}

/// True when the time-of-day is exactly midnight.
pub fn is_midnight(instant: NaiveDateTime) -> bool {
    instant.time() == NaiveTime::MIN
}
