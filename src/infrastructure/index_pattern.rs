// Index pattern expansion - Time rotated index names for a lookback window
use crate::domain::dashboard::{IndexSettings, TimeRange};
use crate::domain::time_span::{lookback_of, parse_time_span, DEFAULT_TIME_SPAN};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, Timelike, Utc};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexInterval {
    None,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl FromStr for IndexInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(IndexInterval::None),
            "hour" => Ok(IndexInterval::Hour),
            "day" => Ok(IndexInterval::Day),
            "week" => Ok(IndexInterval::Week),
            "month" => Ok(IndexInterval::Month),
            "year" => Ok(IndexInterval::Year),
            other => Err(format!("unknown index interval '{}'", other)),
        }
    }
}

impl IndexInterval {
    /// Start of the period containing `t`
    fn floor(self, t: NaiveDateTime) -> Option<NaiveDateTime> {
        let date = t.date();
        match self {
            IndexInterval::None => Some(t),
            IndexInterval::Hour => date.and_hms_opt(t.hour(), 0, 0),
            IndexInterval::Day => date.and_hms_opt(0, 0, 0),
            IndexInterval::Week => {
                let offset = Duration::days(date.weekday().num_days_from_monday() as i64);
                date.checked_sub_signed(offset)?.and_hms_opt(0, 0, 0)
            }
            IndexInterval::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?.and_hms_opt(0, 0, 0),
            IndexInterval::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1)?.and_hms_opt(0, 0, 0),
        }
    }

    /// Start of the following period
    fn next(self, t: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            IndexInterval::None => None,
            IndexInterval::Hour => t.checked_add_signed(Duration::hours(1)),
            IndexInterval::Day => t.checked_add_signed(Duration::days(1)),
            IndexInterval::Week => t.checked_add_signed(Duration::weeks(1)),
            IndexInterval::Month => t.checked_add_months(Months::new(1)),
            IndexInterval::Year => t.checked_add_months(Months::new(12)),
        }
    }
}

/// Translate a moment style pattern such as `[logstash-]YYYY.MM.DD` into a strftime format.
///
/// Both `ww` (locale week) and `WW` map to the ISO week, matching the Monday
/// based periods used for weekly rotation.
pub fn to_strftime(pattern: &str) -> String {
    const TOKENS: [(&str, &str); 8] = [
        ("YYYY", "%Y"),
        ("GGGG", "%G"),
        ("YY", "%y"),
        ("MM", "%m"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("ww", "%V"),
        ("WW", "%V"),
    ];

    let mut out = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;
    'scan: while let Some(c) = rest.chars().next() {
        if c == '[' {
            let literal_end = rest.find(']').unwrap_or(rest.len());
            out.push_str(&rest[1..literal_end].replace('%', "%%"));
            rest = rest.get(literal_end + 1..).unwrap_or("");
            continue;
        }
        for (token, spec) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = tail;
                continue 'scan;
            }
        }
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Index names a search over the dashboard's time window should target.
///
/// Falls back to the default index when rotation is off, no pattern is set
/// or there is no time filter.
pub fn candidate_indices(
    settings: &IndexSettings,
    time: Option<TimeRange<'_>>,
    now: DateTime<Utc>,
) -> Vec<String> {
    let fallback = vec![settings.default.clone()];

    let interval = match settings.interval.parse::<IndexInterval>() {
        Ok(IndexInterval::None) => return fallback,
        Ok(interval) => interval,
        Err(e) => {
            tracing::warn!("{}, using the default index", e);
            return fallback;
        }
    };
    let (Some(pattern), Some(time)) = (&settings.pattern, time) else {
        return fallback;
    };

    let lookback = lookback_of(time.from).unwrap_or_else(|e| {
        tracing::warn!("Invalid time filter start '{}': {}, using {}", time.from, e, DEFAULT_TIME_SPAN);
        parse_time_span(DEFAULT_TIME_SPAN).unwrap_or_else(|_| Duration::hours(4))
    });

    let Some(start) = now.checked_sub_signed(lookback) else {
        tracing::warn!("Time filter start '{}' is out of range, using the default index", time.from);
        return fallback;
    };

    expand(&to_strftime(pattern), interval, start.naive_utc(), now.naive_utc()).unwrap_or(fallback)
}

fn expand(
    format: &str,
    interval: IndexInterval,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Option<Vec<String>> {
    let mut indices: Vec<String> = Vec::new();
    let mut t = interval.floor(from)?;
    while t <= to {
        let name = t.format(format).to_string();
        if indices.last() != Some(&name) {
            indices.push(name);
        }
        t = interval.next(t)?;
    }
    Some(indices)
}
